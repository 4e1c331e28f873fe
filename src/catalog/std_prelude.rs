//! Built-in standard packages.
//!
//! The standard catalog is obtained the same way user packages are: these
//! sources are parsed and type-checked by the bundled front-end when the
//! loader starts, rather than hand-encoding method sets. The package order
//! here is the catalog insertion order, which fixes tie-breaking when a user
//! interface duplicates a standard method set.

/// `(import path, source)` in catalog insertion order.
pub const PACKAGES: &[(&str, &str)] = &[("io", IO_SRC), ("fmt", FMT_SRC), ("sort", SORT_SRC)];

/// Whether an import path names a built-in standard package.
pub fn is_std(path: &str) -> bool {
    PACKAGES.iter().any(|&(p, _)| p == path)
}

const IO_SRC: &str = r#"package io

type Reader interface {
	Read(p []byte) (n int, err error)
}

type Writer interface {
	Write(p []byte) (n int, err error)
}

type Closer interface {
	Close() error
}

type Seeker interface {
	Seek(offset int64, whence int) (int64, error)
}

type ReadWriter interface {
	Reader
	Writer
}

type ReadCloser interface {
	Reader
	Closer
}

type WriteCloser interface {
	Writer
	Closer
}

type ReadWriteCloser interface {
	Reader
	Writer
	Closer
}

type ReadSeeker interface {
	Reader
	Seeker
}

type WriteSeeker interface {
	Writer
	Seeker
}

type ReadWriteSeeker interface {
	Reader
	Writer
	Seeker
}

type ReaderFrom interface {
	ReadFrom(r Reader) (n int64, err error)
}

type WriterTo interface {
	WriteTo(w Writer) (n int64, err error)
}

type ReaderAt interface {
	ReadAt(p []byte, off int64) (n int, err error)
}

type WriterAt interface {
	WriteAt(p []byte, off int64) (n int, err error)
}

type ByteReader interface {
	ReadByte() (byte, error)
}

type ByteScanner interface {
	ByteReader
	UnreadByte() error
}

type ByteWriter interface {
	WriteByte(c byte) error
}

type RuneReader interface {
	ReadRune() (r rune, size int, err error)
}

type RuneScanner interface {
	RuneReader
	UnreadRune() error
}

func Copy(dst Writer, src Reader) (int64, error) {
	return 0, nil
}

func ReadAll(r Reader) ([]byte, error) {
	return nil, nil
}

func WriteString(w Writer, s string) (int, error) {
	return 0, nil
}
"#;

const FMT_SRC: &str = r#"package fmt

type Stringer interface {
	String() string
}
"#;

const SORT_SRC: &str = r#"package sort

type Interface interface {
	Len() int
	Less(i, j int) bool
	Swap(i, j int)
}
"#;
