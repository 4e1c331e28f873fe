//! End-to-end analysis scenarios over in-memory packages.

use narrower::check_source;
use std::path::PathBuf;

fn check(src: &str) -> Vec<(String, String)> {
    check_source("foo", vec![(PathBuf::from("foo.go"), src.to_string())])
        .expect("package must load")
        .into_iter()
        .map(|w| (w.name, w.new_type))
        .collect()
}

fn warns(src: &str) -> Vec<String> {
    check_source("foo", vec![(PathBuf::from("foo.go"), src.to_string())])
        .expect("package must load")
        .into_iter()
        .map(|w| w.to_string())
        .collect()
}

const FILE_TYPE: &str = "package foo

type File struct {
	fd int
}

func (f *File) Close() error {
	return nil
}

func (f *File) Stat() error {
	return nil
}
";

#[test]
fn basic_demotion_to_standard_interface() {
    let src = format!(
        "{FILE_TYPE}
func FooCloser(c *File) {{
	c.Close()
}}
"
    );
    let out = warns(&src);
    assert_eq!(out.len(), 1);
    assert!(
        out[0].ends_with("c can be io.Closer"),
        "unexpected warning {:?}",
        out[0]
    );
}

#[test]
fn warning_position_points_at_the_parameter() {
    let src = "package foo\n\ntype File struct {\n\tfd int\n}\n\nfunc (f *File) Close() error {\n\treturn nil\n}\n\nfunc (f *File) Stat() error {\n\treturn nil\n}\n\nfunc FooCloser(c *File) {\n\tc.Close()\n}\n";
    let ws = check_source("foo", vec![(PathBuf::from("used.go"), src.to_string())])
        .expect("package must load");
    assert_eq!(ws.len(), 1);
    let w = &ws[0];
    assert_eq!(w.pos.line, 15);
    assert_eq!(w.pos.column, 16);
    assert!(w.pos.file.ends_with("used.go"));
    assert_eq!(w.name, "c");
    assert_eq!(w.new_type, "io.Closer");
}

#[test]
fn type_name_in_function_name_suppresses() {
    let src = format!(
        "{FILE_TYPE}
func FooFile(f *File) {{
	f.Close()
}}
"
    );
    assert!(check(&src).is_empty());
}

#[test]
fn passing_to_a_concrete_function_poisons() {
    let src = format!(
        "{FILE_TYPE}
func FooFile(f *File) {{
	f.Stat()
}}

func Bar(f *File) {{
	f.Close()
	FooFile(f)
}}
"
    );
    assert!(check(&src).is_empty());
}

#[test]
fn passing_to_an_interface_function_does_not_poison() {
    let src = "package foo

import \"io\"

type File struct {
	fd int
}

func (f *File) Close() error {
	return nil
}

func FooCloser(c io.Closer) {
	c.Close()
}

func BarWrong(f *File) {
	f.Close()
	FooCloser(f)
}
";
    assert_eq!(
        check(src),
        vec![("f".to_string(), "io.Closer".to_string())]
    );
}

#[test]
fn nil_comparison_keeps_the_declared_interface() {
    let src = "package foo

type Reader interface {
	Read(p []byte) (n int, err error)
}

type Closer interface {
	Close() error
}

type ReadCloser interface {
	Reader
	Closer
}

func CompareNil(rc ReadCloser) {
	if rc != nil {
		rc.Close()
	}
}
";
    assert!(check(src).is_empty());
}

#[test]
fn typed_literal_comparison_poisons() {
    let src = "package foo

type Mint int

func (m Mint) Close() error {
	return nil
}

func CompareStruct(m Mint) {
	if m != Mint(3) {
		m.Close()
	}
}
";
    assert!(check(src).is_empty());
}

#[test]
fn comparing_two_variables_does_not_poison() {
    let src = "package foo

type Mint int

func (m Mint) Close() error {
	return nil
}

func Compare(m Mint, other Mint) {
	if m != other {
		m.Close()
	}
}
";
    let out = check(src);
    assert!(out.contains(&("m".to_string(), "io.Closer".to_string())));
}

#[test]
fn composite_field_selects_the_lighter_interface() {
    let src = "package foo

type Fooer interface {
	Foo()
}

type FooBarer interface {
	Fooer
	Bar()
}

type HoldFooer struct {
	f Fooer
}

type HoldFooBarer struct {
	fb FooBarer
}

func Correct(fb FooBarer) {
	_ = HoldFooBarer{fb: fb}
}

func Wrong(fb FooBarer) {
	_ = HoldFooer{f: fb}
}
";
    assert_eq!(
        check(src),
        vec![("fb".to_string(), "Fooer".to_string())]
    );
}

#[test]
fn positional_inline_and_renamed_composites() {
    let src = "package foo

type Fooer interface {
	Foo()
}

type FooBarer interface {
	Fooer
	Bar()
}

type holdFooer struct {
	f Fooer
}

type holdFooerNested holdFooer

func WrongNoKey(fb FooBarer) {
	_ = holdFooer{fb}
}

func WrongNoKeyInplace(fb FooBarer) {
	_ = struct {
		f Fooer
	}{fb}
}

func WrongNoKeyDeep(fb FooBarer) {
	_ = holdFooerNested{fb}
}
";
    assert_eq!(
        check(src),
        vec![
            ("fb".to_string(), "Fooer".to_string()),
            ("fb".to_string(), "Fooer".to_string()),
            ("fb".to_string(), "Fooer".to_string()),
        ]
    );
}

#[test]
fn assignment_to_lighter_interface_unions_method_sets() {
    let src = "package foo

type Closer interface {
	Close() error
}

type Banger interface {
	Bang()
}

type BangCloser interface {
	Banger
	Closer
}

type St struct {
	x int
}

func (s St) Bang() {}

func (s St) Close() error {
	return nil
}

func BangLighter(s St) {
	s.Close()
	var b Banger
	b = s
	b.Bang()
}
";
    assert_eq!(
        check(src),
        vec![("s".to_string(), "BangCloser".to_string())]
    );
}

#[test]
fn full_method_set_is_redundant() {
    let src = "package foo

type Closer interface {
	Close() error
}

type Banger interface {
	Bang()
}

type BangCloser interface {
	Banger
	Closer
}

func Bang(bc BangCloser) {
	var bc2 BangCloser
	bc.Close()
	bc2 = bc
	bc2.Bang()
}
";
    assert!(check(src).is_empty());
}

#[test]
fn goroutine_usage_feeds_the_outer_parameter() {
    let ok = "package foo

import \"io\"

func FooGo(rc io.ReadCloser) {
	rc.Read(nil)
	go func() {
		rc.Close()
	}()
}
";
    assert!(check(ok).is_empty());

    let wrong = "package foo

import \"io\"

func FooGoWrong(rc io.ReadCloser) {
	go func() {
		rc.Close()
	}()
}
";
    assert_eq!(
        check(wrong),
        vec![("rc".to_string(), "io.Closer".to_string())]
    );
}

#[test]
fn literal_argument_usage_feeds_the_outer_parameter() {
    let src = "package foo

import \"io\"

func FooArgWrong(rc io.ReadCloser) {
	f := func(err error) {}
	f(rc.Close())
}
";
    assert_eq!(
        check(src),
        vec![("rc".to_string(), "io.Closer".to_string())]
    );
}

#[test]
fn non_interface_operations_poison() {
    let src = "package foo

type Mint int

func (m Mint) String() string {
	return \"\"
}

type Marr [3]int

func (m Marr) String() string {
	return \"\"
}

func Stringy(m Mint) {
	m.String()
}

func Unary(m Mint) {
	m.String()
	_ = -m
}

func BinaryLeft(m Mint) {
	m.String()
	_ = m + 3
}

func BinaryRight(m Mint) {
	m.String()
	_ = 3 + m
}

func Index(m Marr) {
	m.String()
	_ = m[1]
}
";
    assert_eq!(
        check(src),
        vec![("m".to_string(), "fmt.Stringer".to_string())]
    );
}

#[test]
fn map_literal_keys_and_values_poison() {
    let src = "package foo

type Mint int

func (m Mint) Close() error {
	return nil
}

func MapKey(m Mint) {
	m.Close()
	_ = map[Mint]string{
		m: \"foo\",
	}
}

func MapValue(m Mint) {
	m.Close()
	_ = map[string]Mint{
		\"foo\": m,
	}
}
";
    assert!(check(src).is_empty());
}

#[test]
fn variadic_arguments_use_the_element_interface() {
    let src = "package foo

type Closer interface {
	Close() error
}

type St struct {
	x int
}

func (s St) Close() error {
	return nil
}

func Extra(n int, cs ...Closer) {}

func ArgExtraWrong(s1 St) {
	var s2 St
	s1.Close()
	s2.Close()
	Extra(3, s1, s2)
}
";
    // The standard catalog wins the Close-only method set.
    assert_eq!(
        check(src),
        vec![("s1".to_string(), "io.Closer".to_string())]
    );
}

#[test]
fn alias_chains_propagate_poisoning() {
    let poisoned = "package foo

type St struct {
	x int
}

func (s St) Close() error {
	return nil
}

func Assigned(s St) {
	s.Close()
	var s2 St
	s2 = s
	_ = s2
}
";
    assert!(check(poisoned).is_empty());

    let clean = "package foo

type Closer interface {
	Close() error
}

type St struct {
	x int
}

func (s St) Close() error {
	return nil
}

func AssignedWrong(s St) {
	s.Close()
	var c Closer
	c = s
	_ = c
}
";
    assert_eq!(
        check(clean),
        vec![("s".to_string(), "io.Closer".to_string())]
    );
}

#[test]
fn multi_value_assignments_track_the_receiver_call() {
    let src = "package foo

type File struct {
	fd int
}

func (f *File) Read(p []byte) (n int, err error) {
	return 0, nil
}

func (f *File) Close() error {
	return nil
}

func Consume(f *File, p []byte) {
	n, err := f.Read(p)
	_ = n
	_ = err
}
";
    assert_eq!(
        check(src),
        vec![("f".to_string(), "io.Reader".to_string())]
    );
}

#[test]
fn standard_free_function_arguments_shape_the_parameter() {
    let src = "package foo

import \"io\"

type File struct {
	fd int
}

func (f *File) Read(p []byte) (n int, err error) {
	return 0, nil
}

func (f *File) Close() error {
	return nil
}

func Drain(f *File) {
	io.ReadAll(f)
}
";
    assert_eq!(
        check(src),
        vec![("f".to_string(), "io.Reader".to_string())]
    );
}

#[test]
fn short_declaration_aliases_propagate_poisoning() {
    let src = "package foo

type Mint int

func (m Mint) Close() error {
	return nil
}

func ShortAlias(m Mint) {
	m.Close()
	m2 := m
	_ = -m2
}
";
    assert!(check(src).is_empty());
}

#[test]
fn unexported_functions_avoid_boxing_suggestions() {
    let src = "package foo

type St struct {
	x int
}

func (s St) Close() error {
	return nil
}

func useSt(s St) {
	s.Close()
}
";
    assert!(check(src).is_empty());

    // Pointers already box; unexported functions still get suggestions.
    let ptr = format!(
        "{FILE_TYPE}
func useHandle(h *File) {{
	h.Close()
}}
"
    );
    assert_eq!(
        check(&ptr),
        vec![("h".to_string(), "io.Closer".to_string())]
    );
}

#[test]
fn function_whose_signature_matches_a_contract_is_skipped() {
    let pinned = "package foo

import \"io\"

type Handler interface {
	Handle(rc io.ReadCloser) error
}

func Process(rc io.ReadCloser) error {
	rc.Close()
	return nil
}
";
    assert!(check(pinned).is_empty());

    let unpinned = "package foo

import \"io\"

func Process(rc io.ReadCloser) error {
	rc.Close()
	return nil
}
";
    assert_eq!(
        check(unpinned),
        vec![("rc".to_string(), "io.Closer".to_string())]
    );
}

#[test]
fn function_values_that_escape_are_pinned() {
    let escaped = "package foo

type St struct {
	x int
}

func (s St) Close() error {
	return nil
}

func Consume(s St) {
	s.Close()
}

func Register(f func(St)) {}

func Setup() {
	Register(Consume)
}
";
    assert!(check(escaped).is_empty());

    let kept = "package foo

type St struct {
	x int
}

func (s St) Close() error {
	return nil
}

func Consume(s St) {
	s.Close()
}
";
    assert_eq!(
        check(kept),
        vec![("s".to_string(), "io.Closer".to_string())]
    );
}

#[test]
fn nested_literal_matching_a_contract_is_skipped() {
    let pinned = "package foo

type St struct {
	x int
}

func (s St) Close() error {
	return nil
}

type Walker interface {
	Walk(depth int) error
}

func Nested(s St) {
	f := func(depth int) error {
		s.Close()
		return nil
	}
	_ = f
}
";
    assert!(check(pinned).is_empty());

    let unpinned = "package foo

type St struct {
	x int
}

func (s St) Close() error {
	return nil
}

func Nested(s St) {
	f := func(depth int) error {
		s.Close()
		return nil
	}
	_ = f
}
";
    assert_eq!(
        check(unpinned),
        vec![("s".to_string(), "io.Closer".to_string())]
    );
}

#[test]
fn import_aliases_shape_suggestions() {
    let src = "package foo

import myio \"io\"

type File struct {
	fd int
}

func (f *File) Close() error {
	return nil
}

func Use(f *File) {
	var c myio.Closer
	c = f
	_ = c
}
";
    assert_eq!(
        check(src),
        vec![("f".to_string(), "myio.Closer".to_string())]
    );
}

#[test]
fn warnings_are_ordered_by_source_offset() {
    let a = "package foo

type File struct {
	fd int
}

func (f *File) Close() error {
	return nil
}

func Second(x *File) {
	x.Close()
}

func Third(y *File) {
	y.Close()
}
";
    let b = "package foo

func Fourth(z *File) {
	z.Close()
}
";
    let ws = check_source(
        "foo",
        vec![
            (PathBuf::from("a.go"), a.to_string()),
            (PathBuf::from("b.go"), b.to_string()),
        ],
    )
    .expect("package must load");
    let names: Vec<&str> = ws.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, ["x", "y", "z"]);
    let offsets: Vec<usize> = ws.iter().map(|w| w.pos.offset).collect();
    let mut sorted = offsets.clone();
    sorted.sort_unstable();
    assert_eq!(offsets, sorted);
}

#[test]
fn embedded_struct_methods_participate() {
    let src = "package foo

type Base struct {
	x int
}

func (b Base) Close() error {
	return nil
}

type Wrap struct {
	Base
	y int
}

func Use(w *Wrap) {
	w.Close()
}
";
    assert_eq!(
        check(src),
        vec![("w".to_string(), "io.Closer".to_string())]
    );
}
