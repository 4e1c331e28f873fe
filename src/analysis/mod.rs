//! The parameter-usage analyzer: usage tracking, the demotion decision, and
//! the driver that runs them over loaded packages.

pub mod decider;
pub mod driver;
pub mod usage;

pub use driver::{check_args_list, check_args_output, check_source, Linter};
pub use usage::{ParamUsage, UsageMap};
