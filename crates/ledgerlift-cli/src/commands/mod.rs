//! Command implementations.

pub mod analyze;
pub mod convert;
pub mod extract;
pub mod run;
pub mod search;

pub use self::analyze::execute_analyze;
pub use self::convert::execute_convert;
pub use self::extract::execute_extract;
pub use self::run::execute_run;
pub use self::search::execute_search;
