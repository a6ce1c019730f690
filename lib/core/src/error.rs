//! Report-based result alias.
//!
//! Domain crates define their own error enums; this alias wraps them in a
//! rootcause [`Report`] at the points where a whole operation can fail, such
//! as process startup. Context is layered on with `.context()` as the error
//! travels up.

use rootcause::Report;

/// Result carrying a rootcause report.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
