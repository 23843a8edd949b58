//! Path and URL utilities.
//!
//! Pure functions for path manipulation. No side effects beyond
//! `normalize_path`'s canonicalize attempt.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `lexical_normalize`)
//! - [`route`]: URL path utilities (`is_external_link`, `join_url_path`, `url_path_of`)

pub mod fs;
pub mod route;

pub use fs::{lexical_normalize, normalize_path};
