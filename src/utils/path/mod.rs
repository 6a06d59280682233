//! Path utilities.
//!
//! Pure functions for path manipulation. No side effects apart from the
//! `canonicalize` attempt in `normalize_path`.

pub mod fs;

pub use fs::{lexical_normalize, normalize_path, relative_to};
