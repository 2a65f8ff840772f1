// Security module for path validation
//
// Filesystem tools resolve every caller-supplied path through this module so
// that an optional root directory can confine them.

pub mod path_guard;

pub use path_guard::{PathSecurityError, validate_new_path, validate_path};
