//! Core VFS types and utilities

mod path;
mod types;

pub use path::{components, filename, join_path, parent_path, trim_trailing_slashes};
pub use types::{Credentials, FileMode, NodeType};
