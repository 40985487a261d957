//! Path utilities for the VFS layer.
//!
//! Paths are plain `/`-separated strings. Resolution of `.`, `..` and
//! symlinks is the resolver's job; these helpers only split and join.

use alloc::string::String;

/// Strip trailing slashes, reporting whether any were removed.
///
/// The root keeps a single slash.
pub fn trim_trailing_slashes(path: &str) -> (&str, bool) {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && !path.is_empty() {
        return ("/", path.len() > 1);
    }
    (trimmed, trimmed.len() != path.len())
}

/// Non-empty components of a path, in order.
pub fn components(path: &str) -> impl DoubleEndedIterator<Item = &str> {
    path.split('/').filter(|c| !c.is_empty())
}

/// Get the parent path of a given path.
pub fn parent_path(path: &str) -> String {
    if path == "/" {
        return String::from("/");
    }

    match path.rfind('/') {
        Some(0) => String::from("/"),
        Some(pos) => String::from(&path[..pos]),
        None => String::from("/"),
    }
}

/// Get the filename (last component) of a path.
pub fn filename(path: &str) -> &str {
    if path == "/" {
        return "";
    }

    match path.rfind('/') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// Join a relative path onto a base directory. Absolute `name`s win.
pub fn join_path(base: &str, name: &str) -> String {
    if name.starts_with('/') {
        String::from(name)
    } else if base.ends_with('/') {
        alloc::format!("{}{}", base, name)
    } else {
        alloc::format!("{}/{}", base, name)
    }
}
