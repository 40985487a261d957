//! Size limits and namespace prefixes from `linux/limits.h` and `linux/xattr.h`.

/// Maximum length of a path, including the terminating NUL.
pub const PATH_MAX: usize = 4096;

/// Maximum length of a single path component.
pub const NAME_MAX: usize = 255;

/// Maximum length of an extended attribute name (excluding the NUL).
pub const XATTR_NAME_MAX: usize = 255;

/// Maximum size of an extended attribute value.
pub const XATTR_SIZE_MAX: usize = 65536;

/// The only namespace userspace may manipulate.
pub const XATTR_USER_PREFIX: &str = "user.";
