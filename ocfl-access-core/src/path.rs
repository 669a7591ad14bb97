//! Logical path validation and joining
//!
//! Logical paths are slash-separated, relative, and canonical: no empty,
//! `.`, or `..` segments, no leading or trailing slash. The single name
//! `"."` stands for the root directory and is valid only where a directory
//! is expected.

/// True if `path` is a canonical logical path or the root name `"."`.
pub fn valid_path(path: &str) -> bool {
    if path == "." {
        return true;
    }
    if path.is_empty() {
        return false;
    }
    path.split('/')
        .all(|seg| !seg.is_empty() && seg != "." && seg != "..")
}

/// Join two relative path fragments, treating `""` and `"."` as "no prefix".
pub fn join_paths(base: &str, rest: &str) -> String {
    if base.is_empty() || base == "." {
        return rest.to_string();
    }
    if rest.is_empty() || rest == "." {
        return base.to_string();
    }
    format!("{base}/{rest}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_path() {
        assert!(valid_path("."));
        assert!(valid_path("a.txt"));
        assert!(valid_path("dir/sub/file.txt"));
        assert!(valid_path("..dots..ok"));

        assert!(!valid_path(""));
        assert!(!valid_path("/abs"));
        assert!(!valid_path("trailing/"));
        assert!(!valid_path("a//b"));
        assert!(!valid_path("a/./b"));
        assert!(!valid_path("a/../b"));
        assert!(!valid_path(".."));
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("objects/obj-1", "v1/content/a.txt"), "objects/obj-1/v1/content/a.txt");
        assert_eq!(join_paths(".", "a.txt"), "a.txt");
        assert_eq!(join_paths("", "a.txt"), "a.txt");
        assert_eq!(join_paths("objects/obj-1", "."), "objects/obj-1");
    }
}
