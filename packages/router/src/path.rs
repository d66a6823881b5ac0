//! Helpers for splitting and joining location paths.

/// A path split into its three parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPath {
    /// Everything before the query and hash.
    pub path: String,
    /// The query, without the leading `?`.
    pub query: String,
    /// The hash, including the leading `#`. Empty if there was none.
    pub hash: String,
}

/// Split `path` into path, query and hash.
///
/// The hash is split off first, so a `?` inside the hash belongs to the hash.
///
/// ```rust
/// # use waypost_router::path::parse_path;
/// let parsed = parse_path("/a?x=1#h");
/// assert_eq!(parsed.path, "/a");
/// assert_eq!(parsed.query, "x=1");
/// assert_eq!(parsed.hash, "#h");
/// ```
pub fn parse_path(path: &str) -> ParsedPath {
    let (path, hash) = match path.find('#') {
        Some(index) => (&path[..index], &path[index..]),
        None => (path, ""),
    };

    let (path, query) = match path.split_once('?') {
        Some((path, query)) => (path, query),
        None => (path, ""),
    };

    ParsedPath {
        path: path.to_string(),
        query: query.to_string(),
        hash: hash.to_string(),
    }
}

/// Resolve `relative` against `base`.
///
/// Absolute paths are returned as they are, and paths starting with `?` or `#` are appended to
/// `base`. Otherwise the last segment of `base` is dropped (unless `append` is set, or `base`
/// ends in a slash), and the segments of `relative` are applied one by one: `..` removes a
/// segment, `.` is ignored and anything else is added.
///
/// ```rust
/// # use waypost_router::path::resolve_path;
/// assert_eq!(resolve_path("bar", "/foo/baz", false), "/foo/bar");
/// assert_eq!(resolve_path("bar", "/foo/baz", true), "/foo/baz/bar");
/// assert_eq!(resolve_path("../x", "/a/b/c", false), "/a/x");
/// ```
pub fn resolve_path(relative: &str, base: &str, append: bool) -> String {
    match relative.chars().next() {
        Some('/') => return relative.to_string(),
        Some('?') | Some('#') => return format!("{base}{relative}"),
        _ => {}
    }

    let mut stack: Vec<&str> = base.split('/').collect();

    // a trailing slash leaves an empty leaf that is always replaced
    if !append || stack.last().is_some_and(|s| s.is_empty()) {
        stack.pop();
    }

    for segment in relative.split('/') {
        match segment {
            ".." => {
                stack.pop();
            }
            "." => {}
            segment => stack.push(segment),
        }
    }

    if stack.first() != Some(&"") {
        stack.insert(0, "");
    }

    stack.join("/")
}

/// Collapse double slashes.
pub fn clean_path(path: &str) -> String {
    path.replace("//", "/")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_hash_before_query() {
        assert_eq!(
            parse_path("/a#h?x=1"),
            ParsedPath {
                path: "/a".into(),
                query: String::new(),
                hash: "#h?x=1".into(),
            }
        );
        assert_eq!(
            parse_path("/a?x=1?y=2"),
            ParsedPath {
                path: "/a".into(),
                query: "x=1?y=2".into(),
                hash: String::new(),
            }
        );
        assert_eq!(parse_path(""), ParsedPath::default());
    }

    #[test]
    fn resolve_absolute_and_markers() {
        assert_eq!(resolve_path("/x", "/a/b", false), "/x");
        assert_eq!(resolve_path("?q=1", "/a/b", false), "/a/b?q=1");
        assert_eq!(resolve_path("#top", "/a/b", true), "/a/b#top");
    }

    #[test]
    fn resolve_relative() {
        assert_eq!(resolve_path("bar", "/foo/baz", false), "/foo/bar");
        assert_eq!(resolve_path("bar", "/foo/baz", true), "/foo/baz/bar");
        assert_eq!(resolve_path("bar", "/foo/", true), "/foo/bar");
        assert_eq!(resolve_path("bar", "/", false), "/bar");
        assert_eq!(resolve_path("./bar", "/foo/baz", false), "/foo/bar");
    }

    #[test]
    fn resolve_parent_segments() {
        assert_eq!(resolve_path("../x", "/a/b/c", false), "/a/x");
        assert_eq!(resolve_path("../x", "/a/b/c", true), "/a/b/x");
        assert_eq!(resolve_path("../../../../x", "/a/b", false), "/x");
    }

    #[test]
    fn clean() {
        assert_eq!(clean_path("/a//b"), "/a/b");
        assert_eq!(clean_path("//"), "/");
    }
}
