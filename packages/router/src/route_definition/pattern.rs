use tracing::warn;
use urlencoding::encode;

use crate::location::Params;

/// The name the value matched by a `*` segment is stored under.
pub const CATCH_ALL_PARAM: &str = "pathMatch";

#[derive(Clone, Debug, PartialEq, Eq)]
enum PatternSegment {
    Static(String),
    Param { name: String, optional: bool },
    CatchAll,
}

/// A compiled route path.
///
/// A path is made of segments separated by `/`. A segment is either
/// - static text, which matches case-insensitively,
/// - a `:name` parameter, which matches exactly one non-empty segment,
/// - an optional `:name?` parameter, which may also match nothing,
/// - or `*`, which matches any number of segments and is stored as `pathMatch`.
///
/// A trailing slash on the matched path is always accepted.
///
/// ```rust
/// # use waypost_router::route_definition::PathPattern;
/// let pattern = PathPattern::compile("/user/:id/:tab?");
/// assert_eq!(pattern.keys(), ["id", "tab"]);
/// assert!(pattern.is_match("/User/42/"));
/// assert!(pattern.is_match("/user/42/posts"));
/// assert!(!pattern.is_match("/user"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<PatternSegment>,
    keys: Vec<String>,
}

impl PathPattern {
    /// Compile `path`.
    pub fn compile(path: &str) -> Self {
        let mut keys = Vec::new();
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s == "*" {
                    keys.push(CATCH_ALL_PARAM.to_string());
                    return PatternSegment::CatchAll;
                }

                match s.strip_prefix(':') {
                    Some(name) => {
                        let (name, optional) = match name.strip_suffix('?') {
                            Some(name) => (name, true),
                            None => (name, false),
                        };
                        if name.is_empty() {
                            warn!(path, "parameter without a name");
                        }
                        if keys.iter().any(|k| k == name) {
                            warn!(path, name, "parameter name used more than once");
                        }
                        keys.push(name.to_string());
                        PatternSegment::Param {
                            name: name.to_string(),
                            optional,
                        }
                    }
                    None => PatternSegment::Static(s.to_string()),
                }
            })
            .collect();

        Self {
            source: path.to_string(),
            segments,
            keys,
        }
    }

    /// The path this pattern was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parameter names in declaration order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Check whether `path` matches.
    pub fn is_match(&self, path: &str) -> bool {
        self.captures(path).is_some()
    }

    /// Match `path` and return the raw (still encoded) value of every parameter in declaration
    /// order. Optional parameters that matched nothing have no value.
    pub fn captures(&self, path: &str) -> Option<Vec<(String, Option<String>)>> {
        let path = path.strip_prefix('/')?;
        let path = path.strip_suffix('/').unwrap_or(path);
        let input: Vec<&str> = match path.is_empty() {
            true => Vec::new(),
            false => path.split('/').collect(),
        };

        let mut captures = Vec::with_capacity(self.keys.len());
        match match_segments(&self.segments, &input, &mut captures) {
            true => Some(captures),
            false => None,
        }
    }

    /// Build a path by substituting `params` into the pattern.
    ///
    /// Returns the name of the first required parameter that has no value.
    pub fn fill(&self, params: &Params) -> Result<String, String> {
        let mut path = String::new();
        for segment in &self.segments {
            match segment {
                PatternSegment::Static(s) => {
                    path.push('/');
                    path.push_str(s);
                }
                PatternSegment::Param { name, optional } => match params.get(name) {
                    Some(value) if !value.is_empty() => {
                        path.push('/');
                        path.push_str(&encode(value));
                    }
                    _ if *optional => {}
                    _ => return Err(name.clone()),
                },
                PatternSegment::CatchAll => {
                    if let Some(value) = params.get(CATCH_ALL_PARAM) {
                        let value = value.trim_start_matches('/');
                        if !value.is_empty() {
                            path.push('/');
                            path.push_str(value);
                        }
                    }
                }
            }
        }

        if path.is_empty() {
            path.push('/');
        }
        Ok(path)
    }
}

fn match_segments(
    segments: &[PatternSegment],
    input: &[&str],
    captures: &mut Vec<(String, Option<String>)>,
) -> bool {
    let Some((segment, rest)) = segments.split_first() else {
        return input.is_empty();
    };

    match segment {
        PatternSegment::Static(s) => match input.split_first() {
            Some((first, remaining)) if first.to_lowercase() == s.to_lowercase() => {
                match_segments(rest, remaining, captures)
            }
            _ => false,
        },
        PatternSegment::Param { name, optional } => {
            if let Some((first, remaining)) = input.split_first() {
                if !first.is_empty() {
                    captures.push((name.clone(), Some(first.to_string())));
                    if match_segments(rest, remaining, captures) {
                        return true;
                    }
                    captures.pop();
                }
            }

            if *optional {
                captures.push((name.clone(), None));
                if match_segments(rest, input, captures) {
                    return true;
                }
                captures.pop();
            }

            false
        }
        PatternSegment::CatchAll => {
            // greedy, the longest match wins
            for taken in (0..=input.len()).rev() {
                captures.push((CATCH_ALL_PARAM.to_string(), Some(input[..taken].join("/"))));
                if match_segments(rest, &input[taken..], captures) {
                    return true;
                }
                captures.pop();
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn caps(pattern: &str, path: &str) -> Option<Vec<(String, Option<String>)>> {
        PathPattern::compile(pattern).captures(path)
    }

    fn some(pairs: &[(&str, Option<&str>)]) -> Option<Vec<(String, Option<String>)>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
                .collect(),
        )
    }

    #[test]
    fn static_segments() {
        assert_eq!(caps("/", "/"), some(&[]));
        assert_eq!(caps("/foo/bar", "/FOO/Bar"), some(&[]));
        assert_eq!(caps("/foo", "/foo/"), some(&[]));
        assert_eq!(caps("/foo", "/foo/bar"), None);
        assert_eq!(caps("/foo/bar", "/foo"), None);
        assert_eq!(caps("/foo", "foo"), None);
    }

    #[test]
    fn params() {
        assert_eq!(
            caps("/user/:id", "/user/42"),
            some(&[("id", Some("42"))])
        );
        assert_eq!(caps("/user/:id", "/user"), None);
        assert_eq!(caps("/user/:id", "/user//"), None);
    }

    #[test]
    fn optional_params() {
        assert_eq!(
            caps("/a/:x?/b", "/a/b"),
            some(&[("x", None)])
        );
        assert_eq!(
            caps("/a/:x?/b", "/a/1/b"),
            some(&[("x", Some("1"))])
        );
        // the optional param gives up its segment to the required one
        assert_eq!(
            caps("/a/:x?/:y", "/a/1"),
            some(&[("x", None), ("y", Some("1"))])
        );
    }

    #[test]
    fn catch_all() {
        assert_eq!(
            caps("*", "/anything/at/all"),
            some(&[(CATCH_ALL_PARAM, Some("anything/at/all"))])
        );
        assert_eq!(caps("*", "/"), some(&[(CATCH_ALL_PARAM, Some(""))]));
        assert_eq!(
            caps("/files/*/raw", "/files/a/b/raw"),
            some(&[(CATCH_ALL_PARAM, Some("a/b"))])
        );
    }

    #[test]
    fn unnamed_params_still_match() {
        let pattern = PathPattern::compile("/a/:");
        assert_eq!(pattern.keys(), [""]);
        assert_eq!(pattern.captures("/a/x"), some(&[("", Some("x"))]));
    }

    #[test]
    fn fill() {
        let pattern = PathPattern::compile("/user/:id/:tab?");
        let mut params = Params::new();
        assert_eq!(pattern.fill(&params), Err("id".to_string()));

        params.insert("id".into(), "a b".into());
        assert_eq!(pattern.fill(&params), Ok("/user/a%20b".to_string()));

        params.insert("tab".into(), "posts".into());
        assert_eq!(pattern.fill(&params), Ok("/user/a%20b/posts".to_string()));

        assert_eq!(PathPattern::compile("/").fill(&params), Ok("/".to_string()));
    }
}
