//! Reading and writing the hash of the host location.

use tracing::error;
use waypost_history::History;

use crate::path::clean_path;

/// Everything after the first `#` of the host location.
pub(crate) fn get_hash(host: &dyn History) -> String {
    let href = host.href();
    match href.find('#') {
        Some(index) => href[index + 1..].to_string(),
        None => String::new(),
    }
}

/// The host location with its hash replaced by `path`.
pub(crate) fn get_url(host: &dyn History, path: &str) -> String {
    let href = host.href();
    let base = href.split_once('#').map_or(href.as_str(), |(base, _)| base);
    format!("{base}#{path}")
}

/// Show `path` as the hash, adding a history entry.
pub(crate) fn push_hash(host: &dyn History, path: &str) {
    match host.supports_push_state() {
        true => push_state(host, &get_url(host, path), false),
        false => host.set_hash(path),
    }
}

/// Show `path` as the hash, overwriting the current history entry.
pub(crate) fn replace_hash(host: &dyn History, path: &str) {
    match host.supports_push_state() {
        true => push_state(host, &get_url(host, path), true),
        false => host.replace_location(&get_url(host, path)),
    }
}

fn push_state(host: &dyn History, url: &str, replace: bool) {
    let res = match replace {
        true => host.replace_state(url),
        false => host.push_state(url),
    };

    if let Err(err) = res {
        error!(url, %err, "failed to change history state, changing the whole location instead");
        match replace {
            true => host.replace_location(url),
            false => host.assign(url),
        }
    }
}

/// Make sure the hash starts with a `/`. Returns whether it did already.
pub(crate) fn ensure_slash(host: &dyn History) -> bool {
    let path = get_hash(host);
    if path.starts_with('/') {
        return true;
    }
    replace_hash(host, &format!("/{path}"));
    false
}

/// Turn the configured base, or the one of the host, into a path prefix without a trailing
/// slash. The root base becomes the empty string.
pub(crate) fn normalize_base(base: Option<&str>, host: &dyn History) -> String {
    let base = match base.filter(|b| !b.is_empty()) {
        Some(base) => base.to_string(),
        None => {
            let base = host.base_href().unwrap_or_else(|| "/".to_string());
            strip_origin(&base).to_string()
        }
    };

    let base = match base.starts_with('/') {
        true => base,
        false => format!("/{base}"),
    };

    base.strip_suffix('/').unwrap_or(&base).to_string()
}

fn strip_origin(url: &str) -> &str {
    let Some(rest) = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
    else {
        return url;
    };

    match rest.find('/') {
        Some(index) => &rest[index..],
        None => "",
    }
}

/// The link to `full_path` for the given base.
pub(crate) fn create_href(base: &str, full_path: &str) -> String {
    let path = format!("#{full_path}");
    match base.is_empty() {
        true => path,
        false => clean_path(&format!("{base}/{path}")),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use waypost_history::MemoryHistory;

    use super::*;

    #[test]
    fn read_hash() {
        let host = MemoryHistory::with_initial_url("http://localhost/app#/a?x=1#y");
        assert_eq!(get_hash(&host), "/a?x=1#y");
        assert_eq!(get_url(&host, "/b"), "http://localhost/app#/b");

        let host = MemoryHistory::with_initial_url("http://localhost/app");
        assert_eq!(get_hash(&host), "");
        assert_eq!(get_url(&host, "/b"), "http://localhost/app#/b");
    }

    #[test]
    fn push_and_replace_with_push_state() {
        let host = MemoryHistory::default();
        push_hash(&host, "/a");
        replace_hash(&host, "/b");
        assert_eq!(
            host.entries(),
            vec!["http://localhost/", "http://localhost/#/b"]
        );
    }

    #[test]
    fn push_and_replace_without_push_state() {
        let host = MemoryHistory::default().without_push_state();
        push_hash(&host, "/a");
        replace_hash(&host, "/b");
        assert_eq!(
            host.entries(),
            vec!["http://localhost/", "http://localhost/#/b"]
        );
    }

    #[test]
    fn rejected_state_changes_fall_back() {
        let host = MemoryHistory::default().rejecting_state_changes();
        push_hash(&host, "/a");
        assert_eq!(
            host.entries(),
            vec!["http://localhost/", "http://localhost/#/a"]
        );
        replace_hash(&host, "/b");
        assert_eq!(host.href(), "http://localhost/#/b");
        assert_eq!(host.entries().len(), 2);
    }

    #[test]
    fn slash() {
        let host = MemoryHistory::with_initial_url("http://localhost/#users");
        assert!(!ensure_slash(&host));
        assert_eq!(host.href(), "http://localhost/#/users");
        assert!(ensure_slash(&host));

        let host = MemoryHistory::default();
        ensure_slash(&host);
        assert_eq!(host.href(), "http://localhost/#/");
    }

    #[test]
    fn base() {
        let host = MemoryHistory::default();
        assert_eq!(normalize_base(None, &host), "");
        assert_eq!(normalize_base(Some("app/"), &host), "/app");
        assert_eq!(normalize_base(Some("/app"), &host), "/app");

        let host = MemoryHistory::default().with_base_href("https://example.com/shop/");
        assert_eq!(normalize_base(None, &host), "/shop");

        let host = MemoryHistory::default().with_base_href("http://example.com");
        assert_eq!(normalize_base(None, &host), "");
    }

    #[test]
    fn href() {
        assert_eq!(create_href("", "/a?b=c"), "#/a?b=c");
        assert_eq!(create_href("/app", "/a"), "/app/#/a");
    }
}
