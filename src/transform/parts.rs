//! Lenient URL splitting.
//!
//! `url::Url` normalizes aggressively and refuses hosts like
//! `www-{LEVEL}.example.com` or scheme-less strings like `example.com?a=1`,
//! both of which appear in directive files. `UrlParts` splits a URL into its
//! five textual components without validating or normalizing any of them,
//! so that `join` reproduces the input exactly.

/// The five components of a URL, as written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParts {
    pub scheme: String,
    pub netloc: String,
    pub path: String,
    pub query: String,
    pub fragment: String,
}

impl UrlParts {
    pub fn split(url: &str) -> Self {
        let mut rest = url;

        let mut scheme = String::new();
        if let Some(colon) = rest.find(':') {
            let candidate = &rest[..colon];
            if is_scheme(candidate) {
                scheme = candidate.to_ascii_lowercase();
                rest = &rest[colon + 1..];
            }
        }

        let mut netloc = String::new();
        if let Some(after) = rest.strip_prefix("//") {
            let end = after.find(['/', '?', '#']).unwrap_or(after.len());
            netloc = after[..end].to_string();
            rest = &after[end..];
        }

        let mut fragment = String::new();
        if let Some(hash) = rest.find('#') {
            fragment = rest[hash + 1..].to_string();
            rest = &rest[..hash];
        }

        let mut query = String::new();
        if let Some(question) = rest.find('?') {
            query = rest[question + 1..].to_string();
            rest = &rest[..question];
        }

        Self {
            scheme,
            netloc,
            path: rest.to_string(),
            query,
            fragment,
        }
    }

    pub fn join(&self) -> String {
        let mut url = String::new();
        if !self.scheme.is_empty() {
            url.push_str(&self.scheme);
            url.push(':');
        }
        if !self.netloc.is_empty() {
            url.push_str("//");
            url.push_str(&self.netloc);
            if !self.path.is_empty() && !self.path.starts_with('/') {
                url.push('/');
            }
        }
        url.push_str(&self.path);
        if !self.query.is_empty() {
            url.push('?');
            url.push_str(&self.query);
        }
        if !self.fragment.is_empty() {
            url.push('#');
            url.push_str(&self.fragment);
        }
        url
    }
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_full_url() {
        let parts = UrlParts::split("https://www.example.com:8080/a/b?x=1&y=2#top");
        assert_eq!(parts.scheme, "https");
        assert_eq!(parts.netloc, "www.example.com:8080");
        assert_eq!(parts.path, "/a/b");
        assert_eq!(parts.query, "x=1&y=2");
        assert_eq!(parts.fragment, "top");
    }

    #[test]
    fn test_split_keeps_level_token_in_host() {
        let parts = UrlParts::split("http://www-{LEVEL}.example.com/{LEVEL}/");
        assert_eq!(parts.netloc, "www-{LEVEL}.example.com");
        assert_eq!(parts.path, "/{LEVEL}/");
    }

    #[test]
    fn test_split_schemeless() {
        let parts = UrlParts::split("example.com?_=123&b=2");
        assert_eq!(parts.scheme, "");
        assert_eq!(parts.netloc, "");
        assert_eq!(parts.path, "example.com");
        assert_eq!(parts.query, "_=123&b=2");
    }

    #[test]
    fn test_join_reproduces_input() {
        for url in [
            "http://www.example.com",
            "http://www.example.com/",
            "https://a.example.com:8443/x?y=1#z",
            "example.com?b=2&a=1&c=",
            "/relative/path",
        ] {
            assert_eq!(UrlParts::split(url).join(), url);
        }
    }
}
