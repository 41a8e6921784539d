// URL transformation tests.

use super::*;
use regex::Regex;

fn level(level: &str) -> TransformOptions<'_> {
    TransformOptions {
        level: Some(level),
        ..Default::default()
    }
}

#[test]
fn test_level_decorates_first_label() {
    let t = UrlTransformer::default();
    assert_eq!(
        t.transform("http://www.example.com", &level("stag")),
        "http://www-stag.example.com"
    );
    assert_eq!(
        t.transform("http://www.example.com/a/b?c=d", &level("dev")),
        "http://www-dev.example.com/a/b?c=d"
    );
}

#[test]
fn test_live_level_is_unchanged() {
    let t = UrlTransformer::default();
    assert_eq!(
        t.transform("http://www.example.com", &level("live")),
        "http://www.example.com"
    );
}

#[test]
fn test_level_needs_a_subdomain() {
    let t = UrlTransformer::default();
    assert_eq!(
        t.transform("http://example.com/page", &level("stag")),
        "http://example.com/page"
    );
}

#[test]
fn test_level_token_in_host() {
    let t = UrlTransformer::default();
    let cases = [
        ("http://www-{LEVEL}.example.com", "live", "http://www.example.com"),
        ("http://www-{LEVEL}.example.com", "stag", "http://www-stag.example.com"),
        ("http://{LEVEL}.example.com", "live", "http://example.com"),
        ("http://{LEVEL}.example.com", "stag", "http://stag.example.com"),
        ("http://{LEVEL}-www.example.com", "live", "http://www.example.com"),
        ("http://{LEVEL}-www.example.com", "stag", "http://stag-www.example.com"),
        ("http://www.example{LEVEL}.com", "-staging", "http://www.example-staging.com"),
        ("http://www.example{LEVEL}.com", "", "http://www.example.com"),
    ];
    for (url, lvl, expected) in cases {
        assert_eq!(t.transform(url, &level(lvl)), expected, "{url} on {lvl:?}");
    }
}

#[test]
fn test_level_token_in_path() {
    let t = UrlTransformer::default();
    assert_eq!(
        t.transform("http://www.example.com/{LEVEL}/", &level("live")),
        "http://www.example.com/"
    );
    assert_eq!(
        t.transform("http://www.example.com/{LEVEL}/", &level("stag")),
        "http://www.example.com/stag/"
    );
}

#[test]
fn test_custom_level_token() {
    let t = UrlTransformer::new("%ENV%", Vec::new());
    assert_eq!(
        t.transform("http://www-%ENV%.example.com", &level("dev")),
        "http://www-dev.example.com"
    );
    // The default token is just text now.
    assert_eq!(
        t.transform("http://www.example.com", &level("dev")),
        "http://www-dev.example.com"
    );
}

#[test]
fn test_port_replaces_or_appends() {
    let t = UrlTransformer::default();
    let options = TransformOptions {
        port: Some(8999),
        level: Some("live"),
        ..Default::default()
    };
    assert_eq!(
        t.transform("http://www.example.com", &options),
        "http://www.example.com:8999"
    );
    assert_eq!(
        t.transform("http://www.example.com:8080/x", &options),
        "http://www.example.com:8999/x"
    );
}

#[test]
fn test_scheme_then_level() {
    let t = UrlTransformer::default();
    let options = TransformOptions {
        scheme: Some("https"),
        level: Some("stag"),
        ..Default::default()
    };
    assert_eq!(
        t.transform("http://www.example.com", &options),
        "https://www-stag.example.com"
    );
}

#[test]
fn test_cachebust_appends_one_parameter() {
    let t = UrlTransformer::default();
    let options = TransformOptions {
        level: Some("stag"),
        cachebust: true,
        ..Default::default()
    };
    let busted = t.transform("http://www.example.com", &options);
    let pattern = Regex::new(r"^http://www-stag\.example\.com/\?_=\d+$").expect("regex");
    assert!(pattern.is_match(&busted), "got {busted}");

    let busted = t.transform("http://www.example.com/a?b=1", &options);
    let pattern = Regex::new(r"^http://www-stag\.example\.com/a\?b=1&_=\d+$").expect("regex");
    assert!(pattern.is_match(&busted), "got {busted}");
}

#[test]
fn test_no_cachebust_leaves_query_alone() {
    let t = UrlTransformer::default();
    let transformed = t.transform("http://www.example.com", &level("stag"));
    assert!(!transformed.contains("_="));
}

#[test]
fn test_special_cases_run_last_in_order() {
    let t = UrlTransformer::new(
        "{LEVEL}",
        vec![
            ("www-stag.example.com".to_string(), "staging.example.net".to_string()),
            ("staging.example.net".to_string(), "final.example.net".to_string()),
        ],
    );
    assert_eq!(
        t.transform("http://www.example.com/x", &level("stag")),
        "http://final.example.net/x"
    );
}

#[test]
fn test_uncachebust_without_cachebuster() {
    assert_eq!(uncachebust("example.com?b=2&a=1&c="), "example.com?b=2&a=1&c=");
}

#[test]
fn test_uncachebust_with_cachebuster() {
    assert_eq!(
        uncachebust("example.com?_=123&b=2&a=1&c="),
        "example.com?b=2&a=1&c="
    );
    assert_eq!(uncachebust("example.com?_=123"), "example.com");
}

#[test]
fn test_uncachebust_is_left_inverse_of_cachebust() {
    let t = UrlTransformer::default();
    let options = TransformOptions {
        cachebust: true,
        ..Default::default()
    };
    for url in ["http://www.example.com/", "http://www.example.com/a?x=1&y=two"] {
        let busted = t.transform(url, &options);
        assert_eq!(busted.matches("_=").count(), 1);
        assert_eq!(uncachebust(&busted), url);
    }
}

#[test]
fn test_cachebust_replaces_existing_cachebuster() {
    let t = UrlTransformer::default();
    let options = TransformOptions {
        cachebust: true,
        ..Default::default()
    };
    let busted = t.transform("http://www.example.com/a?_=1&b=2&_=3", &options);
    assert_eq!(busted.matches("_=").count(), 1, "got {busted}");
    let pattern = Regex::new(r"^http://www\.example\.com/a\?b=2&_=\d+$").expect("regex");
    assert!(pattern.is_match(&busted), "got {busted}");
}

#[test]
fn test_uncachebust_keeps_other_pairs_verbatim() {
    assert_eq!(
        uncachebust("http://www.example.com/?q=a%20b&next=/x/y&_=99&t=a+b"),
        "http://www.example.com/?q=a%20b&next=/x/y&t=a+b"
    );
    // Keys that merely start with an underscore stay.
    assert_eq!(
        uncachebust("http://www.example.com/?_x=1&_=2"),
        "http://www.example.com/?_x=1"
    );
}
