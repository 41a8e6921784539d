//! Directive files.
//!
//! [`FileParser`] turns input files into an ordered list of directives,
//! dispatching on the file extension:
//!
//! - `.json`, `.yaml`, `.yml`: a list of directive records or plain URLs
//! - `.xml`: a sitemap or sitemap index, local or `http(s)`
//! - anything else: a line-oriented URL list
//!
//! Structured files and lists can include other files. A file already
//! loaded is skipped, which also breaks include cycles.

mod list;
mod sitemap;

pub use list::{parse_list_line, ListLine};
pub use sitemap::{is_remote, load_sitemap, sitemap_locations};

use std::collections::HashSet;
use std::path::Path;

use futures::future::BoxFuture;
use log::{debug, warn};
use regex::Regex;
use serde_json::Value;

use crate::assertion::{Assertion, RedirectAssertion, StatusAssertion};
use crate::directive::record::{CheckRecord, IncludeRecord};
use crate::directive::{Directive, DirectiveBuilder};
use crate::error_handling::{ConfigError, InputFileError, LoadError};
use crate::initialization::TlsPolicy;
use crate::transform::TransformOptions;

pub struct FileParser<'a> {
    builder: &'a DirectiveBuilder<'a>,
    user_agent: &'a str,
    tls: &'a TlsPolicy,
    visited: HashSet<String>,
}

impl<'a> FileParser<'a> {
    /// `user_agent` and `tls` are used to download remote sitemaps.
    pub fn new(builder: &'a DirectiveBuilder<'a>, user_agent: &'a str, tls: &'a TlsPolicy) -> Self {
        Self {
            builder,
            user_agent,
            tls,
            visited: HashSet::new(),
        }
    }

    /// Loads every file in order.
    ///
    /// # Errors
    ///
    /// The first unreadable file, malformed record or unknown directive
    /// type. Nothing is returned in that case: a partial suite would
    /// misreport the site's health.
    pub async fn load(&mut self, filenames: &[String]) -> Result<Vec<Directive>, LoadError> {
        let mut directives = Vec::new();
        for filename in filenames {
            directives.extend(self.parse_file(filename.clone()).await?);
        }
        Ok(directives)
    }

    fn parse_file(&mut self, filename: String) -> BoxFuture<'_, Result<Vec<Directive>, LoadError>> {
        Box::pin(async move {
            if !self.visited.insert(filename.clone()) {
                warn!("Skipping {filename}, it has already been loaded");
                return Ok(Vec::new());
            }
            debug!("Loading directives from {filename}");

            let extension = Path::new(&filename)
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase);
            match extension.as_deref() {
                Some(ext @ ("json" | "yaml" | "yml")) => {
                    let document = read_structured(&filename, ext == "json").await?;
                    self.parse_structured(&filename, document).await
                }
                Some("xml") => self.parse_sitemap(&filename).await,
                _ => self.parse_list(&filename).await,
            }
        })
    }

    async fn parse_structured(
        &mut self,
        filename: &str,
        document: Value,
    ) -> Result<Vec<Directive>, LoadError> {
        let elements = match document {
            Value::Array(elements) => elements,
            Value::Null => Vec::new(),
            other => {
                return Err(InputFileError::new(
                    filename,
                    format!("expected a list of directives, not {}", json_type(&other)),
                )
                .into())
            }
        };

        let mut directives = Vec::new();
        for element in elements {
            let element = match element {
                Value::String(url) => {
                    directives.push(self.build(filename, &CheckRecord::for_url(url))?);
                    continue;
                }
                Value::Object(map) => map,
                other => {
                    return Err(InputFileError::new(
                        filename,
                        format!("expected a directive or a URL, not {}", json_type(&other)),
                    )
                    .into())
                }
            };

            let Some(directive_type) = element.get("directive").cloned() else {
                continue;
            };
            let included = level_included(element.get("only_levels"), &self.builder.options().level)
                .map_err(|e| LoadError::config(filename, e))?;
            if !included {
                debug!("Skipping a {directive_type} directive in {filename} for this level");
                continue;
            }

            let element = Value::Object(element);
            match directive_type.as_str() {
                Some("check") => {
                    let record = CheckRecord::from_value(element)
                        .map_err(|e| LoadError::config(filename, e))?;
                    directives.push(self.build(filename, &record)?);
                }
                Some("include") => {
                    let record: IncludeRecord = serde_json::from_value(element)
                        .map_err(|e| LoadError::config(filename, e.into()))?;
                    let target = resolve_include(filename, &record.filename);
                    directives.extend(self.parse_file(target).await?);
                }
                Some(other) => {
                    return Err(LoadError::config(
                        filename,
                        ConfigError::UnknownDirective(other.to_string()),
                    ))
                }
                None => {
                    return Err(LoadError::config(
                        filename,
                        ConfigError::UnknownDirective(directive_type.to_string()),
                    ))
                }
            }
        }
        Ok(directives)
    }

    async fn parse_sitemap(&mut self, filename: &str) -> Result<Vec<Directive>, LoadError> {
        let locations = load_sitemap(filename, self.user_agent, self.tls).await?;
        debug!("{filename} lists {} URL(s)", locations.len());
        locations
            .into_iter()
            .map(|loc| self.build(filename, &CheckRecord::for_url(loc)))
            .collect()
    }

    async fn parse_list(&mut self, filename: &str) -> Result<Vec<Directive>, LoadError> {
        let text = tokio::fs::read_to_string(filename)
            .await
            .map_err(|e| InputFileError::new(filename, e))?;
        let builder = self.builder;
        let options = builder.options();

        let mut directives = Vec::new();
        for (number, line) in text.lines().enumerate() {
            let parsed = parse_list_line(line, &options.level).map_err(|message| {
                InputFileError::new(filename, format!("line {}: {message}", number + 1))
            })?;
            match parsed {
                None => {}
                Some(ListLine::Include(included)) => {
                    let target = resolve_include(filename, &included);
                    directives.extend(self.parse_file(target).await?);
                }
                Some(ListLine::Check {
                    status,
                    url,
                    redirect_to,
                }) => {
                    let mut directive = self.build(filename, &CheckRecord::for_url(url))?;
                    directive.tests = vec![match redirect_to {
                        Some(target) => {
                            let target = builder.transformer().transform(
                                &target,
                                &TransformOptions {
                                    scheme: options.scheme.as_deref(),
                                    port: options.port,
                                    level: Some(options.level.as_str()),
                                    cachebust: false,
                                },
                            );
                            Assertion::Redirect(RedirectAssertion::new(status, Some(target), false))
                        }
                        None => Assertion::Status(StatusAssertion::new(status)),
                    }];
                    directives.push(directive);
                }
            }
        }
        Ok(directives)
    }

    fn build(&self, filename: &str, record: &CheckRecord) -> Result<Directive, LoadError> {
        self.builder
            .build(record)
            .map_err(|e| LoadError::config(filename, e))
    }
}

async fn read_structured(filename: &str, is_json: bool) -> Result<Value, LoadError> {
    let text = tokio::fs::read_to_string(filename)
        .await
        .map_err(|e| InputFileError::new(filename, e))?;
    let document = if is_json {
        serde_json::from_str(&text).map_err(|e| InputFileError::new(filename, e))?
    } else {
        serde_yaml::from_str(&text).map_err(|e| InputFileError::new(filename, e))?
    };
    Ok(document)
}

/// Whether a record with this `only_levels` value applies to `level`.
///
/// Absent or any empty value (`null`, `false`, `0`, `""`, `[]`, `{}`)
/// means every level. Patterns are unanchored.
///
/// # Errors
///
/// `only_levels` is a non-empty value other than a list, or holds an
/// invalid regex.
pub fn level_included(only_levels: Option<&Value>, level: &str) -> Result<bool, ConfigError> {
    let patterns = match only_levels {
        None => return Ok(true),
        Some(value) if is_empty_value(value) => return Ok(true),
        Some(Value::Array(patterns)) => patterns,
        Some(other) => return Err(ConfigError::OnlyLevelsNotList(json_type(other).to_string())),
    };
    for pattern in patterns {
        let pattern = match pattern {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let regex = Regex::new(&pattern)
            .map_err(|source| ConfigError::InvalidLevelPattern { pattern, source })?;
        if regex.is_match(level) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Included files are relative to the including file unless absolute or
/// remote.
fn resolve_include(including: &str, filename: &str) -> String {
    if is_remote(filename) || Path::new(filename).is_absolute() {
        return filename.to_string();
    }
    match Path::new(including).parent() {
        Some(dir) => dir.join(filename).to_string_lossy().into_owned(),
        None => filename.to_string(),
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_level_included() {
        assert!(level_included(None, "stag").expect("absent"));
        assert!(level_included(Some(&json!([])), "stag").expect("empty"));
        assert!(level_included(Some(&json!(["live", "st"])), "stag").expect("match"));
        assert!(!level_included(Some(&json!(["^live$"])), "stag").expect("no match"));
    }

    #[test]
    fn test_level_patterns_are_unanchored() {
        assert!(level_included(Some(&json!(["ag"])), "stag").expect("substring"));
    }

    #[test]
    fn test_empty_only_levels_means_every_level() {
        for value in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!({})] {
            assert!(level_included(Some(&value), "stag").expect("empty value"), "{value}");
        }
    }

    #[test]
    fn test_only_levels_must_be_a_list() {
        let err = level_included(Some(&json!("live")), "live").expect_err("string");
        assert!(matches!(err, ConfigError::OnlyLevelsNotList(kind) if kind == "string"));
        let err = level_included(Some(&json!(true)), "live").expect_err("boolean");
        assert!(matches!(err, ConfigError::OnlyLevelsNotList(kind) if kind == "boolean"));

        let err = level_included(Some(&json!(["("])), "live").expect_err("bad regex");
        assert!(matches!(err, ConfigError::InvalidLevelPattern { .. }));
    }

    #[test]
    fn test_resolve_include() {
        assert_eq!(resolve_include("suite/main.yaml", "more.txt"), "suite/more.txt");
        assert_eq!(resolve_include("main.yaml", "more.txt"), "more.txt");
        assert_eq!(resolve_include("suite/main.yaml", "/abs/more.txt"), "/abs/more.txt");
        assert_eq!(
            resolve_include("suite/main.yaml", "https://www.example.com/sitemap.xml"),
            "https://www.example.com/sitemap.xml"
        );
    }
}
