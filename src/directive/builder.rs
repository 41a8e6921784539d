//! Turns check records into runnable directives.

use std::time::Duration;

use crate::assertion::{default_builders, AssertionBuilder, AssertionContext};
use crate::config::{RunOptions, DEFAULT_PLATFORM, OTHER_LEVEL_KEY};
use crate::error_handling::ConfigError;
use crate::fetch::{Credentials, LoginForm};
use crate::platform::PlatformRegistry;
use crate::transform::UrlTransformer;

use super::record::{CheckRecord, UrlEntry};
use super::Directive;

/// Everything needed to build directives for one run.
pub struct DirectiveBuilder<'a> {
    options: &'a RunOptions,
    transformer: &'a UrlTransformer,
    registry: &'a PlatformRegistry,
    default_timeout: Duration,
    builders: Vec<AssertionBuilder>,
}

impl<'a> DirectiveBuilder<'a> {
    pub fn new(
        options: &'a RunOptions,
        transformer: &'a UrlTransformer,
        registry: &'a PlatformRegistry,
        default_timeout: Duration,
    ) -> Self {
        Self {
            options,
            transformer,
            registry,
            default_timeout,
            builders: default_builders(),
        }
    }

    /// Replaces the assertion builders, e.g. to add a custom assertion.
    pub fn with_builders(mut self, builders: Vec<AssertionBuilder>) -> Self {
        self.builders = builders;
        self
    }

    pub fn options(&self) -> &RunOptions {
        self.options
    }

    pub fn transformer(&self) -> &UrlTransformer {
        self.transformer
    }

    pub fn build(&self, record: &CheckRecord) -> Result<Directive, ConfigError> {
        let ctx = AssertionContext {
            options: self.options,
            transformer: self.transformer,
        };
        let mut tests = Vec::new();
        for builder in &self.builders {
            tests.extend(builder(record, &ctx)?);
        }

        let platforms = match &record.platforms {
            Some(names) => self.registry.resolve_all(names)?,
            None => vec![self.registry.resolve(DEFAULT_PLATFORM)?],
        };

        let timeout = match record.timeout {
            Some(secs) => {
                Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidTimeout(secs))?
            }
            None => self.default_timeout,
        };

        Ok(Directive {
            urls: self.urls(record)?,
            tests,
            platforms,
            timeout,
            follow_redirects: record.follow_redirects,
            basic_auth: record.basic_auth_instructions.as_ref().map(|auth| Credentials {
                username: auth.username.clone(),
                password: auth.password.clone(),
            }),
            login: record.auth_cookie_instructions.as_ref().map(|login| LoginForm {
                url: self
                    .transformer
                    .transform(&login.url, &self.options.transform_options()),
                fields: login
                    .data
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_string()))
                    .collect(),
            }),
            failed: false,
        })
    }

    /// `urls` takes precedence over `url`.
    fn urls(&self, record: &CheckRecord) -> Result<Vec<String>, ConfigError> {
        let field = record
            .urls
            .as_ref()
            .or(record.url.as_ref())
            .ok_or(ConfigError::MissingUrl)?;
        field
            .entries()
            .into_iter()
            .map(|entry| self.url(entry))
            .collect()
    }

    /// A URL chosen for this exact level is used verbatim; anything else
    /// goes through the full transform.
    fn url(&self, entry: &UrlEntry) -> Result<String, ConfigError> {
        let transform = |url: &str| {
            self.transformer
                .transform(url, &self.options.transform_options())
        };
        match entry {
            UrlEntry::Plain(url) => Ok(transform(url)),
            UrlEntry::PerLevel(choices) => {
                if let Some(url) = choices.get(&self.options.level) {
                    return Ok(url.clone());
                }
                choices
                    .get(OTHER_LEVEL_KEY)
                    .map(|url| transform(url))
                    .ok_or_else(|| ConfigError::NoUrlForLevel(self.options.level.clone()))
            }
        }
    }
}
