//! Assertion builders: each turns one part of a check record into
//! assertions.
//!
//! The directive builder runs an explicit ordered list of builders over
//! every record, so the order of a directive's assertions is fixed.

use std::time::Duration;

use crate::config::{RunOptions, DEFAULT_STATUS, OTHER_LEVEL_KEY};
use crate::directive::record::{CheckRecord, StatusSpec, TextMatchKeys};
use crate::error_handling::ConfigError;
use crate::transform::{TransformOptions, UrlTransformer};

use super::{
    Assertion, DtdAssertion, HeaderAssertion, HtmlAssertion, JsonAssertion, JsonSchemaAssertion,
    RedirectAssertion, ResponseTimeAssertion, StatusAssertion, XmlRootAssertion,
};

/// What builders may consult besides the record itself.
pub struct AssertionContext<'a> {
    pub options: &'a RunOptions,
    pub transformer: &'a UrlTransformer,
}

pub type AssertionBuilder =
    fn(&CheckRecord, &AssertionContext<'_>) -> Result<Vec<Assertion>, ConfigError>;

/// The builders in the order their assertions run.
pub fn default_builders() -> Vec<AssertionBuilder> {
    vec![
        status_assertions as AssertionBuilder,
        redirect_assertions,
        html_assertions,
        json_assertions,
        response_time_assertions,
        xml_assertions,
        json_schema_assertions,
        header_assertions,
    ]
}

/// A redirect block already checks the status, so it replaces this one.
fn status_assertions(
    record: &CheckRecord,
    ctx: &AssertionContext<'_>,
) -> Result<Vec<Assertion>, ConfigError> {
    if record.redirect.is_some() {
        return Ok(Vec::new());
    }
    let code = match &record.status {
        None => DEFAULT_STATUS.to_string(),
        Some(StatusSpec::Code(code)) => code.to_string(),
        Some(StatusSpec::PerLevel(codes)) => codes
            .get(&ctx.options.level)
            .or_else(|| codes.get(OTHER_LEVEL_KEY))
            .map_or_else(|| DEFAULT_STATUS.to_string(), |c| c.to_string()),
    };
    Ok(vec![Assertion::Status(StatusAssertion::new(code))])
}

/// Unless `exact`, the expected location is adapted to the target port and
/// level; scheme and cachebusting are left alone.
fn redirect_assertions(
    record: &CheckRecord,
    ctx: &AssertionContext<'_>,
) -> Result<Vec<Assertion>, ConfigError> {
    let Some(redirect) = &record.redirect else {
        return Ok(Vec::new());
    };
    let code = redirect
        .status
        .as_ref()
        .map_or_else(|| DEFAULT_STATUS.to_string(), |c| c.to_string());
    let location = redirect.location.as_ref().map(|location| {
        if redirect.exact {
            location.clone()
        } else {
            let options = TransformOptions {
                port: ctx.options.port,
                level: Some(ctx.options.level.as_str()),
                ..Default::default()
            };
            ctx.transformer.transform(location, &options)
        }
    });
    Ok(vec![Assertion::Redirect(RedirectAssertion::new(
        code,
        location,
        record.follow_redirects,
    ))])
}

/// One assertion per matching key, or a single presence check when an
/// entry has none.
fn html_assertions(
    record: &CheckRecord,
    _ctx: &AssertionContext<'_>,
) -> Result<Vec<Assertion>, ConfigError> {
    let mut assertions = Vec::new();
    for spec in &record.html {
        let rules = spec.rules()?;
        if rules.is_empty() {
            assertions.push(Assertion::Html(HtmlAssertion::new(
                &spec.selector,
                spec.attribute.clone(),
                None,
                spec.when,
            )?));
        }
        for rule in rules {
            assertions.push(Assertion::Html(HtmlAssertion::new(
                &spec.selector,
                spec.attribute.clone(),
                Some(rule),
                spec.when,
            )?));
        }
    }
    Ok(assertions)
}

fn json_assertions(
    record: &CheckRecord,
    _ctx: &AssertionContext<'_>,
) -> Result<Vec<Assertion>, ConfigError> {
    let mut assertions = Vec::new();
    for spec in &record.json {
        for rule in spec.rules()? {
            assertions.push(Assertion::Json(JsonAssertion::new(&spec.selector, rule)));
        }
    }
    Ok(assertions)
}

fn response_time_assertions(
    record: &CheckRecord,
    _ctx: &AssertionContext<'_>,
) -> Result<Vec<Assertion>, ConfigError> {
    let Some(seconds) = record.response_time else {
        return Ok(Vec::new());
    };
    let max = Duration::try_from_secs_f64(seconds)
        .map_err(|_| ConfigError::InvalidResponseTime(seconds))?;
    Ok(vec![Assertion::ResponseTime(ResponseTimeAssertion::new(max))])
}

fn xml_assertions(
    record: &CheckRecord,
    _ctx: &AssertionContext<'_>,
) -> Result<Vec<Assertion>, ConfigError> {
    let Some(xml) = &record.xml else {
        return Ok(Vec::new());
    };
    let mut assertions = Vec::new();
    if let Some(root) = &xml.root {
        assertions.push(Assertion::XmlRoot(XmlRootAssertion::new(root)));
    }
    if let Some(dtd) = &xml.dtd_filename {
        assertions.push(Assertion::Dtd(DtdAssertion::new(dtd)));
    }
    Ok(assertions)
}

fn json_schema_assertions(
    record: &CheckRecord,
    _ctx: &AssertionContext<'_>,
) -> Result<Vec<Assertion>, ConfigError> {
    Ok(record
        .json_schema
        .as_ref()
        .and_then(|spec| spec.schema_filename.as_ref())
        .map(|filename| Assertion::JsonSchema(JsonSchemaAssertion::new(filename)))
        .into_iter()
        .collect())
}

fn header_assertions(
    record: &CheckRecord,
    _ctx: &AssertionContext<'_>,
) -> Result<Vec<Assertion>, ConfigError> {
    let mut assertions = Vec::new();
    for spec in &record.headers {
        for rule in spec.rules()? {
            assertions.push(Assertion::Header(HeaderAssertion::new(&spec.header, rule)));
        }
    }
    Ok(assertions)
}
