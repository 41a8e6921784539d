//! XML body assertions: root element and DTD validity.

use roxmltree::{Document, ParsingOptions};

use crate::fetch::Response;

use super::dtd::Dtd;
use super::TestResult;

fn parse_xml(body: &str) -> Result<Document<'_>, roxmltree::Error> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(body, options)
}

/// Root tag in `{namespace}name` form, or the bare name without a namespace.
fn qualified_root(document: &Document<'_>) -> String {
    let tag = document.root_element().tag_name();
    match tag.namespace() {
        Some(ns) => format!("{{{ns}}}{}", tag.name()),
        None => tag.name().to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct XmlRootAssertion {
    pub root: String,
}

impl XmlRootAssertion {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    pub fn description(&self) -> String {
        format!("XML root is {}", self.root)
    }

    pub fn evaluate(&self, response: &Response) -> TestResult {
        match parse_xml(&response.body) {
            Ok(document) => {
                let root = qualified_root(&document);
                TestResult {
                    passed: root == self.root,
                    description: format!("XML root was {root}"),
                }
            }
            Err(e) => TestResult::failed(format!("Response body was not valid XML: {e}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DtdAssertion {
    pub dtd_filename: String,
}

impl DtdAssertion {
    pub fn new(dtd_filename: impl Into<String>) -> Self {
        Self {
            dtd_filename: dtd_filename.into(),
        }
    }

    pub fn description(&self) -> String {
        format!("Response body obeys {}", self.dtd_filename)
    }

    fn check(&self, body: &str) -> Result<(), String> {
        let text = std::fs::read_to_string(&self.dtd_filename)
            .map_err(|e| format!("could not read DTD: {e}"))?;
        let dtd = Dtd::parse(&text)?;
        let document = parse_xml(body).map_err(|e| e.to_string())?;
        dtd.validate(&document)
    }

    pub fn evaluate(&self, response: &Response) -> TestResult {
        match self.check(&response.body) {
            Ok(()) => TestResult::passed(format!("Response body obeyed {}", self.dtd_filename)),
            Err(e) => TestResult::failed(format!(
                "Response body did not obey {}: {}",
                self.dtd_filename, e
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn xml_response(body: &str) -> Response {
        Response::new(200, "http://www.example.com/feed.xml").with_body(body)
    }

    #[test]
    fn test_root_without_namespace() {
        let assertion = XmlRootAssertion::new("rss");
        assert_eq!(assertion.description(), "XML root is rss");
        let result = assertion.evaluate(&xml_response("<?xml version=\"1.0\"?><rss><channel/></rss>"));
        assert!(result.passed);
        assert_eq!(result.description, "XML root was rss");
    }

    #[test]
    fn test_root_with_namespace() {
        let body = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"></urlset>"#;
        let assertion =
            XmlRootAssertion::new("{http://www.sitemaps.org/schemas/sitemap/0.9}urlset");
        assert!(assertion.evaluate(&xml_response(body)).passed);
        assert!(!XmlRootAssertion::new("urlset")
            .evaluate(&xml_response(body))
            .passed);
    }

    #[test]
    fn test_root_on_invalid_xml() {
        let result = XmlRootAssertion::new("rss").evaluate(&xml_response("<rss>"));
        assert!(!result.passed);
        assert!(result.description.starts_with("Response body was not valid XML"));
    }

    #[test]
    fn test_dtd_validation() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "<!ELEMENT items (item*)><!ELEMENT item (#PCDATA)>").expect("write");
        let filename = file.path().display().to_string();
        let assertion = DtdAssertion::new(filename.clone());

        let result = assertion.evaluate(&xml_response("<items><item>a</item></items>"));
        assert!(result.passed, "{}", result.description);
        assert_eq!(result.description, format!("Response body obeyed {filename}"));

        let result = assertion.evaluate(&xml_response("<items><other/></items>"));
        assert!(!result.passed);
        assert!(result
            .description
            .starts_with(&format!("Response body did not obey {filename}: ")));

        let result = assertion.evaluate(&xml_response("not xml"));
        assert!(!result.passed);
    }

    #[test]
    fn test_dtd_with_doctype_in_body() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "<!ELEMENT page EMPTY>").expect("write");
        let assertion = DtdAssertion::new(file.path().display().to_string());
        let body = "<?xml version=\"1.0\"?>\n<!DOCTYPE page SYSTEM \"page.dtd\">\n<page/>";
        assert!(assertion.evaluate(&xml_response(body)).passed);
    }
}
