//! A small DTD validator.
//!
//! Supports what response-format DTDs use in practice: `ELEMENT`
//! declarations (`EMPTY`, `ANY`, mixed content and children content models
//! with `?`, `*`, `+`, sequences and choices) and `ATTLIST` declarations
//! (`#REQUIRED`, `#IMPLIED`, `#FIXED`, defaults and enumerations).
//! General `ENTITY` and `NOTATION` declarations are skipped.
//!
//! Limits:
//! - Parameter entities are not expanded. A DTD that declares or references
//!   one is rejected, so validation fails instead of passing silently.
//! - Namespaces are ignored. Elements and attributes are matched by local
//!   name, so a DTD declaring prefixed names (`atom:feed`) never matches.
//!
//! Children content models are compiled to a regex over the child element
//! names, each written as `name,`.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use roxmltree::{Document, Node};

#[derive(Debug, Clone)]
enum ContentModel {
    Empty,
    Any,
    /// `#PCDATA`, optionally mixed with the listed elements.
    Mixed(HashSet<String>),
    Children { spec: String, pattern: Regex },
}

#[derive(Debug, Clone, PartialEq)]
enum AttributeDefault {
    Required,
    Implied,
    Fixed(String),
    Value(String),
}

#[derive(Debug, Clone)]
struct AttributeDecl {
    name: String,
    allowed: Option<Vec<String>>,
    default: AttributeDefault,
}

#[derive(Debug, Clone, Default)]
pub struct Dtd {
    elements: HashMap<String, ContentModel>,
    attributes: HashMap<String, Vec<AttributeDecl>>,
}

impl Dtd {
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut dtd = Dtd::default();
        for declaration in declarations(text)? {
            let mut words = declaration.splitn(2, char::is_whitespace);
            let keyword = words.next().unwrap_or_default();
            let rest = words.next().unwrap_or_default().trim();
            if matches!(keyword, "ELEMENT" | "ATTLIST") {
                reject_parameter_entity_reference(rest)?;
            }
            match keyword {
                "ELEMENT" => dtd.add_element(rest)?,
                "ATTLIST" => dtd.add_attlist(rest)?,
                "ENTITY" if rest.starts_with('%') => {
                    return Err(format!(
                        "Parameter entities are not supported: <!ENTITY {rest}>"
                    ))
                }
                "ENTITY" | "NOTATION" => {}
                other => return Err(format!("Unsupported declaration <!{other}")),
            }
        }
        Ok(dtd)
    }

    fn add_element(&mut self, declaration: &str) -> Result<(), String> {
        let (name, spec) = declaration
            .split_once(char::is_whitespace)
            .ok_or_else(|| format!("Malformed element declaration: {declaration}"))?;
        let spec: String = spec.chars().filter(|c| !c.is_whitespace()).collect();
        let model = match spec.as_str() {
            "EMPTY" => ContentModel::Empty,
            "ANY" => ContentModel::Any,
            s if s.starts_with("(#PCDATA") => {
                let names = s
                    .trim_start_matches('(')
                    .trim_end_matches('*')
                    .trim_end_matches(')')
                    .split('|')
                    .filter(|n| *n != "#PCDATA")
                    .map(str::to_string)
                    .collect();
                ContentModel::Mixed(names)
            }
            s if s.starts_with('(') => ContentModel::Children {
                pattern: compile_children(s)?,
                spec: s.to_string(),
            },
            s => return Err(format!("Unsupported content model for {name}: {s}")),
        };
        self.elements.insert(name.to_string(), model);
        Ok(())
    }

    fn add_attlist(&mut self, declaration: &str) -> Result<(), String> {
        let mut tokens = tokenize_attlist(declaration)?.into_iter();
        let element = tokens
            .next()
            .ok_or_else(|| "Malformed attribute list declaration".to_string())?;
        let decls = self.attributes.entry(element.clone()).or_default();
        while let Some(name) = tokens.next() {
            let kind = tokens
                .next()
                .ok_or_else(|| format!("Attribute {name} of {element} has no type"))?;
            let allowed = kind.strip_prefix('(').map(|values| {
                values
                    .trim_end_matches(')')
                    .split('|')
                    .map(|v| v.trim().to_string())
                    .collect()
            });
            let default = match tokens.next().as_deref() {
                Some("#REQUIRED") => AttributeDefault::Required,
                Some("#IMPLIED") => AttributeDefault::Implied,
                Some("#FIXED") => AttributeDefault::Fixed(
                    tokens
                        .next()
                        .ok_or_else(|| format!("Attribute {name} of {element} has no fixed value"))?,
                ),
                Some(value) => AttributeDefault::Value(value.to_string()),
                None => return Err(format!("Attribute {name} of {element} has no default")),
            };
            decls.push(AttributeDecl {
                name,
                allowed,
                default,
            });
        }
        Ok(())
    }

    /// Validates every element of `document`, returning the first problem.
    pub fn validate(&self, document: &Document<'_>) -> Result<(), String> {
        document
            .root_element()
            .descendants()
            .filter(Node::is_element)
            .try_for_each(|element| self.validate_element(element))
    }

    fn validate_element(&self, element: Node<'_, '_>) -> Result<(), String> {
        let name = element.tag_name().name();
        let model = self
            .elements
            .get(name)
            .ok_or_else(|| format!("No declaration for element {name}"))?;

        let children: Vec<&str> = element
            .children()
            .filter(Node::is_element)
            .map(|c| c.tag_name().name())
            .collect();
        let has_text = element
            .children()
            .filter(Node::is_text)
            .any(|t| t.text().is_some_and(|s| !s.trim().is_empty()));

        match model {
            ContentModel::Any => {}
            ContentModel::Empty => {
                if !children.is_empty() || has_text {
                    return Err(format!(
                        "Element {name} was declared EMPTY this one has content"
                    ));
                }
            }
            ContentModel::Mixed(allowed) => {
                if let Some(child) = children.iter().find(|c| !allowed.contains(**c)) {
                    return Err(format!(
                        "Element {child} is not declared in {name} list of possible children"
                    ));
                }
            }
            ContentModel::Children { spec, pattern } => {
                if has_text {
                    return Err(format!("Element {name} has text content, expecting {spec}"));
                }
                let sequence: String = children.iter().map(|c| format!("{c},")).collect();
                if !pattern.is_match(&sequence) {
                    return Err(format!(
                        "Element {name} content does not follow the DTD, expecting {spec}, got ({})",
                        children.join(" ")
                    ));
                }
            }
        }

        self.validate_attributes(name, element)
    }

    fn validate_attributes(&self, name: &str, element: Node<'_, '_>) -> Result<(), String> {
        let decls = self.attributes.get(name).map(Vec::as_slice).unwrap_or_default();
        for attribute in element.attributes() {
            if !decls.iter().any(|d| d.name == attribute.name()) {
                return Err(format!(
                    "No declaration for attribute {} of element {name}",
                    attribute.name()
                ));
            }
        }
        for decl in decls {
            let value = element.attribute(decl.name.as_str());
            match (&decl.default, value) {
                (AttributeDefault::Required, None) => {
                    return Err(format!(
                        "Element {name} does not carry attribute {}",
                        decl.name
                    ))
                }
                (AttributeDefault::Fixed(fixed), Some(v)) if v != fixed => {
                    return Err(format!(
                        "Value for attribute {} of {name} is different from default \"{fixed}\"",
                        decl.name
                    ))
                }
                _ => {}
            }
            if let (Some(allowed), Some(v)) = (&decl.allowed, value) {
                if !allowed.iter().any(|a| a == v) {
                    return Err(format!(
                        "Value \"{v}\" for attribute {} of {name} is not among the enumerated set",
                        decl.name
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Splits DTD text into the bodies of its `<!...>` declarations, skipping
/// comments and processing instructions. `>` inside quotes doesn't end a
/// declaration.
fn declarations(text: &str) -> Result<Vec<String>, String> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        check_between_declarations(&rest[..start])?;
        rest = &rest[start..];
        if let Some(after) = rest.strip_prefix("<!--") {
            let end = after
                .find("-->")
                .ok_or_else(|| "Unterminated comment".to_string())?;
            rest = &after[end + 3..];
        } else if let Some(after) = rest.strip_prefix("<?") {
            let end = after
                .find("?>")
                .ok_or_else(|| "Unterminated processing instruction".to_string())?;
            rest = &after[end + 2..];
        } else if let Some(after) = rest.strip_prefix("<!") {
            let mut quote = None;
            let end = after
                .char_indices()
                .find(|&(_, c)| match (quote, c) {
                    (None, '"' | '\'') => {
                        quote = Some(c);
                        false
                    }
                    (Some(q), c) if c == q => {
                        quote = None;
                        false
                    }
                    (None, '>') => true,
                    _ => false,
                })
                .map(|(i, _)| i)
                .ok_or_else(|| "Unterminated declaration".to_string())?;
            out.push(after[..end].trim().to_string());
            rest = &after[end + 1..];
        } else {
            return Err(format!(
                "Unexpected content in DTD: {}",
                rest.chars().take(20).collect::<String>()
            ));
        }
    }
    check_between_declarations(rest)?;
    Ok(out)
}

/// Only whitespace may sit between declarations. `%name;` there would be
/// a parameter entity reference pulling in more declarations.
fn check_between_declarations(text: &str) -> Result<(), String> {
    let text = text.trim();
    if text.is_empty() {
        Ok(())
    } else if text.starts_with('%') {
        Err(format!("Parameter entities are not supported: {text}"))
    } else {
        Err(format!(
            "Unexpected content in DTD: {}",
            text.chars().take(20).collect::<String>()
        ))
    }
}

fn reject_parameter_entity_reference(declaration: &str) -> Result<(), String> {
    let mut rest = declaration;
    while let Some(percent) = rest.find('%') {
        let after = &rest[percent + 1..];
        let name_len = after
            .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')))
            .unwrap_or(after.len());
        if name_len > 0 && after[name_len..].starts_with(';') {
            return Err(format!(
                "Parameter entities are not supported: %{};",
                &after[..name_len]
            ));
        }
        rest = after;
    }
    Ok(())
}

/// Words of an ATTLIST body; quoted strings lose their quotes and
/// parenthesized enumerations stay one token.
fn tokenize_attlist(text: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '"' || c == '\'' {
            chars.next();
            let value: String = chars.by_ref().take_while(|&x| x != c).collect();
            tokens.push(value);
        } else if c == '(' {
            let mut group = String::new();
            for x in chars.by_ref() {
                if !x.is_whitespace() {
                    group.push(x);
                }
                if x == ')' {
                    break;
                }
            }
            if !group.ends_with(')') {
                return Err(format!("Unterminated enumeration in ATTLIST {text}"));
            }
            tokens.push(group);
        } else {
            let mut word = String::new();
            while let Some(&x) = chars.peek() {
                if x.is_whitespace() {
                    break;
                }
                word.push(x);
                chars.next();
            }
            tokens.push(word);
        }
    }
    Ok(tokens)
}

fn compile_children(spec: &str) -> Result<Regex, String> {
    let mut pattern = String::from("^");
    let mut name = String::new();
    let flush = |name: &mut String, pattern: &mut String| {
        if !name.is_empty() {
            pattern.push_str(&format!("(?:{},)", regex::escape(name)));
            name.clear();
        }
    };
    for c in spec.chars() {
        match c {
            '(' | ')' | '|' | ',' | '?' | '*' | '+' => {
                flush(&mut name, &mut pattern);
                match c {
                    '(' => pattern.push_str("(?:"),
                    ',' => {}
                    other => pattern.push(other),
                }
            }
            c => name.push(c),
        }
    }
    flush(&mut name, &mut pattern);
    pattern.push('$');
    Regex::new(&pattern).map_err(|e| format!("Invalid content model {spec}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTE_DTD: &str = r#"
        <!-- a note -->
        <!ELEMENT note (to+, from, heading?, body)>
        <!ELEMENT to (#PCDATA)>
        <!ELEMENT from (#PCDATA)>
        <!ELEMENT heading (#PCDATA)>
        <!ELEMENT body (#PCDATA | em)*>
        <!ELEMENT em (#PCDATA)>
        <!ATTLIST note
            priority (low|high) "low"
            id CDATA #REQUIRED
            version CDATA #FIXED "1.0">
    "#;

    fn check(xml: &str) -> Result<(), String> {
        let dtd = Dtd::parse(NOTE_DTD).expect("dtd parses");
        let doc = Document::parse(xml).expect("xml parses");
        dtd.validate(&doc)
    }

    #[test]
    fn test_valid_document() {
        check(
            r#"<note id="1" priority="high"><to>A</to><to>B</to><from>C</from>
               <body>Hi <em>there</em></body></note>"#,
        )
        .expect("document is valid");
    }

    #[test]
    fn test_wrong_child_order() {
        let err = check(r#"<note id="1"><from>C</from><to>A</to><body/></note>"#)
            .expect_err("order matters");
        assert!(err.contains("content does not follow the DTD"), "{err}");
    }

    #[test]
    fn test_missing_required_attribute() {
        let err = check("<note><to>A</to><from>C</from><body/></note>").expect_err("id required");
        assert_eq!(err, "Element note does not carry attribute id");
    }

    #[test]
    fn test_enumeration_and_fixed() {
        let err = check(r#"<note id="1" priority="urgent"><to>A</to><from>C</from><body/></note>"#)
            .expect_err("not in enumeration");
        assert!(err.contains("not among the enumerated set"), "{err}");

        let err = check(r#"<note id="1" version="2.0"><to>A</to><from>C</from><body/></note>"#)
            .expect_err("fixed value");
        assert!(err.contains("different from default"), "{err}");
    }

    #[test]
    fn test_undeclared_element_and_attribute() {
        let err = check(r#"<note id="1"><to>A</to><from>C</from><body/><extra/></note>"#)
            .expect_err("extra isn't allowed");
        assert!(err.contains("does not follow"), "{err}");

        let err = check(r#"<note id="1" lang="en"><to>A</to><from>C</from><body/></note>"#)
            .expect_err("lang isn't declared");
        assert_eq!(err, "No declaration for attribute lang of element note");
    }

    #[test]
    fn test_mixed_content_rejects_unlisted_children() {
        let err = check(r#"<note id="1"><to>A</to><from>C</from><body><to>x</to></body></note>"#)
            .expect_err("to isn't allowed in body");
        assert!(err.contains("list of possible children"), "{err}");
    }

    #[test]
    fn test_empty_and_any() {
        let dtd = Dtd::parse("<!ELEMENT r ANY><!ELEMENT br EMPTY>").expect("dtd");
        let ok = Document::parse("<r>text<br/></r>").expect("xml");
        assert!(dtd.validate(&ok).is_ok());
        let bad = Document::parse("<r><br>no</br></r>").expect("xml");
        assert!(dtd.validate(&bad).is_err());
    }

    #[test]
    fn test_quoted_gt_in_default() {
        let dtd = Dtd::parse(r#"<!ELEMENT a EMPTY><!ATTLIST a op CDATA "a>b">"#).expect("dtd");
        let doc = Document::parse(r#"<a op="x"/>"#).expect("xml");
        assert!(dtd.validate(&doc).is_ok());
    }

    #[test]
    fn test_parameter_entities_are_rejected() {
        let declared = r#"<!ENTITY % inline "(#PCDATA)"><!ELEMENT note %inline;>"#;
        let err = Dtd::parse(declared).expect_err("parameter entity declaration");
        assert!(err.contains("Parameter entities are not supported"), "{err}");

        let referenced = "<!ELEMENT note (#PCDATA)>\n%external;\n";
        let err = Dtd::parse(referenced).expect_err("parameter entity reference");
        assert!(err.contains("%external;"), "{err}");

        let in_model = "<!ELEMENT note (%body;)>";
        let err = Dtd::parse(in_model).expect_err("reference in content model");
        assert!(err.contains("%body;"), "{err}");
    }

    #[test]
    fn test_general_entities_and_percent_in_defaults_are_fine() {
        let dtd = Dtd::parse(
            r#"<!ENTITY copy "(c)">
            <!ELEMENT rate EMPTY>
            <!ATTLIST rate value CDATA "100%">"#,
        )
        .expect("dtd parses");
        let doc = Document::parse("<rate/>").expect("xml parses");
        assert!(dtd.validate(&doc).is_ok());
    }

    #[test]
    fn test_unterminated_declaration() {
        assert!(Dtd::parse("<!ELEMENT a EMPTY").is_err());
    }
}
