//! Line-oriented URL lists.
//!
//! ```text
//! # comment
//! #include other.txt
//! http://www.example.com/            expects 200
//! 404 http://www.example.com/gone
//! 30X http://www.example.com/old -> http://www.example.com/new
//! 301_live http://www.example.com/promo   301 on live, 200 elsewhere
//! ```

use crate::config::{DEFAULT_STATUS, LIVE_LEVEL};

const REDIRECT_ARROW: &str = "->";
const LIVE_ONLY_SUFFIX: &str = "_live";

/// One meaningful line of a list file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListLine {
    Include(String),
    Check {
        status: String,
        url: String,
        /// Expected redirect target, untransformed.
        redirect_to: Option<String>,
    },
}

/// Parses one line. Blank and comment-only lines are `Ok(None)`.
///
/// # Errors
///
/// A description of what's wrong with a malformed line.
pub fn parse_list_line(line: &str, level: &str) -> Result<Option<ListLine>, String> {
    let cleaned = line.split('#').next().unwrap_or_default().trim();
    if cleaned.is_empty() {
        return parse_include(line);
    }

    let (status, url, redirect_to) = if cleaned.contains(REDIRECT_ARROW) {
        let tokens: Vec<&str> = cleaned.split_whitespace().collect();
        match tokens[..] {
            [status, url, REDIRECT_ARROW, target] if status.starts_with('3') => {
                (status, url, Some(target.to_string()))
            }
            _ => {
                return Err(format!(
                    "expected \"3XX URL -> TARGET\", got \"{cleaned}\""
                ))
            }
        }
    } else if cleaned.starts_with(|c: char| c.is_ascii_digit()) {
        let tokens: Vec<&str> = cleaned.split_whitespace().collect();
        match tokens[..] {
            [status, url] => (status, url, None),
            _ => return Err(format!("expected \"STATUS URL\", got \"{cleaned}\"")),
        }
    } else {
        (DEFAULT_STATUS, cleaned, None)
    };

    let status = match status.strip_suffix(LIVE_ONLY_SUFFIX) {
        Some(code) if level == LIVE_LEVEL => code,
        Some(_) => DEFAULT_STATUS,
        None => status,
    };

    Ok(Some(ListLine::Check {
        status: status.to_string(),
        url: url.to_string(),
        redirect_to,
    }))
}

fn parse_include(line: &str) -> Result<Option<ListLine>, String> {
    let line = line.trim_start();
    if !line.starts_with("#include") {
        return Ok(None);
    }
    match line.split_whitespace().nth(1) {
        Some(filename) => Ok(Some(ListLine::Include(filename.to_string()))),
        None => Err("#include without a filename".to_string()),
    }
}
