//! XML sitemaps and sitemap indexes, local or remote.

use log::info;
use reqwest::StatusCode;

use crate::config::SITEMAP_NAMESPACE;
use crate::error_handling::InputFileError;
use crate::initialization::{init_sitemap_client, TlsPolicy};

/// Whether `filename` names a remote document.
pub fn is_remote(filename: &str) -> bool {
    filename.starts_with("http://") || filename.starts_with("https://")
}

/// Reads the sitemap at `filename` and returns every `loc` it lists.
pub async fn load_sitemap(
    filename: &str,
    user_agent: &str,
    tls: &TlsPolicy,
) -> Result<Vec<String>, InputFileError> {
    let text = if is_remote(filename) {
        fetch_remote(filename, user_agent, tls).await?
    } else {
        tokio::fs::read_to_string(filename)
            .await
            .map_err(|e| InputFileError::new(filename, e))?
    };
    sitemap_locations(filename, &text)
}

async fn fetch_remote(
    url: &str,
    user_agent: &str,
    tls: &TlsPolicy,
) -> Result<String, InputFileError> {
    info!("Fetching sitemap {url}");
    let client = init_sitemap_client(user_agent, tls).map_err(|e| InputFileError::new(url, e))?;
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| InputFileError::new(url, e))?;
    let status = response.status();
    if status != StatusCode::OK {
        return Err(InputFileError::new(
            url,
            format!("URL returned {} response", status.as_u16()),
        ));
    }
    response.text().await.map_err(|e| InputFileError::new(url, e))
}

/// Extracts `urlset/url/loc` or `sitemapindex/sitemap/loc` entries.
///
/// # Errors
///
/// The text isn't XML, or its root isn't a sitemap element.
pub fn sitemap_locations(filename: &str, text: &str) -> Result<Vec<String>, InputFileError> {
    let document = roxmltree::Document::parse(text).map_err(|e| {
        InputFileError::new(filename, format!("Could not parse XML. Error: {e}"))
    })?;
    let root = document.root_element();
    if root.tag_name().namespace() != Some(SITEMAP_NAMESPACE) {
        return Err(InputFileError::new(filename, "XML input must be a sitemap"));
    }
    let entry = match root.tag_name().name() {
        "urlset" => "url",
        "sitemapindex" => "sitemap",
        _ => return Err(InputFileError::new(filename, "XML input must be a sitemap")),
    };

    let is_sitemap_element = |node: &roxmltree::Node<'_, '_>, name: &str| {
        node.is_element()
            && node.tag_name().name() == name
            && node.tag_name().namespace() == Some(SITEMAP_NAMESPACE)
    };
    Ok(root
        .children()
        .filter(|n| is_sitemap_element(n, entry))
        .flat_map(|n| n.children().filter(|c| is_sitemap_element(c, "loc")))
        .filter_map(|loc| loc.text())
        .map(str::trim)
        .filter(|loc| !loc.is_empty())
        .map(str::to_string)
        .collect())
}
