//! Implements the `Source` trait over HTTP, for the tables published in the public repository.

use crate::error::Res;
use crate::source::Source;
use anyhow::Context;
use tracing::{debug, trace};
use url::Url;

/// Fetches tables relative to a base URL.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpSource {
    /// `base_url` is the root of the repository. A trailing slash is added when it is missing, so
    /// that joining keeps the last path segment.
    pub fn new(base_url: &str) -> Res<Self> {
        let with_slash = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url =
            Url::parse(&with_slash).with_context(|| format!("Invalid base URL '{base_url}'"))?;
        let client = reqwest::Client::builder()
            .build()
            .context("Unable to create the HTTP client")?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> Res<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Unable to join '{path}' to {}", self.base_url))
    }
}

#[async_trait::async_trait]
impl Source for HttpSource {
    async fn fetch(&self, path: &str) -> Res<String> {
        let url = self.url(path)?;
        debug!("Fetching {url}");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("The server refused {url}"))?;
        let text = response
            .text()
            .await
            .with_context(|| format!("Unable to read the response from {url}"))?;
        trace!("Received {} bytes from {url}", text.len());
        Ok(text)
    }

    fn describe(&self) -> String {
        self.base_url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_join() {
        let source = HttpSource::new("https://example.org/data").unwrap();
        assert_eq!(
            source.url("Analysedata/Iv3/2024_begroting.csv").unwrap().as_str(),
            "https://example.org/data/Analysedata/Iv3/2024_begroting.csv"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(HttpSource::new("not a url").is_err());
    }
}
