//! Loading subscription, template and rule text from URLs or files.

use anyhow::{bail, Context, Result};
use futures::future::try_join_all;
use sg_subscribe::Uri;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Remote(String),
    Local(PathBuf),
}

impl Source {
    /// Validates `url` as an http(s) location.
    pub fn remote(url: &str) -> Result<Self> {
        let uri = Uri::parse(url.trim()).with_context(|| format!("invalid url '{url}'"))?;
        match uri.scheme.as_str() {
            "http" | "https" if !uri.host.is_empty() => Ok(Self::Remote(url.trim().to_string())),
            "http" | "https" => bail!("url '{url}' has no host"),
            other => bail!("unsupported url scheme '{other}' in '{url}'"),
        }
    }

    /// `http(s)://…` is fetched, anything else is read from disk.
    pub fn detect(location: &str) -> Result<Self> {
        match Uri::parse(location.trim()) {
            Ok(uri) if matches!(uri.scheme.as_str(), "http" | "https") => Self::remote(location),
            _ => Ok(Self::Local(PathBuf::from(location))),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Source::Remote(url) => url.clone(),
            Source::Local(path) => path.display().to_string(),
        }
    }
}

pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("subgen/", env!("CARGO_PKG_VERSION")))
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("building http client")
}

/// Loads every source concurrently; results keep the input order.
pub async fn fetch_all(sources: &[Source]) -> Result<Vec<String>> {
    let client = http_client()?;
    let texts = try_join_all(sources.iter().map(|s| load(&client, s))).await?;
    info!(sources = texts.len(), "subscriptions loaded");
    Ok(texts)
}

pub async fn load(client: &reqwest::Client, source: &Source) -> Result<String> {
    let text = match source {
        Source::Remote(url) => {
            debug!(%url, "fetching");
            client
                .get(url)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .with_context(|| format!("fetching {url}"))?
                .text()
                .await
                .with_context(|| format!("reading body of {url}"))?
        }
        Source::Local(path) => {
            debug!(path = %path.display(), "reading");
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?
        }
    };
    debug!(source = %source.describe(), bytes = text.len(), "loaded");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_requires_http() {
        assert!(matches!(
            Source::remote("https://example.com/sub?token=x").unwrap(),
            Source::Remote(_)
        ));
        assert!(Source::remote("ftp://example.com/sub").is_err());
        assert!(Source::remote("example.com/sub").is_err());
    }

    #[test]
    fn detect_falls_back_to_path() {
        assert_eq!(
            Source::detect("./template.yaml").unwrap(),
            Source::Local(PathBuf::from("./template.yaml"))
        );
        assert!(matches!(
            Source::detect("http://example.com/t.yaml").unwrap(),
            Source::Remote(_)
        ));
    }

    #[tokio::test]
    async fn reads_local_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub.txt");
        std::fs::write(&path, "ss://x").unwrap();
        let texts = fetch_all(&[Source::Local(path)]).await.unwrap();
        assert_eq!(texts, vec!["ss://x".to_string()]);
    }
}
