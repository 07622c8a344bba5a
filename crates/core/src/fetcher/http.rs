//! HTTP page fetcher for the live site.

use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::{redirect, Client, StatusCode, Url};
use std::time::Duration;
use tracing::debug;

use crate::config::SiteConfig;
use crate::metrics;

use super::parser::parse_results_page;
use super::{FetchError, FetchedPage, PageFetcher};

/// Fetches result pages over HTTP and parses them.
///
/// Redirects are not followed by the client; a single redirect is followed
/// by hand so the final location can be reported to the engine.
pub struct HttpPageFetcher {
    client: Client,
    base_url: Url,
}

/// Outcome of a single request.
enum Response {
    Body(String),
    Redirect(Url),
}

impl HttpPageFetcher {
    /// Create a fetcher for the configured site.
    pub fn new(config: &SiteConfig) -> Result<Self, FetchError> {
        let base_url = site_root(&config.base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(config.user_agent.clone())
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| FetchError::Connection(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// Absolute URL for a site path.
    pub fn url_for(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| FetchError::Parse(format!("invalid path {path:?}: {e}")))
    }

    async fn request(&self, url: Url) -> Result<Response, FetchError> {
        debug!(url = %url, "Fetching results page");

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }

        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or(FetchError::Http {
                    status: status.as_u16(),
                })?;
            let target = url
                .join(location)
                .map_err(|e| FetchError::Parse(format!("bad redirect {location:?}: {e}")))?;
            return Ok(Response::Redirect(target));
        }

        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;
        Ok(Response::Body(body))
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_page(&self, path: &str) -> Result<FetchedPage, FetchError> {
        let url = self.url_for(path)?;

        let (body, redirected_to) = match self.request(url).await? {
            Response::Body(body) => (body, None),
            Response::Redirect(target) => {
                debug!(target = %target, "Following redirect");
                match self.request(target.clone()).await? {
                    Response::Body(body) => (body, Some(target.to_string())),
                    Response::Redirect(again) => {
                        return Err(FetchError::TooManyRedirects(again.to_string()))
                    }
                }
            }
        };

        let mut page = parse_results_page(&body);
        page.redirected_to = redirected_to;
        metrics::PAGES_PARSED.inc();
        Ok(page)
    }
}

/// Parse the configured base URL, making sure it ends with a slash so
/// relative paths join under it.
pub(crate) fn site_root(base_url: &str) -> Result<Url, FetchError> {
    let mut root = base_url.to_string();
    if !root.ends_with('/') {
        root.push('/');
    }
    Url::parse(&root).map_err(|e| FetchError::Parse(format!("invalid base URL {base_url:?}: {e}")))
}
