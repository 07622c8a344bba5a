//! Enumerated values for select fields (categories, times, languages, platforms).
//!
//! The values live on the site's advanced search form. `SelectListClient`
//! downloads that form once and keeps it until `invalidate` is called.

mod parser;

pub use parser::parse_select_list;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::SiteConfig;
use crate::fetcher::site_root;
use crate::fields::FieldRegistry;
use crate::metrics;

/// Path of the advanced search form, relative to the site root.
pub const ADVANCED_SEARCH_PATH: &str = "torrents/search/advanced/";

/// Values of one select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SelectList {
    /// Display label → wire value, in form order.
    Flat(Vec<(String, String)>),
    /// Group label → wire values, in form order (categories).
    Grouped(Vec<(String, Vec<String>)>),
}

impl SelectList {
    /// Number of entries (groups for a grouped list).
    pub fn len(&self) -> usize {
        match self {
            SelectList::Flat(options) => options.len(),
            SelectList::Grouped(groups) => groups.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `value` is one of the list's wire values.
    pub fn contains_value(&self, value: &str) -> bool {
        match self {
            SelectList::Flat(options) => options.iter().any(|(_, v)| v == value),
            SelectList::Grouped(groups) => groups
                .iter()
                .any(|(_, values)| values.iter().any(|v| v == value)),
        }
    }
}

/// Errors that can occur while reading select lists.
#[derive(Debug, Error)]
pub enum SelectListError {
    /// No select field uses this list.
    #[error("Unknown select list: {0}")]
    UnknownList(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The site answered with an error status.
    #[error("HTTP {status} fetching the advanced search form")]
    Status { status: u16 },

    /// The form has no select for this field.
    #[error("Field not found on the advanced search form: {0}")]
    FieldNotFound(String),

    #[error("Invalid site URL: {0}")]
    InvalidUrl(String),
}

/// Source of select list values.
#[async_trait]
pub trait SelectListSource: Send + Sync {
    /// Values for a list id (`categories`, `times`, `languages`, `platforms`).
    async fn list(&self, list_id: &str) -> Result<SelectList, SelectListError>;
}

/// Reads select lists from the live advanced search form.
pub struct SelectListClient {
    client: Client,
    form_url: Url,
    registry: &'static FieldRegistry,
    document: RwLock<Option<Arc<String>>>,
}

impl SelectListClient {
    /// Create a new client for the configured site.
    pub fn new(config: &SiteConfig) -> Result<Self, SelectListError> {
        let form_url = site_root(&config.base_url)
            .map_err(|e| SelectListError::InvalidUrl(e.to_string()))?
            .join(ADVANCED_SEARCH_PATH)
            .map_err(|e| SelectListError::InvalidUrl(e.to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            form_url,
            registry: FieldRegistry::standard(),
            document: RwLock::new(None),
        })
    }

    /// URL of the advanced search form.
    pub fn form_url(&self) -> &Url {
        &self.form_url
    }

    /// Drop the cached form so the next lookup downloads it again.
    pub async fn invalidate(&self) {
        *self.document.write().await = None;
    }

    /// Seed the cache with an already downloaded form.
    pub async fn prime(&self, html: String) {
        *self.document.write().await = Some(Arc::new(html));
    }

    pub async fn is_cached(&self) -> bool {
        self.document.read().await.is_some()
    }

    async fn document(&self) -> Result<Arc<String>, SelectListError> {
        if let Some(doc) = self.document.read().await.as_ref() {
            return Ok(Arc::clone(doc));
        }

        let mut cached = self.document.write().await;
        if let Some(doc) = cached.as_ref() {
            return Ok(Arc::clone(doc));
        }

        debug!(url = %self.form_url, "Fetching advanced search form");
        metrics::SELECT_LIST_FETCHES.inc();
        let response = self.client.get(self.form_url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(SelectListError::Status {
                status: response.status().as_u16(),
            });
        }

        let doc = Arc::new(response.text().await?);
        *cached = Some(Arc::clone(&doc));
        Ok(doc)
    }
}

#[async_trait]
impl SelectListSource for SelectListClient {
    async fn list(&self, list_id: &str) -> Result<SelectList, SelectListError> {
        let field = self
            .registry
            .select_by_list(list_id)
            .ok_or_else(|| SelectListError::UnknownList(list_id.to_string()))?;

        let document = self.document().await?;
        parse_select_list(&document, field.name)
    }
}
