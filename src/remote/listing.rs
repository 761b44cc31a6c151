// Video listing client
// Fetches pages of videos from the listing endpoint and builds the
// pagination URLs (?after=, ?before=, ?start= or a server-supplied next link)

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{PlayerError, Result};
use crate::player::queue::{OrderingKey, VideoRecord};

// Which page to ask for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    // The first page, optionally starting at (and including) a resume key
    First { start: Option<OrderingKey> },
    // Strictly after the given key (next page)
    After(OrderingKey),
    // Strictly before the given key (previous page, returned nearest-first)
    Before(OrderingKey),
    // A `next` link the server handed us, possibly relative
    Link(String),
}

// One page of the listing response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoPage {
    #[serde(default)]
    pub videos: Vec<VideoRecord>,
    #[serde(default)]
    pub next: Option<String>,
}

#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn fetch_page(&self, request: PageRequest) -> Result<VideoPage>;
}

pub struct HttpVideoSource {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpVideoSource {
    pub fn new(client: reqwest::Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|source| PlayerError::BadUrl {
            url: base_url.to_string(),
            source,
        })?;

        Ok(HttpVideoSource { client, base_url })
    }

    // Build the URL for a page request without sending anything
    pub fn page_url(&self, request: &PageRequest) -> Result<Url> {
        let mut url = self.base_url.clone();

        match request {
            PageRequest::First { start: None } => {}
            PageRequest::First { start: Some(key) } => {
                url.query_pairs_mut().append_pair("start", key.as_str());
            }
            PageRequest::After(key) => {
                url.query_pairs_mut().append_pair("after", key.as_str());
            }
            PageRequest::Before(key) => {
                url.query_pairs_mut().append_pair("before", key.as_str());
            }
            PageRequest::Link(link) => {
                url = self
                    .base_url
                    .join(link)
                    .map_err(|source| PlayerError::BadUrl {
                        url: link.clone(),
                        source,
                    })?;
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl VideoSource for HttpVideoSource {
    async fn fetch_page(&self, request: PageRequest) -> Result<VideoPage> {
        let url = self.page_url(&request)?;
        debug!("Fetching video page: {}", url);

        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(PlayerError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let page: VideoPage = response.json().await?;
        debug!("Got {} videos from {}", page.videos.len(), url);

        Ok(page)
    }
}
