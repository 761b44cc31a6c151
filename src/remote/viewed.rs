// "Mark viewed" client
// POSTs the id of a finished video plus the anti-forgery token.
// The response body is ignored; only the status is checked so failures
// can be logged by whoever dispatched the report.

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::error::{PlayerError, Result};
use crate::player::queue::VideoId;

#[async_trait]
pub trait ViewedReporter: Send + Sync {
    async fn mark_viewed(&self, id: &VideoId) -> Result<()>;
}

pub struct HttpViewedReporter {
    client: reqwest::Client,
    url: Url,
    csrf_token: String,
}

impl HttpViewedReporter {
    pub fn new(client: reqwest::Client, url: &str, csrf_token: String) -> Result<Self> {
        let url = Url::parse(url).map_err(|source| PlayerError::BadUrl {
            url: url.to_string(),
            source,
        })?;

        Ok(HttpViewedReporter {
            client,
            url,
            csrf_token,
        })
    }

    // Form fields sent with every report
    fn form<'a>(&'a self, id: &'a VideoId) -> [(&'static str, &'a str); 2] {
        [
            ("id", id.as_str()),
            ("csrfmiddlewaretoken", self.csrf_token.as_str()),
        ]
    }
}

#[async_trait]
impl ViewedReporter for HttpViewedReporter {
    async fn mark_viewed(&self, id: &VideoId) -> Result<()> {
        debug!("Marking video {} as viewed", id);

        let response = self
            .client
            .post(self.url.clone())
            .form(&self.form(id))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PlayerError::Status {
                url: self.url.to_string(),
                status: response.status(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_carries_id_and_token() {
        let reporter = HttpViewedReporter::new(
            reqwest::Client::new(),
            "https://example.com/viewed",
            "a1b2c3".to_string(),
        )
        .unwrap();

        let id = VideoId::new("123");
        assert_eq!(
            reporter.form(&id),
            [("id", "123"), ("csrfmiddlewaretoken", "a1b2c3")]
        );
    }
}
