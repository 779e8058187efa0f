use crate::domain::CurrentReading;
use crate::error::FetchError;

use std::future::Future;
use std::time::Duration;

/// something that can produce the current reading, once per call
pub trait ReadingSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<CurrentReading, FetchError>> + Send;
}

/// fetches `GET {base}{endpoint}` from a running station
#[derive(Clone, Debug)]
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    /// `timeout` of `None` keeps the client default (no timeout)
    pub fn new(base_url: &str, endpoint: &str, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self { client, url: join_url(base_url, endpoint) })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ReadingSource for HttpSource {
    async fn fetch(&self) -> Result<CurrentReading, FetchError> {
        let transport = |e: reqwest::Error| FetchError::Transport {
            url: self.url.clone(),
            source: Box::new(e),
        };

        let response = self.client.get(&self.url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: self.url.clone(), status: status.as_u16() });
        }

        let body = response.bytes().await.map_err(transport)?;
        parse_reading(&self.url, &body)
    }
}

/// decode one response body; no partial parsing
pub fn parse_reading(url: &str, body: &[u8]) -> Result<CurrentReading, FetchError> {
    serde_json::from_slice(body).map_err(|source| FetchError::Decode { url: url.to_string(), source })
}

fn join_url(base: &str, endpoint: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), endpoint.trim_start_matches('/'))
}
