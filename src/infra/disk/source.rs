//! Where rendered page bodies come from.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use url::Url;

use crate::{application::renderer::RenderError, domain::paths::StaticPath};

/// Produces the rendered body for one path.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, path: &StaticPath) -> Result<Bytes, RenderError>;
}

/// Renders paths by requesting them from the live application.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
    origin: Url,
}

impl HttpPageSource {
    pub fn new(origin: Url, timeout: Duration) -> Result<Self, RenderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RenderError::output(format!("failed to build http client: {err}")))?;
        Ok(Self { client, origin })
    }

    /// Resolve `path` under the origin, keeping any base path the origin has.
    ///
    /// The path is appended to the origin's path rather than resolved as a
    /// relative reference, so a first segment such as `Category:Rust` is never
    /// mistaken for a scheme.
    pub fn url_for(&self, path: &StaticPath) -> Url {
        let base = self.origin.path().trim_end_matches('/');
        let relative = path.location().trim_start_matches('/');

        let mut url = self.origin.clone();
        url.set_path(&format!("{base}/{relative}"));
        url.set_query(path.query());
        url.set_fragment(None);
        url
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, path: &StaticPath) -> Result<Bytes, RenderError> {
        let url = self.url_for(path);
        let fetch_error = |err: reqwest::Error| RenderError::Fetch {
            path: path.clone(),
            message: err.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(fetch_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status {
                path: path.clone(),
                status: status.as_u16(),
            });
        }

        response.bytes().await.map_err(fetch_error)
    }
}
