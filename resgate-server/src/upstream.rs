use axum::http::StatusCode;
use reqwest::{header::ACCEPT, Url};
use resgate::resource::{ResourceDocument, ResourceIdentifier};

use crate::{config::Config, error::GatewayError};

/// Pooled HTTP client for the upstream object service.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl UpstreamClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.upstream_url.clone(),
            token: config.upstream_token.clone(),
        })
    }

    /// `{base}/v1/objects/{id}`, with the identifier as a single path segment.
    pub fn object_url(&self, id: &ResourceIdentifier) -> Url {
        let mut url = self.base_url.clone();
        // Config only accepts base URLs, so the segments are always writable.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v1", "objects", id.as_str()]);
        }
        url
    }

    pub async fn fetch_object(
        &self,
        id: &ResourceIdentifier,
    ) -> Result<ResourceDocument, GatewayError> {
        let url = self.object_url(id);

        let mut request = self.client.get(url.clone()).header(ACCEPT, "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|err| {
            tracing::warn!(%url, error = %err, "upstream request failed");
            GatewayError::UpstreamUnavailable(err)
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(id.clone()));
        }

        let body = response.bytes().await.map_err(|err| {
            tracing::warn!(%url, error = %err, "reading upstream response failed");
            GatewayError::UpstreamUnavailable(err)
        })?;

        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "upstream returned an error");
            return Err(GatewayError::UpstreamStatus {
                status: StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        ResourceDocument::from_slice(&body).map_err(|err| {
            tracing::warn!(%url, error = %err, "upstream body is not a JSON object");
            GatewayError::DownstreamMalformed(err)
        })
    }
}
