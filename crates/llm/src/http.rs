//! HTTP chunked-text script source.

use crate::{Config, ScriptSource};
use anyhow::Result;
use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::{
    Client,
    header::{self, HeaderMap},
};

/// Streams script text from an HTTP endpoint.
///
/// Posts `{"prompt": …}` and reads the response body as a chunked
/// text-mode stream: no framing, no length prefixes, just script text
/// split at whatever boundaries the transport happens to deliver. An
/// out-of-band `ERROR:` line is the collaborator's convention for
/// upstream failures and passes through here as ordinary text.
#[derive(Clone)]
pub struct HttpSource {
    client: Client,
    endpoint: String,
    headers: HeaderMap,
}

impl HttpSource {
    /// Create a source for `endpoint` with no authentication.
    pub fn new(client: Client, endpoint: impl Into<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "application/json".parse()?);
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            headers,
        })
    }

    /// Create a source with a bearer token.
    pub fn bearer(client: Client, key: &str, endpoint: impl Into<String>) -> Result<Self> {
        let mut source = Self::new(client, endpoint)?;
        source
            .headers
            .insert(header::AUTHORIZATION, format!("Bearer {key}").parse()?);
        Ok(source)
    }

    /// Build a source from a [`Config`].
    pub fn from_config(client: Client, config: &Config) -> Result<Self> {
        match &config.api_key {
            Some(key) => Self::bearer(client, key, &config.endpoint),
            None => Self::new(client, &config.endpoint),
        }
    }

    /// Target endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl ScriptSource for HttpSource {
    fn stream(&self, prompt: &str) -> impl Stream<Item = Result<String>> + Send + 'static {
        let request = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .json(&serde_json::json!({ "prompt": prompt }));

        try_stream! {
            let response = request.send().await?.error_for_status()?;
            tracing::debug!(status = %response.status(), "script stream opened");

            let mut chunks = response.bytes_stream();
            // Transport chunks can split multi-byte characters; carry the
            // undecodable tail into the next chunk.
            let mut pending: Vec<u8> = Vec::new();
            while let Some(chunk) = chunks.next().await {
                let bytes = chunk?;
                pending.extend_from_slice(&bytes);
                let valid = match std::str::from_utf8(&pending) {
                    Ok(_) => pending.len(),
                    Err(e) => e.valid_up_to(),
                };
                if valid == 0 {
                    continue;
                }
                let fragment = String::from_utf8_lossy(&pending[..valid]).into_owned();
                pending.drain(..valid);
                yield fragment;
            }
            if !pending.is_empty() {
                tracing::warn!(bytes = pending.len(), "stream ended inside a multi-byte character");
                yield String::from_utf8_lossy(&pending).into_owned();
            }
            tracing::debug!("script stream closed cleanly");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_content_type() {
        let source = HttpSource::new(Client::new(), "http://example.com/generate").unwrap();
        let ct = source.headers().get("content-type").expect("content-type");
        assert_eq!(ct.to_str().unwrap(), "application/json");
        assert!(source.headers().get("authorization").is_none());
        assert_eq!(source.endpoint(), "http://example.com/generate");
    }

    #[test]
    fn bearer_sets_authorization() {
        let source = HttpSource::bearer(Client::new(), "sk-test", "http://example.com").unwrap();
        let auth = source.headers().get("authorization").expect("authorization");
        assert_eq!(auth.to_str().unwrap(), "Bearer sk-test");
    }

    #[test]
    fn from_config_picks_auth_mode() {
        let plain = HttpSource::from_config(Client::new(), &Config::default()).unwrap();
        assert!(plain.headers().get("authorization").is_none());

        let config = Config {
            api_key: Some("sk-test".into()),
            ..Default::default()
        };
        let authed = HttpSource::from_config(Client::new(), &config).unwrap();
        assert!(authed.headers().get("authorization").is_some());
    }
}
