//! Source configuration.

use serde::{Deserialize, Serialize};

/// Configuration for a script generation source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Endpoint that accepts `{"prompt": …}` and streams back script text.
    pub endpoint: String,

    /// Side length of the square canvas the generated scripts target.
    #[serde(default = "default_canvas_size")]
    pub canvas_size: u16,

    /// Optional bearer token for the endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_canvas_size() -> u16 {
    512
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8787/generate-canvas".into(),
            canvas_size: default_canvas_size(),
            api_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_the_local_dev_server() {
        let config = Config::default();
        assert_eq!(config.endpoint, "http://localhost:8787/generate-canvas");
        assert_eq!(config.canvas_size, 512);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn canvas_size_defaults_when_missing_from_json() {
        let config: Config = serde_json::from_str(r#"{"endpoint": "http://x"}"#).unwrap();
        assert_eq!(config.canvas_size, 512);
    }
}
