//! Deployment outputs
//!
//! The JSON document written by backend provisioning: endpoint URLs, resource
//! identifiers and user pool identifiers. Its contents are owned by the
//! provisioning system; this module only reads and checks it.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::auth::AuthEndpoints;
use crate::backend::DataEndpoints;

/// Collection name used when the outputs do not name one
pub const DEFAULT_MODEL: &str = "Expense";

/// Authorization type that matches signed-in user access
pub const USER_POOL_AUTHORIZATION: &str = "AMAZON_COGNITO_USER_POOLS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendOutputs {
    #[serde(default)]
    pub version: Option<String>,
    pub auth: AuthOutputs,
    pub data: DataOutputs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthOutputs {
    #[serde(default)]
    pub aws_region: Option<String>,
    pub user_pool_id: String,
    pub user_pool_client_id: String,
    /// Base URL of the user pool API
    pub endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataOutputs {
    pub url: String,
    /// Live query endpoint; defaults to `url`
    #[serde(default)]
    pub realtime_url: Option<String>,
    #[serde(default)]
    pub aws_region: Option<String>,
    #[serde(default = "default_authorization_type")]
    pub default_authorization_type: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

fn default_authorization_type() -> String {
    USER_POOL_AUTHORIZATION.to_string()
}

/// Problems with the outputs document
#[derive(Debug, Error)]
pub enum OutputsError {
    #[error("Failed to read outputs {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Malformed outputs: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid outputs field {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl BackendOutputs {
    /// Read, parse and validate the outputs document at `path`
    pub fn load(path: &Path) -> Result<Self, OutputsError> {
        let content = std::fs::read_to_string(path).map_err(|e| OutputsError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate an outputs document
    pub fn from_json(content: &str) -> Result<Self, OutputsError> {
        let outputs: BackendOutputs = serde_json::from_str(content)?;
        outputs.validate()?;
        Ok(outputs)
    }

    pub fn validate(&self) -> Result<(), OutputsError> {
        check_url("data.url", &self.data.url)?;
        if let Some(realtime) = &self.data.realtime_url {
            check_url("data.realtime_url", realtime)?;
        }
        check_url("auth.endpoint", &self.auth.endpoint)?;
        check_present("auth.user_pool_id", &self.auth.user_pool_id)?;
        check_present("auth.user_pool_client_id", &self.auth.user_pool_client_id)?;
        if let Some(model) = &self.data.model_name {
            check_present("data.model_name", model)?;
        }
        Ok(())
    }

    /// Collection endpoints for the data client
    pub fn data_endpoints(&self) -> DataEndpoints {
        let url = trim_base(&self.data.url);
        let realtime_url = self
            .data
            .realtime_url
            .as_deref()
            .map(trim_base)
            .unwrap_or_else(|| url.clone());

        DataEndpoints {
            url,
            realtime_url,
            model: self
                .data
                .model_name
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    /// User pool endpoints for the authenticator
    pub fn auth_endpoints(&self) -> AuthEndpoints {
        AuthEndpoints {
            endpoint: trim_base(&self.auth.endpoint),
            user_pool_id: self.auth.user_pool_id.clone(),
            client_id: self.auth.user_pool_client_id.clone(),
        }
    }
}

fn check_url(field: &'static str, value: &str) -> Result<(), OutputsError> {
    let url = Url::parse(value).map_err(|e| OutputsError::Invalid {
        field,
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(OutputsError::Invalid {
            field,
            reason: format!("unsupported scheme {}", scheme),
        }),
    }
}

fn check_present(field: &'static str, value: &str) -> Result<(), OutputsError> {
    if value.trim().is_empty() {
        Err(OutputsError::Invalid {
            field,
            reason: "must not be empty".to_string(),
        })
    } else {
        Ok(())
    }
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) fn sample_json() -> String {
        serde_json::json!({
            "version": "1",
            "auth": {
                "aws_region": "us-east-1",
                "user_pool_id": "us-east-1_pool",
                "user_pool_client_id": "client-abc",
                "endpoint": "https://auth.example.com/"
            },
            "data": {
                "url": "https://api.example.com/graphql/",
                "aws_region": "us-east-1",
                "default_authorization_type": "AMAZON_COGNITO_USER_POOLS"
            }
        })
        .to_string()
    }

    #[test]
    fn test_parse_sample() {
        let outputs = BackendOutputs::from_json(&sample_json()).unwrap();
        assert_eq!(outputs.version.as_deref(), Some("1"));
        assert_eq!(outputs.data.default_authorization_type, USER_POOL_AUTHORIZATION);

        let data = outputs.data_endpoints();
        assert_eq!(data.url, "https://api.example.com/graphql");
        assert_eq!(data.realtime_url, data.url);
        assert_eq!(data.model, "Expense");

        let auth = outputs.auth_endpoints();
        assert_eq!(auth.endpoint, "https://auth.example.com");
        assert_eq!(auth.user_pool_id, "us-east-1_pool");
        assert_eq!(auth.client_id, "client-abc");
    }

    #[test]
    fn test_realtime_and_model_overrides() {
        let mut value: serde_json::Value = serde_json::from_str(&sample_json()).unwrap();
        value["data"]["realtime_url"] = "https://live.example.com".into();
        value["data"]["model_name"] = "Outlay".into();

        let outputs = BackendOutputs::from_json(&value.to_string()).unwrap();
        let data = outputs.data_endpoints();
        assert_eq!(data.realtime_url, "https://live.example.com");
        assert_eq!(data.model, "Outlay");
    }

    #[test]
    fn test_missing_section_is_malformed() {
        let result = BackendOutputs::from_json(r#"{"version": "1", "data": {"url": "https://x"}}"#);
        assert!(matches!(result, Err(OutputsError::Parse(_))));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let mut value: serde_json::Value = serde_json::from_str(&sample_json()).unwrap();
        value["data"]["url"] = "not a url".into();
        match BackendOutputs::from_json(&value.to_string()) {
            Err(OutputsError::Invalid { field, .. }) => assert_eq!(field, "data.url"),
            other => panic!("Expected invalid url, got {:?}", other),
        }

        value["data"]["url"] = "ftp://api.example.com".into();
        assert!(matches!(
            BackendOutputs::from_json(&value.to_string()),
            Err(OutputsError::Invalid { field: "data.url", .. })
        ));
    }

    #[test]
    fn test_empty_pool_id_rejected() {
        let mut value: serde_json::Value = serde_json::from_str(&sample_json()).unwrap();
        value["auth"]["user_pool_id"] = "".into();
        assert!(matches!(
            BackendOutputs::from_json(&value.to_string()),
            Err(OutputsError::Invalid { field: "auth.user_pool_id", .. })
        ));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_json().as_bytes()).unwrap();
        assert!(BackendOutputs::load(file.path()).is_ok());

        let missing = BackendOutputs::load(Path::new("/no/such/outputs.json"));
        assert!(matches!(missing, Err(OutputsError::Io { .. })));
    }
}
