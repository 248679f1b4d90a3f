//! Backend Outputs
//!
//! Loads the deployment outputs document served next to the page and turns
//! it into the endpoints the API client and live query use.

use gloo_net::http::Request;

/// Where the outputs document is served from
pub const OUTPUTS_PATH: &str = "/backend_outputs.json";

const DEFAULT_MODEL: &str = "Expense";

#[derive(Debug, serde::Deserialize)]
struct BackendOutputs {
    auth: AuthOutputs,
    data: DataOutputs,
}

#[derive(Debug, serde::Deserialize)]
struct AuthOutputs {
    user_pool_id: String,
    user_pool_client_id: String,
    endpoint: String,
}

#[derive(Debug, serde::Deserialize)]
struct DataOutputs {
    url: String,
    #[serde(default)]
    realtime_url: Option<String>,
    #[serde(default)]
    model_name: Option<String>,
}

/// Resolved backend endpoints
#[derive(Clone, Debug, PartialEq)]
pub struct Endpoints {
    pub auth_url: String,
    pub user_pool_id: String,
    pub client_id: String,
    pub data_url: String,
    pub realtime_url: String,
    pub model: String,
}

impl Endpoints {
    /// Parse and check an outputs document
    pub fn from_json(content: &str) -> Result<Self, String> {
        let outputs: BackendOutputs =
            serde_json::from_str(content).map_err(|e| format!("Malformed outputs: {}", e))?;

        let endpoints = Self {
            auth_url: trim_base(&outputs.auth.endpoint),
            user_pool_id: outputs.auth.user_pool_id,
            client_id: outputs.auth.user_pool_client_id,
            realtime_url: outputs
                .data
                .realtime_url
                .as_deref()
                .map(trim_base)
                .unwrap_or_else(|| trim_base(&outputs.data.url)),
            data_url: trim_base(&outputs.data.url),
            model: outputs
                .data
                .model_name
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        };

        for (field, value) in [
            ("auth.endpoint", &endpoints.auth_url),
            ("data.url", &endpoints.data_url),
            ("data.realtime_url", &endpoints.realtime_url),
        ] {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(format!("Invalid outputs field {}: not an http(s) URL", field));
            }
        }
        if endpoints.user_pool_id.trim().is_empty() || endpoints.client_id.trim().is_empty() {
            return Err("Invalid outputs: user pool identifiers are required".to_string());
        }

        Ok(endpoints)
    }

    pub fn collection_url(&self) -> String {
        format!("{}/models/{}", self.data_url, self.model)
    }

    pub fn record_url(&self, id: &str) -> String {
        format!("{}/{}", self.collection_url(), urlencoding::encode(id))
    }

    /// Live query URL. `EventSource` cannot set headers, so the token rides
    /// in the query string.
    pub fn observe_url(&self, access_token: &str) -> String {
        format!(
            "{}/models/{}/observe?access_token={}",
            self.realtime_url,
            self.model,
            urlencoding::encode(access_token)
        )
    }
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Fetch the outputs document
pub async fn load() -> Result<Endpoints, String> {
    let response = Request::get(OUTPUTS_PATH)
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        return Err(format!(
            "Failed to load {}: HTTP {}",
            OUTPUTS_PATH,
            response.status()
        ));
    }

    let content = response
        .text()
        .await
        .map_err(|e| format!("Read error: {}", e))?;
    Endpoints::from_json(&content)
}
