//! Block explorer client - verified contract source lookup
//!
//! Etherscan-compatible `module=contract&action=getsourcecode`. Unverified
//! contracts and disabled lookups both yield `None`.

use alloy_primitives::Address;
use eyre::{eyre, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::models::{AppConfig, ChainConfig};

#[derive(Debug, Deserialize)]
struct SourceCodeResponse {
    status: String,
    #[serde(default)]
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SourceCodeEntry {
    #[serde(default)]
    source_code: String,
}

/// Extract source text from a `getsourcecode` response
fn parse_source(response: SourceCodeResponse) -> Option<String> {
    if response.status != "1" {
        return None;
    }
    let entries: Vec<SourceCodeEntry> = serde_json::from_value(response.result).ok()?;
    entries
        .into_iter()
        .map(|e| e.source_code)
        .find(|s| !s.trim().is_empty())
}

/// Explorer API client
pub struct ExplorerClient {
    client: reqwest::Client,
    api_key: Option<String>,
    url_override: Option<String>,
}

impl ExplorerClient {
    pub fn new(config: &AppConfig) -> Self {
        if config.explorer.api_key.is_some() {
            info!("🔎 Explorer source lookups enabled");
        }
        Self {
            client: reqwest::Client::new(),
            api_key: config.explorer.api_key.clone(),
            url_override: config.explorer.api_url.clone(),
        }
    }

    /// Lookups disabled without an API key
    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Verified source for a contract, if the explorer has it
    pub async fn get_source(&self, chain: &ChainConfig, address: Address) -> Result<Option<String>> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(None);
        };
        let Some(base_url) = self.url_override.as_deref().or(chain.explorer_api_url.as_deref()) else {
            return Ok(None);
        };

        debug!("🔎 Fetching verified source for {} on {}", address, chain.key);

        let address = address.to_string();
        let response = self
            .client
            .get(base_url)
            .query(&[
                ("module", "contract"),
                ("action", "getsourcecode"),
                ("address", address.as_str()),
                ("apikey", api_key),
            ])
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| eyre!("Explorer request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(eyre!("Explorer API error: {}", response.status()));
        }

        let data: SourceCodeResponse = response
            .json()
            .await
            .map_err(|e| eyre!("Failed to parse explorer response: {}", e))?;

        Ok(parse_source(data))
    }
}
