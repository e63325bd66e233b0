//! Tree configuration.

use serde::{Deserialize, Serialize};

use crate::error::ProxyError;

/// Whether `push` on a sequence consults `beforeChange`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushPolicy {
    /// Append and fire `onChange` only. A subscriber cannot veto a push.
    #[default]
    Ungated,
    /// Route push through the same veto gate as `set`.
    Gated,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub push: PushPolicy,
}

impl TreeConfig {
    /// Parse from JSON, e.g. `{"push": "gated"}`. Missing fields take defaults.
    pub fn from_json_str(input: &str) -> Result<Self, ProxyError> {
        let config: TreeConfig = serde_json::from_str(input)?;
        tracing::debug!(?config, "loaded tree config");
        Ok(config)
    }
}
