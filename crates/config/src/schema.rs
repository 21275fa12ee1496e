//! Config schema types.

use std::{path::PathBuf, time::Duration};

use {
    courier_backends::Profile,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    /// Which backend capability profile to drive.
    pub profile: Profile,
    pub backend: BackendConfig,
    /// JSON file external producers append send requests to.
    pub queue_file: PathBuf,
    /// Directory cache lifetime in seconds.
    pub cache_expire_secs: u64,
    /// Where media downloads land before upload (search/direct profiles).
    pub download_dir: PathBuf,
    /// Watch the queue file and drain on change.
    pub watch: bool,
}

impl Default for CourierConfig {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            backend: BackendConfig::default(),
            queue_file: PathBuf::from("data.json"),
            cache_expire_secs: 24 * 60 * 60,
            download_dir: PathBuf::from("."),
            watch: true,
        }
    }
}

impl CourierConfig {
    #[must_use]
    pub fn cache_expiry(&self) -> Duration {
        Duration::from_secs(self.cache_expire_secs)
    }
}

/// Connection details for the backend sidecar.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    /// Bearer token, if the sidecar requires one.
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<Secret<String>>,
    /// Device/app identifier injected into every call (bulk profile).
    pub app_id: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5700".into(),
            token: None,
            app_id: None,
        }
    }
}

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
