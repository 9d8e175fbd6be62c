use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::Context;
use url::Url;

pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CONFIG_FILE: &str = "desk.toml";

/// Connection settings handed to the order service client at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub service_url: Url,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(service_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            service_url: parse_service_url(service_url)?,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Joins an absolute route such as `/orders/3` onto the base URL, keeping
    /// any path prefix the base URL carries.
    pub fn endpoint(&self, route: &str) -> String {
        let base = self.service_url.as_str().trim_end_matches('/');
        format!("{base}{route}")
    }
}

pub fn parse_service_url(raw: &str) -> anyhow::Result<Url> {
    let raw = raw.trim();
    let url = Url::parse(raw).with_context(|| format!("invalid order service url '{raw}'"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => anyhow::bail!("unsupported order service url scheme '{other}' in '{raw}'"),
    }
}

/// Defaults, then `desk.toml` in the working directory, then environment.
pub fn load_client_config() -> anyhow::Result<ClientConfig> {
    load_client_config_from(Path::new(CONFIG_FILE), |key| std::env::var(key).ok())
}

fn load_client_config_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::new(DEFAULT_SERVICE_URL)?;

    if let Ok(raw) = fs::read_to_string(path) {
        let file_cfg = toml::from_str::<HashMap<String, toml::Value>>(&raw)
            .with_context(|| format!("failed to parse '{}'", path.display()))?;
        if let Some(v) = file_cfg.get("service_url").and_then(toml::Value::as_str) {
            config.service_url = parse_service_url(v)?;
        }
        if let Some(v) = file_cfg
            .get("request_timeout_secs")
            .and_then(toml::Value::as_integer)
        {
            config.request_timeout = timeout_from_secs(v)?;
        }
    }

    if let Some(v) = env("ORDER_SERVICE_URL") {
        config.service_url = parse_service_url(&v)?;
    }
    if let Some(v) = env("APP__SERVICE_URL") {
        config.service_url = parse_service_url(&v)?;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        let secs = v
            .trim()
            .parse::<i64>()
            .with_context(|| format!("invalid APP__REQUEST_TIMEOUT_SECS '{v}'"))?;
        config.request_timeout = timeout_from_secs(secs)?;
    }

    Ok(config)
}

fn timeout_from_secs(secs: i64) -> anyhow::Result<Duration> {
    if secs <= 0 {
        anyhow::bail!("request timeout must be positive, got {secs}");
    }
    Ok(Duration::from_secs(secs as u64))
}
