use anyhow::Result;

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub geo_url: String,
    pub storage_dir: String,
    pub poll_interval_ms: u64,
    pub http_timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let get = |k: &str, d: &str| std::env::var(k).unwrap_or_else(|_| d.to_string());

        Ok(Self {
            api_base_url: get("API_BASE_URL", "http://localhost:9084"),
            geo_url: get("GEO_URL", "http://localhost:9099/location"),
            storage_dir: get("STORAGE_DIR", "./report-sync-data"),
            poll_interval_ms: get("POLL_INTERVAL_MS", "30000").parse().unwrap_or(30000),
            http_timeout_ms: get("HTTP_TIMEOUT_MS", "10000").parse().unwrap_or(10000),
        })
    }
}
