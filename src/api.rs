use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::RawReportBatch;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("reports api unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of one reports fetch. `ok: false` covers server-side rejections
/// (non-2xx, undecodable body); transport failures surface as `ApiError`.
#[derive(Debug, Clone, Default)]
pub struct ReportsResult {
    pub ok: bool,
    pub reports: Option<RawReportBatch>,
    pub error: Option<String>,
}

impl ReportsResult {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            reports: None,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait ReportsApi: Send + Sync {
    async fn get_reports_by_latlon(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ReportsResult, ApiError>;
}

/// Reports API client over HTTP.
pub struct HttpReportsApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpReportsApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ReportsApi for HttpReportsApi {
    async fn get_reports_by_latlon(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ReportsResult, ApiError> {
        let url = format!("{}/api/v4/reports/by-latlon", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("latitude", latitude), ("longitude", longitude)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Ok(ReportsResult::failure(format!(
                "reports endpoint returned {}",
                status
            )));
        }

        match response.json::<RawReportBatch>().await {
            Ok(batch) => Ok(ReportsResult {
                ok: true,
                reports: Some(batch),
                error: None,
            }),
            Err(e) => Ok(ReportsResult::failure(format!(
                "undecodable reports body: {}",
                e
            ))),
        }
    }
}
