use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw report record as served by the reports API. Every field is optional:
/// the transform must swallow whatever the server sends without failing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawReport {
    #[serde(default)]
    pub seq: Option<i64>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Raw analysis record attached to a report. One report carries one entry
/// per language; display fields come from the English one when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawAnalysis {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub brand_display_name: Option<String>,
    #[serde(default)]
    pub litter_probability: Option<f64>,
    #[serde(default)]
    pub hazard_probability: Option<f64>,
    #[serde(default)]
    pub digital_bug_probability: Option<f64>,
    #[serde(default)]
    pub severity_level: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawReportWrapper {
    #[serde(default)]
    pub report: Option<RawReport>,
    #[serde(default)]
    pub analysis: Option<Vec<RawAnalysis>>,
}

/// Response body of the reports endpoint. Extra fields (count, seq range)
/// are ignored on deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawReportBatch {
    #[serde(default)]
    pub reports: Vec<RawReportWrapper>,
}

/// Dedup key used everywhere a report identity is compared or persisted.
/// Server-assigned `seq` when present, otherwise a synthesized string from
/// the batch position. Serializes as a bare JSON number or string, so the
/// persisted ID arrays stay plain `[1, 2, "report-3"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportId {
    Seq(i64),
    Synthetic(String),
}

impl ReportId {
    /// IDs accepted by the tracker: any seq, or a non-blank string.
    pub fn is_valid(&self) -> bool {
        match self {
            ReportId::Seq(_) => true,
            ReportId::Synthetic(s) => !s.trim().is_empty(),
        }
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportId::Seq(n) => write!(f, "{}", n),
            ReportId::Synthetic(s) => f.write_str(s),
        }
    }
}

/// Canonical report entity dispatched into application state. All display
/// fields are pre-resolved here so consumers never touch the raw analysis
/// selection logic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub id: ReportId,
    pub title: String,
    pub description: String,
    pub timestamp: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub severity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub analysis: Vec<RawAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub litter_probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hazard_probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digital_bug_probability: Option<f64>,
}

/// Shape of the wallet entry other parts of the app persist; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredWallet {
    #[serde(default)]
    pub address: String,
}

/// Shape of the last-known map location entry; read-only here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StoredMapLocation {
    pub latitude: f64,
    pub longitude: f64,
}
