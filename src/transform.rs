use crate::models::{RawAnalysis, RawReportBatch, RawReportWrapper, Report, ReportId};

const DEFAULT_TITLE: &str = "Untitled report";
const DEFAULT_DESCRIPTION: &str = "No description available";
const DEFAULT_STATUS: &str = "pending";

/// Turns one raw API batch into ordered canonical reports. Total over any
/// input: a missing batch, missing wrappers, or missing nested fields all
/// degrade to defaults, never to an error.
pub fn transform_response(batch: Option<RawReportBatch>) -> Vec<Report> {
    let Some(batch) = batch else {
        return Vec::new();
    };
    batch
        .reports
        .iter()
        .enumerate()
        .map(|(index, wrapper)| transform_wrapper(index, wrapper))
        .collect()
}

fn transform_wrapper(index: usize, wrapper: &RawReportWrapper) -> Report {
    let raw = wrapper.report.clone().unwrap_or_default();
    let analysis = wrapper.analysis.clone().unwrap_or_default();
    let primary = primary_analysis(&analysis).cloned().unwrap_or_default();

    let id = match raw.seq {
        Some(seq) => ReportId::Seq(seq),
        None => ReportId::Synthetic(format!("report-{}", index)),
    };

    Report {
        id,
        title: primary
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        description: primary
            .description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        timestamp: raw.timestamp.unwrap_or_default(),
        // The server does not report a status; every fetched report starts out pending.
        status: DEFAULT_STATUS.to_string(),
        location: format_location(raw.latitude, raw.longitude),
        severity: severity_label(primary.severity_level).to_string(),
        latitude: raw.latitude,
        longitude: raw.longitude,
        image: raw.image,
        classification: primary.classification,
        brand_name: primary.brand_name,
        litter_probability: primary.litter_probability,
        hazard_probability: primary.hazard_probability,
        digital_bug_probability: primary.digital_bug_probability,
        analysis,
    }
}

/// Analysis entry used for display: first English one, else the first.
pub fn primary_analysis(analysis: &[RawAnalysis]) -> Option<&RawAnalysis> {
    analysis
        .iter()
        .find(|a| a.language.as_deref() == Some("en"))
        .or_else(|| analysis.first())
}

/// Maps a 0.0..=1.0 severity level onto the display buckets.
pub fn severity_label(level: Option<f64>) -> &'static str {
    match level {
        None => "-",
        Some(v) if v >= 0.8 => "Critical",
        Some(v) if v >= 0.6 => "High",
        Some(v) if v >= 0.4 => "Medium",
        Some(v) if v >= 0.2 => "Low",
        Some(_) => "Very Low",
    }
}

/// `"lat, lon"` with 4 decimal places, only when both coordinates exist.
pub fn format_location(latitude: Option<f64>, longitude: Option<f64>) -> Option<String> {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => Some(format!("{:.4}, {:.4}", lat, lon)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawReport;

    fn analysis(language: &str, title: &str, severity: f64) -> RawAnalysis {
        RawAnalysis {
            language: Some(language.to_string()),
            title: Some(title.to_string()),
            severity_level: Some(severity),
            ..Default::default()
        }
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(severity_label(Some(0.85)), "Critical");
        assert_eq!(severity_label(Some(0.65)), "High");
        assert_eq!(severity_label(Some(0.45)), "Medium");
        assert_eq!(severity_label(Some(0.25)), "Low");
        assert_eq!(severity_label(Some(0.05)), "Very Low");
        assert_eq!(severity_label(None), "-");
    }

    #[test]
    fn test_severity_boundaries() {
        assert_eq!(severity_label(Some(0.8)), "Critical");
        assert_eq!(severity_label(Some(0.6)), "High");
        assert_eq!(severity_label(Some(0.4)), "Medium");
        assert_eq!(severity_label(Some(0.2)), "Low");
        assert_eq!(severity_label(Some(0.0)), "Very Low");
    }

    #[test]
    fn test_transform_none_and_empty() {
        assert!(transform_response(None).is_empty());
        assert!(transform_response(Some(RawReportBatch::default())).is_empty());
    }

    #[test]
    fn test_transform_never_fails_on_empty_wrapper() {
        let batch = RawReportBatch {
            reports: vec![RawReportWrapper::default()],
        };
        let out = transform_response(Some(batch));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, ReportId::Synthetic("report-0".to_string()));
        assert_eq!(out[0].title, "Untitled report");
        assert_eq!(out[0].description, "No description available");
        assert_eq!(out[0].status, "pending");
        assert_eq!(out[0].severity, "-");
        assert!(out[0].location.is_none());
    }

    #[test]
    fn test_transform_prefers_english_analysis() {
        let batch = RawReportBatch {
            reports: vec![RawReportWrapper {
                report: Some(RawReport {
                    seq: Some(7),
                    ..Default::default()
                }),
                analysis: Some(vec![
                    analysis("me", "Otpad", 0.3),
                    analysis("en", "Litter", 0.3),
                ]),
            }],
        };
        let out = transform_response(Some(batch));
        assert_eq!(out[0].title, "Litter");
        assert_eq!(out[0].analysis.len(), 2);
    }

    #[test]
    fn test_transform_falls_back_to_first_analysis() {
        let batch = RawReportBatch {
            reports: vec![RawReportWrapper {
                report: Some(RawReport {
                    seq: Some(8),
                    ..Default::default()
                }),
                analysis: Some(vec![analysis("de", "Müll", 0.5)]),
            }],
        };
        let out = transform_response(Some(batch));
        assert_eq!(out[0].title, "Müll");
        assert_eq!(out[0].severity, "Medium");
    }

    #[test]
    fn test_transform_full_report() {
        let batch = RawReportBatch {
            reports: vec![RawReportWrapper {
                report: Some(RawReport {
                    seq: Some(1),
                    latitude: Some(40.71),
                    longitude: Some(-74.01),
                    timestamp: Some("2024-01-01T00:00:00Z".to_string()),
                    ..Default::default()
                }),
                analysis: Some(vec![analysis("en", "Litter", 0.9)]),
            }],
        };
        let out = transform_response(Some(batch));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, ReportId::Seq(1));
        assert_eq!(out[0].title, "Litter");
        assert_eq!(out[0].severity, "Critical");
        assert_eq!(out[0].location.as_deref(), Some("40.7100, -74.0100"));
        assert_eq!(out[0].timestamp, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_transform_preserves_order() {
        let batch = RawReportBatch {
            reports: (0..5)
                .map(|seq| RawReportWrapper {
                    report: Some(RawReport {
                        seq: Some(seq),
                        ..Default::default()
                    }),
                    analysis: None,
                })
                .collect(),
        };
        let out = transform_response(Some(batch));
        let ids: Vec<_> = out.iter().map(|r| r.id.clone()).collect();
        assert_eq!(
            ids,
            (0..5).map(ReportId::Seq).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_location_requires_both_coordinates() {
        assert_eq!(format_location(Some(1.0), None), None);
        assert_eq!(format_location(None, Some(1.0)), None);
        assert_eq!(
            format_location(Some(42.4304), Some(19.2594)).as_deref(),
            Some("42.4304, 19.2594")
        );
    }
}
