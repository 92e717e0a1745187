//! Rendered duration of a crossfaded export timeline.
//!
//! Requests arrive as loosely typed JSON maps (`width`, `height`, `sections`,
//! optional `crossfadeMs` and `outputPath`). Validation runs before any
//! arithmetic; a request either resolves to an [`ExportResult`] or fails with
//! exactly one [`ExportError`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Crossfade applied when a request does not name one.
pub const DEFAULT_CROSSFADE_MS: f64 = 350.0;

/// Faults found while reading an otherwise well-formed request.
#[derive(Debug, Error, PartialEq)]
pub enum ComputeFault {
    #[error("field `{field}` is not a number")]
    NotANumber { field: String },
    #[error("section {index} is not an object")]
    MalformedSection { index: usize },
    #[error("`sections` is not an array")]
    SectionsNotArray,
    #[error("`outputPath` is not a string")]
    OutputPathNotString,
    #[error("computed duration {0} is not finite")]
    NonFinite(f64),
}

#[derive(Debug, Error)]
pub enum ExportError {
    /// Required fields missing or `sections` empty. Raised before computing.
    #[error("{0}")]
    InvalidArguments(String),
    /// Unexpected fault while computing; the cause is attached.
    #[error("Export failed: {0}")]
    ExportFailure(#[from] ComputeFault),
}

impl ExportError {
    /// Stable error code reported to callers.
    pub fn code(&self) -> &'static str {
        match self {
            ExportError::InvalidArguments(_) => "E_INVALID_ARGS",
            ExportError::ExportFailure(_) => "E_EXPORT",
        }
    }
}

/// One clip of the timeline. Only its duration matters here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub duration_ms: Option<f64>,
}

impl Section {
    pub fn new(duration_ms: f64) -> Self {
        Self {
            duration_ms: Some(duration_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Required to be present; the value is not used for duration.
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub sections: Vec<Section>,
    pub crossfade_ms: f64,
    pub output_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub output_path: String,
    pub duration_ms: f64,
}

/// Sums section durations and removes one crossfade per adjacent pair.
///
/// Sections without a duration count as zero length. The result is not
/// clamped: a crossfade longer than the clips yields a negative total.
pub fn compute_duration(sections: &[Section], crossfade_ms: f64) -> f64 {
    let total: f64 = sections.iter().filter_map(|s| s.duration_ms).sum();
    if sections.len() > 1 {
        total - crossfade_ms * (sections.len() - 1) as f64
    } else {
        total
    }
}

impl ExportOptions {
    /// Validates and reads a request map.
    ///
    /// # Errors
    /// - `InvalidArguments` if the options are absent, a required key is missing,
    ///   or `sections` is empty
    /// - `ExportFailure` if a present field has the wrong type
    pub fn from_value(options: Option<&Value>) -> Result<Self, ExportError> {
        let map = match options {
            Some(Value::Object(map)) => map,
            _ => return Err(ExportError::InvalidArguments("Missing options".to_string())),
        };

        if !["width", "height", "sections"]
            .iter()
            .all(|key| map.contains_key(*key))
        {
            return Err(ExportError::InvalidArguments(
                "Missing width/height/sections".to_string(),
            ));
        }

        let raw_sections = match map.get("sections") {
            Some(Value::Array(items)) if !items.is_empty() => items,
            Some(Value::Array(_)) | Some(Value::Null) | None => {
                return Err(ExportError::InvalidArguments(
                    "sections must be non-empty".to_string(),
                ))
            }
            Some(_) => return Err(ComputeFault::SectionsNotArray.into()),
        };

        let sections = raw_sections
            .iter()
            .enumerate()
            .map(|(index, item)| read_section(index, item))
            .collect::<Result<Vec<_>, _>>()?;

        let crossfade_ms = match map.get("crossfadeMs") {
            None => DEFAULT_CROSSFADE_MS,
            Some(value) => number(value, "crossfadeMs")?,
        };

        let output_path = match map.get("outputPath") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(path)) => path.clone(),
            Some(_) => return Err(ComputeFault::OutputPathNotString.into()),
        };

        Ok(Self {
            width: map["width"].as_f64(),
            height: map["height"].as_f64(),
            sections,
            crossfade_ms,
            output_path,
        })
    }

    pub fn duration_ms(&self) -> f64 {
        compute_duration(&self.sections, self.crossfade_ms)
    }
}

/// Handles one export duration request end to end.
pub fn export_duration(options: Option<&Value>) -> Result<ExportResult, ExportError> {
    let options = ExportOptions::from_value(options)?;
    let duration_ms = options.duration_ms();
    if !duration_ms.is_finite() {
        return Err(ComputeFault::NonFinite(duration_ms).into());
    }

    tracing::debug!(
        sections = options.sections.len(),
        crossfade_ms = options.crossfade_ms,
        duration_ms,
        "Export duration computed"
    );

    Ok(ExportResult {
        output_path: options.output_path,
        duration_ms,
    })
}

fn read_section(index: usize, item: &Value) -> Result<Section, ComputeFault> {
    match item {
        // A null entry is a clip without a known length.
        Value::Null => Ok(Section::default()),
        Value::Object(fields) => Ok(Section {
            duration_ms: optional_number(fields, "durationMs")?,
        }),
        _ => Err(ComputeFault::MalformedSection { index }),
    }
}

fn optional_number(fields: &Map<String, Value>, key: &str) -> Result<Option<f64>, ComputeFault> {
    fields.get(key).map(|v| number(v, key)).transpose()
}

fn number(value: &Value, field: &str) -> Result<f64, ComputeFault> {
    value.as_f64().ok_or_else(|| ComputeFault::NotANumber {
        field: field.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(value: Value) -> Result<ExportResult, ExportError> {
        export_duration(Some(&value))
    }

    #[test]
    fn single_section_has_no_overlap() {
        let result = run(json!({
            "width": 1920, "height": 1080,
            "sections": [{"durationMs": 1000}],
            "crossfadeMs": 350
        }))
        .unwrap();
        assert_eq!(result.duration_ms, 1000.0);
    }

    #[test]
    fn two_sections_subtract_one_crossfade() {
        let result = run(json!({
            "width": 1920, "height": 1080,
            "sections": [{"durationMs": 1000}, {"durationMs": 2000}],
            "crossfadeMs": 300
        }))
        .unwrap();
        assert_eq!(result.duration_ms, 2700.0);
    }

    #[test]
    fn default_crossfade_applies_when_absent() {
        let result = run(json!({
            "width": 1920, "height": 1080,
            "sections": [{"durationMs": 1000}, {"durationMs": 1000}, {"durationMs": 1000}]
        }))
        .unwrap();
        assert_eq!(result.duration_ms, 2300.0);
    }

    #[test]
    fn explicit_zero_crossfade_is_kept() {
        let result = run(json!({
            "width": 1, "height": 1,
            "sections": [{"durationMs": 1000}, {"durationMs": 1000}],
            "crossfadeMs": 0
        }))
        .unwrap();
        assert_eq!(result.duration_ms, 2000.0);
    }

    #[test]
    fn missing_duration_counts_as_zero() {
        let result = run(json!({
            "width": 1, "height": 1,
            "sections": [{"durationMs": 1000}, {"text": "no duration"}, null],
            "crossfadeMs": 100
        }))
        .unwrap();
        assert_eq!(result.duration_ms, 800.0);
    }

    #[test]
    fn empty_sections_are_rejected() {
        let err = run(json!({
            "width": 1920, "height": 1080, "sections": [], "outputPath": "/tmp/x.mp4"
        }))
        .unwrap_err();
        assert!(matches!(err, ExportError::InvalidArguments(_)));
        assert_eq!(err.code(), "E_INVALID_ARGS");
        assert_eq!(err.to_string(), "sections must be non-empty");
    }

    #[test]
    fn missing_required_keys_are_rejected() {
        for value in [
            json!({"width": 1920, "sections": [{"durationMs": 1}]}),
            json!({"height": 1080, "sections": [{"durationMs": 1}]}),
            json!({"width": 1920, "height": 1080}),
        ] {
            let err = run(value).unwrap_err();
            assert_eq!(err.to_string(), "Missing width/height/sections");
        }
    }

    #[test]
    fn absent_options_are_rejected() {
        let err = export_duration(None).unwrap_err();
        assert!(matches!(err, ExportError::InvalidArguments(ref m) if m == "Missing options"));
        assert!(matches!(
            run(Value::Null).unwrap_err(),
            ExportError::InvalidArguments(_)
        ));
    }

    #[test]
    fn output_path_is_echoed_or_defaults_to_empty() {
        let with_path = run(json!({
            "width": 1, "height": 1,
            "sections": [{"durationMs": 5}],
            "outputPath": "exports/obs2vid-1.mp4"
        }))
        .unwrap();
        assert_eq!(with_path.output_path, "exports/obs2vid-1.mp4");

        let without = run(json!({"width": 1, "height": 1, "sections": [{"durationMs": 5}]})).unwrap();
        assert_eq!(without.output_path, "");
    }

    #[test]
    fn negative_totals_are_not_clamped() {
        let sections = [Section::new(100.0), Section::new(100.0), Section::new(100.0)];
        assert_eq!(compute_duration(&sections, 500.0), -700.0);
    }

    #[test]
    fn wrong_field_types_become_export_failures() {
        let err = run(json!({
            "width": 1, "height": 1,
            "sections": [{"durationMs": "long"}]
        }))
        .unwrap_err();
        assert_eq!(err.code(), "E_EXPORT");
        assert!(matches!(
            err,
            ExportError::ExportFailure(ComputeFault::NotANumber { ref field }) if field == "durationMs"
        ));

        let err = run(json!({"width": 1, "height": 1, "sections": [3]})).unwrap_err();
        assert!(matches!(
            err,
            ExportError::ExportFailure(ComputeFault::MalformedSection { index: 0 })
        ));
    }

    #[test]
    fn width_and_height_only_need_to_be_present() {
        let result = run(json!({
            "width": null, "height": "1080",
            "sections": [{"durationMs": 1000}]
        }))
        .unwrap();
        assert_eq!(result.duration_ms, 1000.0);

        let options = ExportOptions::from_value(Some(&json!({
            "width": 1920, "height": "tall", "sections": [{"durationMs": 1}]
        })))
        .unwrap();
        assert_eq!(options.width, Some(1920.0));
        assert_eq!(options.height, None);
    }

    #[test]
    fn non_array_sections_are_export_failures() {
        let err = run(json!({"width": 1, "height": 1, "sections": "abc"})).unwrap_err();
        assert_eq!(err.code(), "E_EXPORT");
        assert!(matches!(
            err,
            ExportError::ExportFailure(ComputeFault::SectionsNotArray)
        ));

        let err = run(json!({"width": 1, "height": 1, "sections": null})).unwrap_err();
        assert_eq!(err.code(), "E_INVALID_ARGS");
        assert_eq!(err.to_string(), "sections must be non-empty");
    }

    #[test]
    fn result_serializes_with_camel_case_keys() {
        let result = ExportResult {
            output_path: "out.mp4".to_string(),
            duration_ms: 2700.0,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value, json!({"outputPath": "out.mp4", "durationMs": 2700.0}));
    }
}
