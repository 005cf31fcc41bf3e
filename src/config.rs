// In: src/config.rs

//! The single source of truth for all fieldmesh engine configuration.
//!
//! `EngineConfig` is created once at the application boundary (e.g., parsed from a
//! JSON document) and then passed down through the system as a shared, read-only
//! `Arc<EngineConfig>`. Every process in a group must use an identical
//! configuration: the tag namespace in particular is part of the send/receive
//! choreography, and a mismatch between ranks blocks the gather.

use serde::{Deserialize, Serialize};

use crate::error::FieldError;

//==================================================================================
// I. Core Configuration Enums
//==================================================================================

/// Output encoding used when the leader hands its result to persistence.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// **Default:** whitespace-separated real values, one row per line.
    #[default]
    Ascii,

    /// Plain-text (P2) greymap. Values are clamped to `[0, 255]` on write.
    Pgm,
}

//==================================================================================
// II. The Unified EngineConfig
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// First tag of the per-call message-tag namespace. The primary exchange uses
    /// `tag_base..=tag_base + 2`, the mirrored exchange of the vertical flip uses
    /// `tag_base + 3..=tag_base + 5` and result replication between chained
    /// filters uses `tag_base + 6`.
    #[serde(default)]
    pub tag_base: i32,

    /// Element tolerance used when comparing fields.
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,

    /// Encoding of the persisted leader result.
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Optional `log` level filter name ("error", "warn", "info", "debug", "trace").
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tag_base: 0,
            tolerance: default_tolerance(),
            output_format: OutputFormat::default(),
            log_level: None,
        }
    }
}

impl EngineConfig {
    /// Parses a configuration document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, FieldError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, FieldError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects configurations that could never drive a valid exchange.
    pub fn validate(&self) -> Result<(), FieldError> {
        if self.tag_base < 0 || self.tag_base.checked_add(TAG_SPAN).is_none() {
            return Err(FieldError::InternalError(format!(
                "tag_base {} leaves no room for the {}-tag namespace",
                self.tag_base, TAG_SPAN
            )));
        }
        if self.tolerance.is_nan() || self.tolerance < 0.0 {
            return Err(FieldError::InternalError(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }

    /// Resolves `log_level` into a filter, defaulting to `Info`.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(log::LevelFilter::Info)
    }
}

/// Number of consecutive tags reserved per call, starting at `tag_base`.
pub const TAG_SPAN: i32 = 7;

/// Helper for `serde` to provide a default for `tolerance`.
fn default_tolerance() -> f32 {
    1.0e-6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.output_format, OutputFormat::Ascii);
        assert_eq!(config.level_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn test_partial_document_overrides_fields() {
        let json = r#"{ "tag_base": 100, "output_format": "pgm", "log_level": "debug" }"#;
        let config = EngineConfig::from_json_str(json).unwrap();
        assert_eq!(config.tag_base, 100);
        assert_eq!(config.output_format, OutputFormat::Pgm);
        assert_eq!(config.level_filter(), log::LevelFilter::Debug);
        assert!((config.tolerance - 1.0e-6).abs() < f32::EPSILON);
    }

    #[test]
    fn test_negative_tag_base_is_rejected() {
        let result = EngineConfig::from_json_str(r#"{ "tag_base": -1 }"#);
        assert!(matches!(result, Err(FieldError::InternalError(_))));
    }

    #[test]
    fn test_config_survives_json_roundtrip() {
        let config = EngineConfig {
            tag_base: 12,
            tolerance: 0.5,
            output_format: OutputFormat::Pgm,
            log_level: Some("warn".to_string()),
        };
        let json = config.to_json_string().unwrap();
        assert_eq!(EngineConfig::from_json_str(&json).unwrap(), config);
    }
}
