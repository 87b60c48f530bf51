//! Parse diagnostics for ENC chart loading.
//!
//! Chart data in the wild is frequently degraded rather than broken, so the
//! parsing pipeline reports defects as ordered, code-keyed warnings instead
//! of failing. This crate provides [`ParseWarning`], [`Severity`], the
//! stable code vocabulary in [`codes`], and the [`WarningCollector`] every
//! pipeline stage routes its defects through.

pub mod codes;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::SystemTime;
use strum_macros::{Display, EnumIter};
use thiserror::Error;

/// Severity of a parse warning.
///
/// Ordering matters: strict mode aborts on anything `>= Warning`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    /// Informational note; never aborts, even in strict mode.
    Info,
    /// The data may produce degraded results.
    Warning,
    /// The data is wrong but parsing could continue.
    Error,
}

/// A single defect observed while parsing.
///
/// Warnings are immutable once emitted. Two warnings are equal when their
/// code, severity, message, record id, and feature id match; the timestamp
/// and context are excluded from equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseWarning {
    /// Stable code from [`codes`].
    pub code: String,
    /// Severity level.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// ISO 8211 record the defect was observed in, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<u32>,
    /// Feature the defect belongs to, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_id: Option<u32>,
    /// Machine-readable context for tooling (e.g. `{"ring": "0"}`).
    /// `BTreeMap` keeps serialized output deterministic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
    /// Emission time.
    pub timestamp: SystemTime,
}

impl ParseWarning {
    /// Create a warning with the given code, severity, and message.
    pub fn new(code: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            severity,
            message: message.into(),
            record_id: None,
            feature_id: None,
            context: None,
            timestamp: SystemTime::now(),
        }
    }

    /// Shorthand for an `Info` warning.
    pub fn info(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Info, message)
    }

    /// Shorthand for a `Warning` warning.
    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Warning, message)
    }

    /// Shorthand for an `Error` warning.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Error, message)
    }

    /// Attach the originating record id.
    pub fn with_record(mut self, record_id: u32) -> Self {
        self.record_id = Some(record_id);
        self
    }

    /// Attach the owning feature id.
    pub fn with_feature(mut self, feature_id: u32) -> Self {
        self.feature_id = Some(feature_id);
        self
    }

    /// Attach one key/value pair of machine-readable context.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}

impl PartialEq for ParseWarning {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
            && self.severity == other.severity
            && self.message == other.message
            && self.record_id == other.record_id
            && self.feature_id == other.feature_id
    }
}

impl Eq for ParseWarning {}

/// A warning of severity >= Warning was emitted while strict mode was on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("strict mode violation: [{}] {}", warning.code, warning.message)]
pub struct StrictModeViolation {
    /// The warning that triggered the abort.
    pub warning: ParseWarning,
}

/// Aggregate report over a collector's contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningSummary {
    pub total_warnings: usize,
    pub has_errors: bool,
    pub strict_mode: bool,
    pub is_threshold_exceeded: bool,
    pub warnings_by_severity: BTreeMap<Severity, usize>,
    pub warnings_by_code: BTreeMap<String, usize>,
}

/// Ordered, severity-tagged defect log.
///
/// All pipeline stages funnel their warnings through one collector so the
/// final list preserves emission order across stages. The collector is
/// thread-confined to a single parse.
#[derive(Debug, Default)]
pub struct WarningCollector {
    warnings: Vec<ParseWarning>,
    strict: bool,
    threshold: Option<usize>,
}

impl WarningCollector {
    /// Create a collector in lenient mode with no threshold.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collector that aborts on the first warning of severity
    /// >= `Warning`.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    /// Set a soft cap. Exceeding it marks the summary but never aborts.
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Whether strict mode is enabled.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Record a warning.
    ///
    /// In strict mode a warning of severity >= `Warning` is returned as a
    /// [`StrictModeViolation`] instead of being collected; `Info` warnings
    /// are always collected.
    pub fn warn(&mut self, warning: ParseWarning) -> Result<(), StrictModeViolation> {
        if self.strict && warning.severity >= Severity::Warning {
            return Err(StrictModeViolation { warning });
        }
        self.warnings.push(warning);
        Ok(())
    }

    /// Record every warning from `iter`, stopping at the first strict-mode
    /// violation. Used to fold stage-local buffers into the main log.
    pub fn extend(
        &mut self,
        iter: impl IntoIterator<Item = ParseWarning>,
    ) -> Result<(), StrictModeViolation> {
        for warning in iter {
            self.warn(warning)?;
        }
        Ok(())
    }

    /// All warnings in emission order.
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// Number of collected warnings.
    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// True when nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Warnings of exactly `severity`, preserving relative order.
    pub fn by_severity(&self, severity: Severity) -> Vec<&ParseWarning> {
        self.warnings
            .iter()
            .filter(|w| w.severity == severity)
            .collect()
    }

    /// Warnings with the given code, preserving relative order.
    pub fn by_code(&self, code: &str) -> Vec<&ParseWarning> {
        self.warnings.iter().filter(|w| w.code == code).collect()
    }

    /// Count of warnings at `severity`.
    pub fn count(&self, severity: Severity) -> usize {
        self.warnings
            .iter()
            .filter(|w| w.severity == severity)
            .count()
    }

    /// True when at least one `Error` severity warning was collected.
    pub fn has_errors(&self) -> bool {
        self.warnings.iter().any(|w| w.severity == Severity::Error)
    }

    /// True once the collected count exceeds the configured threshold.
    pub fn is_threshold_exceeded(&self) -> bool {
        match self.threshold {
            Some(threshold) => self.warnings.len() > threshold,
            None => false,
        }
    }

    /// Drop all collected warnings.
    pub fn clear(&mut self) {
        self.warnings.clear();
    }

    /// Consume the collector, yielding the warnings in emission order.
    pub fn into_warnings(self) -> Vec<ParseWarning> {
        self.warnings
    }

    /// Build the aggregate report.
    pub fn summary(&self) -> WarningSummary {
        let mut warnings_by_severity = BTreeMap::new();
        let mut warnings_by_code = BTreeMap::new();
        for warning in &self.warnings {
            *warnings_by_severity.entry(warning.severity).or_insert(0) += 1;
            *warnings_by_code
                .entry(warning.code.clone())
                .or_insert(0usize) += 1;
        }
        WarningSummary {
            total_warnings: self.warnings.len(),
            has_errors: self.has_errors(),
            strict_mode: self.strict,
            is_threshold_exceeded: self.is_threshold_exceeded(),
            warnings_by_severity,
            warnings_by_code,
        }
    }
}
