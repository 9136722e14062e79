#![forbid(unsafe_code)]

//! Configuration for the two viewports and the static character budget.
//!
//! Every tunable lives in one [`DiagonalConfig`]. Defaults reproduce the
//! classic look: a 30-row code panel stepping every 350 ms, two columns of
//! indentation per level, and the 80 / 3.15 / 4 character budget.
//!
//! # Loading
//!
//! ```toml
//! seed = 42
//!
//! [code]
//! rows = 24
//! interval_ms = 250
//! cadence = "combined"
//!
//! [writing]
//! drift = 0.5
//! ```
//!
//! ```rust,ignore
//! let config = DiagonalConfig::load("diagonal.toml")?;
//! ```
//!
//! Missing keys keep their per-viewport defaults, so a section only needs
//! the values it changes.

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Deserializer, Serialize};

use diagonal_render::{CharBudget, CodeLayout, ProseLayout};
use web_time::Duration;

use crate::animator::{AnimatorOptions, Cadence};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Configuration for a Diagonal host.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct DiagonalConfig {
    /// Code viewport ("code" container).
    #[cfg_attr(feature = "config", serde(deserialize_with = "code_section"))]
    pub code: ViewportConfig,
    /// Prose viewport ("writing" container).
    #[cfg_attr(feature = "config", serde(deserialize_with = "writing_section"))]
    pub writing: ViewportConfig,
    /// Truncation for static renders.
    pub budget: BudgetConfig,
    /// Seed for document selection; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for DiagonalConfig {
    fn default() -> Self {
        Self {
            code: ViewportConfig::code(),
            writing: ViewportConfig::writing(),
            budget: BudgetConfig::default(),
            seed: None,
        }
    }
}

impl DiagonalConfig {
    /// Parse from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Parse from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse a TOML file and reject invalid values.
    #[cfg(feature = "config")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::from_toml_file(path)?;
        config.check()?;
        Ok(config)
    }

    /// Every problem with the current values, empty when valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        self.code.validate_into("code", &mut errors);
        self.writing.validate_into("writing", &mut errors);

        let budget = &self.budget;
        for (field, value) in [
            ("base", budget.base),
            ("per_row", budget.per_row),
            ("per_indent", budget.per_indent),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!(
                    "budget.{field} must be finite and >= 0, got {value}"
                ));
            }
        }
        errors
    }

    /// [`validate`](Self::validate) as a `Result`.
    pub fn check(&self) -> Result<(), ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ---------------------------------------------------------------------------
// Viewports
// ---------------------------------------------------------------------------

/// One animated viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub struct ViewportConfig {
    /// Window capacity in rows.
    pub rows: usize,
    /// Delay between ticks.
    pub interval_ms: u64,
    pub cadence: Cadence,
    /// Grow from an empty window instead of starting full.
    pub fill: bool,
    pub x_origin: f32,
    /// Code: top offset. Writing: distance of row 0 above the bottom edge.
    pub y_origin: f32,
    /// Columns per indentation level (code only).
    pub col_step: f32,
    pub row_step: f32,
    /// Extra columns per row (writing only).
    pub drift: f32,
}

impl ViewportConfig {
    /// Defaults for the code viewport.
    pub fn code() -> Self {
        Self {
            rows: 30,
            interval_ms: 350,
            cadence: Cadence::Alternating,
            fill: true,
            x_origin: 1.0,
            y_origin: 0.0,
            col_step: 2.0,
            row_step: 1.0,
            drift: 0.0,
        }
    }

    /// Defaults for the writing viewport.
    pub fn writing() -> Self {
        Self {
            rows: 12,
            interval_ms: 450,
            col_step: 0.0,
            ..Self::code()
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Animator shape for this viewport.
    pub fn animator_options(&self) -> AnimatorOptions {
        AnimatorOptions::new(self.rows, self.interval())
            .with_cadence(self.cadence)
            .with_fill(self.fill)
    }

    pub fn code_layout(&self) -> CodeLayout {
        CodeLayout {
            x_origin: self.x_origin,
            y_origin: self.y_origin,
            col_step: self.col_step,
            row_step: self.row_step,
            ..CodeLayout::default()
        }
    }

    /// Bottom-up layout for a container whose last row is `bottom`.
    pub fn prose_layout(&self, bottom: f32) -> ProseLayout {
        ProseLayout {
            x_origin: self.x_origin,
            far_edge: bottom - self.y_origin,
            row_step: self.row_step,
            drift: self.drift,
            ..ProseLayout::default()
        }
    }

    fn validate_into(&self, section: &str, errors: &mut Vec<String>) {
        if self.rows == 0 {
            errors.push(format!("{section}.rows must be > 0"));
        }
        if self.interval_ms == 0 {
            errors.push(format!("{section}.interval_ms must be > 0"));
        }
        if !self.row_step.is_finite() || self.row_step <= 0.0 {
            errors.push(format!(
                "{section}.row_step must be > 0, got {}",
                self.row_step
            ));
        }
        for (field, value) in [("col_step", self.col_step), ("drift", self.drift)] {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("{section}.{field} must be >= 0, got {value}"));
            }
        }
        for (field, value) in [("x_origin", self.x_origin), ("y_origin", self.y_origin)] {
            if !value.is_finite() {
                errors.push(format!("{section}.{field} must be finite"));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Budget
// ---------------------------------------------------------------------------

/// Character budget for static renders.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct BudgetConfig {
    pub base: f32,
    pub per_row: f32,
    pub per_indent: f32,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        let budget = CharBudget::default();
        Self {
            base: budget.base,
            per_row: budget.per_row,
            per_indent: budget.per_indent,
        }
    }
}

impl From<BudgetConfig> for CharBudget {
    fn from(config: BudgetConfig) -> Self {
        Self {
            base: config.base,
            per_row: config.per_row,
            per_indent: config.per_indent,
        }
    }
}

// ---------------------------------------------------------------------------
// Partial viewport sections
// ---------------------------------------------------------------------------

/// A viewport section where every key is optional.
#[cfg(feature = "config")]
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ViewportPatch {
    rows: Option<usize>,
    interval_ms: Option<u64>,
    cadence: Option<Cadence>,
    fill: Option<bool>,
    x_origin: Option<f32>,
    y_origin: Option<f32>,
    col_step: Option<f32>,
    row_step: Option<f32>,
    drift: Option<f32>,
}

#[cfg(feature = "config")]
impl ViewportPatch {
    fn apply(self, base: ViewportConfig) -> ViewportConfig {
        ViewportConfig {
            rows: self.rows.unwrap_or(base.rows),
            interval_ms: self.interval_ms.unwrap_or(base.interval_ms),
            cadence: self.cadence.unwrap_or(base.cadence),
            fill: self.fill.unwrap_or(base.fill),
            x_origin: self.x_origin.unwrap_or(base.x_origin),
            y_origin: self.y_origin.unwrap_or(base.y_origin),
            col_step: self.col_step.unwrap_or(base.col_step),
            row_step: self.row_step.unwrap_or(base.row_step),
            drift: self.drift.unwrap_or(base.drift),
        }
    }
}

#[cfg(feature = "config")]
fn code_section<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ViewportConfig, D::Error> {
    Ok(ViewportPatch::deserialize(deserializer)?.apply(ViewportConfig::code()))
}

#[cfg(feature = "config")]
fn writing_section<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<ViewportConfig, D::Error> {
    Ok(ViewportPatch::deserialize(deserializer)?.apply(ViewportConfig::writing()))
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while loading a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "config")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}
