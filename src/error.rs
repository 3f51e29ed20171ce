//! Error types for card generation.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result alias used across the pipeline.
pub type Result<T> = std::result::Result<T, CardError>;

/// What was wrong with a request field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    MissingField,
    InvalidType,
    OutOfRange,
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ValidationKind::MissingField => "missing field",
            ValidationKind::InvalidType => "invalid type",
            ValidationKind::OutOfRange => "out of range",
        };
        f.write_str(text)
    }
}

/// A request field failed validation. Always names the offending field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {kind} ({reason})")]
pub struct ValidationError {
    pub field: String,
    pub kind: ValidationKind,
    pub reason: String,
}

impl ValidationError {
    pub fn missing(field: &str) -> Self {
        Self {
            field: field.to_string(),
            kind: ValidationKind::MissingField,
            reason: "field is required".to_string(),
        }
    }

    pub fn invalid_type(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            kind: ValidationKind::InvalidType,
            reason: reason.into(),
        }
    }

    pub fn out_of_range(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            kind: ValidationKind::OutOfRange,
            reason: reason.into(),
        }
    }
}

/// The computed layout does not fit the canvas.
///
/// Only reachable through a theme/canvas mismatch; the shipped themes are
/// covered by tests.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("layout needs at least one stat row")]
    NoStats,

    #[error("canvas {width}x{height} is too small for the theme margins")]
    CanvasTooSmall { width: u32, height: u32 },

    #[error("stat rows need {needed:.1}px but only {available:.1}px are available")]
    Overflow { needed: f32, available: f32 },
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to allocate a {0}x{1} surface")]
    Surface(u32, u32),

    #[error("failed to parse card scene: {0}")]
    Svg(String),

    #[error("renderer unavailable: {0}")]
    RendererUnavailable(String),
}

#[derive(Error, Debug)]
#[error("failed to encode PNG: {0}")]
pub struct EncodingError(pub String);

/// Every way a card request can fail.
#[derive(Error, Debug)]
pub enum CardError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("layout failed: {0}")]
    Layout(#[from] LayoutError),

    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("render timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl CardError {
    /// True when the caller sent a bad request (HTTP 400 territory).
    pub fn is_client_error(&self) -> bool {
        matches!(self, CardError::Validation(_))
    }

    /// Message safe to hand back to a remote caller.
    ///
    /// Validation errors are reported in full; everything else collapses to an
    /// opaque string so no filesystem or renderer detail leaks out.
    pub fn public_message(&self) -> String {
        match self {
            CardError::Validation(err) => err.to_string(),
            CardError::Timeout(_) => "card generation timed out".to_string(),
            _ => "card generation failed".to_string(),
        }
    }
}
