use serde::{Deserialize, Serialize};
use std::fmt;

use crate::HEALTHY_DISEASE_ID;

/// Urgency level attached to a diagnosis. Wire values outside the four
/// known levels parse to `Unknown` and render with the neutral style, so a
/// misbehaving classifier can never fail a successful detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
    Unknown,
}

impl Severity {
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "none" => Self::None,
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Unknown => "unknown",
        }
    }

    #[must_use]
    pub const fn style(self) -> SeverityStyle {
        match self {
            Self::Low => SeverityStyle::Low,
            Self::Medium => SeverityStyle::Medium,
            Self::High => SeverityStyle::High,
            Self::None | Self::Unknown => SeverityStyle::None,
        }
    }

    #[must_use]
    pub const fn is_clear(self) -> bool {
        matches!(self, Self::None)
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self::Unknown
    }
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Severity> for String {
    fn from(value: Severity) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four display styles a result card can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityStyle {
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultIcon {
    Healthy,
    Warning,
}

/// Optional crop-type hint attached to a submission. `Unspecified` lets the
/// service auto-detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CropHint {
    #[default]
    Unspecified,
    Maize,
    Cassava,
    Tomato,
}

impl CropHint {
    /// Value for the multipart `crop_type` field; `None` omits the field.
    #[must_use]
    pub const fn field_value(self) -> Option<&'static str> {
        match self {
            Self::Unspecified => None,
            Self::Maize => Some("maize"),
            Self::Cassava => Some("cassava"),
            Self::Tomato => Some("tomato"),
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Unspecified => "Auto-detect",
            Self::Maize => "Maize",
            Self::Cassava => "Cassava",
            Self::Tomato => "Tomato",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CostLevel {
    Low,
    Medium,
    High,
    Unknown,
}

impl CostLevel {
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Unknown => "unknown",
        }
    }
}

impl From<String> for CostLevel {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<CostLevel> for String {
    fn from(value: CostLevel) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Treatment {
    pub method: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cost: Option<CostLevel>,
    #[serde(default)]
    pub steps: Vec<String>,
}

/// Structured guidance for a diagnosis. Every section is optional on the
/// wire; missing sections are simply omitted from display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Recommendations {
    #[serde(default)]
    pub disease_name: Option<String>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub treatments: Vec<Treatment>,
    #[serde(default)]
    pub prevention: Vec<String>,
    #[serde(default)]
    pub urgency: Option<String>,
}

impl Recommendations {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symptoms.is_empty() && self.treatments.is_empty() && self.prevention.is_empty()
    }
}

/// Result of a classification call. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisRecord {
    pub crop_type: String,
    pub disease: String,
    pub confidence: f32,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub recommendations: Option<Recommendations>,
}

impl DiagnosisRecord {
    /// Enforces the confidence invariant: always a finite value in [0, 1].
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if !self.confidence.is_finite() {
            self.confidence = 0.0;
        }
        self.confidence = self.confidence.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.disease == HEALTHY_DISEASE_ID || self.severity.is_clear()
    }

    #[must_use]
    pub fn icon(&self) -> ResultIcon {
        if self.is_healthy() {
            ResultIcon::Healthy
        } else {
            ResultIcon::Warning
        }
    }

    #[must_use]
    pub fn has_recommendations(&self) -> bool {
        self.recommendations
            .as_ref()
            .is_some_and(|r| !r.is_empty())
    }

    #[must_use]
    pub fn confidence_percent(&self) -> String {
        format!("{:.1}%", f64::from(self.confidence.clamp(0.0, 1.0)) * 100.0)
    }

    /// Short text used by the share sheet and the clipboard fallback.
    #[must_use]
    pub fn share_summary(&self) -> String {
        format!("Crop: {} | Disease: {}", self.crop_type, self.disease)
    }

    /// Display name for the disease, preferring the localized name from the
    /// guidance payload over the raw identifier.
    #[must_use]
    pub fn disease_label(&self) -> String {
        self.recommendations
            .as_ref()
            .and_then(|r| r.disease_name.clone())
            .unwrap_or_else(|| self.disease.replace('_', " "))
    }
}

/// A persisted diagnosis, as returned by the history store. Read-only on
/// the client; the only mutation is deletion by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub crop_type: String,
    pub disease: String,
    pub confidence: f32,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub created_at: String,
}
