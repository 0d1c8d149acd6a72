#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod api;
pub mod app;
pub mod capabilities;
pub mod capture;
pub mod diagnosis;
pub mod event;
pub mod history;
pub mod locale;
pub mod model;

use serde::{Deserialize, Serialize};

pub use app::{App, ViewModel};
pub use capabilities::{Capabilities, Effect};
pub use event::Event;
pub use model::Model;

pub const DEFAULT_API_BASE: &str = "https://api.cropdoctor.app";
pub const HEALTHY_DISEASE_ID: &str = "healthy";

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_IMAGE_DIMENSION: u32 = 4096;
pub const MAX_IMAGE_ALLOC: u64 = 100 * 1024 * 1024;
pub const MAX_PROCESSED_DIMENSION: u32 = 1920;

pub const DETECT_TIMEOUT_MS: u64 = 60_000;
pub const RECOMMENDATIONS_TIMEOUT_MS: u64 = 30_000;
pub const HISTORY_TIMEOUT_MS: u64 = 30_000;
pub const SAVE_TIMEOUT_MS: u64 = 30_000;
pub const DELETE_TIMEOUT_MS: u64 = 30_000;

/// Keeps the success acknowledgment visible before navigating to results.
pub const RESULT_ACK_DELAY_MS: u64 = 1_000;

pub const RECOMMENDATION_CACHE_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Validation,
    Network,
    Timeout,
    Service,
    Device,
    Storage,
    Deserialization,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Service => "SERVICE_ERROR",
            Self::Device => "DEVICE_ERROR",
            Self::Storage => "STORAGE_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::Service | Self::Storage
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub status: Option<u16>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Builds a `Service` error from a non-2xx response, surfacing the
    /// backend's own message verbatim when the body carries one.
    #[must_use]
    pub fn from_http_status(status: u16, body: &[u8]) -> Self {
        let message = ApiErrorBody::parse(body)
            .unwrap_or_else(|| format!("The service returned an error (HTTP {status})"));

        let kind = match status {
            408 => ErrorKind::Timeout,
            _ => ErrorKind::Service,
        };

        Self::new(kind, message).with_status(status)
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Validation | ErrorKind::Service | ErrorKind::Device => self.message.clone(),
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::Storage => "Unable to save your preferences on this device.".into(),
            ErrorKind::Deserialization => {
                "The service sent an unexpected response. Please try again.".into()
            }
            ErrorKind::Internal => "Something went wrong. Please try again.".into(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(status) = self.status {
            write!(f, " (http {status})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

/// Error body shape of the detection backend. `detail` is the usual field;
/// `message` appears on a few gateway responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiErrorBody {
    fn parse(body: &[u8]) -> Option<String> {
        let parsed: Self = serde_json::from_slice(body).ok()?;
        if let Some(detail) = parsed.detail {
            if let Some(text) = detail.as_str() {
                if !text.is_empty() {
                    return Some(text.to_string());
                }
            }
        }
        parsed.message.filter(|m| !m.is_empty())
    }
}
