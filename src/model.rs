use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;

use crate::capture::{CameraPhase, StagedImage};
use crate::diagnosis::{CropHint, DiagnosisRecord, Recommendations};
use crate::history::HistoryState;
use crate::locale::LocaleState;
use crate::{AppError, DEFAULT_API_BASE, RECOMMENDATION_CACHE_SIZE};

/// Opaque bearer token. Redacts debug output; use `secrecy` if stronger
/// guarantees are ever needed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret(String);

impl Secret {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_base: String,
}

impl AppConfig {
    /// Accepts an http(s) base URL; anything else is rejected so a
    /// misconfigured shell cannot point the client at a bogus scheme.
    pub fn set_api_base(&mut self, base: &str) -> Result<(), AppError> {
        let parsed = url::Url::parse(base).map_err(|e| {
            AppError::new(crate::ErrorKind::Validation, format!("invalid API base: {e}"))
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(AppError::new(
                crate::ErrorKind::Validation,
                format!("invalid API base scheme '{}'", parsed.scheme()),
            ));
        }
        if parsed.host_str().is_none() {
            return Err(AppError::new(
                crate::ErrorKind::Validation,
                "API base must have a host",
            ));
        }
        self.api_base = base.trim_end_matches('/').to_string();
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    #[default]
    Detector,
    Results,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Transient user-visible notification, the equivalent of a toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Idle,
    ImageReady,
    Submitting,
    Succeeded,
    Failed,
}

impl SessionPhase {
    #[must_use]
    pub const fn is_submitting(self) -> bool {
        matches!(self, Self::Submitting)
    }

    #[must_use]
    pub const fn can_stage_image(self) -> bool {
        !matches!(self, Self::Submitting)
    }
}

/// The detection session. `generation` advances every time the staged
/// image changes or is cleared, so a response from an earlier submission
/// can be recognized as stale and dropped instead of overwriting a newer
/// session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetectionSession {
    pub phase: SessionPhase,
    pub staged: Option<StagedImage>,
    pub crop_hint: CropHint,
    pub diagnosis: Option<DiagnosisRecord>,
    pub error: Option<AppError>,
    pub generation: u64,
}

impl DetectionSession {
    /// Advances the generation for a new staged image and returns it.
    pub fn next_generation(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    pub fn stage(&mut self, image: StagedImage) {
        self.staged = Some(image);
        self.phase = SessionPhase::ImageReady;
        self.diagnosis = None;
        self.error = None;
    }

    /// Back to `Idle`, discarding the image and anything derived from it.
    pub fn clear(&mut self) {
        self.phase = SessionPhase::Idle;
        self.staged = None;
        self.crop_hint = CropHint::Unspecified;
        self.diagnosis = None;
        self.error = None;
        self.generation = self.generation.wrapping_add(1);
    }

    #[must_use]
    pub const fn has_image(&self) -> bool {
        self.staged.is_some()
    }
}

/// Guidance keyed by (crop, disease, language); repeat lookups for the
/// same diagnosis skip the network.
pub struct RecommendationCache {
    inner: LruCache<(String, String, String), Recommendations>,
}

impl RecommendationCache {
    #[must_use]
    pub fn get(&mut self, crop_type: &str, disease: &str, language: &str) -> Option<Recommendations> {
        self.inner
            .get(&(crop_type.to_string(), disease.to_string(), language.to_string()))
            .cloned()
    }

    pub fn put(
        &mut self,
        crop_type: &str,
        disease: &str,
        language: &str,
        recommendations: Recommendations,
    ) {
        self.inner.put(
            (
                crop_type.to_string(),
                disease.to_string(),
                language.to_string(),
            ),
            recommendations,
        );
    }
}

impl Default for RecommendationCache {
    fn default() -> Self {
        let capacity =
            NonZeroUsize::new(RECOMMENDATION_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: LruCache::new(capacity),
        }
    }
}

#[derive(Default)]
pub struct Model {
    pub config: AppConfig,
    pub locale: LocaleState,
    pub auth_token: Option<Secret>,
    pub screen: Screen,
    pub session: DetectionSession,
    pub camera: CameraPhase,
    pub history: HistoryState,
    pub recommendation_cache: RecommendationCache,
    pub notice: Option<Notice>,
}

impl Model {
    #[must_use]
    pub fn auth_token_str(&self) -> Option<&str> {
        self.auth_token.as_ref().map(Secret::expose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnosis::Recommendations;

    #[test]
    fn secret_debug_is_redacted() {
        let secret = Secret::new("jwt-abc");
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
        assert_eq!(secret.expose(), "jwt-abc");
    }

    #[test]
    fn config_accepts_https_base_and_strips_trailing_slash() {
        let mut config = AppConfig::default();
        config.set_api_base("https://staging.cropdoctor.app/").expect("valid");
        assert_eq!(config.api_base, "https://staging.cropdoctor.app");
    }

    #[test]
    fn config_rejects_non_http_schemes() {
        let mut config = AppConfig::default();
        assert!(config.set_api_base("ftp://files.example.com").is_err());
        assert!(config.set_api_base("not a url").is_err());
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn clearing_a_session_advances_the_generation() {
        let mut session = DetectionSession::default();
        let before = session.generation;
        session.clear();
        assert_ne!(session.generation, before);
        assert_eq!(session.phase, SessionPhase::Idle);
        assert!(session.staged.is_none());
        assert_eq!(session.crop_hint, CropHint::Unspecified);
    }

    #[test]
    fn recommendation_cache_round_trips() {
        let mut cache = RecommendationCache::default();
        assert!(cache.get("maize", "rust", "en").is_none());

        cache.put(
            "maize",
            "rust",
            "en",
            Recommendations {
                symptoms: vec!["Orange pustules".into()],
                ..Recommendations::default()
            },
        );

        let hit = cache.get("maize", "rust", "en").expect("cached");
        assert_eq!(hit.symptoms, vec!["Orange pustules".to_string()]);
        assert!(cache.get("maize", "rust", "yo").is_none());
    }
}
