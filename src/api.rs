use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

use crate::capabilities::{HttpRequest, HttpResponse};
use crate::diagnosis::{CropHint, DiagnosisRecord, HistoryEntry, Recommendations};
use crate::locale::{Locale, LanguageCode};
use crate::model::AppConfig;
use crate::{
    AppError, ErrorKind, DELETE_TIMEOUT_MS, DETECT_TIMEOUT_MS, HISTORY_TIMEOUT_MS,
    RECOMMENDATIONS_TIMEOUT_MS, SAVE_TIMEOUT_MS,
};

/// Response shape of the narrower crop-type classification call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropDetectionResponse {
    pub crop_type: String,
    pub confidence: f32,
    #[serde(default)]
    pub crops: HashMap<String, f32>,
}

/// Body of a history save. The store assigns the id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveHistoryBody {
    pub crop_type: String,
    pub disease: String,
    pub confidence: f32,
    pub severity: String,
    pub language: String,
}

/// Full detection pipeline: crop type, disease, confidence, severity and
/// embedded guidance in one call.
pub fn detect_full(
    config: &AppConfig,
    image: &crate::capture::StagedImage,
    hint: CropHint,
    language: &LanguageCode,
    token: Option<&str>,
) -> Result<HttpRequest, AppError> {
    let url = endpoint(config, "/api/detect/full", &[("language", language.as_str())])?;
    multipart_detect_request(url, image, hint, token, DETECT_TIMEOUT_MS)
}

pub fn detect_crop_type(
    config: &AppConfig,
    image: &crate::capture::StagedImage,
    token: Option<&str>,
) -> Result<HttpRequest, AppError> {
    let url = endpoint(config, "/api/detect/crop-type", &[])?;
    multipart_detect_request(url, image, CropHint::Unspecified, token, DETECT_TIMEOUT_MS)
}

pub fn detect_disease(
    config: &AppConfig,
    image: &crate::capture::StagedImage,
    hint: CropHint,
    language: &LanguageCode,
    token: Option<&str>,
) -> Result<HttpRequest, AppError> {
    let url = endpoint(config, "/api/detect/disease", &[("language", language.as_str())])?;
    multipart_detect_request(url, image, hint, token, DETECT_TIMEOUT_MS)
}

pub fn recommendations(
    config: &AppConfig,
    crop_type: &str,
    disease: &str,
    language: &LanguageCode,
    token: Option<&str>,
) -> Result<HttpRequest, AppError> {
    let path = format!(
        "/api/recommendations/{}/{}",
        encode_segment(crop_type),
        encode_segment(disease)
    );
    let url = endpoint(config, &path, &[("language", language.as_str())])?;

    Ok(HttpRequest::get(url)
        .with_bearer(token)
        .map_err(AppError::from)?
        .with_timeout_ms(RECOMMENDATIONS_TIMEOUT_MS))
}

pub fn list_history(
    config: &AppConfig,
    skip: Option<u32>,
    limit: Option<u32>,
    token: Option<&str>,
) -> Result<HttpRequest, AppError> {
    let mut params: Vec<(&str, String)> = Vec::new();
    if let Some(skip) = skip {
        params.push(("skip", skip.to_string()));
    }
    if let Some(limit) = limit {
        params.push(("limit", limit.to_string()));
    }
    let borrowed: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
    let url = endpoint(config, "/api/history", &borrowed)?;

    Ok(HttpRequest::get(url)
        .with_bearer(token)
        .map_err(AppError::from)?
        .with_timeout_ms(HISTORY_TIMEOUT_MS))
}

pub fn save_history(
    config: &AppConfig,
    record: &DiagnosisRecord,
    language: &LanguageCode,
    token: Option<&str>,
) -> Result<HttpRequest, AppError> {
    let url = endpoint(config, "/api/history", &[])?;

    let body = SaveHistoryBody {
        crop_type: record.crop_type.clone(),
        disease: record.disease.clone(),
        confidence: record.confidence,
        severity: record.severity.as_str().to_string(),
        language: language.as_str().to_string(),
    };
    let body = serde_json::to_vec(&body)
        .map_err(|e| AppError::new(ErrorKind::Internal, e.to_string()))?;

    Ok(HttpRequest::post(url)
        .with_bearer(token)
        .map_err(AppError::from)?
        .with_body("application/json", body)
        .map_err(AppError::from)?
        .with_timeout_ms(SAVE_TIMEOUT_MS))
}

pub fn delete_history(
    config: &AppConfig,
    id: i64,
    token: Option<&str>,
) -> Result<HttpRequest, AppError> {
    let url = endpoint(config, &format!("/api/history/{id}"), &[])?;

    Ok(HttpRequest::delete(url)
        .with_bearer(token)
        .map_err(AppError::from)?
        .with_timeout_ms(DELETE_TIMEOUT_MS))
}

pub fn list_languages(config: &AppConfig, token: Option<&str>) -> Result<HttpRequest, AppError> {
    let url = endpoint(config, "/api/languages", &[])?;

    Ok(HttpRequest::get(url)
        .with_bearer(token)
        .map_err(AppError::from)?
        .with_timeout_ms(RECOMMENDATIONS_TIMEOUT_MS))
}

/// Decodes a successful JSON response, mapping non-2xx statuses to
/// `Service` errors that carry the backend's own message.
pub fn decode_response<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, AppError> {
    if !response.is_success() {
        return Err(AppError::from_http_status(response.status, &response.body));
    }
    serde_json::from_slice(&response.body).map_err(|e| {
        AppError::new(
            ErrorKind::Deserialization,
            format!("invalid response from the service: {e}"),
        )
    })
}

pub fn parse_diagnosis(response: &HttpResponse) -> Result<DiagnosisRecord, AppError> {
    decode_response::<DiagnosisRecord>(response).map(DiagnosisRecord::sanitized)
}

pub fn parse_recommendations(response: &HttpResponse) -> Result<Recommendations, AppError> {
    decode_response(response)
}

pub fn parse_history(response: &HttpResponse) -> Result<Vec<HistoryEntry>, AppError> {
    decode_response(response)
}

pub fn parse_languages(response: &HttpResponse) -> Result<Vec<Locale>, AppError> {
    decode_response(response)
}

fn multipart_detect_request(
    url: String,
    image: &crate::capture::StagedImage,
    hint: CropHint,
    token: Option<&str>,
    timeout_ms: u64,
) -> Result<HttpRequest, AppError> {
    let mut form = MultipartForm::new();
    form.file_field("file", &image.file_name, &image.mime_type, &image.data);
    if let Some(crop_type) = hint.field_value() {
        form.text_field("crop_type", crop_type);
    }
    let (content_type, body) = form.finish();

    Ok(HttpRequest::post(url)
        .with_bearer(token)
        .map_err(AppError::from)?
        .with_body(content_type, body)
        .map_err(AppError::from)?
        .with_timeout_ms(timeout_ms))
}

fn endpoint(config: &AppConfig, path: &str, query: &[(&str, &str)]) -> Result<String, AppError> {
    let base = Url::parse(&config.api_base)
        .map_err(|e| AppError::new(ErrorKind::Internal, format!("invalid API base: {e}")))?;
    let mut url = base
        .join(path)
        .map_err(|e| AppError::new(ErrorKind::Internal, format!("invalid endpoint path: {e}")))?;
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in query {
            pairs.append_pair(name, value);
        }
    }
    Ok(url.to_string())
}

fn encode_segment(segment: &str) -> String {
    // Path segments come from classifier output; escape anything that
    // would change the route shape.
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c.to_string()
            } else {
                let mut escaped = String::new();
                for byte in c.to_string().as_bytes() {
                    escaped.push_str(&format!("%{byte:02X}"));
                }
                escaped
            }
        })
        .collect()
}

/// Hand-rolled multipart/form-data writer; the shell transports the body
/// verbatim.
struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartForm {
    fn new() -> Self {
        Self {
            boundary: format!("cropdoctor-{}", uuid::Uuid::new_v4().simple()),
            body: Vec::new(),
        }
    }

    fn text_field(&mut self, name: &str, value: &str) {
        self.body
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
    }

    fn file_field(&mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) {
        let file_name = sanitize_file_name(file_name);
        self.body
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n"
            )
            .as_bytes(),
        );
        self.body
            .extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
    }

    fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}

fn sanitize_file_name(file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .map(|c| {
            if c == '"' || c == '\r' || c == '\n' || c == '\\' {
                '_'
            } else {
                c
            }
        })
        .collect();
    if cleaned.is_empty() {
        "image.jpg".to_string()
    } else {
        cleaned
    }
}
