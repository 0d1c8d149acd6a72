use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api;
use crate::capabilities::{
    Capabilities, CameraOutput, ShareOutput, AUTH_TOKEN_KEY, LANGUAGE_KEY,
};
use crate::capture::{self, CameraPhase};
use crate::diagnosis::{
    CropHint, DiagnosisRecord, ResultIcon, Severity, SeverityStyle, Treatment,
};
use crate::event::Event;
use crate::history::{HistoryFilter, HistoryState, HistoryStatus};
use crate::locale::{available_locales, LanguageCode, Locale};
use crate::model::{Model, Notice, Screen, Secret, SessionPhase};
use crate::{AppError, RESULT_ACK_DELAY_MS};

pub const SHARE_TITLE: &str = "CropDoctor detection result";

#[derive(Default)]
pub struct App;

impl App {
    fn stage_bytes(model: &mut Model, file_name: &str, data: &[u8]) {
        if !model.session.phase.can_stage_image() {
            debug!("image ignored while a submission is in flight");
            return;
        }
        let generation = model.session.next_generation();
        match capture::stage_image(file_name, data, generation) {
            Ok(image) => model.session.stage(image),
            Err(error) => {
                let error: AppError = error.into();
                model.notice = Some(Notice::error(error.user_facing_message()));
            }
        }
    }

    /// Hands the device stream back to the shell. Callers must only invoke
    /// this while the stream is actually held, so each acquisition gets
    /// exactly one release.
    fn release_camera(model: &mut Model, caps: &Capabilities) {
        caps.camera
            .release(|result| Event::CameraReleased(Box::new(result)));
        model.camera = CameraPhase::Closed;
    }

    /// Dismisses the live-camera view, releasing the stream if held.
    fn dismiss_camera(model: &mut Model, caps: &Capabilities) {
        match model.camera {
            CameraPhase::Streaming => Self::release_camera(model, caps),
            // Not acquired yet; the open acknowledgment will be released
            // when it lands in the closed state.
            CameraPhase::Opening => model.camera = CameraPhase::Closed,
            CameraPhase::Closed => {}
        }
    }

    fn apply_detection_failure(model: &mut Model, error: AppError) {
        model.notice = Some(Notice::error(error.user_facing_message()));
        model.session.phase = SessionPhase::Failed;
        model.session.error = Some(error);
    }

    fn apply_detection_success(
        model: &mut Model,
        caps: &Capabilities,
        record: DiagnosisRecord,
        generation: u64,
    ) {
        model.session.phase = SessionPhase::Succeeded;
        model.session.error = None;
        model.session.diagnosis = Some(record);
        model.notice = Some(Notice::success("Detection complete"));
        Self::ensure_recommendations(model, caps);
        caps.delay.start(RESULT_ACK_DELAY_MS, move |_| Event::ResultAckElapsed {
            generation,
        });
    }

    /// Fetches guidance when the detection result did not embed any,
    /// consulting the cache first.
    fn ensure_recommendations(model: &mut Model, caps: &Capabilities) {
        let Some(record) = model.session.diagnosis.as_ref() else {
            return;
        };
        if record.has_recommendations() {
            return;
        }
        let crop_type = record.crop_type.clone();
        let disease = record.disease.clone();
        let language = model.locale.current.clone();

        if let Some(cached) =
            model
                .recommendation_cache
                .get(&crop_type, &disease, language.as_str())
        {
            if let Some(record) = model.session.diagnosis.as_mut() {
                record.recommendations = Some(cached);
            }
            return;
        }

        match api::recommendations(
            &model.config,
            &crop_type,
            &disease,
            &language,
            model.auth_token_str(),
        ) {
            Ok(request) => {
                caps.http.send(request, move |result| Event::RecommendationsFetched {
                    crop_type,
                    disease,
                    result: Box::new(result),
                });
            }
            Err(error) => warn!("could not build recommendations request: {error}"),
        }
    }

    fn start_history_load(model: &mut Model, caps: &Capabilities) {
        match api::list_history(&model.config, None, None, model.auth_token_str()) {
            Ok(request) => {
                model.history.begin_loading();
                caps.http
                    .send(request, |result| Event::HistoryLoaded(Box::new(result)));
            }
            Err(error) => {
                model.notice = Some(Notice::error(error.user_facing_message()));
                model.history.failed(error);
            }
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        match event {
            // --- Boot ---
            Event::AppStarted => {
                caps.kv.get(LANGUAGE_KEY, |result| {
                    Event::PersistedLanguageLoaded(Box::new(result))
                });
                caps.kv.get(AUTH_TOKEN_KEY, |result| {
                    Event::PersistedTokenLoaded(Box::new(result))
                });
            }

            Event::Configured { api_base } => {
                if let Err(error) = model.config.set_api_base(&api_base) {
                    warn!("ignoring invalid API base: {error}");
                }
            }

            Event::PersistedLanguageLoaded(result) => match *result {
                Ok(output) => {
                    let stored = output.into_string();
                    model.locale.current = LanguageCode::from_persisted(stored.as_deref());
                }
                Err(error) => warn!("could not read persisted language: {error}"),
            },

            Event::PersistedTokenLoaded(result) => match *result {
                Ok(output) => {
                    if let Some(token) = output.into_string() {
                        model.auth_token = Some(Secret::new(token));
                    }
                }
                Err(error) => warn!("could not read persisted token: {error}"),
            },

            // --- Locale ---
            Event::ChangeLanguage { code } => {
                model.locale.change(LanguageCode::new(code.clone()));
                caps.kv.set(LANGUAGE_KEY, code.into_bytes(), |result| {
                    Event::LanguagePersisted(Box::new(result))
                });
            }

            Event::LanguagePersisted(result) => {
                if let Err(error) = *result {
                    warn!("could not persist language: {error}");
                }
            }

            // --- Image acquisition: file path ---
            Event::ImageSelected { file_name, data } => {
                if model.session.phase.can_stage_image() {
                    // A file selection dismisses the live-camera view.
                    Self::dismiss_camera(model, caps);
                    Self::stage_bytes(model, &file_name, &data);
                } else {
                    debug!("file selection ignored while submitting");
                }
            }

            Event::ClearImage => {
                model.session.clear();
            }

            // --- Image acquisition: camera path ---
            Event::OpenCamera => {
                if model.camera.is_closed() {
                    model.camera = CameraPhase::Opening;
                    caps.camera
                        .open(|result| Event::CameraOpened(Box::new(result)));
                } else {
                    debug!("camera already open");
                }
            }

            Event::CameraOpened(result) => match model.camera {
                CameraPhase::Opening => match *result {
                    Ok(CameraOutput::Opened) => model.camera = CameraPhase::Streaming,
                    Ok(_) => {
                        warn!("unexpected camera output while opening");
                        model.camera = CameraPhase::Closed;
                    }
                    Err(error) => {
                        model.camera = CameraPhase::Closed;
                        let error: AppError = error.into();
                        model.notice = Some(Notice::error(error.user_facing_message()));
                    }
                },
                _ => {
                    // The user left before the stream arrived; hand it
                    // straight back so the device is not leaked.
                    if matches!(*result, Ok(CameraOutput::Opened)) {
                        caps.camera
                            .release(|result| Event::CameraReleased(Box::new(result)));
                        debug!("released camera stream acknowledged after close");
                    }
                }
            },

            Event::CaptureFrame => {
                if model.camera.is_streaming() {
                    caps.camera
                        .capture_frame(|result| Event::FrameCaptured(Box::new(result)));
                } else {
                    debug!("capture requested with no stream");
                }
            }

            Event::FrameCaptured(result) => {
                if model.camera.is_streaming() {
                    match *result {
                        Ok(output) => {
                            if let Some(frame) = output.into_frame() {
                                Self::release_camera(model, caps);
                                Self::stage_bytes(model, "camera-photo.jpg", &frame.data);
                            } else {
                                warn!("unexpected camera output for capture");
                            }
                        }
                        Err(error) => {
                            // Stream stays held; the user may retry or close.
                            let error: AppError = error.into();
                            model.notice = Some(Notice::error(error.user_facing_message()));
                        }
                    }
                } else {
                    debug!("frame arrived after camera was closed; dropping");
                }
            }

            Event::CloseCamera => match model.camera {
                CameraPhase::Streaming => Self::release_camera(model, caps),
                CameraPhase::Opening => model.camera = CameraPhase::Closed,
                CameraPhase::Closed => debug!("camera already closed"),
            },

            Event::CameraReleased(result) => {
                if let Err(error) = *result {
                    warn!("camera release reported failure: {error}");
                }
            }

            // --- Detection session ---
            Event::SetCropHint { hint } => {
                if model.session.phase == SessionPhase::ImageReady {
                    model.session.crop_hint = hint;
                } else {
                    debug!("crop hint ignored in phase {:?}", model.session.phase);
                }
            }

            Event::Submit => {
                if model.session.phase.is_submitting() {
                    debug!("submission already in flight; ignoring");
                } else if let Some(staged) = model.session.staged.as_ref() {
                    let generation = staged.generation;
                    match api::detect_full(
                        &model.config,
                        staged,
                        model.session.crop_hint,
                        &model.locale.current,
                        model.auth_token_str(),
                    ) {
                        Ok(request) => {
                            model.session.phase = SessionPhase::Submitting;
                            model.session.error = None;
                            caps.http.send(request, move |result| Event::DetectionCompleted {
                                generation,
                                result: Box::new(result),
                            });
                        }
                        Err(error) => {
                            model.notice = Some(Notice::error(error.user_facing_message()));
                        }
                    }
                } else {
                    model.notice = Some(Notice::error(
                        "Please choose or capture a photo of the leaf first.",
                    ));
                }
            }

            Event::DetectionCompleted { generation, result } => {
                if generation != model.session.generation {
                    debug!("stale detection response discarded");
                } else if !model.session.phase.is_submitting() {
                    debug!(
                        "detection response ignored in phase {:?}",
                        model.session.phase
                    );
                } else {
                    match *result {
                        Ok(response) => match api::parse_diagnosis(&response) {
                            Ok(record) => {
                                Self::apply_detection_success(model, caps, record, generation);
                            }
                            Err(error) => Self::apply_detection_failure(model, error),
                        },
                        Err(error) => Self::apply_detection_failure(model, error.into()),
                    }
                }
            }

            Event::ResultAckElapsed { generation } => {
                if generation == model.session.generation
                    && model.session.phase == SessionPhase::Succeeded
                {
                    model.screen = Screen::Results;
                    // Submitted and shown; the staged payload is done.
                    model.session.staged = None;
                } else {
                    debug!("stale result acknowledgment ignored");
                }
            }

            Event::RecommendationsFetched {
                crop_type,
                disease,
                result,
            } => match *result {
                Ok(response) if response.is_success() => {
                    match api::parse_recommendations(&response) {
                        Ok(recommendations) => {
                            model.recommendation_cache.put(
                                &crop_type,
                                &disease,
                                model.locale.current.as_str(),
                                recommendations.clone(),
                            );
                            if let Some(record) = model.session.diagnosis.as_mut() {
                                if record.crop_type == crop_type
                                    && record.disease == disease
                                    && !record.has_recommendations()
                                {
                                    record.recommendations = Some(recommendations);
                                }
                            }
                        }
                        // Guidance is optional everywhere; absence is not
                        // an error the user needs to see.
                        Err(error) => warn!("recommendations response not usable: {error}"),
                    }
                }
                Ok(response) => {
                    warn!("recommendations request failed with status {}", response.status);
                }
                Err(error) => warn!("recommendations request failed: {error}"),
            },

            // --- Result actions ---
            Event::SaveResult => {
                if let Some(record) = model.session.diagnosis.as_ref() {
                    match api::save_history(
                        &model.config,
                        record,
                        &model.locale.current,
                        model.auth_token_str(),
                    ) {
                        Ok(request) => {
                            caps.http
                                .send(request, |result| Event::ResultSaved(Box::new(result)));
                        }
                        Err(error) => {
                            model.notice = Some(Notice::error(error.user_facing_message()));
                        }
                    }
                } else {
                    debug!("save requested without a diagnosis");
                }
            }

            Event::ResultSaved(result) => match *result {
                Ok(response) if response.is_success() => {
                    model.notice = Some(Notice::success("Saved to history"));
                }
                Ok(response) => {
                    let error = AppError::from_http_status(response.status, &response.body);
                    model.notice = Some(Notice::error(format!(
                        "Could not save to history: {}",
                        error.user_facing_message()
                    )));
                }
                Err(error) => {
                    let error: AppError = error.into();
                    model.notice = Some(Notice::error(format!(
                        "Could not save to history: {}",
                        error.user_facing_message()
                    )));
                }
            },

            Event::ShareResult => {
                if let Some(record) = model.session.diagnosis.as_ref() {
                    caps.share.share(SHARE_TITLE, record.share_summary(), |result| {
                        Event::ShareCompleted(Box::new(result))
                    });
                } else {
                    debug!("share requested without a diagnosis");
                }
            }

            Event::ShareCompleted(result) => match *result {
                Ok(output) if output.needs_fallback() => {
                    if let Some(record) = model.session.diagnosis.as_ref() {
                        caps.share.copy_to_clipboard(record.share_summary(), |result| {
                            Event::ShareCompleted(Box::new(result))
                        });
                    }
                }
                Ok(ShareOutput::Copied) => {
                    model.notice = Some(Notice::info("Copied to clipboard"));
                }
                // Shared or cancelled by the user; both are fine.
                Ok(_) => {}
                Err(error) => debug!("share failed: {error}"),
            },

            // --- History ---
            Event::HistoryLoaded(result) => match *result {
                Ok(response) => match api::parse_history(&response) {
                    Ok(entries) => model.history.loaded(entries),
                    Err(error) => {
                        model.notice = Some(Notice::error(error.user_facing_message()));
                        model.history.failed(error);
                    }
                },
                Err(error) => {
                    let error: AppError = error.into();
                    model.notice = Some(Notice::error(error.user_facing_message()));
                    model.history.failed(error);
                }
            },

            Event::SetHistoryFilter { filter } => {
                model.history.filter = filter;
            }

            Event::RequestDeleteEntry { id } => {
                if model.history.contains(id) {
                    model.history.pending_delete = Some(id);
                } else {
                    debug!("delete requested for unknown entry {id}");
                }
            }

            Event::CancelDelete => {
                model.history.pending_delete = None;
            }

            Event::ConfirmDelete => {
                if let Some(id) = model.history.pending_delete.take() {
                    match api::delete_history(&model.config, id, model.auth_token_str()) {
                        Ok(request) => {
                            caps.http.send(request, move |result| Event::EntryDeleted {
                                id,
                                result: Box::new(result),
                            });
                        }
                        Err(error) => {
                            model.notice = Some(Notice::error(error.user_facing_message()));
                        }
                    }
                } else {
                    debug!("confirm with no pending delete");
                }
            }

            Event::EntryDeleted { id, result } => match *result {
                Ok(response) if response.is_success() => {
                    debug!("history entry {id} deleted");
                    model.notice = Some(Notice::success("Entry deleted"));
                    // Reload rather than splice locally; the store is the
                    // source of truth.
                    Self::start_history_load(model, caps);
                }
                Ok(response) => {
                    let error = AppError::from_http_status(response.status, &response.body);
                    model.notice = Some(Notice::error(format!(
                        "Could not delete the entry: {}",
                        error.user_facing_message()
                    )));
                }
                Err(error) => {
                    let error: AppError = error.into();
                    model.notice = Some(Notice::error(format!(
                        "Could not delete the entry: {}",
                        error.user_facing_message()
                    )));
                }
            },

            // --- Navigation & notices ---
            Event::Navigate { screen } => {
                if model.screen == Screen::Detector && screen != Screen::Detector {
                    Self::dismiss_camera(model, caps);
                }
                match screen {
                    Screen::Results if model.session.diagnosis.is_none() => {
                        debug!("no result to show; staying on detector");
                        model.screen = Screen::Detector;
                    }
                    Screen::History => {
                        model.screen = Screen::History;
                        model.history.pending_delete = None;
                        Self::start_history_load(model, caps);
                    }
                    other => model.screen = other,
                }
            }

            Event::DismissNotice => {
                model.notice = None;
            }
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel {
            screen: model.screen,
            language: model.locale.current.as_str().to_string(),
            available_locales: available_locales(),
            detector: DetectorView {
                phase: model.session.phase,
                preview_uri: model
                    .session
                    .staged
                    .as_ref()
                    .map(|image| image.preview_uri.clone()),
                crop_hint: model.session.crop_hint,
                has_image: model.session.has_image(),
                can_submit: model.session.has_image()
                    && !model.session.phase.is_submitting(),
                is_submitting: model.session.phase.is_submitting(),
                camera: model.camera,
                error: model
                    .session
                    .error
                    .as_ref()
                    .map(AppError::user_facing_message),
            },
            result: model.session.diagnosis.as_ref().map(build_result_view),
            history: build_history_view(&model.history),
            notice: model.notice.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub screen: Screen,
    pub language: String,
    pub available_locales: Vec<Locale>,
    pub detector: DetectorView,
    pub result: Option<ResultView>,
    pub history: HistoryView,
    pub notice: Option<Notice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorView {
    pub phase: SessionPhase,
    pub preview_uri: Option<String>,
    pub crop_hint: CropHint,
    pub has_image: bool,
    pub can_submit: bool,
    pub is_submitting: bool,
    pub camera: CameraPhase,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultView {
    pub crop_type: String,
    pub disease_label: String,
    pub confidence_text: String,
    pub severity: Severity,
    pub severity_style: SeverityStyle,
    pub icon: ResultIcon,
    pub symptoms: Vec<String>,
    pub treatments: Vec<Treatment>,
    pub prevention: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryView {
    pub status: HistoryStatus,
    pub is_loading: bool,
    pub error: Option<String>,
    pub filter: HistoryFilter,
    pub entries: Vec<HistoryItemView>,
    pub pending_delete: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItemView {
    pub id: i64,
    pub crop_type: String,
    pub disease_label: String,
    pub confidence_text: String,
    pub severity: Severity,
    pub severity_style: SeverityStyle,
    pub created_at: String,
}

fn build_result_view(record: &DiagnosisRecord) -> ResultView {
    let (symptoms, treatments, prevention) = record
        .recommendations
        .as_ref()
        .map(|r| (r.symptoms.clone(), r.treatments.clone(), r.prevention.clone()))
        .unwrap_or_default();

    ResultView {
        crop_type: record.crop_type.clone(),
        disease_label: record.disease_label(),
        confidence_text: record.confidence_percent(),
        severity: record.severity,
        severity_style: record.severity.style(),
        icon: record.icon(),
        symptoms,
        treatments,
        prevention,
    }
}

fn build_history_view(history: &HistoryState) -> HistoryView {
    let entries = history
        .filtered()
        .into_iter()
        .map(|entry| HistoryItemView {
            id: entry.id,
            crop_type: entry.crop_type.clone(),
            disease_label: entry.disease.replace('_', " "),
            confidence_text: format!(
                "{:.1}%",
                f64::from(entry.confidence.clamp(0.0, 1.0)) * 100.0
            ),
            severity: entry.severity,
            severity_style: entry.severity.style(),
            created_at: entry.created_at.clone(),
        })
        .collect();

    HistoryView {
        status: history.status,
        is_loading: history.status.is_loading(),
        error: history.error.as_ref().map(AppError::user_facing_message),
        filter: history.filter.clone(),
        entries,
        pending_delete: history.pending_delete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{Effect, KvOperation, KvOutput};
    use crux_core::testing::AppTester;

    fn kv_requests(
        effects: Vec<Effect>,
    ) -> Vec<crux_core::Request<KvOperation>> {
        effects
            .into_iter()
            .filter_map(|effect| match effect {
                Effect::KeyValue(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn boot_reads_persisted_language_and_token() {
        let app = AppTester::<App, Effect>::default();
        let mut model = Model::default();

        let update = app.update(Event::AppStarted, &mut model);
        let mut requests = kv_requests(update.effects);
        assert_eq!(requests.len(), 2);

        assert_eq!(
            requests[0].operation,
            KvOperation::Get {
                key: LANGUAGE_KEY.to_string()
            }
        );

        let update = app
            .resolve(&mut requests[0], Ok(KvOutput::Value(Some(b"yo".to_vec()))))
            .expect("resolves");
        for event in update.events {
            let _ = app.update(event, &mut model);
        }
        assert_eq!(model.locale.current.as_str(), "yo");

        let update = app
            .resolve(
                &mut requests[1],
                Ok(KvOutput::Value(Some(b"jwt-abc".to_vec()))),
            )
            .expect("resolves");
        for event in update.events {
            let _ = app.update(event, &mut model);
        }
        assert_eq!(model.auth_token_str(), Some("jwt-abc"));
    }

    #[test]
    fn unrecognized_persisted_language_falls_back_to_default() {
        let app = AppTester::<App, Effect>::default();
        let mut model = Model::default();

        let update = app.update(Event::AppStarted, &mut model);
        let mut requests = kv_requests(update.effects);
        let update = app
            .resolve(&mut requests[0], Ok(KvOutput::Value(Some(b"fr".to_vec()))))
            .expect("resolves");
        for event in update.events {
            let _ = app.update(event, &mut model);
        }

        assert_eq!(model.locale.current.as_str(), "en");
    }

    #[test]
    fn change_language_updates_state_and_persists() {
        let app = AppTester::<App, Effect>::default();
        let mut model = Model::default();

        let update = app.update(
            Event::ChangeLanguage { code: "ha".into() },
            &mut model,
        );

        assert_eq!(model.locale.current.as_str(), "ha");
        let requests = kv_requests(update.effects);
        assert_eq!(
            requests[0].operation,
            KvOperation::Set {
                key: LANGUAGE_KEY.to_string(),
                value: b"ha".to_vec(),
            }
        );
    }

    #[test]
    fn change_language_applies_unrecognized_codes() {
        let app = AppTester::<App, Effect>::default();
        let mut model = Model::default();

        let _ = app.update(Event::ChangeLanguage { code: "sw".into() }, &mut model);
        assert_eq!(model.locale.current.as_str(), "sw");
    }

    #[test]
    fn configured_accepts_valid_base_and_rejects_invalid() {
        let app = AppTester::<App, Effect>::default();
        let mut model = Model::default();

        let _ = app.update(
            Event::Configured {
                api_base: "https://staging.cropdoctor.app".into(),
            },
            &mut model,
        );
        assert_eq!(model.config.api_base, "https://staging.cropdoctor.app");

        let _ = app.update(
            Event::Configured {
                api_base: "file:///etc/passwd".into(),
            },
            &mut model,
        );
        assert_eq!(model.config.api_base, "https://staging.cropdoctor.app");
    }

    #[test]
    fn navigating_to_results_without_a_diagnosis_redirects_to_detector() {
        let app = AppTester::<App, Effect>::default();
        let mut model = Model::default();

        let _ = app.update(
            Event::Navigate {
                screen: Screen::Results,
            },
            &mut model,
        );
        assert_eq!(model.screen, Screen::Detector);
    }

    #[test]
    fn crop_hint_is_only_honored_with_an_image_ready() {
        let app = AppTester::<App, Effect>::default();
        let mut model = Model::default();

        let _ = app.update(
            Event::SetCropHint {
                hint: CropHint::Maize,
            },
            &mut model,
        );
        assert_eq!(model.session.crop_hint, CropHint::Unspecified);
    }

    #[test]
    fn dismissing_notice_clears_it() {
        let app = AppTester::<App, Effect>::default();
        let mut model = Model::default();
        model.notice = Some(Notice::info("hello"));

        let _ = app.update(Event::DismissNotice, &mut model);
        assert!(model.notice.is_none());
    }

    #[test]
    fn view_reflects_history_filter() {
        use crate::diagnosis::HistoryEntry;

        let app = AppTester::<App, Effect>::default();
        let mut model = Model::default();
        model.history.loaded(vec![
            HistoryEntry {
                id: 2,
                crop_type: "tomato".into(),
                disease: "early_blight".into(),
                confidence: 0.8,
                severity: Severity::Medium,
                language: None,
                created_at: String::new(),
            },
            HistoryEntry {
                id: 1,
                crop_type: "maize".into(),
                disease: "healthy".into(),
                confidence: 0.99,
                severity: Severity::None,
                language: None,
                created_at: String::new(),
            },
        ]);

        let _ = app.update(
            Event::SetHistoryFilter {
                filter: HistoryFilter::Crop("maize".into()),
            },
            &mut model,
        );

        let view = app.view(&model);
        assert_eq!(view.history.entries.len(), 1);
        assert_eq!(view.history.entries[0].id, 1);
        assert_eq!(view.history.entries[0].disease_label, "healthy");
    }

    #[test]
    fn view_builds_result_card_from_diagnosis() {
        let app = AppTester::<App, Effect>::default();
        let mut model = Model::default();
        model.session.diagnosis = Some(DiagnosisRecord {
            crop_type: "maize".into(),
            disease: "maize_streak_virus".into(),
            confidence: 0.92,
            severity: Severity::High,
            recommendations: None,
        });

        let view = app.view(&model);
        let result = view.result.expect("result view");
        assert_eq!(result.confidence_text, "92.0%");
        assert_eq!(result.severity_style, SeverityStyle::High);
        assert_eq!(result.icon, ResultIcon::Warning);
        assert!(result.symptoms.is_empty());
    }
}
