use assert_matches::assert_matches;
use crux_core::testing::AppTester;
use crux_core::Request;
use std::io::Cursor;

use cropdoctor_core::capabilities::{
    DelayElapsed, DelayOperation, HttpOperation, HttpResponse, ShareOperation, ShareOutput,
};
use cropdoctor_core::diagnosis::{CropHint, ResultIcon, Severity, SeverityStyle};
use cropdoctor_core::model::{NoticeLevel, Screen, SessionPhase};
use cropdoctor_core::{App, Effect, Event, Model};

fn png_bytes() -> Vec<u8> {
    let buffer = image::RgbImage::from_pixel(4, 4, image::Rgb([30, 120, 40]));
    let mut out = Vec::new();
    buffer
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .expect("encode test image");
    out
}

fn http_requests(effects: Vec<Effect>) -> Vec<Request<HttpOperation>> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .collect()
}

fn delay_requests(effects: Vec<Effect>) -> Vec<Request<DelayOperation>> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Delay(request) => Some(request),
            _ => None,
        })
        .collect()
}

fn request_url(request: &Request<HttpOperation>) -> String {
    let HttpOperation::Execute(inner) = &request.operation;
    inner.url.clone()
}

fn request_body(request: &Request<HttpOperation>) -> Vec<u8> {
    let HttpOperation::Execute(inner) = &request.operation;
    inner.body.clone().unwrap_or_default()
}

fn detection_body() -> Vec<u8> {
    br#"{
        "crop_type": "maize",
        "disease": "maize_streak_virus",
        "confidence": 0.92,
        "severity": "high",
        "recommendations": {
            "disease_name": "Maize Streak Virus",
            "symptoms": ["Broken yellow streaks along the veins"],
            "treatments": [
                {"method": "Rogueing", "cost": "low", "steps": ["Remove and destroy infected plants"]}
            ],
            "prevention": ["Plant early", "Control leafhoppers"]
        }
    }"#
    .to_vec()
}

fn select_image(app: &AppTester<App, Effect>, model: &mut Model) {
    let _ = app.update(
        Event::ImageSelected {
            file_name: "leaf.png".into(),
            data: png_bytes(),
        },
        model,
    );
}

#[test]
fn selecting_an_image_readies_the_session() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    select_image(&app, &mut model);

    assert_eq!(model.session.phase, SessionPhase::ImageReady);
    let staged = model.session.staged.as_ref().expect("staged image");
    assert!(staged.preview_uri.starts_with("data:image/jpeg;base64,"));

    let view = app.view(&model);
    assert!(view.detector.can_submit);
    assert!(!view.detector.is_submitting);
}

#[test]
fn clear_after_staging_returns_to_idle() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    select_image(&app, &mut model);
    let _ = app.update(
        Event::SetCropHint {
            hint: CropHint::Maize,
        },
        &mut model,
    );
    let _ = app.update(Event::ClearImage, &mut model);

    assert_eq!(model.session.phase, SessionPhase::Idle);
    assert!(model.session.staged.is_none());
    assert!(model.session.diagnosis.is_none());
    assert_eq!(model.session.crop_hint, CropHint::Unspecified);
}

#[test]
fn submit_without_an_image_is_a_local_validation_failure() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(Event::Submit, &mut model);

    assert_eq!(model.session.phase, SessionPhase::Idle);
    assert!(http_requests(update.effects).is_empty());
    let notice = model.notice.as_ref().expect("validation notice");
    assert_eq!(notice.level, NoticeLevel::Error);
}

#[test]
fn successful_submission_reaches_succeeded_and_navigates_after_the_ack_delay() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    select_image(&app, &mut model);
    let _ = app.update(
        Event::SetCropHint {
            hint: CropHint::Maize,
        },
        &mut model,
    );

    let update = app.update(Event::Submit, &mut model);
    assert_eq!(model.session.phase, SessionPhase::Submitting);

    let mut requests = http_requests(update.effects);
    assert_eq!(requests.len(), 1, "exactly one detection request");
    let url = request_url(&requests[0]);
    assert!(url.contains("/api/detect/full"));
    assert!(url.contains("language=en"));
    let body = String::from_utf8_lossy(&request_body(&requests[0])).to_string();
    assert!(body.contains("name=\"crop_type\"\r\n\r\nmaize"));

    let update = app
        .resolve(&mut requests[0], Ok(HttpResponse::new(200, detection_body())))
        .expect("resolves");

    let mut delay = Vec::new();
    for event in update.events {
        let inner = app.update(event, &mut model);
        delay.extend(delay_requests(inner.effects));
    }

    assert_eq!(model.session.phase, SessionPhase::Succeeded);
    let record = model.session.diagnosis.as_ref().expect("diagnosis");
    assert_eq!(record.crop_type, "maize");
    assert_eq!(record.severity, Severity::High);
    assert!(record.confidence >= 0.0 && record.confidence <= 1.0);

    let view = app.view(&model);
    let result = view.result.expect("result view");
    assert_eq!(result.severity_style, SeverityStyle::High);
    assert_eq!(result.icon, ResultIcon::Warning);
    assert_eq!(result.confidence_text, "92.0%");

    // Image retained until navigation.
    assert!(model.session.staged.is_some());

    assert_eq!(delay.len(), 1, "one navigation delay");
    assert_matches!(delay[0].operation, DelayOperation::Start { millis: 1_000 });

    let update = app.resolve(&mut delay[0], DelayElapsed).expect("resolves");
    for event in update.events {
        let _ = app.update(event, &mut model);
    }

    assert_eq!(model.screen, Screen::Results);
    assert!(model.session.staged.is_none(), "handle discarded on navigation");
    assert_eq!(model.session.phase, SessionPhase::Succeeded);
}

#[test]
fn a_second_submit_while_submitting_issues_no_second_request() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    select_image(&app, &mut model);
    let first = app.update(Event::Submit, &mut model);
    assert_eq!(http_requests(first.effects).len(), 1);

    let second = app.update(Event::Submit, &mut model);
    assert!(http_requests(second.effects).is_empty());
    assert_eq!(model.session.phase, SessionPhase::Submitting);
}

#[test]
fn failed_submission_keeps_the_image_and_clear_still_works() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    select_image(&app, &mut model);
    let update = app.update(Event::Submit, &mut model);
    let mut requests = http_requests(update.effects);

    let update = app
        .resolve(
            &mut requests[0],
            Ok(HttpResponse::new(
                500,
                br#"{"detail": "model not loaded"}"#.to_vec(),
            )),
        )
        .expect("resolves");
    for event in update.events {
        let _ = app.update(event, &mut model);
    }

    assert_eq!(model.session.phase, SessionPhase::Failed);
    assert!(model.session.staged.is_some(), "image retained for retry");
    let error = model.session.error.as_ref().expect("error held");
    assert_eq!(error.message, "model not loaded");

    let _ = app.update(Event::ClearImage, &mut model);
    assert_eq!(model.session.phase, SessionPhase::Idle);
    assert!(model.session.staged.is_none());
}

#[test]
fn transport_failure_also_lands_in_failed() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    select_image(&app, &mut model);
    let update = app.update(Event::Submit, &mut model);
    let mut requests = http_requests(update.effects);

    let update = app
        .resolve(
            &mut requests[0],
            Err(cropdoctor_core::capabilities::HttpError::Network {
                message: "connection reset".into(),
            }),
        )
        .expect("resolves");
    for event in update.events {
        let _ = app.update(event, &mut model);
    }

    assert_eq!(model.session.phase, SessionPhase::Failed);
    assert!(model.session.staged.is_some());
}

#[test]
fn a_stale_response_does_not_touch_a_cleared_session() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    select_image(&app, &mut model);
    let update = app.update(Event::Submit, &mut model);
    let mut requests = http_requests(update.effects);

    // The user clears mid-flight; the session moves on.
    let _ = app.update(Event::ClearImage, &mut model);
    assert_eq!(model.session.phase, SessionPhase::Idle);

    let update = app
        .resolve(&mut requests[0], Ok(HttpResponse::new(200, detection_body())))
        .expect("resolves");
    for event in update.events {
        let _ = app.update(event, &mut model);
    }

    assert_eq!(model.session.phase, SessionPhase::Idle);
    assert!(model.session.diagnosis.is_none());
    assert!(model.session.staged.is_none());
}

#[test]
fn restaging_a_new_image_invalidates_the_previous_submission() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    select_image(&app, &mut model);
    let update = app.update(Event::Submit, &mut model);
    let mut requests = http_requests(update.effects);

    // The response for the first image arrives only after the session has
    // failed over to a new image.
    let update_failed = app
        .resolve(
            &mut requests[0],
            Err(cropdoctor_core::capabilities::HttpError::Timeout { timeout_ms: 60_000 }),
        )
        .expect("resolves");
    for event in update_failed.events {
        let _ = app.update(event, &mut model);
    }
    assert_eq!(model.session.phase, SessionPhase::Failed);

    select_image(&app, &mut model);
    assert_eq!(model.session.phase, SessionPhase::ImageReady);

    // A late duplicate of the old response must not apply to the new image.
    let stale = Event::DetectionCompleted {
        generation: model.session.generation - 1,
        result: Box::new(Ok(HttpResponse::new(200, detection_body()))),
    };
    let _ = app.update(stale, &mut model);

    assert_eq!(model.session.phase, SessionPhase::ImageReady);
    assert!(model.session.diagnosis.is_none());
}

#[test]
fn detection_without_embedded_guidance_fetches_recommendations() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    select_image(&app, &mut model);
    let update = app.update(Event::Submit, &mut model);
    let mut requests = http_requests(update.effects);

    let bare = br#"{"crop_type": "tomato", "disease": "early_blight",
                    "confidence": 0.81, "severity": "medium"}"#
        .to_vec();
    let update = app
        .resolve(&mut requests[0], Ok(HttpResponse::new(200, bare)))
        .expect("resolves");

    let mut follow_ups = Vec::new();
    for event in update.events {
        let inner = app.update(event, &mut model);
        follow_ups.extend(http_requests(inner.effects));
    }

    assert_eq!(follow_ups.len(), 1, "one recommendations fetch");
    let url = request_url(&follow_ups[0]);
    assert!(url.contains("/api/recommendations/tomato/early_blight"));

    let guidance = br#"{"symptoms": ["Dark concentric rings"], "treatments": [], "prevention": []}"#
        .to_vec();
    let update = app
        .resolve(&mut follow_ups[0], Ok(HttpResponse::new(200, guidance)))
        .expect("resolves");
    for event in update.events {
        let _ = app.update(event, &mut model);
    }

    let record = model.session.diagnosis.as_ref().expect("diagnosis");
    assert!(record.has_recommendations());
    let view = app.view(&model);
    assert_eq!(
        view.result.expect("result").symptoms,
        vec!["Dark concentric rings".to_string()]
    );
}

#[test]
fn save_sends_the_record_with_the_active_language() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let _ = app.update(Event::ChangeLanguage { code: "ha".into() }, &mut model);

    select_image(&app, &mut model);
    let update = app.update(Event::Submit, &mut model);
    let mut requests = http_requests(update.effects);
    let update = app
        .resolve(&mut requests[0], Ok(HttpResponse::new(200, detection_body())))
        .expect("resolves");
    for event in update.events {
        let _ = app.update(event, &mut model);
    }

    let update = app.update(Event::SaveResult, &mut model);
    let mut saves = http_requests(update.effects);
    assert_eq!(saves.len(), 1);
    assert!(request_url(&saves[0]).ends_with("/api/history"));

    let body: serde_json::Value =
        serde_json::from_slice(&request_body(&saves[0])).expect("json body");
    assert_eq!(body["crop_type"], "maize");
    assert_eq!(body["disease"], "maize_streak_virus");
    assert_eq!(body["severity"], "high");
    assert_eq!(body["language"], "ha");

    let created = br#"{"id": 7, "crop_type": "maize", "disease": "maize_streak_virus",
                       "confidence": 0.92, "severity": "high", "language": "ha",
                       "created_at": "2024-05-03T09:00:00Z"}"#
        .to_vec();
    let update = app
        .resolve(&mut saves[0], Ok(HttpResponse::new(201, created)))
        .expect("resolves");
    for event in update.events {
        let _ = app.update(event, &mut model);
    }

    let notice = model.notice.as_ref().expect("notice");
    assert_eq!(notice.level, NoticeLevel::Success);
}

#[test]
fn share_falls_back_to_the_clipboard_when_unavailable() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    select_image(&app, &mut model);
    let update = app.update(Event::Submit, &mut model);
    let mut requests = http_requests(update.effects);
    let update = app
        .resolve(&mut requests[0], Ok(HttpResponse::new(200, detection_body())))
        .expect("resolves");
    for event in update.events {
        let _ = app.update(event, &mut model);
    }

    let update = app.update(Event::ShareResult, &mut model);
    let mut shares: Vec<Request<ShareOperation>> = update
        .effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Share(request) => Some(request),
            _ => None,
        })
        .collect();
    assert_eq!(shares.len(), 1);
    assert_matches!(&shares[0].operation, ShareOperation::Share { text, .. } => {
        assert_eq!(text, "Crop: maize | Disease: maize_streak_virus");
    });

    let update = app
        .resolve(&mut shares[0], Ok(ShareOutput::Unavailable))
        .expect("resolves");

    let mut fallbacks = Vec::new();
    for event in update.events {
        let inner = app.update(event, &mut model);
        fallbacks.extend(inner.effects.into_iter().filter_map(|effect| match effect {
            Effect::Share(request) => Some(request),
            _ => None,
        }));
    }
    assert_eq!(fallbacks.len(), 1);
    assert_matches!(&fallbacks[0].operation, ShareOperation::CopyToClipboard { text } => {
        assert_eq!(text, "Crop: maize | Disease: maize_streak_virus");
    });

    let update = app
        .resolve(&mut fallbacks[0], Ok(ShareOutput::Copied))
        .expect("resolves");
    for event in update.events {
        let _ = app.update(event, &mut model);
    }
    let notice = model.notice.as_ref().expect("notice");
    assert_eq!(notice.level, NoticeLevel::Info);
}

#[test]
fn a_cancelled_share_is_not_an_error() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    select_image(&app, &mut model);
    let update = app.update(Event::Submit, &mut model);
    let mut requests = http_requests(update.effects);
    let update = app
        .resolve(&mut requests[0], Ok(HttpResponse::new(200, detection_body())))
        .expect("resolves");
    for event in update.events {
        let _ = app.update(event, &mut model);
    }
    model.notice = None;

    let update = app.update(Event::ShareResult, &mut model);
    let mut shares: Vec<Request<ShareOperation>> = update
        .effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Share(request) => Some(request),
            _ => None,
        })
        .collect();

    let update = app
        .resolve(&mut shares[0], Ok(ShareOutput::Cancelled))
        .expect("resolves");
    for event in update.events {
        let _ = app.update(event, &mut model);
    }

    assert!(model.notice.is_none(), "cancellation is silent");
}
