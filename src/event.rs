use serde::{Deserialize, Serialize};

use crate::capabilities::{CameraResult, HttpResult, KvResult, ShareResult};
use crate::diagnosis::CropHint;
use crate::history::HistoryFilter;
use crate::model::Screen;

/// Everything that can happen to the app: user intents and capability
/// responses. Capability results are boxed to keep the enum small.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // Boot
    AppStarted,
    Configured {
        api_base: String,
    },
    PersistedLanguageLoaded(Box<KvResult>),
    PersistedTokenLoaded(Box<KvResult>),

    // Locale
    ChangeLanguage {
        code: String,
    },
    LanguagePersisted(Box<KvResult>),

    // Image acquisition: file path
    ImageSelected {
        file_name: String,
        #[serde(with = "serde_bytes")]
        data: Vec<u8>,
    },
    ClearImage,

    // Image acquisition: camera path
    OpenCamera,
    CameraOpened(Box<CameraResult>),
    CaptureFrame,
    FrameCaptured(Box<CameraResult>),
    CloseCamera,
    CameraReleased(Box<CameraResult>),

    // Detection session
    SetCropHint {
        hint: CropHint,
    },
    Submit,
    DetectionCompleted {
        generation: u64,
        result: Box<HttpResult>,
    },
    ResultAckElapsed {
        generation: u64,
    },
    RecommendationsFetched {
        crop_type: String,
        disease: String,
        result: Box<HttpResult>,
    },

    // Result actions
    SaveResult,
    ResultSaved(Box<HttpResult>),
    ShareResult,
    ShareCompleted(Box<ShareResult>),

    // History
    HistoryLoaded(Box<HttpResult>),
    SetHistoryFilter {
        filter: HistoryFilter,
    },
    RequestDeleteEntry {
        id: i64,
    },
    CancelDelete,
    ConfirmDelete,
    EntryDeleted {
        id: i64,
        result: Box<HttpResult>,
    },

    // Navigation & notices
    Navigate {
        screen: Screen,
    },
    DismissNotice,
}
