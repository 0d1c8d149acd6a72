use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AppError, ErrorKind};

/// Device stream contract: one `Open` acquires the stream, exactly one
/// `Release` must follow per successful open. `CaptureFrame` is only valid
/// while the stream is held and does not release it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraOperation {
    Open,
    CaptureFrame,
    Release,
}

impl Operation for CameraOperation {
    type Output = CameraResult;
}

/// A still frame drawn from the live stream, encoded by the shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedFrame {
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraOutput {
    Opened,
    Frame(CapturedFrame),
    Released,
}

impl CameraOutput {
    #[must_use]
    pub fn into_frame(self) -> Option<CapturedFrame> {
        match self {
            Self::Frame(frame) => Some(frame),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("no camera device available")]
    NoDevice,

    #[error("camera unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("capture failed: {reason}")]
    CaptureFailed { reason: String },
}

impl CameraError {
    #[must_use]
    pub const fn is_permission_error(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }
}

impl From<CameraError> for AppError {
    fn from(e: CameraError) -> Self {
        let message = match &e {
            CameraError::PermissionDenied => {
                "Camera access is required. Please enable camera permissions in Settings."
                    .to_string()
            }
            CameraError::NoDevice => "No camera was found on this device.".to_string(),
            CameraError::Unavailable { .. } => {
                "The camera is unavailable. Please close other apps using it and try again."
                    .to_string()
            }
            CameraError::CaptureFailed { .. } => {
                "Could not capture a photo. Please try again.".to_string()
            }
        };
        AppError::new(ErrorKind::Device, message)
    }
}

pub type CameraResult = Result<CameraOutput, CameraError>;

#[derive(Clone)]
pub struct Camera<Ev> {
    context: CapabilityContext<CameraOperation, Ev>,
}

impl<Ev> Capability<Ev> for Camera<Ev> {
    type Operation = CameraOperation;
    type MappedSelf<MappedEv> = Camera<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Camera::new(self.context.map_event(f))
    }
}

impl<Ev> Camera<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<CameraOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn open<F>(&self, make_event: F)
    where
        F: FnOnce(CameraResult) -> Ev + Send + 'static,
    {
        self.request(CameraOperation::Open, make_event);
    }

    pub fn capture_frame<F>(&self, make_event: F)
    where
        F: FnOnce(CameraResult) -> Ev + Send + 'static,
    {
        self.request(CameraOperation::CaptureFrame, make_event);
    }

    pub fn release<F>(&self, make_event: F)
    where
        F: FnOnce(CameraResult) -> Ev + Send + 'static,
    {
        self.request(CameraOperation::Release, make_event);
    }

    fn request<F>(&self, operation: CameraOperation, make_event: F)
    where
        F: FnOnce(CameraResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(make_event(result));
        });
    }
}
