use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Native share sheet with a clipboard fallback. Both paths are
/// best-effort: a cancelled share is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareOperation {
    Share { title: String, text: String },
    CopyToClipboard { text: String },
}

impl Operation for ShareOperation {
    type Output = ShareResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareOutput {
    Shared,
    Cancelled,
    /// No native share sheet on this platform; the caller should fall back
    /// to the clipboard.
    Unavailable,
    Copied,
}

impl ShareOutput {
    #[must_use]
    pub const fn is_cancelled(self) -> bool {
        matches!(self, Self::Cancelled)
    }

    #[must_use]
    pub const fn needs_fallback(self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareError {
    #[error("share failed: {reason}")]
    Failed { reason: String },

    #[error("clipboard unavailable")]
    ClipboardUnavailable,
}

pub type ShareResult = Result<ShareOutput, ShareError>;

#[derive(Clone)]
pub struct Share<Ev> {
    context: CapabilityContext<ShareOperation, Ev>,
}

impl<Ev> Capability<Ev> for Share<Ev> {
    type Operation = ShareOperation;
    type MappedSelf<MappedEv> = Share<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Share::new(self.context.map_event(f))
    }
}

impl<Ev> Share<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<ShareOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn share<F>(&self, title: impl Into<String>, text: impl Into<String>, make_event: F)
    where
        F: FnOnce(ShareResult) -> Ev + Send + 'static,
    {
        self.request(
            ShareOperation::Share {
                title: title.into(),
                text: text.into(),
            },
            make_event,
        );
    }

    pub fn copy_to_clipboard<F>(&self, text: impl Into<String>, make_event: F)
    where
        F: FnOnce(ShareResult) -> Ev + Send + 'static,
    {
        self.request(ShareOperation::CopyToClipboard { text: text.into() }, make_event);
    }

    fn request<F>(&self, operation: ShareOperation, make_event: F)
    where
        F: FnOnce(ShareResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(make_event(result));
        });
    }
}
