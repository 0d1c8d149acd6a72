use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Keys are namespaced `prefix:name` strings; the two the app persists are
/// the language selection and the auth token.
pub const LANGUAGE_KEY: &str = "settings:language";
pub const AUTH_TOKEN_KEY: &str = "session:auth_token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KvOperation {
    Get {
        key: String,
    },
    Set {
        key: String,
        #[serde(with = "serde_bytes")]
        value: Vec<u8>,
    },
    Delete {
        key: String,
    },
}

impl Operation for KvOperation {
    type Output = KvResult;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KvOutput {
    Value(#[serde(with = "serde_bytes")] Option<Vec<u8>>),
    Written,
    Deleted { existed: bool },
}

impl KvOutput {
    /// The stored value as UTF-8, if the read found one.
    #[must_use]
    pub fn into_string(self) -> Option<String> {
        match self {
            Self::Value(Some(bytes)) => String::from_utf8(bytes).ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum KvError {
    #[error("storage error: {message}")]
    Storage { message: String },
}

pub type KvResult = Result<KvOutput, KvError>;

#[derive(Clone)]
pub struct KeyValue<Ev> {
    context: CapabilityContext<KvOperation, Ev>,
}

impl<Ev> Capability<Ev> for KeyValue<Ev> {
    type Operation = KvOperation;
    type MappedSelf<MappedEv> = KeyValue<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        KeyValue::new(self.context.map_event(f))
    }
}

impl<Ev> KeyValue<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<KvOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn get<F>(&self, key: impl Into<String>, make_event: F)
    where
        F: FnOnce(KvResult) -> Ev + Send + 'static,
    {
        self.request(KvOperation::Get { key: key.into() }, make_event);
    }

    pub fn set<F>(&self, key: impl Into<String>, value: Vec<u8>, make_event: F)
    where
        F: FnOnce(KvResult) -> Ev + Send + 'static,
    {
        self.request(
            KvOperation::Set {
                key: key.into(),
                value,
            },
            make_event,
        );
    }

    pub fn delete<F>(&self, key: impl Into<String>, make_event: F)
    where
        F: FnOnce(KvResult) -> Ev + Send + 'static,
    {
        self.request(KvOperation::Delete { key: key.into() }, make_event);
    }

    fn request<F>(&self, operation: KvOperation, make_event: F)
    where
        F: FnOnce(KvResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(make_event(result));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_output_decodes_utf8() {
        let output = KvOutput::Value(Some(b"yo".to_vec()));
        assert_eq!(output.into_string(), Some("yo".to_string()));
    }

    #[test]
    fn missing_value_decodes_to_none() {
        assert_eq!(KvOutput::Value(None).into_string(), None);
        assert_eq!(KvOutput::Written.into_string(), None);
    }

    #[test]
    fn invalid_utf8_decodes_to_none() {
        let output = KvOutput::Value(Some(vec![0xFF, 0xFE]));
        assert_eq!(output.into_string(), None);
    }

    #[test]
    fn operations_roundtrip_through_serde() {
        let op = KvOperation::Set {
            key: LANGUAGE_KEY.to_string(),
            value: b"ha".to_vec(),
        };
        let json = serde_json::to_string(&op).expect("serializes");
        let back: KvOperation = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(op, back);
    }
}
