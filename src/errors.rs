use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("Policy key {0:?} does not exist in the relay policy list")]
    PolicyNotFound(String),

    #[error("Policy entry {key:?} is malformed: {detail}")]
    PolicyMalformed { key: String, detail: String },

    #[error("Unrecognized relay line: {detail}")]
    ConfigParseAnomaly { interface: String, detail: String },

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Invalid relay address: {0}")]
    InvalidRelayAddress(String),

    #[error("Invalid policy list: {0}")]
    PolicyListFormat(String),

    #[error("Failed to load settings from {path}: {detail}")]
    Settings { path: String, detail: String },
}
