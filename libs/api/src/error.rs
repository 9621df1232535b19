/// Category of an ingest error. Allows the pipeline to make intelligent
/// decisions about error handling (drop, retry, fail fast).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid configuration — permanent, fail at startup.
    Config,
    /// Malformed or unrecognized payload — bad input, drop the message.
    Decode,
    /// Storage failure with no partial effect — safe to retry verbatim.
    Transient,
    /// Any other storage/collaborator failure — propagate, no retry.
    Storage,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Config => f.write_str("config"),
            ErrorKind::Decode => f.write_str("decode"),
            ErrorKind::Transient => f.write_str("transient"),
            ErrorKind::Storage => f.write_str("storage"),
        }
    }
}

/// Unified error type for codec, pipeline and collaborator calls.
///
/// Carries an `ErrorKind` for categorization and a human-readable message.
/// `From` impls assign the appropriate kind automatically and allow
/// ergonomic `?` in codec and pipeline implementations.
#[derive(Clone)]
pub struct IngestError {
    kind: ErrorKind,
    message: String,
}

impl IngestError {
    /// Configuration error — permanent, fail at startup.
    pub fn config(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Config, message: msg.into() }
    }

    /// Malformed payload or missing required field — drop the message.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Decode, message: msg.into() }
    }

    /// Transient storage failure — no partial write occurred, retry verbatim.
    pub fn transient(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Transient, message: msg.into() }
    }

    /// Fatal storage/collaborator failure — propagate immediately.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Storage, message: msg.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Debug for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for IngestError {}

impl From<std::io::Error> for IngestError {
    fn from(e: std::io::Error) -> Self {
        Self { kind: ErrorKind::Transient, message: e.to_string() }
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(e: serde_json::Error) -> Self {
        Self { kind: ErrorKind::Decode, message: e.to_string() }
    }
}

impl From<std::str::Utf8Error> for IngestError {
    fn from(e: std::str::Utf8Error) -> Self {
        Self { kind: ErrorKind::Decode, message: e.to_string() }
    }
}

impl From<std::string::FromUtf8Error> for IngestError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self { kind: ErrorKind::Decode, message: e.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_includes_kind() {
        let e = IngestError::transient("connection reset");
        assert_eq!(format!("{e:?}"), "[transient] connection reset");
        assert_eq!(e.to_string(), "connection reset");
    }

    #[test]
    fn from_impls_assign_kinds() {
        let e: IngestError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert_eq!(e.kind(), ErrorKind::Decode);

        let e: IngestError = std::io::Error::other("boom").into();
        assert_eq!(e.kind(), ErrorKind::Transient);
    }
}
