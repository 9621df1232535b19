use ingest_api::IngestError;

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("line {line}: {message}")]
    Capture { line: usize, message: String },

    #[error("{0}")]
    Ingest(#[from] IngestError),
}
