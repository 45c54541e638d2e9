use thiserror::Error;

/// Fatal configuration problems. Raised before any provider request is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Errors surfaced by destination and artifact sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The destination could not be reached or the statement failed.
    #[error("destination {destination} unavailable: {reason}")]
    Unavailable { destination: String, reason: String },

    /// The destination exists but does not accept the row shape.
    #[error("schema mismatch on {destination}: {reason}")]
    SchemaMismatch { destination: String, reason: String },

    /// Snapshot artifact could not be written.
    #[error("artifact write failed for {path}: {reason}")]
    Artifact { path: String, reason: String },
}
