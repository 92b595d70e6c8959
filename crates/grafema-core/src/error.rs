use thiserror::Error;

/// The closed error taxonomy shared by every phase of the pipeline.
///
/// Each variant is a *kind*, not a wrapper around a foreign error type:
/// callers match on the kind to decide whether a failure is fatal
/// (`ConfigError`, a `PluginError` whose dependent plugin requires it) or
/// merely recorded as an `Issue` and skipped (everything else).
#[derive(Error, Debug)]
pub enum GrafemaError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file access error ({file}): {source}")]
    FileAccess {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("language error ({file}): {message}")]
    Language { file: String, message: String },

    #[error("analysis error ({file}): {message}")]
    Analysis { file: String, message: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("plugin error ({plugin}): {message}")]
    Plugin { plugin: String, message: String },

    #[error("{0}")]
    StrictMode(Box<GrafemaError>),

    #[error("run was cancelled")]
    Cancelled,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GrafemaError {
    /// Whether this error, by kind, always aborts the run (never becomes an
    /// `Issue`). Only `ConfigError` and a dependency-missing `PluginError`
    /// bubble out; everything else is local recovery.
    pub fn is_fatal_by_default(&self) -> bool {
        matches!(self, GrafemaError::Config(_) | GrafemaError::Yaml(_))
    }

    /// Promote any error to fatal, as `StrictModeError` does in configuration.
    pub fn into_strict(self) -> Self {
        GrafemaError::StrictMode(Box::new(self))
    }
}

pub type Result<T> = std::result::Result<T, GrafemaError>;
