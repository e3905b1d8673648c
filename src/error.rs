use thiserror::Error;

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Failures surfaced while wiring the page to the rendering module.
///
/// Everything here is fatal for the page view; nothing is retried.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("window not available")]
    WindowUnavailable,
    #[error("document not available")]
    DocumentUnavailable,
    #[error("canvas element not found: {0}")]
    CanvasNotFound(String),
    #[error("element is not a canvas: {0}")]
    NotACanvas(String),
    #[error("canvas does not support a {0} context")]
    ContextUnsupported(String),
    #[error("failed to load rendering module: {0}")]
    ModuleLoad(String),
    #[error("rendering module does not export `{0}`")]
    MissingExport(String),
    #[error("javascript error: {0}")]
    Js(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
