use thiserror::Error;

/// Result type alias for exporter operations
pub type Result<T, E = ExportError> = std::result::Result<T, E>;

/// Errors that can occur while generating a document.
///
/// Each variant corresponds to one stage of the generation flow, so a caller
/// can tell a submission that never started from a job the provider killed
/// or a finished artifact that could not be downloaded.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("job submission failed: {0}")]
    Submission(String),

    #[error("provider broke its contract: {0}")]
    Protocol(String),

    #[error("status check failed: {0}")]
    Polling(String),

    #[error("job still pending after {attempts} polls")]
    TimedOut { attempts: u32 },

    #[error("provider reported terminal status: {status}")]
    Provider { status: String },

    #[error("artifact download failed: {0}")]
    Download(String),

    #[error("conversion failed with status {status}: {body}")]
    Conversion { status: u16, body: String },

    /// Stage-1 failure of the chained flow. Carries whatever markup the
    /// renderer produced before failing, for diagnostics.
    #[error("order markup render failed: {detail}")]
    UpstreamRender { detail: String, markup: String },

    /// Stage-2 failure of the chained flow. Carries the finished markup so
    /// the caller can retry conversion without re-rendering.
    #[error("document conversion failed after render")]
    ChainConversion {
        markup: String,
        #[source]
        source: Box<ExportError>,
    },

    #[error("artifact payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
}
