use thiserror::Error;

use funcpack_ir::RenderError;

/// Why one output unit could not be serialized.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("tag serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// A failed output unit: the file that would have been written and why
/// it was skipped. The rest of the output is still produced.
#[derive(Debug)]
pub struct EmitFailure {
    pub path: String,
    pub error: EmitError,
}
