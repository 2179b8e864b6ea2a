use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WidgetError {
    /// The widget model refuses bulk replacement of its internals.
    #[error("unsupported widget operation: {op}")]
    UnsupportedOperation { op: &'static str },

    #[error("widget is closed")]
    Closed,

    #[error("widget model already destroyed")]
    ModelDestroyed,

    #[error("renderer `{id}` is not attached to this widget")]
    RendererMissing { id: String },

    #[error("widget rejected renderer `{id}`: {reason}")]
    Rejected { id: String, reason: String },
}
