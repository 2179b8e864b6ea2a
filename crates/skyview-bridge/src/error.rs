use skyview_widget::WidgetError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("figure has not finished loading")]
    NotReady,

    #[error("no element registered as `{id}`")]
    UnknownElement { id: String },

    #[error("element `{id}` is already registered")]
    DuplicateElement { id: String },

    #[error("element `{id}` is already mounted")]
    AlreadyMounted { id: String },

    #[error("element `{id}` is not mounted")]
    NotMounted { id: String },

    #[error("element `{id}` is a {found} renderable, expected {expected}")]
    KindMismatch {
        id: String,
        found: &'static str,
        expected: &'static str,
    },

    #[error(transparent)]
    Widget(#[from] WidgetError),
}
