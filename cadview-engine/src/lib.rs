pub mod command;
pub mod render;
pub mod session;
pub mod viewport;

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("a drawing is already being loaded")]
        LoadInProgress,
        #[error("no load is pending")]
        NoLoadPending,
        #[error("layer {0:?} not found")]
        LayerNotFound(String),
    }
}
