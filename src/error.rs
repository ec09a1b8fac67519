use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrainerError {
    /// Character outside the closed A-Z / 0-9 alphabet
    #[error("no Morse pattern for {0:?}")]
    UnknownSymbol(char),

    /// Nothing left to introduce from the back queue
    #[error("back queue is empty")]
    EmptyBackQueue,

    /// Both queues drained; the session is over
    #[error("training complete")]
    TrainingComplete,

    #[cfg(feature = "audio")]
    #[error("Audio error: {0}")]
    Audio(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrainerError>;
