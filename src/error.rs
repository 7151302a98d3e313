use thiserror::Error;

#[derive(Error, Debug)]
pub enum UptimeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    
    #[error("Malformed sample for tag {tag_id} at {timestamp}: {message}")]
    MalformedSample {
        tag_id: u32,
        timestamp: i64,
        message: String,
    },
    
    #[error("Unknown time range option: {0}")]
    UnknownRange(String),
    
    #[error("Invalid time range: {message}")]
    InvalidRange { message: String },
    
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl UptimeError {
    /// True for errors caused by the caller's request rather than by the data or the store.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            UptimeError::UnknownRange(_)
                | UptimeError::InvalidRange { .. }
                | UptimeError::InvalidInput { .. }
        )
    }
}

pub type UptimeResult<T> = Result<T, UptimeError>;
