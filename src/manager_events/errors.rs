use std::fmt;

#[derive(Debug)]
pub enum EventStoreError {
    NotFound(String),
    Io(String),
    Document(String),
    MissingList(String),
    InvalidRecord(String),
}

impl EventStoreError {
    /// True when the error was caused by the submitted record rather than the store itself
    pub fn is_user_error(&self) -> bool {
        matches!(self, EventStoreError::InvalidRecord(_))
    }
}

impl fmt::Display for EventStoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventStoreError::NotFound(e) => write!(f, "EventStoreError::NotFound: {}", e),
            EventStoreError::Io(e) => write!(f, "EventStoreError::Io: {}", e),
            EventStoreError::Document(e) => write!(f, "EventStoreError::Document: {}", e),
            EventStoreError::MissingList(e) => write!(f, "EventStoreError::MissingList: {}", e),
            EventStoreError::InvalidRecord(e) => write!(f, "EventStoreError::InvalidRecord: {}", e),
        }
    }
}
impl From<std::io::Error> for EventStoreError {
    fn from(e: std::io::Error) -> Self {
        EventStoreError::Io(e.to_string())
    }
}
impl From<serde_json::Error> for EventStoreError {
    fn from(e: serde_json::Error) -> Self {
        EventStoreError::Document(e.to_string())
    }
}
impl From<tempfile::PersistError> for EventStoreError {
    fn from(e: tempfile::PersistError) -> Self {
        EventStoreError::Io(e.to_string())
    }
}
impl From<chrono::format::ParseError> for EventStoreError {
    fn from(e: chrono::format::ParseError) -> Self {
        EventStoreError::InvalidRecord(e.to_string())
    }
}
