use std::fmt;

/// Error type shared by every storage driver.
///
/// Drivers normalize their store-specific "no such row" signal into
/// [`DriverError::NotFound`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// Record absent from the backing collection or table.
    NotFound { resource_type: String, id: String },
    /// Malformed inbound document.
    Validation(String),
    /// Backing store unreachable, misconfigured, or not connected yet.
    Connection(String),
    /// A record with this id already exists.
    Conflict { resource_type: String, id: String },
    /// Record could not be encoded or decoded.
    Serde(String),
    /// Any other backing store failure.
    Storage(String),
    LockPoisoned(&'static str),
    /// No driver registered under this name.
    UnknownDriver(String),
}

impl DriverError {
    pub fn not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        DriverError::NotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DriverError::NotFound { .. })
    }

    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            DriverError::NotFound { .. } => 404,
            DriverError::Validation(_) => 422,
            DriverError::Conflict { .. } => 409,
            DriverError::Connection(_)
            | DriverError::Serde(_)
            | DriverError::Storage(_)
            | DriverError::LockPoisoned(_)
            | DriverError::UnknownDriver(_) => 500,
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::NotFound { resource_type, id } => {
                write!(f, "record not found: {}:{}", resource_type, id)
            }
            DriverError::Validation(msg) => write!(f, "invalid document: {}", msg),
            DriverError::Connection(msg) => write!(f, "connection error: {}", msg),
            DriverError::Conflict { resource_type, id } => {
                write!(f, "record already exists: {}:{}", resource_type, id)
            }
            DriverError::Serde(msg) => write!(f, "record serialization error: {}", msg),
            DriverError::Storage(msg) => write!(f, "storage error: {}", msg),
            DriverError::LockPoisoned(operation) => {
                write!(f, "driver lock poisoned during {}", operation)
            }
            DriverError::UnknownDriver(name) => write!(f, "unknown database driver '{}'", name),
        }
    }
}

impl std::error::Error for DriverError {}

impl From<serde_json::Error> for DriverError {
    fn from(err: serde_json::Error) -> Self {
        DriverError::Serde(err.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for DriverError {
    fn from(err: rusqlite::Error) -> Self {
        let cannot_open = matches!(
            &err,
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.code == rusqlite::ErrorCode::CannotOpen
        );
        if cannot_open {
            DriverError::Connection(err.to_string())
        } else {
            DriverError::Storage(err.to_string())
        }
    }
}
