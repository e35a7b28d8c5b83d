// ⚠️ Registry Errors
// Every failure is local to one call and leaves registry state unchanged.

use thiserror::Error;

/// Result type alias using the registry's error type.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// `(err u100)` - one or more registration fields failed validation
pub const ERR_INVALID_INPUT: u32 = 100;
/// `(err u101)` - the id counter cannot advance any further
pub const ERR_ID_SPACE_EXHAUSTED: u32 = 101;
/// `(err u500)` - the backing store failed
pub const ERR_STORAGE: u32 = 500;

// ============================================================================
// VALIDATION ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// REGISTRY ERROR
// ============================================================================

#[derive(Error, Debug)]
pub enum RegistryError {
    /// Empty text field, negative amount, or missing caller
    #[error("Invalid input: {}", join_errors(.0))]
    InvalidInput(Vec<ValidationError>),

    /// Counter overflow
    #[error("Equipment id space exhausted")]
    IdSpaceExhausted,

    /// Store fault (SQLite, serialization)
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl RegistryError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        RegistryError::InvalidInput(vec![ValidationError::new(field, message)])
    }

    /// Numeric code reported through the contract surface
    pub fn code(&self) -> u32 {
        match self {
            RegistryError::InvalidInput(_) => ERR_INVALID_INPUT,
            RegistryError::IdSpaceExhausted => ERR_ID_SPACE_EXHAUSTED,
            RegistryError::Storage(_) => ERR_STORAGE,
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, RegistryError::InvalidInput(_))
    }
}

impl From<rusqlite::Error> for RegistryError {
    fn from(err: rusqlite::Error) -> Self {
        RegistryError::Storage(err.into())
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
