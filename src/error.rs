use thiserror::Error;

/// A single failed field: path into the submitted habit (e.g.
/// `schedule.daysOfWeek`) plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Field-scoped validation failure. All failing fields are reported at once;
/// nothing is persisted when this is returned.
#[derive(Debug, Clone, Default, Error)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn names_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "Invalid habit: {}", parts.join("; "))
    }
}

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Ambiguous(String),

    #[error("{0}")]
    Io(String),

    #[error("{0}")]
    Auth(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),
}

impl AppError {
    pub fn usage(message: impl Into<String>) -> Self {
        AppError::Usage(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn ambiguous(message: impl Into<String>) -> Self {
        AppError::Ambiguous(message.into())
    }

    pub fn io(message: impl Into<String>) -> Self {
        AppError::Io(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        AppError::Auth(message.into())
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Usage(_) | AppError::Validation(_) => 2,
            AppError::NotFound(_) => 3,
            AppError::Ambiguous(_) => 4,
            AppError::Io(_) => 5,
            AppError::Auth(_) => 6,
            AppError::Api { .. } => 7,
            AppError::Network(_) => 8,
        }
    }
}
