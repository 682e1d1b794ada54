use thiserror::Error;

#[derive(Error, Debug)]
pub enum CartError {
    #[error("Malformed store data: {message}")]
    MalformedStoreData { message: String },

    #[error("Persistence write failed: {message}")]
    PersistenceWriteFailure { message: String },

    #[error("Quantity {attempted} for event '{event_id}' is outside 1..={max}")]
    QuantityBoundsViolation {
        event_id: String,
        attempted: i64,
        max: u32,
    },

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Checkout has not been submitted")]
    CheckoutNotStarted,

    #[error("Unknown event: {event_id}")]
    UnknownEvent { event_id: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CartError {
    /// 錯誤嚴重程度，CLI 依此決定結束碼
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CartError::MalformedStoreData { .. } | CartError::PersistenceWriteFailure { .. } => {
                ErrorSeverity::Low
            }
            CartError::QuantityBoundsViolation { .. }
            | CartError::EmptyCart
            | CartError::CheckoutNotStarted
            | CartError::UnknownEvent { .. } => ErrorSeverity::Medium,
            CartError::ConfigError { .. }
            | CartError::ValidationError { .. }
            | CartError::InvalidConfigValueError { .. }
            | CartError::TomlError(_)
            | CartError::SerializationError(_) => ErrorSeverity::High,
            CartError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CartError::QuantityBoundsViolation { max, .. } => {
                format!("You can book a maximum of {} tickets per event", max)
            }
            CartError::EmptyCart => "Your cart is empty. Add some tickets first!".to_string(),
            CartError::UnknownEvent { event_id } => format!("No event found with id '{}'", event_id),
            CartError::PersistenceWriteFailure { .. } => {
                "Your cart could not be saved; changes are kept for this session only".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CartError::QuantityBoundsViolation { .. } => "Choose a quantity between 1 and 10",
            CartError::EmptyCart => "Add tickets with the 'add' command before checking out",
            CartError::CheckoutNotStarted => "Submit the checkout before completing it",
            CartError::UnknownEvent { .. } => "List available events with the 'events' command",
            CartError::MalformedStoreData { .. } | CartError::PersistenceWriteFailure { .. } => {
                "Check that the store file is writable and not corrupted"
            }
            CartError::ConfigError { .. }
            | CartError::InvalidConfigValueError { .. }
            | CartError::TomlError(_) => "Check the configuration file syntax and values",
            CartError::ValidationError { .. } => "Correct the highlighted input and try again",
            CartError::IoError(_) => "Check file permissions and available disk space",
            CartError::SerializationError(_) => "Inspect the stored JSON for invalid content",
        }
    }
}

pub type Result<T> = std::result::Result<T, CartError>;
