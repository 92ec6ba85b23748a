use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SasResult<T> = Result<T, SasError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SasErrorCategory {
    Success,
    ConfigurationError,
    InputValidationError,
    IoSystemError,
    InternalError,
}

impl SasErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::ConfigurationError | Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::InternalError => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::ConfigurationError => "ConfigurationError",
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::InternalError => "InternalError",
        }
    }

    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Success)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SasError {
    category: SasErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl SasError {
    pub fn new(
        category: SasErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn configuration(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SasErrorCategory::ConfigurationError, placeholder, message)
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SasErrorCategory::InputValidationError, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SasErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SasErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> SasErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        let severity = if self.category.is_fatal() {
            "ERROR"
        } else {
            "INFO"
        };
        format!("{}: [{}] {}", severity, self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> Option<String> {
        self.category
            .is_fatal()
            .then(|| format!("FATAL EXIT CODE: {}", self.exit_code()))
    }
}

impl Display for SasError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.as_str(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for SasError {}
