use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PactError {
    #[error("[line {line}, col {column}] {message}")]
    Lexing {
        message: String,
        line: usize,
        column: usize,
    },
    #[error("[line {line}, col {column}] {message}")]
    Parsing {
        message: String,
        line: usize,
        column: usize,
    },
    #[error("Runtime error: {0}")]
    Runtime(String),
    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl PactError {
    pub fn lexing(message: impl Into<String>, line: usize, column: usize) -> Self {
        PactError::Lexing {
            message: message.into(),
            line,
            column,
        }
    }

    pub fn parsing(message: impl Into<String>, line: usize, column: usize) -> Self {
        PactError::Parsing {
            message: message.into(),
            line,
            column,
        }
    }

    /// Short class name used by audit trails and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            PactError::Lexing { .. } => "Lexing",
            PactError::Parsing { .. } => "Parsing",
            PactError::Runtime(_) => "Runtime",
            PactError::Transaction(_) => "Transaction",
        }
    }
}

pub type Result<T> = std::result::Result<T, PactError>;
