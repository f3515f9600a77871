use thiserror::Error;

#[derive(Error, Debug)]
pub enum MoneyboxError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown transaction: {0}")]
    UnknownTransaction(String),

    #[error("Unknown savings goal: {0}")]
    UnknownGoal(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, MoneyboxError>;
