use thiserror::Error;

/// Data errors raised while turning raw rows into lineup structures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineupError {
    #[error("malformed match clock: {raw:?}")]
    MalformedClock { raw: String },

    #[error("{file} has no column {column:?}")]
    MissingColumn { file: String, column: String },

    #[error("no {what} to process")]
    EmptyInput { what: String },
}
