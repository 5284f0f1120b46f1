use thiserror::Error;

pub mod checksums;
pub mod library;
pub mod lockfile;
pub mod repository;
pub mod source;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported integrity `{0}`, expected a sha512 digest")]
    UnsupportedIntegrityAlgorithm(String),
    #[error("Malformed git URL `{0}`")]
    MalformedGitUrl(String),
    #[error("Malformed {what}: `{input}`")]
    MalformedInput { what: &'static str, input: String },
}

impl ParseError {
    pub(crate) fn malformed(what: &'static str, input: impl Into<String>) -> Self {
        ParseError::MalformedInput {
            what,
            input: input.into(),
        }
    }
}
