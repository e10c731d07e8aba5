use thiserror::Error;

#[derive(Error, Debug)]
pub enum LexError {
    #[error("unknown page '{0}'")]
    UnknownPage(String),

    #[error("page '{0}' has no sections")]
    EmptyCatalog(String),

    #[error("unknown section '{section}' for page '{page}'")]
    UnknownSection { page: String, section: String },

    #[error("field '{field}' is not part of section '{section}'")]
    UnknownField { section: String, field: String },

    #[error("invalid value '{value}' for field '{field}': {reason}")]
    InvalidFilterValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("fetch failed: {0}")]
    Fetch(#[from] crate::remote::FetchError),

}

pub type Result<T> = std::result::Result<T, LexError>;
