use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PageError {
    #[error("Invalid page URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
}
