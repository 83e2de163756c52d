use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("browser error: {0}")]
    Browser(String),

    #[error("navigation error: {0}")]
    Navigation(String),

    #[error("loading error: {0}")]
    Loading(String),

    #[error("extraction error: {0}")]
    Extraction(String),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("usage: reviewscraper \"<business name>\"")]
    Usage,
}

pub type ScraperResult<T> = Result<T, ScraperError>;
