use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}")]
    Api { status: u16 },

    #[error("Empty response body")]
    EmptyResponse,

    #[error("No data found for {0}")]
    NotFound(String),

    #[error("No internet connection and no cached data available")]
    NoData,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Error screen variant shown by the presentation layer.
///
/// Classification is by substring matching on the error text, mirroring how
/// load errors bubble up as opaque messages from the paging chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorView {
    /// No usable network and nothing cached to show.
    Network,
    /// Remote answered with an HTTP error status.
    Http(u16),
    /// Anything else, with the raw message.
    General(String),
}

impl ErrorView {
    pub fn from_message(message: &str) -> Self {
        if message.contains("No internet connection") {
            return ErrorView::Network;
        }
        if message.contains("Network error")
            || message.contains("error sending request")
            || message.contains("Unable to resolve host")
            || message.contains("timed out")
        {
            return ErrorView::Network;
        }
        if message.contains("HTTP 404") {
            return ErrorView::Http(404);
        }
        if let Some(rest) = message.split("HTTP 5").nth(1) {
            let code: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            let status = format!("5{code}").parse().unwrap_or(500);
            return ErrorView::Http(status);
        }
        ErrorView::General(message.to_string())
    }

    pub fn from_error(err: &AppError) -> Self {
        Self::from_message(&err.to_string())
    }
}
