// src/utils/errors.rs

use std::{error::Error, fmt};
use reqwest;
use serde_json;

/// Errors coming from external API calls (HTTP transport, bad status, JSON).
#[derive(Debug)]
pub enum ApiError {
    Http(reqwest::Error),
    Json(serde_json::Error),
    Status(u16),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Http(e)    => write!(f, "HTTP error: {}", e),
            ApiError::Json(e)    => write!(f, "JSON error: {}", e),
            ApiError::Status(s)  => write!(f, "provider returned status {}", s),
            ApiError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ApiError::Http(e)   => Some(e),
            ApiError::Json(e)   => Some(e),
            ApiError::Status(_) => None,
            ApiError::Other(_)  => None,
        }
    }
}

// Conversions from underlying errors into ApiError
impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self { ApiError::Http(err) }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self { ApiError::Json(err) }
}

impl From<String> for ApiError {
    fn from(msg: String) -> Self { ApiError::Other(msg) }
}
