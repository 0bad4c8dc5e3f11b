//! Shared application state for request handlers

use super::config::Configuration;

/// State handed to every handler via `web::Data`
#[derive(Clone)]
pub struct AppState {
    pub configuration: Configuration,
}

impl AppState {
    pub fn new(configuration: Configuration) -> Self {
        Self { configuration }
    }
}
