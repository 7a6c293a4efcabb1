use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub const MAX_RESULTS_LIMIT: usize = 500;

/// One extraction request: what to search for, where, and how many listings
/// to pull at most. Immutable once the session is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub keywords: String,
    pub location: String,
    pub max_results: usize,
}

impl SearchQuery {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.keywords.trim().is_empty() {
            return Err("Keywords are required".to_string());
        }
        if self.location.trim().is_empty() {
            return Err("Location is required".to_string());
        }
        if self.max_results == 0 || self.max_results > MAX_RESULTS_LIMIT {
            return Err(format!(
                "Max results must be between 1 and {}",
                MAX_RESULTS_LIMIT
            ));
        }
        Ok(())
    }
}

/// One extracted business listing. Every field except `name` is best-effort:
/// absent data stays `None`/empty, never a placeholder string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub rating: Option<f64>,
    pub reviews_count: Option<u32>,
    pub categories: Vec<String>,
    pub hours: Option<String>,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}
