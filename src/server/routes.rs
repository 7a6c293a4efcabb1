// Additional route configurations; the session and export routes live in
// their respective API modules.

pub mod health {
    use rocket::{get, serde::json::Json};
    use serde_json::{json, Value};

    #[get("/health")]
    pub async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "service": "listing-scraper-api"
        }))
    }

    #[get("/")]
    pub async fn index() -> Json<Value> {
        Json(json!({
            "name": "Listing Scraper API",
            "version": "0.1.0",
            "description": "API for extracting business listings and tracking extraction sessions",
            "endpoints": {
                "health": "/api/health",
                "scrape": "/api/scrape",
                "progress": "/api/progress/<session_id>",
                "results": "/api/results/<session_id>",
                "download": "/api/download/<session_id>?format=csv|json",
                "cancel": "/api/cancel/<session_id>",
                "sessions": "/api/sessions"
            }
        }))
    }
}
