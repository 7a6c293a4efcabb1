use rocket::{routes, Build, Rocket};

use crate::api::export::download_results;
use crate::api::sessions::{
    cancel_session, get_progress, get_results, list_sessions, start_scrape,
};
use crate::config::Config;
use crate::session::SessionRegistry;

pub mod routes;

pub struct ServerState {
    pub config: Config,
    pub registry: SessionRegistry,
}

pub fn build_rocket(config: Config, registry: SessionRegistry) -> Rocket<Build> {
    let state = ServerState { config, registry };

    rocket::build().manage(state).mount(
        "/api",
        routes![
            // Health and info endpoints
            routes::health::health_check,
            routes::health::index,
            // Extraction session endpoints
            start_scrape,
            get_progress,
            get_results,
            cancel_session,
            list_sessions,
            // Export endpoint
            download_results,
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;

    async fn client() -> Client {
        let rocket = build_rocket(Config::default(), SessionRegistry::new());
        Client::tracked(rocket).await.expect("valid rocket instance")
    }

    #[tokio::test]
    async fn invalid_query_is_rejected_without_creating_a_session() {
        let client = client().await;

        let response = client
            .post("/api/scrape")
            .header(ContentType::JSON)
            .body(r#"{"keywords": "", "location": "Seattle, WA", "max_results": 10}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);

        let sessions = client.get("/api/sessions").dispatch().await;
        let body = sessions.into_string().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["data"]["sessions"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn out_of_range_max_results_is_rejected() {
        let client = client().await;

        let response = client
            .post("/api/scrape")
            .header(ContentType::JSON)
            .body(r#"{"keywords": "coffee", "location": "Seattle, WA", "max_results": 501}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
    }

    #[tokio::test]
    async fn unknown_session_ids_are_not_found() {
        let client = client().await;
        let missing = uuid::Uuid::new_v4();

        for path in [
            format!("/api/progress/{}", missing),
            format!("/api/results/{}", missing),
            format!("/api/download/{}", missing),
        ] {
            let response = client.get(path.as_str()).dispatch().await;
            assert_eq!(response.status(), Status::NotFound, "GET {}", path);
        }

        let response = client
            .post(format!("/api/cancel/{}", missing))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[tokio::test]
    async fn health_endpoint_reports_healthy() {
        let client = client().await;
        let response = client.get("/api/health").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        assert!(body.contains("healthy"));
    }
}
