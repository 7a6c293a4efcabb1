use rocket::http::{ContentType, Header};
use rocket::serde::json::Json;
use rocket::{get, Responder, State};
use uuid::Uuid;

use crate::api::ApiResponse;
use crate::export::{self, ExportError, ExportFormat};
use crate::server::ServerState;

#[derive(Responder)]
pub enum DownloadResponse {
    #[response(status = 200)]
    File(Vec<u8>, ContentType, Header<'static>),
    #[response(status = 404)]
    NotFound(Json<ApiResponse<()>>),
    #[response(status = 409)]
    NotReady(Json<ApiResponse<()>>),
    #[response(status = 422)]
    NoData(Json<ApiResponse<()>>),
    #[response(status = 500)]
    Failed(Json<ApiResponse<()>>),
}

fn refusal(message: String) -> Json<ApiResponse<()>> {
    Json(ApiResponse::error(message))
}

#[get("/download/<session_id>?<format>")]
pub async fn download_results(
    state: &State<ServerState>,
    session_id: Uuid,
    format: Option<ExportFormat>,
) -> DownloadResponse {
    let format = format.unwrap_or(ExportFormat::Csv);

    let Some(snapshot) = state.registry.snapshot(&session_id).await else {
        return DownloadResponse::NotFound(refusal("Session not found".to_string()));
    };

    match export::encode(&snapshot, format, state.config.output.pretty_json) {
        Ok(bytes) => {
            let content_type = match format {
                ExportFormat::Csv => ContentType::CSV,
                ExportFormat::Json => ContentType::JSON,
            };
            let filename = export::download_filename(&snapshot, format);
            DownloadResponse::File(
                bytes,
                content_type,
                Header::new(
                    "Content-Disposition",
                    format!("attachment; filename=\"{}\"", filename),
                ),
            )
        }
        Err(e @ ExportError::NotReady(_)) => DownloadResponse::NotReady(refusal(e.to_string())),
        Err(e @ ExportError::NoData) => DownloadResponse::NoData(refusal(e.to_string())),
        Err(e @ ExportError::Encode(_)) => DownloadResponse::Failed(refusal(e.to_string())),
    }
}
