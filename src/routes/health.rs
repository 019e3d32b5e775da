use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::response::{ApiResponse, Meta};

#[derive(Serialize, ToSchema)]
pub struct PingData {
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/ping",
    responses(
        (status = 200, description = "OK", body = ApiResponse<PingData>),
    ),
        tag = "Health"
)]
pub async fn ping() -> Json<ApiResponse<PingData>> {
    let data = PingData {
        status: "ok".to_string(),
    };

    Json(ApiResponse::success("pong", data, Some(Meta::empty())))
}
