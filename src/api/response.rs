//! Success envelope: `{"success": true, "data": ...}`.

use axum::{http::StatusCode, Json};
use serde::Serialize;

use super::error::ApiError;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;
pub type Created<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse {
        success: true,
        data,
    }))
}

pub fn created<T: Serialize>(data: T) -> Created<T> {
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            success: true,
            data,
        }),
    ))
}

/// Body for deletes and other actions without a resource to return
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: String,
    pub deleted: bool,
}

pub fn deleted(id: impl Into<String>) -> ApiResult<Deleted> {
    ok(Deleted {
        id: id.into(),
        deleted: true,
    })
}
