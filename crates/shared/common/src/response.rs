//! Response envelopes returned across the service boundary.
//!
//! Wire shape: `{succeeded, message, errors, data, statusCode}`; the paged
//! variant adds `pageNumber`, `pageSize` and `pg_total`. Absent values are
//! serialised as `null` so consumers always see every field.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response as HttpResponse},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::pagination::Page;

/// Standard response wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response<T> {
    pub succeeded: bool,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    pub data: Option<T>,
    pub status_code: u16,
}

impl<T> Response<T> {
    pub fn success(data: T) -> Self {
        Self {
            succeeded: true,
            message: None,
            errors: None,
            data: Some(data),
            status_code: StatusCode::OK.as_u16(),
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success(data)
        }
    }

    pub fn failure_with_status(message: impl Into<String>, status_code: u16) -> Self {
        Self {
            succeeded: false,
            message: Some(message.into()),
            errors: None,
            data: None,
            status_code,
        }
    }
}

impl Response<()> {
    /// Successful response that only carries a message
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            message: Some(message.into()),
            errors: None,
            data: None,
            status_code: StatusCode::OK.as_u16(),
        }
    }
}

/// Paged response wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    #[serde(flatten)]
    pub response: Response<T>,
    pub page_number: u64,
    pub page_size: u64,
    #[serde(rename = "pg_total")]
    pub total_count: u64,
}

impl<T> PagedResponse<T> {
    pub fn new(data: T, page_number: u64, page_size: u64, total_count: u64) -> Self {
        Self {
            response: Response::success(data),
            page_number,
            page_size,
            total_count,
        }
    }

    /// Wrap a failed envelope, echoing the requested page
    pub fn failure(response: Response<T>, page_number: u64, page_size: u64) -> Self {
        Self {
            response,
            page_number,
            page_size,
            total_count: 0,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.response.succeeded
    }
}

impl<T> From<Page<T>> for PagedResponse<Vec<T>> {
    fn from(page: Page<T>) -> Self {
        PagedResponse::new(page.items, page.page_number, page.page_size, page.total_count)
    }
}

fn status_of(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl<T: Serialize> IntoResponse for Response<T> {
    fn into_response(self) -> HttpResponse {
        (status_of(self.status_code), Json(self)).into_response()
    }
}

impl<T: Serialize> IntoResponse for PagedResponse<T> {
    fn into_response(self) -> HttpResponse {
        (status_of(self.response.status_code), Json(self)).into_response()
    }
}
