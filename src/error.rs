use axum::{
	extract::{
		multipart::MultipartRejection,
		rejection::{JsonRejection, QueryRejection},
	},
	response::{IntoResponse, Response},
	Json,
};
use hyper::StatusCode;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

pub const LISTING_NOT_FOUND: &str = "Product not found.";
pub const CREATE_LISTING_FAILED: &str = "Failed to create listing. Please try again.";
pub const BOOST_UPDATE_FAILED: &str = "Payment successful but failed to update ad status. Please contact support.";

#[derive(Error, Debug)]
pub enum AppError {
	#[error("{0}")]
	Validation(String),

	#[error("Please log in to continue")]
	Unauthorized,

	#[error("Invalid email or password")]
	InvalidCredentials,

	#[error("You can only manage your own ads")]
	Forbidden,

	#[error("{0}")]
	NotFound(&'static str),

	#[error("{0}")]
	Conflict(String),

	#[error("{0}")]
	Upstream(String),

	#[error("{0}")]
	Failed(&'static str),

	#[error(transparent)]
	Store(#[from] StoreError),

	#[error(transparent)]
	Internal(#[from] anyhow::Error),
}

impl AppError {
	pub fn validation(message: impl Into<String>) -> Self {
		AppError::Validation(message.into())
	}

	fn status(&self) -> StatusCode {
		match self {
			AppError::Validation(_) => StatusCode::BAD_REQUEST,
			AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
			AppError::Forbidden => StatusCode::FORBIDDEN,
			AppError::NotFound(_) => StatusCode::NOT_FOUND,
			AppError::Conflict(_) => StatusCode::CONFLICT,
			AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
			AppError::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
			AppError::Store(StoreError::EmailTaken) => StatusCode::CONFLICT,
			AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl From<JsonRejection> for AppError {
	fn from(rejection: JsonRejection) -> Self {
		AppError::Validation(rejection.body_text())
	}
}

impl From<QueryRejection> for AppError {
	fn from(rejection: QueryRejection) -> Self {
		AppError::Validation(rejection.body_text())
	}
}

impl From<MultipartRejection> for AppError {
	fn from(rejection: MultipartRejection) -> Self {
		AppError::Validation(rejection.body_text())
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response {
		let status = self.status();
		let message = match &self {
			AppError::Store(StoreError::EmailTaken) => self.to_string(),
			AppError::Store(e) => {
				log::error!("store error: {e}");
				"Something went wrong. Please try again.".to_string()
			}
			AppError::Internal(e) => {
				log::error!("internal error: {e:?}");
				"Something went wrong. Please try again.".to_string()
			}
			_ => self.to_string(),
		};
		(status, Json(json!({ "error": message }))).into_response()
	}
}
