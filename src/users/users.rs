use argon2::{
	password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
	Argon2,
};
use axum::{
	extract::{Multipart, State},
	Json,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use hyper::StatusCode;
use postgres_from_row::FromRow;
use serde_json::{json, Value};

use super::session::AuthSession;
use crate::{
	encryption_engine,
	error::AppError,
	file_server::image_extension,
	state::AppState,
};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, FromRow)]
pub struct UserProfile {
	pub uid: String,
	pub name: String,
	pub email: String,
	pub profile_image: Option<String>,
}

#[derive(serde::Deserialize, Debug)]
pub struct Registration {
	name: String,
	email: String,
	password: String,
}

#[derive(serde::Deserialize, Debug)]
pub struct Logins {
	email: String,
	password: String,
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
	let salt = SaltString::generate(&mut OsRng);
	Argon2::default()
		.hash_password(password.as_bytes(), &salt)
		.map(|h| h.to_string())
		.map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
	match PasswordHash::new(hash) {
		Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
		Err(_) => false,
	}
}

fn signed_in(token: String, profile: &UserProfile) -> Json<Value> {
	Json(json!({ "token": token, "profile": profile }))
}

pub async fn create_user(
	State(state): State<AppState>,
	WithRejection(Json(user), _): WithRejection<Json<Registration>, AppError>,
) -> Result<(StatusCode, Json<Value>), AppError> {
	let name = user.name.trim();
	let email = user.email.trim().to_lowercase();
	if name.is_empty() {
		return Err(AppError::validation("Name is required"));
	}
	if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
		return Err(AppError::validation("Please enter a valid email"));
	}
	if user.password.chars().count() < MIN_PASSWORD_LEN {
		return Err(AppError::validation("Password should be at least 6 characters"));
	}

	let profile = UserProfile {
		uid: encryption_engine::user_id(&email, Utc::now()),
		name: name.to_owned(),
		email,
		profile_image: None,
	};
	let hash = hash_password(&user.password)?;
	state.profiles.create_account(&profile, &hash).await?;
	log::info!("registered user {}", profile.uid);

	let (token, _) = state.sessions.open(&profile.uid).await?;
	Ok((StatusCode::CREATED, signed_in(token, &profile)))
}

pub async fn user_login(
	State(state): State<AppState>,
	WithRejection(Json(logins), _): WithRejection<Json<Logins>, AppError>,
) -> Result<Json<Value>, AppError> {
	let Some(account) = state.profiles.account_by_email(logins.email.trim()).await? else {
		return Err(AppError::InvalidCredentials);
	};
	if !verify_password(&logins.password, &account.password_hash) {
		return Err(AppError::InvalidCredentials);
	}
	let (token, _) = state.sessions.open(&account.profile.uid).await?;
	Ok(signed_in(token, &account.profile))
}

pub async fn user_logout(State(state): State<AppState>, session: AuthSession) -> StatusCode {
	state.sessions.close(&session).await;
	StatusCode::NO_CONTENT
}

pub async fn get_profile(State(state): State<AppState>, session: AuthSession) -> Result<Json<UserProfile>, AppError> {
	state
		.profiles
		.profile(&session.uid)
		.await?
		.map(Json)
		.ok_or(AppError::NotFound("Profile not found."))
}

/// Multipart fields: `name` (required) and an optional `image` file.
pub async fn update_profile(
	State(state): State<AppState>,
	session: AuthSession,
	WithRejection(mut multipart, _): WithRejection<Multipart, AppError>,
) -> Result<Json<Value>, AppError> {
	let mut name = String::new();
	let mut image = None;

	while let Some(field) = multipart
		.next_field()
		.await
		.map_err(|e| AppError::validation(format!("Malformed upload: {e}")))?
	{
		let field_name = field.name().unwrap_or_default().to_string();
		match field_name.as_str() {
			"name" => {
				name = field.text().await.map_err(|e| AppError::validation(format!("Malformed upload: {e}")))?;
			}
			"image" => {
				let data = field.bytes().await.map_err(|e| AppError::validation(format!("Malformed upload: {e}")))?;
				if !data.is_empty() {
					image = Some(data);
				}
			}
			_ => {}
		}
	}

	let name = name.trim();
	if name.is_empty() {
		return Err(AppError::validation("Name is required"));
	}

	let avatar_url = match image {
		Some(data) => {
			let ext = image_extension(&data).map_err(|e| AppError::validation(e.to_string()))?;
			let key = format!("users/{}/profile_{}.{}", session.uid, Utc::now().timestamp_millis(), ext);
			let url = state.storage.upload(&key, &data).await.map_err(|e| {
				log::error!("avatar upload for {} failed: {e}", session.uid);
				AppError::Failed("Failed to update profile.")
			})?;
			Some(url)
		}
		None => None,
	};

	let profile = state
		.profiles
		.update_profile(&session.uid, name, avatar_url.as_deref())
		.await?
		.ok_or(AppError::NotFound("Profile not found."))?;

	Ok(Json(json!({
		"profile": profile,
		"message": "Profile updated successfully!"
	})))
}
