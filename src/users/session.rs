//! Signed-in state as an explicit per-request context.
//!
//! Sign-in registers a session and hands out a bearer token naming it;
//! sign-out removes the session, which invalidates the token even before it
//! expires.

use std::{collections::HashMap, sync::Arc};

use axum::{
	async_trait,
	extract::FromRequestParts,
	http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, Rng};
use tokio::sync::RwLock;

use crate::{error::AppError, state::AppState};

#[derive(serde::Serialize, serde::Deserialize, Debug)]
struct Claims {
	sub: String,
	sid: String,
	iat: i64,
	exp: i64,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
	pub uid: String,
	pub session_id: String,
}

struct ActiveSession {
	uid: String,
	expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Sessions {
	encoding: EncodingKey,
	decoding: DecodingKey,
	ttl: Duration,
	active: Arc<RwLock<HashMap<String, ActiveSession>>>,
}

impl Sessions {
	pub fn new(secret: &str, ttl: Duration) -> Self {
		Sessions {
			encoding: EncodingKey::from_secret(secret.as_bytes()),
			decoding: DecodingKey::from_secret(secret.as_bytes()),
			ttl,
			active: Arc::new(RwLock::new(HashMap::new())),
		}
	}

	/// Starts a session for `uid` and returns its bearer token.
	pub async fn open(&self, uid: &str) -> Result<(String, AuthSession), AppError> {
		let now = Utc::now();
		let session_id = random_session_id();
		let claims = Claims {
			sub: uid.to_owned(),
			sid: session_id.clone(),
			iat: now.timestamp(),
			exp: (now + self.ttl).timestamp(),
		};
		let token = encode(&Header::default(), &claims, &self.encoding)
			.map_err(|e| AppError::Internal(anyhow::anyhow!("token signing failed: {e}")))?;

		let mut guard = self.active.write().await;
		guard.retain(|_, s| s.expires_at > now);
		guard.insert(
			session_id.clone(),
			ActiveSession {
				uid: uid.to_owned(),
				expires_at: now + self.ttl,
			},
		);

		Ok((token, AuthSession { uid: uid.to_owned(), session_id }))
	}

	pub async fn authenticate(&self, token: &str) -> Result<AuthSession, AppError> {
		let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(|e| {
			log::debug!("rejected token: {e}");
			AppError::Unauthorized
		})?;
		let claims = data.claims;

		let guard = self.active.read().await;
		match guard.get(&claims.sid) {
			Some(s) if s.uid == claims.sub && s.expires_at > Utc::now() => Ok(AuthSession {
				uid: claims.sub,
				session_id: claims.sid,
			}),
			_ => Err(AppError::Unauthorized),
		}
	}

	pub async fn close(&self, session: &AuthSession) -> bool {
		self.active.write().await.remove(&session.session_id).is_some()
	}
}

fn random_session_id() -> String {
	rand::thread_rng().sample_iter(&Alphanumeric).take(32).map(char::from).collect()
}

fn bearer(parts: &Parts) -> Option<&str> {
	parts
		.headers
		.get(AUTHORIZATION)
		.and_then(|v| v.to_str().ok())
		.and_then(|v| v.strip_prefix("Bearer "))
		.map(str::trim)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
	type Rejection = AppError;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
		let token = bearer(parts).ok_or(AppError::Unauthorized)?;
		state.sessions.authenticate(token).await
	}
}
