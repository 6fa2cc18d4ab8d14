use axum::{
	extract::{Path, State},
	Json,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use serde_json::{json, Value};

use super::{
	listing::{boost_expiry, BOOST_DAYS},
	listings::owned_listing,
};
use crate::{
	error::{AppError, BOOST_UPDATE_FAILED, LISTING_NOT_FOUND},
	payment_gateway::checkout::CheckoutSession,
	state::AppState,
	users::session::AuthSession,
};

#[derive(serde::Deserialize, Debug)]
pub struct BoostConfirmation {
	pub payment_id: String,
}

/// Returns the widget options for paying the boost fee.
pub async fn open_boost(State(state): State<AppState>, session: AuthSession, Path(id): Path<String>) -> Result<Json<CheckoutSession>, AppError> {
	let listing = owned_listing(&state, &session, &id).await?;
	if listing.is_boosted {
		return Err(AppError::Conflict("This ad is already boosted".to_string()));
	}
	let buyer = state.profiles.profile(&session.uid).await?;
	let checkout = state.payments.open_checkout(&listing, buyer.as_ref()).await?;
	Ok(Json(checkout))
}

/// Checkout success callback. The payment id is taken at face value.
pub async fn confirm_boost(
	State(state): State<AppState>,
	session: AuthSession,
	Path(id): Path<String>,
	WithRejection(Json(confirmation), _): WithRejection<Json<BoostConfirmation>, AppError>,
) -> Result<Json<Value>, AppError> {
	let payment_id = confirmation.payment_id.trim();
	if payment_id.is_empty() {
		return Err(AppError::validation("Missing payment id"));
	}
	let mut listing = owned_listing(&state, &session, &id).await?;

	let now = Utc::now();
	let until = boost_expiry(now);
	match state.listings.set_boost(&id, until).await {
		Ok(true) => {}
		Ok(false) => return Err(AppError::NotFound(LISTING_NOT_FOUND)),
		Err(e) => {
			log::error!("payment {payment_id} received but boosting {id} failed: {e}");
			return Err(AppError::Failed(BOOST_UPDATE_FAILED));
		}
	}
	listing.boost(now);
	log::info!("listing {} boosted until {} (payment {})", id, until, payment_id);

	Ok(Json(json!({
		"listing": listing,
		"payment_id": payment_id,
		"message": format!("Success! Payment ID: {payment_id}. Your ad is now boosted for {BOOST_DAYS} days."),
	})))
}
