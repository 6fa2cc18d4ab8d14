use axum::{
	extract::DefaultBodyLimit,
	routing::{get, post},
	Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::{
	file_server::file_handler,
	listings::{
		boost::{confirm_boost, open_boost},
		listings::{create_listing, delete_listing, get_listing, get_listings, my_listings},
	},
	search::search,
	state::AppState,
	users::users::{create_user, get_profile, update_profile, user_login, user_logout},
};

async fn health() -> Json<Value> {
	Json(json!({ "status": "ok" }))
}

pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/listings", get(get_listings))
		.route("/listings/search", get(search))
		.route("/listing/new", post(create_listing))
		.route("/listing/:id", get(get_listing).delete(delete_listing))
		.route("/listing/:id/boost", post(open_boost))
		.route("/listing/:id/boost/confirm", post(confirm_boost))
		.route("/user/new", post(create_user))
		.route("/user/login", post(user_login))
		.route("/user/logout", post(user_logout))
		.route("/user/profile", get(get_profile).put(update_profile))
		.route("/user/listings", get(my_listings))
		.route("/files/*path", get(file_handler))
		.layer(DefaultBodyLimit::max(max_upload_bytes))
		.layer(CorsLayer::permissive())
		.with_state(state)
}
