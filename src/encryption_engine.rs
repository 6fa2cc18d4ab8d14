use base64::{
	alphabet,
	engine::{self, general_purpose},
	Engine,
};
use chrono::{DateTime, Utc};

pub const CUSTOM_ENGINE: engine::GeneralPurpose = engine::GeneralPurpose::new(&alphabet::URL_SAFE, general_purpose::NO_PAD);

/// User ids are the URL-safe encoding of the email and the registration
/// instant, so they are stable and safe inside object keys.
pub fn user_id(email: &str, registered_at: DateTime<Utc>) -> String {
	let timestamp = registered_at.format("%Y%m%d%H%M%S%f").to_string();
	CUSTOM_ENGINE.encode(format!("{}-{}", email, timestamp))
}
