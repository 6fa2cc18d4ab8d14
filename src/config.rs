use std::{env, fmt::Display, str::FromStr};

use anyhow::{anyhow, Context};
use log::{info, warn};

const DEV_JWT_SECRET: &str = "dev-only-secret-change-me";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
	Postgres,
	Memory,
}

impl FromStr for StoreBackend {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"postgres" => Ok(StoreBackend::Postgres),
			"memory" => Ok(StoreBackend::Memory),
			other => Err(format!("expected `postgres` or `memory`, got `{other}`")),
		}
	}
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
	pub host: String,
	pub user: String,
	pub password: String,
	pub dbname: String,
}

#[derive(Debug, Clone)]
pub struct MerchantConfig {
	pub key_id: String,
	pub key_secret: Option<String>,
	pub api_base: String,
	pub name: String,
}

#[derive(Debug, Clone)]
pub struct Config {
	pub bind_addr: String,
	pub store: StoreBackend,
	pub database: DatabaseConfig,
	pub storage_root: String,
	pub public_base_url: String,
	pub jwt_secret: String,
	pub session_ttl_hours: i64,
	pub max_upload_bytes: usize,
	pub merchant: MerchantConfig,
}

impl Config {
	pub fn from_env() -> anyhow::Result<Self> {
		Self::from_lookup(|key| env::var(key).ok())
	}

	/// Builds the configuration from any key lookup, logging every default
	/// that gets applied.
	pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let jwt_secret = match lookup("JWT_SECRET") {
			Some(secret) if !secret.trim().is_empty() => secret,
			_ => {
				warn!("JWT_SECRET not set, falling back to the development secret");
				DEV_JWT_SECRET.to_string()
			}
		};

		let bind_addr: String = try_load(&lookup, "BIND_ADDR", "0.0.0.0:4000")?;
		let public_base_url: String = try_load(&lookup, "PUBLIC_BASE_URL", "http://localhost:4000")?;

		Ok(Config {
			store: try_load(&lookup, "STORE_BACKEND", "postgres")?,
			database: DatabaseConfig {
				host: try_load(&lookup, "PG_HOST", "localhost")?,
				user: try_load(&lookup, "PG_USER", "ubuntu")?,
				password: lookup("PG_PASSWORD").unwrap_or_default(),
				dbname: try_load(&lookup, "PG_DBNAME", "classifieds")?,
			},
			storage_root: try_load(&lookup, "STORAGE_ROOT", "images")?,
			public_base_url: public_base_url.trim_end_matches('/').to_string(),
			jwt_secret,
			session_ttl_hours: try_load(&lookup, "SESSION_TTL_HOURS", "24")?,
			max_upload_bytes: try_load(&lookup, "MAX_UPLOAD_BYTES", "26214400")?,
			merchant: MerchantConfig {
				key_id: try_load(&lookup, "RAZORPAY_KEY_ID", "rzp_test_PlaceHolderKey")?,
				key_secret: lookup("RAZORPAY_KEY_SECRET").filter(|s| !s.is_empty()),
				api_base: try_load(&lookup, "RAZORPAY_API_BASE", "https://api.razorpay.com")?,
				name: try_load(&lookup, "MERCHANT_NAME", "Andaman Connect")?,
			},
			bind_addr,
		})
	}
}

fn try_load<T, F>(lookup: &F, key: &str, default: &str) -> anyhow::Result<T>
where
	T: FromStr,
	T::Err: Display,
	F: Fn(&str) -> Option<String>,
{
	let raw = lookup(key).unwrap_or_else(|| {
		info!("{key} not set, using default: {default}");
		default.to_string()
	});
	raw.parse()
		.map_err(|e| anyhow!("{e}"))
		.with_context(|| format!("invalid {key} value `{raw}`"))
}
