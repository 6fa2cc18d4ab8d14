//! Document store seams for listings and profiles.
//!
//! Handlers only see the [`ListingStore`] and [`ProfileStore`] traits; the
//! Postgres and in-memory backends are chosen at start-up.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{listings::listing::Listing, users::users::UserProfile};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("database error: {0}")]
	Database(#[from] tokio_postgres::Error),
	#[error("email already registered")]
	EmailTaken,
	#[error("corrupt record: {0}")]
	Corrupt(String),
}

/// Credential record of the bundled auth provider.
#[derive(Debug, Clone)]
pub struct Account {
	pub profile: UserProfile,
	pub password_hash: String,
}

#[async_trait]
pub trait ListingStore: Send + Sync {
	async fn insert(&self, listing: &Listing) -> Result<(), StoreError>;

	async fn get(&self, id: &str) -> Result<Option<Listing>, StoreError>;

	/// Every listing, newest first.
	async fn list_recent(&self) -> Result<Vec<Listing>, StoreError>;

	async fn list_by_owner(&self, owner: &str) -> Result<Vec<Listing>, StoreError>;

	/// Returns false when no listing has this id.
	async fn set_boost(&self, id: &str, until: DateTime<Utc>) -> Result<bool, StoreError>;

	async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
	async fn create_account(&self, profile: &UserProfile, password_hash: &str) -> Result<(), StoreError>;

	async fn account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

	async fn profile(&self, uid: &str) -> Result<Option<UserProfile>, StoreError>;

	async fn update_profile(&self, uid: &str, name: &str, avatar_url: Option<&str>) -> Result<Option<UserProfile>, StoreError>;
}
