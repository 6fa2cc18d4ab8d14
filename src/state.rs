use std::sync::Arc;

use anyhow::Context;

use crate::{
	config::{Config, StoreBackend},
	db_client::db_client,
	file_server::{LocalStorage, ObjectStorage},
	payment_gateway::{checkout::PaymentGateway, merchant_portal::Merchant},
	store::{ListingStore, MemoryStore, PgStore, ProfileStore},
	users::session::Sessions,
};

#[derive(Clone)]
pub struct AppState {
	pub listings: Arc<dyn ListingStore>,
	pub profiles: Arc<dyn ProfileStore>,
	pub storage: Arc<dyn ObjectStorage>,
	pub files: Arc<LocalStorage>,
	pub payments: PaymentGateway,
	pub sessions: Sessions,
}

impl AppState {
	pub fn new(
		listings: Arc<dyn ListingStore>,
		profiles: Arc<dyn ProfileStore>,
		files: Arc<LocalStorage>,
		payments: PaymentGateway,
		sessions: Sessions,
	) -> Self {
		AppState {
			listings,
			profiles,
			storage: files.clone(),
			files,
			payments,
			sessions,
		}
	}

	/// Swaps the upload target while keeping `/files` serving the local root.
	pub fn with_storage(mut self, storage: Arc<dyn ObjectStorage>) -> Self {
		self.storage = storage;
		self
	}

	pub fn in_memory(config: &Config) -> Self {
		let store = Arc::new(MemoryStore::new());
		Self::new(
			store.clone(),
			store,
			Arc::new(LocalStorage::new(&config.storage_root, &config.public_base_url)),
			PaymentGateway::new(Merchant::get_credentials(&config.merchant)),
			Sessions::new(&config.jwt_secret, chrono::Duration::hours(config.session_ttl_hours)),
		)
	}

	pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
		match config.store {
			StoreBackend::Memory => {
				log::warn!("using the in-memory store, data is lost on restart");
				Ok(Self::in_memory(config))
			}
			StoreBackend::Postgres => {
				let db = db_client(&config.database).await.context("connecting to postgres")?;
				db.migrate().await.context("creating schema")?;
				let store = Arc::new(PgStore::new(db));
				Ok(Self::new(
					store.clone(),
					store,
					Arc::new(LocalStorage::new(&config.storage_root, &config.public_base_url)),
					PaymentGateway::new(Merchant::get_credentials(&config.merchant)),
					Sessions::new(&config.jwt_secret, chrono::Duration::hours(config.session_ttl_hours)),
				))
			}
		}
	}
}
