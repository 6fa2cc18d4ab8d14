use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{Account, ListingStore, ProfileStore, StoreError};
use crate::{listings::listing::Listing, users::users::UserProfile};

#[derive(Default)]
struct Inner {
	listings: HashMap<String, Listing>,
	// keyed by lowercased email
	accounts: HashMap<String, Account>,
	uid_to_email: HashMap<String, String>,
}

/// Process-local store used for development and tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
	inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

fn newest_first(mut listings: Vec<Listing>) -> Vec<Listing> {
	listings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
	listings
}

#[async_trait]
impl ListingStore for MemoryStore {
	async fn insert(&self, listing: &Listing) -> Result<(), StoreError> {
		let mut guard = self.inner.write().await;
		guard.listings.insert(listing.id.clone(), listing.clone());
		Ok(())
	}

	async fn get(&self, id: &str) -> Result<Option<Listing>, StoreError> {
		Ok(self.inner.read().await.listings.get(id).cloned())
	}

	async fn list_recent(&self) -> Result<Vec<Listing>, StoreError> {
		let guard = self.inner.read().await;
		Ok(newest_first(guard.listings.values().cloned().collect()))
	}

	async fn list_by_owner(&self, owner: &str) -> Result<Vec<Listing>, StoreError> {
		let guard = self.inner.read().await;
		let mine = guard.listings.values().filter(|l| l.owner == owner).cloned().collect();
		Ok(newest_first(mine))
	}

	async fn set_boost(&self, id: &str, until: DateTime<Utc>) -> Result<bool, StoreError> {
		let mut guard = self.inner.write().await;
		match guard.listings.get_mut(id) {
			Some(listing) => {
				listing.is_boosted = true;
				listing.boosted_until = Some(until);
				Ok(true)
			}
			None => Ok(false),
		}
	}

	async fn delete(&self, id: &str) -> Result<bool, StoreError> {
		Ok(self.inner.write().await.listings.remove(id).is_some())
	}
}

#[async_trait]
impl ProfileStore for MemoryStore {
	async fn create_account(&self, profile: &UserProfile, password_hash: &str) -> Result<(), StoreError> {
		let mut guard = self.inner.write().await;
		let key = profile.email.to_lowercase();
		if guard.accounts.contains_key(&key) {
			return Err(StoreError::EmailTaken);
		}
		guard.uid_to_email.insert(profile.uid.clone(), key.clone());
		guard.accounts.insert(
			key,
			Account {
				profile: profile.clone(),
				password_hash: password_hash.to_owned(),
			},
		);
		Ok(())
	}

	async fn account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
		Ok(self.inner.read().await.accounts.get(&email.to_lowercase()).cloned())
	}

	async fn profile(&self, uid: &str) -> Result<Option<UserProfile>, StoreError> {
		let guard = self.inner.read().await;
		let profile = guard
			.uid_to_email
			.get(uid)
			.and_then(|email| guard.accounts.get(email))
			.map(|a| a.profile.clone());
		Ok(profile)
	}

	async fn update_profile(&self, uid: &str, name: &str, avatar_url: Option<&str>) -> Result<Option<UserProfile>, StoreError> {
		let mut guard = self.inner.write().await;
		let Some(email) = guard.uid_to_email.get(uid).cloned() else {
			return Ok(None);
		};
		let Some(account) = guard.accounts.get_mut(&email) else {
			return Ok(None);
		};
		account.profile.name = name.to_owned();
		if let Some(url) = avatar_url {
			account.profile.profile_image = Some(url.to_owned());
		}
		Ok(Some(account.profile.clone()))
	}
}
