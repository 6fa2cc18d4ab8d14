use async_trait::async_trait;
use chrono::{DateTime, Utc};
use postgres_from_row::FromRow;
use tokio_postgres::{error::SqlState, Row};

use super::{Account, ListingStore, ProfileStore, StoreError};
use crate::{
	db_client::DbClient,
	listings::listing::{Listing, ListingRow},
	users::users::UserProfile,
};

const LISTING_COLUMNS: &str = "id,title,description,price,category,images,owner,created_at,is_boosted,boosted_until,year,km_driven,fuel_type,transmission,property_type,bedrooms,bathrooms,furnished,area";

#[derive(Clone)]
pub struct PgStore {
	db: DbClient,
}

impl PgStore {
	pub fn new(db: DbClient) -> Self {
		PgStore { db }
	}
}

fn to_listings(rows: &[Row]) -> Result<Vec<Listing>, StoreError> {
	rows.iter()
		.map(|row| ListingRow::try_from_row(row).map_err(StoreError::from).and_then(Listing::try_from))
		.collect()
}

#[async_trait]
impl ListingStore for PgStore {
	async fn insert(&self, listing: &Listing) -> Result<(), StoreError> {
		let row = ListingRow::from(listing);
		let statement = format!(
			"INSERT INTO listings ({}) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19)",
			LISTING_COLUMNS
		);
		self.db
			.execute(
				statement.as_str(),
				&[
					&row.id,
					&row.title,
					&row.description,
					&row.price,
					&row.category,
					&row.images,
					&row.owner,
					&row.created_at,
					&row.is_boosted,
					&row.boosted_until,
					&row.year,
					&row.km_driven,
					&row.fuel_type,
					&row.transmission,
					&row.property_type,
					&row.bedrooms,
					&row.bathrooms,
					&row.furnished,
					&row.area,
				],
			)
			.await?;
		Ok(())
	}

	async fn get(&self, id: &str) -> Result<Option<Listing>, StoreError> {
		let q = format!("SELECT {} FROM listings WHERE id=$1", LISTING_COLUMNS);
		match self.db.query_opt(q.as_str(), &[&id]).await? {
			Some(row) => Ok(Some(Listing::try_from(ListingRow::try_from_row(&row)?)?)),
			None => Ok(None),
		}
	}

	async fn list_recent(&self) -> Result<Vec<Listing>, StoreError> {
		let q = format!("SELECT {} FROM listings ORDER BY created_at DESC, id", LISTING_COLUMNS);
		let rows = self.db.query(q.as_str(), &[]).await?;
		to_listings(&rows)
	}

	async fn list_by_owner(&self, owner: &str) -> Result<Vec<Listing>, StoreError> {
		let q = format!("SELECT {} FROM listings WHERE owner=$1 ORDER BY created_at DESC, id", LISTING_COLUMNS);
		let rows = self.db.query(q.as_str(), &[&owner]).await?;
		to_listings(&rows)
	}

	async fn set_boost(&self, id: &str, until: DateTime<Utc>) -> Result<bool, StoreError> {
		let n = self
			.db
			.execute("UPDATE listings SET is_boosted=true, boosted_until=$2 WHERE id=$1", &[&id, &until])
			.await?;
		Ok(n > 0)
	}

	async fn delete(&self, id: &str) -> Result<bool, StoreError> {
		let n = self.db.execute("DELETE FROM listings WHERE id=$1", &[&id]).await?;
		Ok(n > 0)
	}
}

#[async_trait]
impl ProfileStore for PgStore {
	async fn create_account(&self, profile: &UserProfile, password_hash: &str) -> Result<(), StoreError> {
		let statement = "INSERT INTO users (uid,name,email,profile_image,password_hash) VALUES ($1,$2,$3,$4,$5)";
		let res = self
			.db
			.execute(
				statement,
				&[&profile.uid, &profile.name, &profile.email.to_lowercase(), &profile.profile_image, &password_hash],
			)
			.await;
		match res {
			Ok(_) => Ok(()),
			Err(e) if e.code() == Some(&SqlState::UNIQUE_VIOLATION) => Err(StoreError::EmailTaken),
			Err(e) => Err(e.into()),
		}
	}

	async fn account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
		let row = self
			.db
			.query_opt(
				"SELECT uid,name,email,profile_image,password_hash FROM users WHERE email=$1",
				&[&email.to_lowercase()],
			)
			.await?;
		let Some(row) = row else {
			return Ok(None);
		};
		Ok(Some(Account {
			profile: UserProfile::try_from_row(&row)?,
			password_hash: row.try_get("password_hash")?,
		}))
	}

	async fn profile(&self, uid: &str) -> Result<Option<UserProfile>, StoreError> {
		let row = self
			.db
			.query_opt("SELECT uid,name,email,profile_image FROM users WHERE uid=$1", &[&uid])
			.await?;
		Ok(row.map(|r| UserProfile::try_from_row(&r)).transpose()?)
	}

	async fn update_profile(&self, uid: &str, name: &str, avatar_url: Option<&str>) -> Result<Option<UserProfile>, StoreError> {
		let row = self
			.db
			.query_opt(
				"UPDATE users SET name=$2, profile_image=COALESCE($3, profile_image) WHERE uid=$1 RETURNING uid,name,email,profile_image",
				&[&uid, &name, &avatar_url],
			)
			.await?;
		Ok(row.map(|r| UserProfile::try_from_row(&r)).transpose()?)
	}
}
