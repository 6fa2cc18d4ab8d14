use axum::{
	extract::{Multipart, Path, Query, State},
	Json,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use hyper::StatusCode;
use uuid::Uuid;

use super::{
	card::ListingCard,
	detail::ListingDetail,
	feed::{arrange, CategoryFilter},
	form::{ImageUpload, ListingForm, ValidListing},
	listing::Listing,
};
use crate::{
	error::{AppError, CREATE_LISTING_FAILED, LISTING_NOT_FOUND},
	file_server::{image_extension, sanitize_file_name},
	state::AppState,
	users::session::AuthSession,
};

pub const EMPTY_FEED_MESSAGE: &str = "No products found";
pub const EMPTY_FEED_HINT: &str = "Try changing the category or check back later.";
pub const NO_OWN_LISTINGS_MESSAGE: &str = "You haven't listed anything yet.";
pub const NO_OWN_LISTINGS_HINT: &str = "Start Selling";

#[derive(serde::Deserialize, Debug, Default)]
pub struct FeedQuery {
	pub category: Option<String>,
}

#[derive(serde::Deserialize, Debug, Default)]
pub struct DetailQuery {
	pub image: Option<usize>,
}

#[derive(serde::Serialize, Debug)]
pub struct FeedResponse {
	pub category: String,
	pub count: usize,
	pub empty: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<&'static str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub hint: Option<&'static str>,
	pub listings: Vec<ListingCard>,
}

impl FeedResponse {
	pub fn new(filter: CategoryFilter, listings: &[Listing]) -> Self {
		let empty = listings.is_empty();
		FeedResponse {
			category: match filter {
				CategoryFilter::All => "All".to_string(),
				CategoryFilter::Only(c) => c.to_string(),
			},
			count: listings.len(),
			empty,
			message: empty.then_some(EMPTY_FEED_MESSAGE),
			hint: empty.then_some(EMPTY_FEED_HINT),
			listings: listings.iter().map(ListingCard::from).collect(),
		}
	}

	/// The caller's own ads, with the console's empty state.
	pub fn owned(listings: &[Listing]) -> Self {
		let mut res = Self::new(CategoryFilter::All, listings);
		if res.empty {
			res.message = Some(NO_OWN_LISTINGS_MESSAGE);
			res.hint = Some(NO_OWN_LISTINGS_HINT);
		}
		res
	}
}

pub fn parse_filter(raw: Option<&str>) -> Result<CategoryFilter, AppError> {
	raw.unwrap_or_default()
		.trim()
		.parse()
		.map_err(|_| AppError::validation(format!("Unknown category `{}`", raw.unwrap_or_default())))
}

pub async fn get_listings(
	State(state): State<AppState>,
	WithRejection(Query(query), _): WithRejection<Query<FeedQuery>, AppError>,
) -> Result<Json<FeedResponse>, AppError> {
	let filter = parse_filter(query.category.as_deref())?;
	let listings = arrange(state.listings.list_recent().await?, filter);
	Ok(Json(FeedResponse::new(filter, &listings)))
}

pub async fn get_listing(
	State(state): State<AppState>,
	Path(id): Path<String>,
	WithRejection(Query(query), _): WithRejection<Query<DetailQuery>, AppError>,
) -> Result<Json<ListingDetail>, AppError> {
	let listing = state.listings.get(&id).await?.ok_or(AppError::NotFound(LISTING_NOT_FOUND))?;
	let owner = state.profiles.profile(&listing.owner).await?;
	Ok(Json(ListingDetail::new(listing, owner, query.image.unwrap_or(0))))
}

/// Loads a listing and checks that the caller owns it.
pub async fn owned_listing(state: &AppState, session: &AuthSession, id: &str) -> Result<Listing, AppError> {
	let listing = state.listings.get(id).await?.ok_or(AppError::NotFound(LISTING_NOT_FOUND))?;
	if listing.owner != session.uid {
		log::warn!("user {} tried to manage listing {} owned by {}", session.uid, id, listing.owner);
		return Err(AppError::Forbidden);
	}
	Ok(listing)
}

async fn read_form(mut multipart: Multipart) -> Result<ListingForm, AppError> {
	let mut form = ListingForm::default();
	loop {
		let next = multipart.next_field().await;
		match next {
			Ok(Some(field)) => {
				let name = field.name().unwrap_or_default().to_string();
				let file_name = field.file_name().map(str::to_string);
				if name == "images" || file_name.is_some() {
					let content_type = field.content_type().map(str::to_string);
					let data = field
						.bytes()
						.await
						.map_err(|e| AppError::validation(format!("Malformed upload: {e}")))?;
					form.add_image(ImageUpload {
						file_name: file_name.unwrap_or_else(|| "image".to_string()),
						content_type,
						data,
					})?;
				} else {
					let value = field
						.text()
						.await
						.map_err(|e| AppError::validation(format!("Malformed upload: {e}")))?;
					form.set_field(&name, value);
				}
			}
			Ok(None) => break Ok(form),
			Err(err) => {
				log::warn!("Error processing multipart upload: {}", err);
				break Err(AppError::validation(format!("Malformed upload: {err}")));
			}
		}
	}
}

/// Uploads the images one after another and only then writes the record.
/// Images stored before a failure stay where they are.
async fn publish(state: &AppState, owner: &str, valid: ValidListing) -> Result<Listing, AppError> {
	let mut extensions = Vec::with_capacity(valid.images.len());
	for image in &valid.images {
		let ext = image_extension(&image.data)
			.map_err(|_| AppError::validation(format!("`{}` is not a supported image", image.file_name)))?;
		extensions.push(ext);
	}

	let mut image_urls = Vec::with_capacity(valid.images.len());
	for (index, (image, ext)) in valid.images.iter().zip(extensions).enumerate() {
		let mut file_name = sanitize_file_name(&image.file_name);
		if !file_name.contains('.') {
			file_name = format!("{file_name}.{ext}");
		}
		let key = format!("products/{}/{}_{}_{}", owner, Utc::now().timestamp_millis(), index, file_name);
		match state.storage.upload(&key, &image.data).await {
			Ok(url) => image_urls.push(url),
			Err(e) => {
				log::error!("upload of {key} failed after {} stored images: {e}", image_urls.len());
				return Err(AppError::Failed(CREATE_LISTING_FAILED));
			}
		}
	}

	let listing = Listing {
		id: Uuid::new_v4().to_string(),
		title: valid.title,
		description: valid.description,
		price: valid.price,
		category: valid.category,
		images: image_urls,
		owner: owner.to_owned(),
		created_at: Utc::now(),
		is_boosted: false,
		boosted_until: None,
		details: valid.details,
	};

	if let Err(e) = state.listings.insert(&listing).await {
		log::error!("storing listing {} failed: {e}", listing.id);
		return Err(AppError::Failed(CREATE_LISTING_FAILED));
	}
	log::info!("user {} posted listing {} in {}", owner, listing.id, listing.category);
	Ok(listing)
}

pub async fn create_listing(
	State(state): State<AppState>,
	session: AuthSession,
	WithRejection(multipart, _): WithRejection<Multipart, AppError>,
) -> Result<(StatusCode, Json<Listing>), AppError> {
	let valid = read_form(multipart).await?.validate()?;
	let listing = publish(&state, &session.uid, valid).await?;
	Ok((StatusCode::CREATED, Json(listing)))
}

pub async fn my_listings(State(state): State<AppState>, session: AuthSession) -> Result<Json<FeedResponse>, AppError> {
	let mine = state.listings.list_by_owner(&session.uid).await?;
	Ok(Json(FeedResponse::owned(&mine)))
}

/// Removes the record only; its images are left in storage.
pub async fn delete_listing(State(state): State<AppState>, session: AuthSession, Path(id): Path<String>) -> Result<StatusCode, AppError> {
	owned_listing(&state, &session, &id).await?;
	if !state.listings.delete(&id).await? {
		return Err(AppError::NotFound(LISTING_NOT_FOUND));
	}
	log::info!("user {} deleted listing {}", session.uid, id);
	Ok(StatusCode::NO_CONTENT)
}
