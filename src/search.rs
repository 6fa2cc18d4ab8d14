use axum::{
	extract::{Query, State},
	Json,
};
use axum_extra::extract::WithRejection;

use crate::{
	error::AppError,
	listings::{
		feed::arrange,
		listing::Listing,
		listings::{parse_filter, FeedResponse},
	},
	state::AppState,
};

#[derive(serde::Deserialize, Debug)]
pub struct SearchQuery {
	#[serde(default)]
	pub q: String,
	pub category: Option<String>,
}

/// Typos tolerated for a keyword: none up to three letters, one up to five,
/// two beyond that.
fn allowed_distance(keyword: &str) -> usize {
	match keyword.chars().count() {
		0..=3 => 0,
		4..=5 => 1,
		_ => 2,
	}
}

/// A keyword hits when some word of the title or description contains it or
/// is within [`allowed_distance`] edits of it.
pub fn matches(listing: &Listing, keyword: &str) -> bool {
	let keyword = keyword.trim().to_lowercase();
	if keyword.is_empty() {
		return true;
	}
	let max_distance = allowed_distance(&keyword);
	listing
		.title
		.split_whitespace()
		.chain(listing.description.split_whitespace())
		.map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
		.any(|word| word.contains(&keyword) || levenshtein::levenshtein(&word, &keyword) <= max_distance)
}

pub async fn search(
	State(state): State<AppState>,
	WithRejection(Query(query), _): WithRejection<Query<SearchQuery>, AppError>,
) -> Result<Json<FeedResponse>, AppError> {
	let filter = parse_filter(query.category.as_deref())?;
	let mut found = arrange(state.listings.list_recent().await?, filter);
	found.retain(|l| matches(l, &query.q));
	log::debug!("search `{}` matched {} listings", query.q, found.len());
	Ok(Json(FeedResponse::new(filter, &found)))
}
