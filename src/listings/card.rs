use chrono::{DateTime, Utc};

use super::listing::{CategoryDetails, Listing};

pub const FEATURED_BADGE: &str = "FEATURED";
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/300x200?text=No+Image";

/// What the feed grid and the "My Ads" list render for one listing.
#[derive(serde::Serialize, Debug, Clone)]
pub struct ListingCard {
	pub id: String,
	pub title: String,
	pub price: f64,
	pub price_label: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub subtitle: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub badge: Option<&'static str>,
	pub is_boosted: bool,
	pub cover_image: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub photo_count: Option<String>,
	pub category: String,
	pub posted: String,
}

impl From<&Listing> for ListingCard {
	fn from(listing: &Listing) -> Self {
		ListingCard {
			id: listing.id.clone(),
			title: listing.title.clone(),
			price: listing.price,
			price_label: format_inr(listing.price),
			subtitle: subtitle(&listing.details),
			badge: listing.is_boosted.then_some(FEATURED_BADGE),
			is_boosted: listing.is_boosted,
			cover_image: listing.images.first().cloned().unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
			photo_count: (listing.images.len() > 1).then(|| format!("{} photos", listing.images.len())),
			category: listing.category.to_string(),
			posted: short_date(listing.created_at),
		}
	}
}

fn subtitle(details: &CategoryDetails) -> Option<String> {
	match details {
		CategoryDetails::Cars(car) => {
			let year = car.year?;
			Some(match car.km_driven {
				Some(km) if km != 0 => format!("{year} - {km} km"),
				_ => year.to_string(),
			})
		}
		CategoryDetails::Properties(p) => {
			let kind = p.property_type?;
			Some(match p.bedrooms {
				Some(n) if n != 0 => format!("{kind} - {n} BHK"),
				_ => kind.to_string(),
			})
		}
		CategoryDetails::None => None,
	}
}

/// Whole rupees with Indian digit grouping: `₹12,34,567`.
pub fn format_inr(amount: f64) -> String {
	let rounded = amount.round();
	let sign = if rounded < 0.0 { "-" } else { "" };
	let digits = format!("{:.0}", rounded.abs());

	let (head, tail) = digits.split_at(digits.len().saturating_sub(3));
	let mut groups: Vec<&str> = Vec::new();
	let mut rest = head;
	while rest.len() > 2 {
		let (left, right) = rest.split_at(rest.len() - 2);
		groups.push(right);
		rest = left;
	}
	if !rest.is_empty() {
		groups.push(rest);
	}
	groups.reverse();
	groups.push(tail);

	format!("{sign}₹{}", groups.join(","))
}

pub fn short_date(at: DateTime<Utc>) -> String {
	at.format("%b %-d").to_string()
}

pub fn long_date(at: DateTime<Utc>) -> String {
	at.format("%b %-d, %Y").to_string()
}
