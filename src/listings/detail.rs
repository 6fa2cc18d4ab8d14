use super::{
	card::{format_inr, long_date, PLACEHOLDER_IMAGE},
	listing::{CategoryDetails, Listing},
};
use crate::users::users::UserProfile;

pub const SELLER_FALLBACK_NAME: &str = "User";

/// Position in a listing's image strip; moves wrap around at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageCarousel {
	len: usize,
	index: usize,
}

impl ImageCarousel {
	/// Any index is accepted and folded into range.
	pub fn new(len: usize, index: usize) -> Self {
		let index = if len == 0 { 0 } else { index % len };
		ImageCarousel { len, index }
	}

	pub fn index(&self) -> usize {
		self.index
	}

	pub fn next(&self) -> usize {
		if self.len == 0 {
			return 0;
		}
		(self.index + 1) % self.len
	}

	pub fn prev(&self) -> usize {
		if self.len == 0 {
			return 0;
		}
		(self.index + self.len - 1) % self.len
	}
}

#[derive(serde::Serialize, Debug, Clone, PartialEq)]
pub struct Spec {
	pub label: &'static str,
	pub value: String,
}

fn spec(label: &'static str, value: impl ToString) -> Spec {
	Spec {
		label,
		value: value.to_string(),
	}
}

pub fn specifics(details: &CategoryDetails) -> Vec<Spec> {
	let mut rows = Vec::new();
	match details {
		CategoryDetails::Cars(car) => {
			if let Some(year) = car.year {
				rows.push(spec("Year", year));
			}
			if let Some(km) = car.km_driven {
				rows.push(spec("KM Driven", format!("{km} km")));
			}
			if let Some(fuel) = car.fuel_type {
				rows.push(spec("Fuel Type", fuel));
			}
			if let Some(t) = car.transmission {
				rows.push(spec("Transmission", t));
			}
		}
		CategoryDetails::Properties(p) => {
			if let Some(kind) = p.property_type {
				rows.push(spec("Type", kind));
			}
			if let Some(n) = p.bedrooms {
				rows.push(spec("Bedrooms", n));
			}
			if let Some(n) = p.bathrooms {
				rows.push(spec("Bathrooms", n));
			}
			if let Some(f) = p.furnished {
				rows.push(spec("Furnished", f));
			}
			if let Some(area) = p.area {
				rows.push(spec("Area", format!("{area} sq ft")));
			}
		}
		CategoryDetails::None => {}
	}
	rows
}

#[derive(serde::Serialize, Debug, Clone)]
pub struct Seller {
	pub uid: String,
	pub name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub profile_image: Option<String>,
}

#[derive(serde::Serialize, Debug, Clone)]
pub struct ListingDetail {
	pub listing: Listing,
	pub price_label: String,
	pub posted: String,
	pub featured: bool,
	pub active_image: String,
	pub image_index: usize,
	pub next_image: usize,
	pub prev_image: usize,
	pub specifics: Vec<Spec>,
	pub seller: Seller,
}

impl ListingDetail {
	pub fn new(listing: Listing, owner: Option<UserProfile>, image: usize) -> Self {
		let carousel = ImageCarousel::new(listing.images.len(), image);
		let seller = match owner {
			Some(p) => Seller {
				uid: p.uid,
				name: p.name,
				profile_image: p.profile_image,
			},
			None => Seller {
				uid: listing.owner.clone(),
				name: SELLER_FALLBACK_NAME.to_string(),
				profile_image: None,
			},
		};

		ListingDetail {
			price_label: format_inr(listing.price),
			posted: long_date(listing.created_at),
			featured: listing.is_boosted,
			active_image: listing
				.images
				.get(carousel.index())
				.cloned()
				.unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
			image_index: carousel.index(),
			next_image: carousel.next(),
			prev_image: carousel.prev(),
			specifics: specifics(&listing.details),
			seller,
			listing,
		}
	}
}
