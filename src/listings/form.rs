use std::str::FromStr;

use bytes::Bytes;

use super::listing::{CarDetails, Category, CategoryDetails, PropertyDetails};
use crate::error::AppError;

pub const MAX_TITLE_CHARS: usize = 70;
pub const MAX_IMAGES: usize = 5;

#[derive(Debug, Clone)]
pub struct ImageUpload {
	pub file_name: String,
	pub content_type: Option<String>,
	pub data: Bytes,
}

/// Raw "post your ad" submission, every field exactly as typed.
#[derive(Debug, Default, Clone)]
pub struct ListingForm {
	pub title: String,
	pub description: String,
	pub price: String,
	pub category: String,
	pub images: Vec<ImageUpload>,

	pub year: String,
	pub km_driven: String,
	pub fuel_type: String,
	pub transmission: String,

	pub property_type: String,
	pub bedrooms: String,
	pub bathrooms: String,
	pub furnished: String,
	pub area: String,
}

/// A submission that passed validation; images are still unuploaded.
#[derive(Debug, Clone)]
pub struct ValidListing {
	pub title: String,
	pub description: String,
	pub price: f64,
	pub category: Category,
	pub details: CategoryDetails,
	pub images: Vec<ImageUpload>,
}

impl ListingForm {
	/// Sets a text field by its multipart name. Unknown names are ignored.
	pub fn set_field(&mut self, name: &str, value: String) {
		let slot = match name {
			"title" => &mut self.title,
			"description" => &mut self.description,
			"price" => &mut self.price,
			"category" => &mut self.category,
			"year" => &mut self.year,
			"km_driven" => &mut self.km_driven,
			"fuel_type" => &mut self.fuel_type,
			"transmission" => &mut self.transmission,
			"property_type" => &mut self.property_type,
			"bedrooms" => &mut self.bedrooms,
			"bathrooms" => &mut self.bathrooms,
			"furnished" => &mut self.furnished,
			"area" => &mut self.area,
			_ => {
				log::debug!("ignoring unknown form field {name}");
				return;
			}
		};
		*slot = value;
	}

	pub fn add_image(&mut self, image: ImageUpload) -> Result<(), AppError> {
		if self.images.len() >= MAX_IMAGES {
			return Err(AppError::validation("Maximum 5 images allowed"));
		}
		self.images.push(image);
		Ok(())
	}

	pub fn validate(self) -> Result<ValidListing, AppError> {
		let title = self.title.trim().to_string();
		if title.is_empty() {
			return Err(AppError::validation("Ad title is required"));
		}
		if title.chars().count() > MAX_TITLE_CHARS {
			return Err(AppError::validation("Ad title must be at most 70 characters"));
		}

		let description = self.description.trim().to_string();
		if description.is_empty() {
			return Err(AppError::validation("Description is required"));
		}

		let category = self.category.trim();
		if category.is_empty() {
			return Err(AppError::validation("Please select a category"));
		}
		let category: Category = category
			.parse()
			.map_err(|_| AppError::validation(format!("Unknown category `{category}`")))?;

		let price = self.price.trim();
		if price.is_empty() {
			return Err(AppError::validation("Price is required"));
		}
		let price: f64 = price
			.parse()
			.ok()
			.filter(|p: &f64| p.is_finite())
			.ok_or_else(|| AppError::validation("Price must be a number"))?;
		if price < 0.0 {
			return Err(AppError::validation("Price cannot be negative"));
		}

		if self.images.is_empty() {
			return Err(AppError::validation("Please upload at least one image"));
		}
		if self.images.len() > MAX_IMAGES {
			return Err(AppError::validation("Maximum 5 images allowed"));
		}

		let details = match category {
			Category::Cars => CategoryDetails::Cars(CarDetails {
				year: optional(&self.year, "Year")?,
				km_driven: optional(&self.km_driven, "KM Driven")?,
				fuel_type: optional(&self.fuel_type, "Fuel Type")?,
				transmission: optional(&self.transmission, "Transmission")?,
			}),
			Category::Properties => CategoryDetails::Properties(PropertyDetails {
				property_type: optional(&self.property_type, "Type")?,
				bedrooms: optional(&self.bedrooms, "Bedrooms")?,
				bathrooms: optional(&self.bathrooms, "Bathrooms")?,
				furnished: optional(&self.furnished, "Furnished Status")?,
				area: optional(&self.area, "Carpet Area")?,
			}),
			_ => CategoryDetails::None,
		};

		Ok(ValidListing {
			title,
			description,
			price,
			category,
			details,
			images: self.images,
		})
	}
}

/// Blank means absent; anything else must parse.
fn optional<T: FromStr>(raw: &str, label: &str) -> Result<Option<T>, AppError> {
	let raw = raw.trim();
	if raw.is_empty() {
		return Ok(None);
	}
	raw.parse()
		.map(Some)
		.map_err(|_| AppError::validation(format!("Invalid value for {label}: `{raw}`")))
}
