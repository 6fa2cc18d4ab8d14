use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use postgres_from_row::FromRow;

use crate::store::StoreError;

pub const BOOST_DAYS: i64 = 7;

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
	Cars,
	Properties,
	Mobiles,
	Bikes,
	Electronics,
	Furniture,
	Fashion,
	Other,
}

impl Category {
	pub const ALL: [Category; 8] = [
		Category::Cars,
		Category::Properties,
		Category::Mobiles,
		Category::Bikes,
		Category::Electronics,
		Category::Furniture,
		Category::Fashion,
		Category::Other,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Category::Cars => "Cars",
			Category::Properties => "Properties",
			Category::Mobiles => "Mobiles",
			Category::Bikes => "Bikes",
			Category::Electronics => "Electronics",
			Category::Furniture => "Furniture",
			Category::Fashion => "Fashion",
			Category::Other => "Other",
		}
	}
}

impl fmt::Display for Category {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownValue(pub String);

impl fmt::Display for UnknownValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "unknown value `{}`", self.0)
	}
}

impl FromStr for Category {
	type Err = UnknownValue;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Category::ALL
			.into_iter()
			.find(|c| c.as_str() == s)
			.ok_or_else(|| UnknownValue(s.to_owned()))
	}
}

// Small closed vocabularies offered by the listing form's dropdowns.
macro_rules! choice_enum {
	($name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
		#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Copy, PartialEq, Eq)]
		pub enum $name {
			$(
				#[serde(rename = $label)]
				$variant,
			)+
		}

		impl $name {
			pub fn as_str(&self) -> &'static str {
				match self {
					$($name::$variant => $label,)+
				}
			}
		}

		impl FromStr for $name {
			type Err = UnknownValue;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				match s {
					$($label => Ok($name::$variant),)+
					_ => Err(UnknownValue(s.to_owned())),
				}
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(self.as_str())
			}
		}
	};
}

choice_enum!(FuelType {
	Petrol => "Petrol",
	Diesel => "Diesel",
	Cng => "CNG",
	Electric => "Electric",
	Lpg => "LPG",
});

choice_enum!(Transmission {
	Manual => "Manual",
	Automatic => "Automatic",
});

choice_enum!(PropertyType {
	Apartment => "Apartment",
	House => "House",
	Plot => "Plot",
	Office => "Office",
});

choice_enum!(Furnishing {
	Furnished => "Furnished",
	SemiFurnished => "Semi-Furnished",
	Unfurnished => "Unfurnished",
});

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Default, PartialEq)]
pub struct CarDetails {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub year: Option<i32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub km_driven: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub fuel_type: Option<FuelType>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub transmission: Option<Transmission>,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Default, PartialEq)]
pub struct PropertyDetails {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub property_type: Option<PropertyType>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub bedrooms: Option<i32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub bathrooms: Option<i32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub furnished: Option<Furnishing>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub area: Option<i64>,
}

/// Fields that only exist for one category. A car listing can never carry
/// property fields and vice versa.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Default, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CategoryDetails {
	Cars(CarDetails),
	Properties(PropertyDetails),
	#[default]
	None,
}

impl CategoryDetails {
	pub fn cars(&self) -> Option<&CarDetails> {
		match self {
			CategoryDetails::Cars(c) => Some(c),
			_ => None,
		}
	}

	pub fn properties(&self) -> Option<&PropertyDetails> {
		match self {
			CategoryDetails::Properties(p) => Some(p),
			_ => None,
		}
	}
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq)]
pub struct Listing {
	pub id: String,
	pub title: String,
	pub description: String,
	pub price: f64,
	pub category: Category,
	pub images: Vec<String>,
	pub owner: String,
	pub created_at: DateTime<Utc>,
	pub is_boosted: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub boosted_until: Option<DateTime<Utc>>,
	pub details: CategoryDetails,
}

impl Listing {
	/// Marks the listing boosted for [`BOOST_DAYS`] starting at `now`.
	/// The expiry is recorded only; nothing reads it back.
	pub fn boost(&mut self, now: DateTime<Utc>) {
		self.is_boosted = true;
		self.boosted_until = Some(boost_expiry(now));
	}
}

pub fn boost_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
	now + Duration::days(BOOST_DAYS)
}

/// Flat row shape of the `listings` table.
#[derive(Debug, FromRow)]
pub struct ListingRow {
	pub id: String,
	pub title: String,
	pub description: String,
	pub price: f64,
	pub category: String,
	pub images: Vec<String>,
	pub owner: String,
	pub created_at: DateTime<Utc>,
	pub is_boosted: bool,
	pub boosted_until: Option<DateTime<Utc>>,
	pub year: Option<i32>,
	pub km_driven: Option<i64>,
	pub fuel_type: Option<String>,
	pub transmission: Option<String>,
	pub property_type: Option<String>,
	pub bedrooms: Option<i32>,
	pub bathrooms: Option<i32>,
	pub furnished: Option<String>,
	pub area: Option<i64>,
}

fn parse_column<T: FromStr<Err = UnknownValue>>(column: &str, value: Option<String>) -> Result<Option<T>, StoreError> {
	value
		.map(|v| v.parse::<T>().map_err(|e| StoreError::Corrupt(format!("{column}: {e}"))))
		.transpose()
}

impl TryFrom<ListingRow> for Listing {
	type Error = StoreError;

	fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
		let category: Category = row
			.category
			.parse()
			.map_err(|e| StoreError::Corrupt(format!("category: {e}")))?;

		// columns of the other category are ignored even if a stray value slipped in
		let details = match category {
			Category::Cars => CategoryDetails::Cars(CarDetails {
				year: row.year,
				km_driven: row.km_driven,
				fuel_type: parse_column("fuel_type", row.fuel_type)?,
				transmission: parse_column("transmission", row.transmission)?,
			}),
			Category::Properties => CategoryDetails::Properties(PropertyDetails {
				property_type: parse_column("property_type", row.property_type)?,
				bedrooms: row.bedrooms,
				bathrooms: row.bathrooms,
				furnished: parse_column("furnished", row.furnished)?,
				area: row.area,
			}),
			_ => CategoryDetails::None,
		};

		Ok(Listing {
			id: row.id,
			title: row.title,
			description: row.description,
			price: row.price,
			category,
			images: row.images,
			owner: row.owner,
			created_at: row.created_at,
			is_boosted: row.is_boosted,
			boosted_until: row.boosted_until,
			details,
		})
	}
}

impl From<&Listing> for ListingRow {
	fn from(listing: &Listing) -> Self {
		let cars = listing.details.cars().cloned().unwrap_or_default();
		let props = listing.details.properties().cloned().unwrap_or_default();
		ListingRow {
			id: listing.id.clone(),
			title: listing.title.clone(),
			description: listing.description.clone(),
			price: listing.price,
			category: listing.category.as_str().to_owned(),
			images: listing.images.clone(),
			owner: listing.owner.clone(),
			created_at: listing.created_at,
			is_boosted: listing.is_boosted,
			boosted_until: listing.boosted_until,
			year: cars.year,
			km_driven: cars.km_driven,
			fuel_type: cars.fuel_type.map(|f| f.as_str().to_owned()),
			transmission: cars.transmission.map(|t| t.as_str().to_owned()),
			property_type: props.property_type.map(|p| p.as_str().to_owned()),
			bedrooms: props.bedrooms,
			bathrooms: props.bathrooms,
			furnished: props.furnished.map(|f| f.as_str().to_owned()),
			area: props.area,
		}
	}
}
