use std::str::FromStr;

use super::listing::{Category, Listing, UnknownValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
	#[default]
	All,
	Only(Category),
}

impl CategoryFilter {
	pub fn matches(&self, listing: &Listing) -> bool {
		match self {
			CategoryFilter::All => true,
			CategoryFilter::Only(c) => listing.category == *c,
		}
	}
}

impl FromStr for CategoryFilter {
	type Err = UnknownValue;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"" | "All" => Ok(CategoryFilter::All),
			other => other.parse().map(CategoryFilter::Only),
		}
	}
}

/// Moves boosted listings ahead of the rest. The sort is stable, so the
/// incoming (newest first) order survives inside each group.
pub fn boost_first(listings: &mut [Listing]) {
	listings.sort_by_key(|l| !l.is_boosted);
}

/// Feed order: boosted first, then category filter.
pub fn arrange(mut listings: Vec<Listing>, filter: CategoryFilter) -> Vec<Listing> {
	boost_first(&mut listings);
	listings.retain(|l| filter.matches(l));
	listings
}
