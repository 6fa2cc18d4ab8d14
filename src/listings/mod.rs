pub mod boost;
pub mod card;
pub mod detail;
pub mod feed;
pub mod form;
pub mod listing;
pub mod listings;
