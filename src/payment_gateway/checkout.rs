use serde_json::{json, Value};

use super::merchant_portal::{Merchant, BOOST_AMOUNT_PAISE, CURRENCY, THEME_COLOR};
use crate::{error::AppError, listings::listing::Listing, users::users::UserProfile};

#[derive(serde::Serialize, Debug, Clone, Default)]
pub struct Prefill {
	pub name: String,
	pub email: String,
	pub contact: String,
}

#[derive(serde::Serialize, Debug, Clone)]
pub struct Theme {
	pub color: &'static str,
}

/// Options the client passes straight to the checkout widget.
#[derive(serde::Serialize, Debug, Clone)]
pub struct CheckoutSession {
	pub key: String,
	pub amount: u64,
	pub currency: &'static str,
	pub name: String,
	pub description: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub order_id: Option<String>,
	pub listing_id: String,
	pub prefill: Prefill,
	pub theme: Theme,
}

#[derive(serde::Deserialize, Debug)]
struct OrderResponse {
	id: String,
}

#[derive(Clone)]
pub struct PaymentGateway {
	merchant: Merchant,
	http: reqwest::Client,
}

impl PaymentGateway {
	pub fn new(merchant: Merchant) -> Self {
		PaymentGateway {
			merchant,
			http: reqwest::Client::new(),
		}
	}

	pub fn merchant(&self) -> &Merchant {
		&self.merchant
	}

	pub async fn open_checkout(&self, listing: &Listing, buyer: Option<&UserProfile>) -> Result<CheckoutSession, AppError> {
		let order_id = if self.merchant.can_create_orders() {
			Some(self.create_order(listing).await?)
		} else {
			None
		};

		Ok(CheckoutSession {
			key: self.merchant.key_id.clone(),
			amount: BOOST_AMOUNT_PAISE,
			currency: CURRENCY,
			name: self.merchant.business_name.clone(),
			description: format!("Boost Ad: {}", listing.title),
			order_id,
			listing_id: listing.id.clone(),
			prefill: buyer
				.map(|p| Prefill {
					name: p.name.clone(),
					email: p.email.clone(),
					contact: String::new(),
				})
				.unwrap_or_default(),
			theme: Theme { color: THEME_COLOR },
		})
	}

	async fn create_order(&self, listing: &Listing) -> Result<String, AppError> {
		let receipt: String = format!("boost_{}", listing.id).chars().take(40).collect();
		let body: Value = json!({
			"amount": BOOST_AMOUNT_PAISE,
			"currency": CURRENCY,
			"receipt": receipt,
			"notes": { "listing_id": listing.id },
		});
		let url = format!("{}/v1/orders", self.merchant.api_base);

		let res = self
			.http
			.post(url)
			.basic_auth(&self.merchant.key_id, self.merchant.key_secret.as_ref())
			.json(&body)
			.send()
			.await
			.and_then(|r| r.error_for_status())
			.map_err(|e| {
				log::error!("payment order creation failed: {e}");
				AppError::Upstream("Payment service unavailable. Please try again.".to_string())
			})?;

		let order: OrderResponse = res.json().await.map_err(|e| {
			log::error!("unexpected payment order response: {e}");
			AppError::Upstream("Payment service unavailable. Please try again.".to_string())
		})?;
		log::info!("created payment order {} for listing {}", order.id, listing.id);
		Ok(order.id)
	}
}
