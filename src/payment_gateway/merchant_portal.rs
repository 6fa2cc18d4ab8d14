use crate::config::MerchantConfig;

pub const BOOST_AMOUNT_PAISE: u64 = 4900;
pub const CURRENCY: &str = "INR";
pub const THEME_COLOR: &str = "#0d9488";

#[derive(Clone, Debug)]
pub struct Merchant {
	pub key_id: String,
	pub key_secret: Option<String>,
	pub business_name: String,
	pub api_base: String,
}

impl Merchant {
	pub fn get_credentials(config: &MerchantConfig) -> Self {
		Merchant {
			key_id: config.key_id.clone(),
			key_secret: config.key_secret.clone(),
			business_name: config.name.clone(),
			api_base: config.api_base.trim_end_matches('/').to_owned(),
		}
	}

	/// Without a secret the server cannot talk to the gateway and the widget
	/// is opened with the public key alone.
	pub fn can_create_orders(&self) -> bool {
		self.key_secret.is_some()
	}
}
