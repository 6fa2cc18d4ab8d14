pub mod checkout;
pub mod merchant_portal;
