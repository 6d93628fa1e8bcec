pub mod auth;
pub mod checkout;
