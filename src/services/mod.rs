pub mod cart_service;
pub mod checkout_service;
pub mod pricing_service;
pub mod webhook_service;
