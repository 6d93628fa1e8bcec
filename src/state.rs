use std::sync::Arc;

use crate::{
    config::CheckoutSettings, middleware::auth::IdentityProvider, notify::OwnerNotifier,
    payments::PaymentGateway, store::CatalogStore,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub notifier: Arc<dyn OwnerNotifier>,
    pub settings: Arc<CheckoutSettings>,
}
