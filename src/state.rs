use std::sync::Arc;

use crate::services::rate_limiter::RateLimiter;
use crate::store::PricePointStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PricePointStore>,
    pub rate_limiter: Arc<RateLimiter>,
}
