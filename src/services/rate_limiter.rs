use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::{DefaultKeyedRateLimiter, Quota};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::state::AppState;

/// Per-client request budget
///
/// Each client IP gets a bucket of `requests` tokens that refills completely
/// over `window`.
pub struct RateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Arguments
    /// * `requests` - Requests allowed per client within one window (zero is treated as one)
    /// * `window` - Time for an exhausted bucket to refill
    pub fn new(requests: u32, window: Duration) -> Self {
        let burst = NonZeroU32::new(requests.max(1)).unwrap_or(NonZeroU32::MIN);
        let period = (window / burst.get()).max(Duration::from_millis(1));
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        Self {
            limiter: governor::RateLimiter::keyed(quota),
        }
    }

    /// Consume one request for `client`; `false` once its bucket is empty.
    pub fn check(&self, client: IpAddr) -> bool {
        self.limiter.check_key(&client).is_ok()
    }

    /// Drops clients whose bucket has fully refilled. Returns how many remain.
    pub fn retain_recent(&self) -> usize {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        self.limiter.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }

    /// Runs `retain_recent` every `every` until the runtime shuts down.
    pub fn spawn_cleanup(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let remaining = self.retain_recent();
                debug!("Rate limiter cleanup: {} clients tracked", remaining);
            }
        })
    }
}

/// Rejects requests with 429 once the calling IP runs out of budget.
/// Requests without connection info share one bucket.
pub async fn limit_by_client_ip(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if !state.rate_limiter.check(client) {
        warn!("Rate limit exceeded for {}", client);
        return AppError::RateLimited.into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_rejects_after_budget_is_spent() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));

        assert!(limiter.check(ip(1)));
        assert!(limiter.check(ip(1)));
        assert!(!limiter.check(ip(1)), "third request within the window should be rejected");
    }

    #[test]
    fn test_clients_have_independent_budgets() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.check(ip(1)));
        assert!(!limiter.check(ip(1)));
        assert!(limiter.check(ip(2)));
    }

    #[tokio::test]
    async fn test_budget_refills_after_window() {
        let limiter = RateLimiter::new(1, Duration::from_millis(50));

        assert!(limiter.check(ip(3)));
        assert!(!limiter.check(ip(3)));
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(limiter.check(ip(3)));
    }

    #[tokio::test]
    async fn test_refilled_clients_are_forgotten() {
        let limiter = RateLimiter::new(2, Duration::from_millis(20));

        for last in 0..=200u8 {
            assert!(limiter.check(ip(last)));
        }
        assert_eq!(limiter.tracked_clients(), 201);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(limiter.retain_recent(), 0);
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[tokio::test]
    async fn test_clients_inside_their_window_are_kept() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.check(ip(9)));
        assert_eq!(limiter.retain_recent(), 1);
        assert!(!limiter.check(ip(9)), "cleanup must not reset a spent budget");
    }

    #[tokio::test]
    async fn test_cleanup_task_prunes_in_background() {
        let limiter = Arc::new(RateLimiter::new(1, Duration::from_millis(10)));
        assert!(limiter.check(ip(42)));

        let task = limiter.clone().spawn_cleanup(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;
        task.abort();

        assert_eq!(limiter.tracked_clients(), 0);
    }
}
