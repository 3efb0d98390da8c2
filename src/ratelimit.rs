//! Request quota tracking for the REST API and the gateway.
//!
//! Two guards protect REST traffic: records built from the server's
//! `X-RateLimit-*` response headers, and a client-side burst counter per
//! route. A third window limits how fast frames may be written to a
//! gateway connection. None of these sleep; a refused request surfaces an
//! error to the caller, which may opt into re-queueing.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::prelude::*;
use tracing::{error, warn};

use crate::{Error, Result};

/// Requests allowed per route within [`BURST_PERIOD`] before the local
/// guard refuses.
pub const BURST_LIMIT_SEND: u32 = 5;
/// The window of the local burst guard.
pub const BURST_PERIOD: Duration = Duration::from_secs(1);

/// Frames allowed on a gateway connection within [`GATEWAY_PERIOD`],
/// across all opcodes.
pub const GATEWAY_LIMIT_SEND: u32 = 120;
/// The window of the gateway send limiter.
pub const GATEWAY_PERIOD: Duration = Duration::from_secs(60);

/// Status updates allowed within [`GATEWAY_PERIOD`].
pub const STATUS_LIMIT_SEND: u32 = 5;

/// Derive the rate-limit bucket for a resource path.
///
/// Paths under `/channels/<id>` or `/guilds/<id>` bucket per parent
/// resource so that unrelated entities do not share quota; all other paths
/// bucket on their first segment.
pub fn route_bucket(resource: &str) -> String {
    let path = resource.split('?').next().unwrap_or(resource);
    let mut segments = path.split('/').filter(|s| !s.is_empty());

    match (segments.next(), segments.next()) {
        (Some(root @ ("channels" | "guilds")), Some(id)) => format!("/{}/{}", root, id),
        (Some(root), _) => format!("/{}", root),
        (None, _) => "/".to_owned(),
    }
}

#[derive(Debug, Default)]
pub struct RateLimits {
    // Mutexes here are expected to have basically 0 wait time
    global: Mutex<RateLimit>,
    routes: Mutex<BTreeMap<String, RateLimit>>,
    bursts: Mutex<BTreeMap<String, SendWindow>>,
}

impl RateLimits {
    /// Check both guards before issuing a request for the given route.
    /// Refuses with `Error::RateLimited` or `Error::LocalRateLimit`.
    pub fn pre_check(&self, route: &str) -> Result<()> {
        self.pre_check_at(route, Utc::now().timestamp(), Instant::now())
    }

    fn pre_check_at(&self, route: &str, now: i64, tick: Instant) -> Result<()> {
        self.bursts
            .lock()
            .expect("Rate limits poisoned")
            .entry(route.to_owned())
            .or_insert_with(|| SendWindow::new(BURST_LIMIT_SEND, BURST_PERIOD))
            .acquire_at(tick)?;

        self.global
            .lock()
            .expect("Rate limits poisoned")
            .pre_check(now)?;
        if let Some(rl) = self
            .routes
            .lock()
            .expect("Rate limits poisoned")
            .get_mut(route)
        {
            rl.pre_check(now)?;
        }
        Ok(())
    }

    /// Update records from the rate limit headers of a response for the
    /// given route.
    pub fn post_update(&self, route: &str, response: &reqwest::Response) {
        if response.headers().get("X-RateLimit-Global").is_some() {
            self.global
                .lock()
                .expect("Rate limits poisoned")
                .post_update(response.headers());
        } else {
            self.routes
                .lock()
                .expect("Rate limits poisoned")
                .entry(route.to_owned())
                .or_insert_with(RateLimit::default)
                .post_update(response.headers());
        }
    }
}

#[derive(Debug, Default)]
struct RateLimit {
    reset: i64,
    limit: i64,
    remaining: i64,
}

impl RateLimit {
    fn pre_check(&mut self, now: i64) -> Result<()> {
        // break out if uninitialized
        if self.limit == 0 {
            return Ok(());
        }

        let until_reset = self.reset - now;
        if self.remaining <= 0 && until_reset >= -3 {
            return Err(Error::RateLimited(until_reset.max(0) as f64));
        }

        if until_reset < -3 {
            // The reset has long passed; restore the full quota until the
            // next response tells us otherwise.
            self.remaining = self.limit;
        }

        // Deduct from our remaining requests. If a lot of requests are issued
        // before any responses are received, this will mean we can still limit
        // preemptively.
        self.remaining -= 1;
        Ok(())
    }

    fn post_update(&mut self, headers: &reqwest::header::HeaderMap) {
        if let Err(e) = self.try_post_update(headers) {
            error!("rate limit checking error: {}", e);
        }
    }

    fn try_post_update(&mut self, headers: &reqwest::header::HeaderMap) -> Result<()> {
        if let Some(reset) = read_header(headers, "X-RateLimit-Reset")? {
            self.reset = reset;
        }
        if let Some(limit) = read_header(headers, "X-RateLimit-Limit")? {
            self.limit = limit;
        }
        if let Some(remaining) = read_header(headers, "X-RateLimit-Remaining")? {
            self.remaining = remaining;
        }
        Ok(())
    }
}

fn read_header(headers: &reqwest::header::HeaderMap, name: &str) -> Result<Option<i64>> {
    match headers.get(name) {
        Some(hdr) => match std::str::from_utf8(hdr.as_bytes()) {
            Ok(text) => match text.parse::<i64>() {
                Ok(val) => Ok(Some(val)),
                Err(_) => match text.parse::<f64>() {
                    Ok(val) => Ok(Some(val as i64)),
                    Err(_) => Err(Error::Other("header is not an i64 or f64")),
                },
            },
            Err(_) => Err(Error::Other("header is not UTF-8")),
        },
        None => Ok(None),
    }
}

/// A fixed-window send counter: at most `limit` acquisitions per `period`.
#[derive(Debug)]
pub struct SendWindow {
    limit: u32,
    period: Duration,
    count: u32,
    opened: Instant,
}

impl SendWindow {
    pub fn new(limit: u32, period: Duration) -> SendWindow {
        SendWindow {
            limit,
            period,
            count: 0,
            opened: Instant::now(),
        }
    }

    /// Count one send against the window, refusing once the limit is hit.
    pub fn acquire(&mut self) -> Result<()> {
        self.acquire_at(Instant::now())
    }

    fn acquire_at(&mut self, now: Instant) -> Result<()> {
        if now.duration_since(self.opened) >= self.period {
            self.opened = now;
            self.count = 0;
        }
        if self.count >= self.limit {
            let reopens = self.period - now.duration_since(self.opened);
            return Err(Error::LocalRateLimit(reopens.as_secs_f64()));
        }
        self.count += 1;
        Ok(())
    }

    /// Like [`acquire`][Self::acquire], but log and report instead of
    /// returning an error. Used on the gateway, where refused frames are
    /// dropped.
    pub fn acquire_or_drop(&mut self, what: &str) -> bool {
        match self.acquire() {
            Ok(()) => true,
            Err(_) => {
                warn!("Gateway send limit exceeded, dropping {}", what);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_bucket_per_parent_resource() {
        assert_eq!(route_bucket("/channels/123/messages"), "/channels/123");
        assert_eq!(
            route_bucket("/channels/123/messages/456/reactions"),
            "/channels/123"
        );
        assert_eq!(route_bucket("/guilds/9/members/4"), "/guilds/9");
        assert_eq!(route_bucket("/users/@me"), "/users");
        assert_eq!(route_bucket("/gateway"), "/gateway");
        assert_eq!(route_bucket("/channels/123/messages?limit=50"), "/channels/123");
        assert_eq!(route_bucket("/invites/abc"), "/invites");
    }

    #[test]
    fn unrelated_routes_do_not_share_quota() {
        assert_ne!(route_bucket("/channels/1"), route_bucket("/channels/2"));
        assert_ne!(route_bucket("/channels/1"), route_bucket("/guilds/1"));
    }

    #[test]
    fn exhausted_record_refuses_until_reset() {
        let limits = RateLimits::default();
        let now = 1_000_000;
        let tick = Instant::now();

        {
            let mut routes = limits.routes.lock().unwrap();
            routes.insert(
                "/channels/1".to_owned(),
                RateLimit {
                    limit: 5,
                    remaining: 0,
                    reset: now + 10,
                },
            );
        }

        match limits.pre_check_at("/channels/1", now, tick) {
            Err(Error::RateLimited(seconds)) => assert_eq!(seconds, 10.0),
            other => panic!("expected refusal, got {:?}", other),
        }

        // A different route is unaffected.
        assert!(limits.pre_check_at("/channels/2", now, tick).is_ok());

        // After the reset has passed, the quota is restored.
        assert!(limits
            .pre_check_at("/channels/1", now + 14, tick + Duration::from_secs(14))
            .is_ok());
    }

    #[test]
    fn slightly_stale_reset_still_refuses() {
        let limits = RateLimits::default();
        let now = 1_000_000;

        limits.routes.lock().unwrap().insert(
            "/guilds/7".to_owned(),
            RateLimit {
                limit: 5,
                remaining: 0,
                reset: now - 2,
            },
        );

        assert!(matches!(
            limits.pre_check_at("/guilds/7", now, Instant::now()),
            Err(Error::RateLimited(_))
        ));
    }

    #[test]
    fn burst_guard_refuses_sixth_call() {
        let limits = RateLimits::default();
        let now = 1_000_000;
        let tick = Instant::now();

        for _ in 0..BURST_LIMIT_SEND {
            limits.pre_check_at("/channels/1", now, tick).unwrap();
        }
        match limits.pre_check_at("/channels/1", now, tick) {
            Err(Error::LocalRateLimit(seconds)) => assert!(seconds <= 1.0),
            other => panic!("expected local refusal, got {:?}", other),
        }

        // The window reopens after its period.
        assert!(limits
            .pre_check_at("/channels/1", now + 2, tick + Duration::from_secs(2))
            .is_ok());
    }

    #[test]
    fn send_window_counts_against_limit() {
        let mut window = SendWindow::new(2, Duration::from_secs(60));
        let start = Instant::now();

        assert!(window.acquire_at(start).is_ok());
        assert!(window.acquire_at(start).is_ok());
        assert!(window.acquire_at(start).is_err());
        assert!(window.acquire_at(start + Duration::from_secs(61)).is_ok());
    }
}
