use axum::{
    extract::{ConnectInfo, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::Lazy;
use serde_json::json;
use std::{
    collections::{HashMap, VecDeque},
    net::{IpAddr, SocketAddr},
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

use crate::core::MAX_CLAIMS_PER_SECOND;

const WINDOW: Duration = Duration::from_secs(1);
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Sliding-window counter for one client on one kind of request
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    hits: VecDeque<Instant>,
    limit: usize,
    window: Duration,
}

impl SlidingWindow {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            hits: VecDeque::with_capacity(limit),
            limit,
            window,
        }
    }

    pub fn per_second(limit: usize) -> Self {
        Self::new(limit, WINDOW)
    }

    /// Record a hit if the window has room
    pub fn allow(&mut self) -> bool {
        self.allow_at(Instant::now())
    }

    fn allow_at(&mut self, now: Instant) -> bool {
        while let Some(&oldest) = self.hits.front() {
            if now.duration_since(oldest) < self.window {
                break;
            }
            self.hits.pop_front();
        }

        if self.hits.len() >= self.limit {
            return false;
        }
        self.hits.push_back(now);
        true
    }

    fn is_idle(&self, now: Instant) -> bool {
        self.hits
            .back()
            .map_or(true, |&last| now.duration_since(last) >= self.window)
    }
}

/// Requests limited together; each has its own budget per IP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RouteClass {
    Claim,
    Session,
    Grid,
    Health,
    Other,
}

impl RouteClass {
    /// None for routes that are not limited here
    fn for_path(path: &str) -> Option<Self> {
        match path {
            // Upgrades are long-lived; the socket throttles its own claims
            p if p.starts_with("/ws") => None,
            "/api/blocks/claim" => Some(Self::Claim),
            "/api/session" => Some(Self::Session),
            "/api/grid" => Some(Self::Grid),
            "/health" => Some(Self::Health),
            _ => Some(Self::Other),
        }
    }

    /// Requests per second
    fn limit(self) -> usize {
        match self {
            Self::Claim => MAX_CLAIMS_PER_SECOND,
            Self::Session => 10,
            // Full snapshots are the most expensive read
            Self::Grid => 30,
            Self::Health => 10,
            Self::Other => 50,
        }
    }
}

struct LimiterState {
    windows: HashMap<(IpAddr, RouteClass), SlidingWindow>,
    last_cleanup: Instant,
}

/// Per-IP, per-route request limits
struct RateLimiter {
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    fn new() -> Self {
        Self {
            state: Mutex::new(LimiterState {
                windows: HashMap::new(),
                last_cleanup: Instant::now(),
            }),
        }
    }

    async fn is_allowed(&self, ip: IpAddr, route: RouteClass) -> bool {
        let now = Instant::now();
        let mut state = self.state.lock().await;

        // Drop idle clients once in a while
        if now.duration_since(state.last_cleanup) >= CLEANUP_INTERVAL {
            state.windows.retain(|_, window| !window.is_idle(now));
            state.last_cleanup = now;
        }

        state
            .windows
            .entry((ip, route))
            .or_insert_with(|| SlidingWindow::per_second(route.limit()))
            .allow_at(now)
    }
}

static RATE_LIMITER: Lazy<RateLimiter> = Lazy::new(RateLimiter::new);

/// Reject requests over their route's per-IP limit with 429
pub async fn rate_limit_middleware(req: Request, next: Next) -> Result<Response, StatusCode> {
    // Requests without a peer address (in-process callers) are not limited
    let Some(ip) = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
    else {
        return Ok(next.run(req).await);
    };

    let Some(route) = RouteClass::for_path(req.uri().path()) else {
        return Ok(next.run(req).await);
    };

    if !RATE_LIMITER.is_allowed(ip, route).await {
        tracing::debug!("Rate limited {} on {:?}", ip, route);
        let response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "error": "rate_limited",
                "detail": "Rate limit exceeded. Please try again later."
            })),
        );
        return Ok(response.into_response());
    }

    Ok(next.run(req).await)
}
