//! In-memory daily quota enforcement, keyed by client identifier.
//!
//! One map entry per identifier: `{count, reset_at}`. Entries are replaced
//! wholesale once the current time passes `reset_at`. State is process-local
//! and unguarded across processes — a restart resets all quotas, and a
//! multi-worker deployment would need an external shared store instead.

use std::collections::HashMap;
use std::sync::Mutex;

use axum::http::HeaderMap;
use chrono::Utc;
use serde::Serialize;

/// Rolling quota window: 24 hours.
const WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

/// Identifier used when no device id and no trusted address header is present.
/// All such callers share one quota bucket.
pub const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone, Copy)]
struct QuotaEntry {
    count: u32,
    reset_at: i64,
}

/// Outcome of a quota check, surfaced to callers and in `X-RateLimit-*` headers.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitResult {
    pub success: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Epoch milliseconds at which the window resets.
    pub reset_at: i64,
}

/// Process-wide quota table. Held in `AppState` as `Arc<RateLimiter>`.
#[derive(Debug, Default)]
pub struct RateLimiter {
    entries: Mutex<HashMap<String, QuotaEntry>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks and consumes one unit of the identifier's daily quota.
    ///
    /// A missing or expired entry is replaced with a fresh one (`count = 0`,
    /// `reset_at = now + 24h`) before the check. At or over the limit the
    /// call fails with `remaining = 0` and mutates nothing.
    pub fn check(&self, identifier: &str, limit: u32) -> RateLimitResult {
        self.check_at(identifier, limit, Utc::now().timestamp_millis())
    }

    fn check_at(&self, identifier: &str, limit: u32, now_ms: i64) -> RateLimitResult {
        let mut entries = self.lock();

        let entry = entries
            .entry(identifier.to_string())
            .and_modify(|e| {
                if now_ms > e.reset_at {
                    *e = QuotaEntry {
                        count: 0,
                        reset_at: now_ms + WINDOW_MS,
                    };
                }
            })
            .or_insert(QuotaEntry {
                count: 0,
                reset_at: now_ms + WINDOW_MS,
            });

        if entry.count >= limit {
            return RateLimitResult {
                success: false,
                limit,
                remaining: 0,
                reset_at: entry.reset_at,
            };
        }

        entry.count += 1;
        RateLimitResult {
            success: true,
            limit,
            remaining: limit - entry.count,
            reset_at: entry.reset_at,
        }
    }

    /// Drops expired entries, returning how many were removed.
    ///
    /// Housekeeping only: an expired entry and an absent one are equivalent
    /// at check time.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now().timestamp_millis())
    }

    fn sweep_expired_at(&self, now_ms: i64) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| now_ms <= e.reset_at);
        before - entries.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, QuotaEntry>> {
        // A poisoned lock only means another task panicked mid-check; the
        // map itself is still a valid quota table.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Resolves the quota identifier for an inbound request.
///
/// Prefers an explicit `X-Device-Id`, then walks the trust-boundary address
/// headers in order (`x-forwarded-for` takes the first hop), and falls back
/// to [`UNKNOWN_CLIENT`].
pub fn client_identifier(headers: &HeaderMap) -> String {
    if let Some(device_id) = header_str(headers, "x-device-id") {
        return device_id.to_string();
    }

    if let Some(forwarded) = header_str(headers, "x-forwarded-for") {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    for name in ["x-real-ip", "cf-connecting-ip"] {
        if let Some(ip) = header_str(headers, name) {
            return ip.to_string();
        }
    }

    UNKNOWN_CLIENT.to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const T0: i64 = 1_700_000_000_000;

    #[test]
    fn test_first_call_succeeds_with_full_window() {
        let limiter = RateLimiter::new();
        let r = limiter.check_at("a", 10, T0);
        assert!(r.success);
        assert_eq!(r.limit, 10);
        assert_eq!(r.remaining, 9);
        assert_eq!(r.reset_at, T0 + WINDOW_MS);
    }

    #[test]
    fn test_nth_call_succeeds_iff_within_limit() {
        let limiter = RateLimiter::new();
        for n in 1..=10 {
            let r = limiter.check_at("a", 10, T0 + n);
            assert!(r.success, "call {n} should succeed");
            assert_eq!(r.remaining, 10 - n as u32);
        }
        let r = limiter.check_at("a", 10, T0 + 11);
        assert!(!r.success);
        assert_eq!(r.remaining, 0);
    }

    #[test]
    fn test_exhausted_check_does_not_mutate_state() {
        let limiter = RateLimiter::new();
        for _ in 0..3 {
            limiter.check_at("a", 3, T0);
        }
        let first_denial = limiter.check_at("a", 3, T0);
        let second_denial = limiter.check_at("a", 3, T0);
        assert!(!first_denial.success);
        assert!(!second_denial.success);
        assert_eq!(first_denial.reset_at, second_denial.reset_at);
    }

    #[test]
    fn test_window_expiry_resets_quota() {
        let limiter = RateLimiter::new();
        for _ in 0..10 {
            limiter.check_at("a", 10, T0);
        }
        assert!(!limiter.check_at("a", 10, T0).success);

        // Past reset_at the next call always succeeds, with a new window.
        let later = T0 + WINDOW_MS + 1;
        let r = limiter.check_at("a", 10, later);
        assert!(r.success);
        assert_eq!(r.remaining, 9);
        assert_eq!(r.reset_at, later + WINDOW_MS);
    }

    #[test]
    fn test_identifiers_have_independent_buckets() {
        let limiter = RateLimiter::new();
        assert!(limiter.check_at("a", 1, T0).success);
        // "a" is now exhausted; "b" is untouched.
        assert!(!limiter.check_at("a", 1, T0).success);
        assert!(limiter.check_at("b", 1, T0).success);
    }

    #[test]
    fn test_sweep_removes_only_expired_entries() {
        let limiter = RateLimiter::new();
        limiter.check_at("old", 10, T0);
        limiter.check_at("fresh", 10, T0 + WINDOW_MS);

        let removed = limiter.sweep_expired_at(T0 + WINDOW_MS + 1);
        assert_eq!(removed, 1);

        // The surviving entry still carries its count.
        let r = limiter.check_at("fresh", 10, T0 + WINDOW_MS + 2);
        assert_eq!(r.remaining, 8);
    }

    #[test]
    fn test_expired_entry_equivalent_to_absent_without_sweep() {
        let limiter = RateLimiter::new();
        for _ in 0..10 {
            limiter.check_at("a", 10, T0);
        }
        // No sweep ran, but the entry is past reset_at.
        let r = limiter.check_at("a", 10, T0 + WINDOW_MS + 1);
        assert!(r.success);
        assert_eq!(r.remaining, 9);
    }

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_identifier_prefers_device_id() {
        let h = headers(&[
            ("x-device-id", "device-123"),
            ("x-forwarded-for", "203.0.113.9"),
        ]);
        assert_eq!(client_identifier(&h), "device-123");
    }

    #[test]
    fn test_identifier_takes_first_forwarded_hop() {
        let h = headers(&[("x-forwarded-for", "203.0.113.9, 10.0.0.1")]);
        assert_eq!(client_identifier(&h), "203.0.113.9");
    }

    #[test]
    fn test_identifier_falls_through_header_chain() {
        let h = headers(&[("cf-connecting-ip", "198.51.100.4")]);
        assert_eq!(client_identifier(&h), "198.51.100.4");

        let h = headers(&[
            ("x-real-ip", "192.0.2.1"),
            ("cf-connecting-ip", "198.51.100.4"),
        ]);
        assert_eq!(client_identifier(&h), "192.0.2.1");
    }

    #[test]
    fn test_identifier_unknown_when_no_headers() {
        assert_eq!(client_identifier(&HeaderMap::new()), UNKNOWN_CLIENT);
    }
}
