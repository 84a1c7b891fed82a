//! Brute-force protection for the login endpoint.
//!
//! Failed logins are counted per account identifier over a trailing window.
//! An identifier with too many recent failures is refused outright, and an
//! identifier that keeps failing gets the client address blocked for a while.
//! Everything lives in memory and is reset on restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch.
pub type Timestamp = u64;

/// Source of the current time for the throttle.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Clock that only moves when told to. Used by tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self { now: AtomicU64::new(start) }
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Trailing span over which failures count.
    pub window_secs: u64,
    /// Failures within the window at which the identifier is refused.
    pub max_identifier_failures: usize,
    /// Failures within the window at which the client address gets blocked.
    pub ip_block_threshold: usize,
    pub ip_block_secs: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            window_secs: 900, // 15 minutes
            max_identifier_failures: 5,
            ip_block_threshold: 10,
            ip_block_secs: 900,
        }
    }
}

/// Recent failed login attempts per identifier.
#[derive(Clone)]
pub struct AttemptLedger {
    attempts: Arc<Mutex<HashMap<String, Vec<Timestamp>>>>,
    window_secs: u64,
    max_failures: usize,
}

impl AttemptLedger {
    pub fn new(window_secs: u64, max_failures: usize) -> Self {
        Self {
            attempts: Arc::new(Mutex::new(HashMap::new())),
            window_secs,
            max_failures,
        }
    }

    /// Prune stale failures for `identifier`, then report whether it may
    /// attempt another login.
    pub fn is_allowed(&self, identifier: &str, now: Timestamp) -> bool {
        self.recent_failures(identifier, now) < self.max_failures
    }

    pub fn record_failure(&self, identifier: &str, now: Timestamp) {
        let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        map.entry(identifier.to_string()).or_default().push(now);
    }

    /// Number of failures for `identifier` inside the window ending at `now`.
    /// Prunes older entries but keeps the key.
    pub fn recent_failures(&self, identifier: &str, now: Timestamp) -> usize {
        let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        match map.get_mut(identifier) {
            Some(timestamps) => {
                timestamps.retain(|t| now.saturating_sub(*t) < self.window_secs);
                timestamps.len()
            }
            None => 0,
        }
    }

    /// Drop identifiers with no failures left inside the window.
    pub fn sweep(&self, now: Timestamp) {
        let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        map.retain(|_, timestamps| {
            timestamps.retain(|t| now.saturating_sub(*t) < self.window_secs);
            !timestamps.is_empty()
        });
    }
}

/// Temporarily blocked client addresses.
#[derive(Clone, Default)]
pub struct IpBlocklist {
    blocked: Arc<Mutex<HashMap<String, Timestamp>>>,
}

impl IpBlocklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_blocked(&self, address: &str, now: Timestamp) -> bool {
        let map = self.blocked.lock().unwrap_or_else(|e| e.into_inner());
        map.get(address).is_some_and(|expiry| *expiry > now)
    }

    pub fn block(&self, address: &str, now: Timestamp, duration_secs: u64) {
        let mut map = self.blocked.lock().unwrap_or_else(|e| e.into_inner());
        map.insert(address.to_string(), now.saturating_add(duration_secs));
    }

    /// Drop blocks that have expired.
    pub fn sweep(&self, now: Timestamp) {
        let mut map = self.blocked.lock().unwrap_or_else(|e| e.into_inner());
        map.retain(|_, expiry| *expiry > now);
    }
}

/// Single decision point consulted before and after a password check.
///
/// Never hold on to this across password verification; each call takes
/// and releases its locks internally.
#[derive(Clone)]
pub struct LoginThrottle {
    ledger: AttemptLedger,
    blocklist: IpBlocklist,
    config: ThrottleConfig,
    clock: Arc<dyn Clock>,
}

impl LoginThrottle {
    pub fn new(config: ThrottleConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger: AttemptLedger::new(config.window_secs, config.max_identifier_failures),
            blocklist: IpBlocklist::new(),
            config,
            clock,
        }
    }

    pub fn with_system_clock(config: ThrottleConfig) -> Self {
        Self::new(config, Arc::new(SystemClock))
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn ledger(&self) -> &AttemptLedger {
        &self.ledger
    }

    pub fn blocklist(&self) -> &IpBlocklist {
        &self.blocklist
    }

    /// Forget identifiers and addresses that no longer affect any decision.
    /// Checks prune per identifier; this also drops keys nobody asks about again.
    pub fn sweep(&self, now: Timestamp) {
        self.ledger.sweep(now);
        self.blocklist.sweep(now);
    }

    /// Returns false if either the identifier or the address is throttled.
    pub fn check_allowed(&self, identifier: &str, address: &str) -> bool {
        self.check_allowed_at(identifier, address, self.now())
    }

    pub fn check_allowed_at(&self, identifier: &str, address: &str, now: Timestamp) -> bool {
        if !self.ledger.is_allowed(identifier, now) {
            return false;
        }
        !self.blocklist.is_blocked(address, now)
    }

    pub fn record_failed_attempt(&self, identifier: &str, address: &str) {
        self.record_failed_attempt_at(identifier, address, self.now());
    }

    pub fn record_failed_attempt_at(&self, identifier: &str, address: &str, now: Timestamp) {
        self.ledger.record_failure(identifier, now);

        let failures = self.ledger.recent_failures(identifier, now);
        if failures >= self.config.ip_block_threshold {
            self.blocklist.block(address, now, self.config.ip_block_secs);
            log::warn!(
                "Blocking {address} for {}s after repeated login failures",
                self.config.ip_block_secs
            );
        }
    }
}
