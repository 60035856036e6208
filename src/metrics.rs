//! Process-wide server counters.
//! Plain relaxed atomics; the values are informational and only ever summed or compared.
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

static CONNECTIONS_ACCEPTED: AtomicU64 = AtomicU64::new(0);
static CONNECTIONS_ACTIVE: AtomicU64 = AtomicU64::new(0);
static CONNECTIONS_PEAK: AtomicU64 = AtomicU64::new(0);
static COMMANDS_PROCESSED: AtomicU64 = AtomicU64::new(0);
static UNKNOWN_COMMANDS: AtomicU64 = AtomicU64::new(0);
static POSTS_CREATED: AtomicU64 = AtomicU64::new(0);
static ERROR_REPLIES: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerCounters {
    pub connections_accepted: u64,
    pub connections_active: u64,
    pub connections_peak: u64,
    pub commands_processed: u64,
    pub unknown_commands: u64,
    pub posts_created: u64,
    pub error_replies: u64,
}

/// Count a new connection and return the number now active.
pub fn record_connection_opened() -> u64 {
    CONNECTIONS_ACCEPTED.fetch_add(1, Ordering::Relaxed);
    let active = CONNECTIONS_ACTIVE.fetch_add(1, Ordering::Relaxed) + 1;
    CONNECTIONS_PEAK.fetch_max(active, Ordering::Relaxed);
    active
}

/// Count a closed connection and return the number still active.
pub fn record_connection_closed() -> u64 {
    let prev = CONNECTIONS_ACTIVE
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| Some(n.saturating_sub(1)))
        .unwrap_or(0);
    prev.saturating_sub(1)
}

pub fn inc_commands() {
    COMMANDS_PROCESSED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_unknown_commands() {
    UNKNOWN_COMMANDS.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_posts() {
    POSTS_CREATED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_error_replies() {
    ERROR_REPLIES.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> ServerCounters {
    ServerCounters {
        connections_accepted: CONNECTIONS_ACCEPTED.load(Ordering::Relaxed),
        connections_active: CONNECTIONS_ACTIVE.load(Ordering::Relaxed),
        connections_peak: CONNECTIONS_PEAK.load(Ordering::Relaxed),
        commands_processed: COMMANDS_PROCESSED.load(Ordering::Relaxed),
        unknown_commands: UNKNOWN_COMMANDS.load(Ordering::Relaxed),
        posts_created: POSTS_CREATED.load(Ordering::Relaxed),
        error_replies: ERROR_REPLIES.load(Ordering::Relaxed),
    }
}
