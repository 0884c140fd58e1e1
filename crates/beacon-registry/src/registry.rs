//! System registry — tracks announced systems and when they were last seen.
//!
//! All mutation and enumeration go through a single table-wide mutex.
//! Reads hand out cloned snapshots, never references into the table, so
//! a listing can never observe the map mid-mutation. The lock is only
//! held for the duration of the table access — no I/O inside.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Placeholder used when an announce carries no display name.
pub const DEFAULT_DISPLAY_NAME: &str = "Unknown System";

/// Retention policy: how often to sweep, when to evict, when to hide.
///
/// The availability window is intentionally shorter than the entry TTL:
/// a system stops being listed as available well before its entry is
/// actually deleted, so the availability signal degrades first.
#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    /// How often the background sweeper wakes.
    pub sweep_interval: Duration,
    /// Entries not refreshed within this are deleted by the sweeper.
    pub entry_ttl: Duration,
    /// Entries not refreshed within this are hidden from `list_available`.
    /// Must be shorter than `entry_ttl`.
    pub availability_window: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(60),
            entry_ttl: Duration::from_secs(300),
            availability_window: Duration::from_secs(120),
        }
    }
}

/// One announced system's current known location and liveness.
#[derive(Debug, Clone)]
pub struct SystemEntry {
    /// IP or hostname, as announced (or inferred by the transport).
    pub address: String,
    /// Port the system serves on.
    pub port: u16,
    /// Human-readable name.
    pub display_name: String,
    /// Refreshed to "now" on every announce. Nothing else mutates it.
    pub last_seen: Instant,
}

/// Announce rejected by the store itself.
///
/// The HTTP boundary validates first; this is the store refusing to
/// accept an incomplete record regardless of who calls it.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AnnounceError {
    #[error("system_id must not be empty")]
    EmptySystemId,
}

/// The registry — one table of announced systems behind one lock.
///
/// Constructed explicitly and shared via `Arc`; multiple independent
/// instances can coexist (tests rely on this).
pub struct Registry {
    policy: RetentionPolicy,
    systems: Mutex<HashMap<String, SystemEntry>>,
}

impl Registry {
    pub fn new(policy: RetentionPolicy) -> Self {
        debug_assert!(
            policy.entry_ttl > policy.availability_window,
            "entry_ttl must exceed availability_window"
        );
        Self {
            policy,
            systems: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Upsert a system, stamping `last_seen` with the current time.
    ///
    /// A re-announce under the same id fully overwrites the previous
    /// address, port, and display name.
    pub fn announce(
        &self,
        system_id: &str,
        address: String,
        port: u16,
        display_name: Option<String>,
    ) -> Result<(), AnnounceError> {
        self.announce_at(Instant::now(), system_id, address, port, display_name)
    }

    /// `announce` with an explicit timestamp. Tests use this to simulate
    /// elapsed time without sleeping.
    pub fn announce_at(
        &self,
        now: Instant,
        system_id: &str,
        address: String,
        port: u16,
        display_name: Option<String>,
    ) -> Result<(), AnnounceError> {
        if system_id.is_empty() {
            return Err(AnnounceError::EmptySystemId);
        }
        let entry = SystemEntry {
            address,
            port,
            display_name: display_name.unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
            last_seen: now,
        };
        self.lock().insert(system_id.to_string(), entry);
        Ok(())
    }

    /// Consistent point-in-time snapshot of every entry, unfiltered.
    pub fn list_all(&self) -> HashMap<String, SystemEntry> {
        self.lock().clone()
    }

    /// Snapshot of entries still inside the availability window.
    pub fn list_available(&self) -> HashMap<String, SystemEntry> {
        self.list_available_at(Instant::now())
    }

    /// `list_available` against an explicit "now".
    pub fn list_available_at(&self, now: Instant) -> HashMap<String, SystemEntry> {
        let window = self.policy.availability_window;
        self.lock()
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.last_seen) <= window)
            .map(|(id, entry)| (id.clone(), entry.clone()))
            .collect()
    }

    /// Delete an entry. Returns whether it existed — absence is a
    /// normal outcome, not an error.
    pub fn remove(&self, system_id: &str) -> bool {
        self.lock().remove(system_id).is_some()
    }

    /// Delete every entry staler than the hard TTL. Returns the number
    /// removed. The sweeper calls this once per wake.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// `sweep` against an explicit "now".
    ///
    /// "now" is fixed before iterating, and the whole pass runs under
    /// the table lock, so an announce that races the sweep is either
    /// applied before the pass (the entry survives) or after it (its
    /// recreation looks like a first announce).
    pub fn sweep_at(&self, now: Instant) -> usize {
        let ttl = self.policy.entry_ttl;
        let mut systems = self.lock();
        let before = systems.len();
        systems.retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= ttl);
        before - systems.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, SystemEntry>> {
        // A poisoned lock means a panic mid-insert/remove on a HashMap,
        // which leaves the table itself intact — keep going.
        self.systems
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
