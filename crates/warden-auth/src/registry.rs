//! In-memory registry cache.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::account::Account;

/// The in-memory mirror of the registry file.
///
/// One reader/writer lock guards the whole map: authentication lookups take
/// the read lock concurrently, accounting updates and reload swaps take the
/// write lock. Critical sections only clone or mutate map entries — no I/O,
/// no awaits — so a slow disk can never stall the decision path through here.
/// `parking_lot` locks do not poison, so a panicking caller cannot wedge the
/// registry for subsequent requests.
#[derive(Debug, Default)]
pub struct Registry {
    accounts: RwLock<HashMap<String, Account>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry over a loaded account map.
    pub fn from_accounts(accounts: HashMap<String, Account>) -> Self {
        Self {
            accounts: RwLock::new(accounts),
        }
    }

    /// Look up an account by exact, case-sensitive username.
    ///
    /// Clones the record out so the lock is released before evaluation.
    pub fn get(&self, username: &str) -> Option<Account> {
        self.accounts.read().get(username).cloned()
    }

    /// Atomically replace the entire map (reload).
    ///
    /// Readers observe either the old registry or the new one, never a mix.
    pub fn replace_all(&self, accounts: HashMap<String, Account>) {
        *self.accounts.write() = accounts;
    }

    /// Apply a usage increment to an account's counters.
    ///
    /// Both counters move under one write-lock acquisition, so a concurrent
    /// reader never observes an increment half-applied. Returns `false`
    /// when the username is unknown (e.g. the account was deleted between
    /// the session starting and the traffic report arriving).
    pub fn record_usage(&self, username: &str, upload_delta: u64, download_delta: u64) -> bool {
        let mut accounts = self.accounts.write();
        let Some(account) = accounts.get_mut(username) else {
            return false;
        };
        account.upload_bytes = account
            .upload_bytes
            .saturating_add(clamp_delta(upload_delta));
        account.download_bytes = account
            .download_bytes
            .saturating_add(clamp_delta(download_delta));
        true
    }

    /// Clone the full map for persistence. Serialization happens on the
    /// caller's side, outside the lock.
    pub fn snapshot(&self) -> HashMap<String, Account> {
        self.accounts.read().clone()
    }

    /// Number of accounts.
    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    /// Whether the registry holds no accounts.
    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }
}

/// Deltas arrive as `u64` from the wire; counters are `i64` in the file.
#[inline]
fn clamp_delta(delta: u64) -> i64 {
    i64::try_from(delta).unwrap_or(i64::MAX)
}
