//! Per-case mutual exclusion.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

/// A lazily populated table of per-case async mutexes.
///
/// The outer mutex is held only long enough to look up or insert an entry,
/// never across an `.await`. Entries nobody holds or waits on are dropped on
/// the next lookup.
#[derive(Debug, Default)]
pub struct CaseLocks {
  inner: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl CaseLocks {
  pub fn new() -> Self { Self::default() }

  /// Wait for exclusive access to `case_id`. Released when the guard drops.
  pub async fn lock(&self, case_id: Uuid) -> OwnedMutexGuard<()> {
    let mutex = {
      let mut table = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
      table.retain(|id, m| *id == case_id || Arc::strong_count(m) > 1);
      Arc::clone(table.entry(case_id).or_default())
    };
    mutex.lock_owned().await
  }

  /// Number of cases with a live entry.
  pub fn len(&self) -> usize {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}
