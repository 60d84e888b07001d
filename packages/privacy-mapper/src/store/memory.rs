// packages/privacy-mapper/src/store/memory.rs
//! In-memory mapping store
//!
//! Pairs live in per-session tables behind a mutex, so transactions of one
//! session are serialized while different sessions proceed independently.
//! Writes made inside `update` are staged and merged only on success.

use crate::interception::session::SessionId;
use crate::store::{PrivacyMapDb, PrivacyMapStore, PrivacyMapTx};
use crate::utils::errors::{MapperError, Result};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct PairTable {
    real_to_pseudo: HashMap<String, String>,
    pseudo_to_real: HashMap<String, String>,
}

impl PairTable {
    fn insert(&mut self, real: &str, pseudo: &str) {
        self.real_to_pseudo.insert(real.to_string(), pseudo.to_string());
        self.pseudo_to_real.insert(pseudo.to_string(), real.to_string());
    }

    fn merge(&mut self, other: PairTable) {
        self.pseudo_to_real.extend(other.pseudo_to_real);
        self.real_to_pseudo.extend(other.real_to_pseudo);
    }

    fn len(&self) -> usize {
        self.real_to_pseudo.len()
    }
}

/// Mapping store kept entirely in process memory
pub struct InMemoryPrivacyStore {
    sessions: DashMap<SessionId, Arc<Mutex<PairTable>>>,
    available: AtomicBool,
}

impl InMemoryPrivacyStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }

    /// Toggle availability; an unavailable store fails every transaction
    pub fn set_available(&self, available: bool) {
        if !available {
            warn!("Privacy map store marked unavailable");
        }
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of pairs recorded for a session
    pub fn mapping_count(&self, session: SessionId) -> usize {
        self.sessions
            .get(&session)
            .map(|table| table.lock().len())
            .unwrap_or(0)
    }

    /// Number of sessions with a table
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn table(&self, session: SessionId) -> Result<Arc<Mutex<PairTable>>> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(MapperError::StoreFailure("store unavailable".to_string()));
        }

        // Clone the handle so the shard lock is released before the
        // transaction runs.
        let table = self.sessions.entry(session).or_default();
        Ok(Arc::clone(table.value()))
    }
}

impl Default for InMemoryPrivacyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PrivacyMapStore for InMemoryPrivacyStore {
    fn session_db(&self, session: SessionId) -> Box<dyn PrivacyMapDb + '_> {
        Box::new(SessionDb {
            store: self,
            session,
        })
    }
}

struct SessionDb<'a> {
    store: &'a InMemoryPrivacyStore,
    session: SessionId,
}

impl PrivacyMapDb for SessionDb<'_> {
    fn view(&self, f: &mut dyn FnMut(&dyn PrivacyMapTx) -> Result<()>) -> Result<()> {
        let table = self.store.table(self.session)?;
        let guard = table.lock();

        let tx = MemoryTx {
            committed: &guard,
            staged: PairTable::default(),
        };
        f(&tx)
    }

    fn update(&self, f: &mut dyn FnMut(&mut dyn PrivacyMapTx) -> Result<()>) -> Result<()> {
        let table = self.store.table(self.session)?;
        let mut guard = table.lock();

        let staged = {
            let mut tx = MemoryTx {
                committed: &guard,
                staged: PairTable::default(),
            };
            if let Err(err) = f(&mut tx) {
                debug!(
                    "Aborting transaction for session {}, dropping {} staged pairs: {}",
                    self.session,
                    tx.staged.len(),
                    err
                );
                return Err(err);
            }
            tx.staged
        };

        if staged.len() > 0 {
            debug!("Committing {} new pairs for session {}", staged.len(), self.session);
        }
        guard.merge(staged);

        Ok(())
    }
}

struct MemoryTx<'a> {
    committed: &'a PairTable,
    staged: PairTable,
}

impl PrivacyMapTx for MemoryTx<'_> {
    fn new_pair(&mut self, real: &str, pseudo: &str) -> Result<()> {
        if self.real_to_pseudo(real)?.is_some() {
            return Err(MapperError::StoreFailure(format!(
                "real value {} already mapped",
                real
            )));
        }
        if self.pseudo_to_real(pseudo)?.is_some() {
            return Err(MapperError::StoreFailure(format!(
                "pseudonym {} already in use",
                pseudo
            )));
        }

        self.staged.insert(real, pseudo);
        Ok(())
    }

    fn real_to_pseudo(&self, real: &str) -> Result<Option<String>> {
        Ok(self
            .staged
            .real_to_pseudo
            .get(real)
            .or_else(|| self.committed.real_to_pseudo.get(real))
            .cloned())
    }

    fn pseudo_to_real(&self, pseudo: &str) -> Result<Option<String>> {
        Ok(self
            .staged
            .pseudo_to_real
            .get(pseudo)
            .or_else(|| self.committed.pseudo_to_real.get(pseudo))
            .cloned())
    }
}
