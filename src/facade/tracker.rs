use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Registry of in-flight actions, keyed `"<action>-<id>"`.
///
/// Prevents duplicate submission from repeated clicks on the same control
/// while letting distinct operations on different notifications run
/// concurrently. The guard releases its key on drop, so error paths
/// cannot leave an action stuck in flight.
pub struct ActionTracker {
    pending: DashMap<String, ()>,
}

impl ActionTracker {
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
        }
    }

    /// Claim a key. Returns `None` when the action is already in flight.
    pub fn try_begin(&self, key: &str) -> Option<ActionGuard<'_>> {
        match self.pending.entry(key.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(entry) => {
                entry.insert(());
                Some(ActionGuard {
                    tracker: self,
                    key: key.to_string(),
                })
            }
        }
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }
}

impl Default for ActionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases the claimed key when dropped.
pub struct ActionGuard<'a> {
    tracker: &'a ActionTracker,
    key: String,
}

impl Drop for ActionGuard<'_> {
    fn drop(&mut self) {
        self.tracker.pending.remove(&self.key);
    }
}
