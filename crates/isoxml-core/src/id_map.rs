//! Correspondence between ISOXML object references and numeric target ids.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

/// Kind of entity an identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EntityKind {
    Customer,
    Farm,
    Partfield,
    Product,
    Device,
    DeviceElement,
    Task,
}

impl EntityKind {
    /// ISOXML tag used as the identifier prefix, e.g. `PDT` in `PDT12`.
    pub const fn prefix(self) -> &'static str {
        match self {
            EntityKind::Customer => "CTR",
            EntityKind::Farm => "FRM",
            EntityKind::Partfield => "PFD",
            EntityKind::Product => "PDT",
            EntityKind::Device => "DVC",
            EntityKind::DeviceElement => "DET",
            EntityKind::Task => "TSK",
        }
    }

    /// Kind named by the prefix of an ISOXML reference.
    pub fn from_iso_ref(iso_ref: &str) -> Option<Self> {
        let prefix = iso_ref.get(..3)?;
        [
            EntityKind::Customer,
            EntityKind::Farm,
            EntityKind::Partfield,
            EntityKind::Product,
            EntityKind::Device,
            EntityKind::DeviceElement,
            EntityKind::Task,
        ]
        .into_iter()
        .find(|kind| kind.prefix() == prefix)
    }
}

/// Two-way table between `(kind, ISOXML reference)` and numeric ids.
///
/// Bindings are never replaced once made. New ids are handed out per kind,
/// starting at the seed, skipping ids already bound through [`IdMap::assign`].
#[derive(Debug, Clone)]
pub struct IdMap {
    seed: i32,
    next: HashMap<EntityKind, i32>,
    forward: HashMap<EntityKind, HashMap<String, i32>>,
    reverse: HashMap<EntityKind, HashMap<i32, String>>,
}

impl Default for IdMap {
    fn default() -> Self {
        Self::with_seed(1)
    }
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table whose first allocated id for every kind is `seed`.
    pub fn with_seed(seed: i32) -> Self {
        Self {
            seed,
            next: HashMap::new(),
            forward: HashMap::new(),
            reverse: HashMap::new(),
        }
    }

    /// Numeric id bound to `iso_ref`, allocating one on first use.
    pub fn map_forward(&mut self, kind: EntityKind, iso_ref: &str) -> i32 {
        if let Some(id) = self.lookup_forward(kind, iso_ref) {
            return id;
        }
        let id = self.allocate(kind);
        self.bind(kind, iso_ref, id);
        debug!(?kind, iso_ref, id, "mapped iso reference");
        id
    }

    /// Bind a known pair. Returns `false` without changing anything when
    /// either side is already bound to something else.
    pub fn assign(&mut self, kind: EntityKind, iso_ref: &str, id: i32) -> bool {
        match (self.lookup_forward(kind, iso_ref), self.lookup_reverse(kind, id)) {
            (Some(existing), _) => existing == id,
            (None, Some(_)) => false,
            (None, None) => {
                self.bind(kind, iso_ref, id);
                true
            }
        }
    }

    pub fn lookup_forward(&self, kind: EntityKind, iso_ref: &str) -> Option<i32> {
        self.forward.get(&kind)?.get(iso_ref).copied()
    }

    pub fn lookup_reverse(&self, kind: EntityKind, id: i32) -> Option<&str> {
        self.reverse.get(&kind)?.get(&id).map(String::as_str)
    }

    /// Number of bindings across all kinds.
    pub fn len(&self) -> usize {
        self.forward.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Next free id of `kind`. Past `i32::MAX` the counter restarts at the
    /// seed and keeps skipping bound ids.
    fn allocate(&mut self, kind: EntityKind) -> i32 {
        let seed = self.seed;
        let next = self.next.entry(kind).or_insert(seed);
        loop {
            let candidate = *next;
            *next = match candidate.checked_add(1) {
                Some(following) => following,
                None => {
                    warn!(?kind, seed, "id range exhausted, restarting at seed");
                    seed
                }
            };
            let taken = self
                .reverse
                .get(&kind)
                .is_some_and(|bound| bound.contains_key(&candidate));
            if !taken {
                return candidate;
            }
        }
    }

    fn bind(&mut self, kind: EntityKind, iso_ref: &str, id: i32) {
        self.forward
            .entry(kind)
            .or_default()
            .insert(iso_ref.to_string(), id);
        self.reverse
            .entry(kind)
            .or_default()
            .insert(id, iso_ref.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_near_the_top_of_the_range_wraps_to_seed() {
        let mut ids = IdMap::with_seed(i32::MAX - 1);
        assert_eq!(ids.map_forward(EntityKind::Task, "TSK1"), i32::MAX - 1);
        assert_eq!(ids.map_forward(EntityKind::Task, "TSK2"), i32::MAX);

        let mut small = IdMap::with_seed(5);
        assert!(small.assign(EntityKind::Task, "TSK9", i32::MAX));
        small.next.insert(EntityKind::Task, i32::MAX);
        assert_eq!(small.map_forward(EntityKind::Task, "TSK1"), 5);
    }

    #[test]
    fn map_forward_is_idempotent() {
        let mut ids = IdMap::new();
        let first = ids.map_forward(EntityKind::Product, "PDT1");
        let again = ids.map_forward(EntityKind::Product, "PDT1");
        assert_eq!(first, again);
        assert_eq!(ids.len(), 1);
        assert_eq!(ids.lookup_reverse(EntityKind::Product, first), Some("PDT1"));
    }

    #[test]
    fn kinds_have_separate_counters() {
        let mut ids = IdMap::with_seed(100);
        assert_eq!(ids.map_forward(EntityKind::Product, "PDT1"), 100);
        assert_eq!(ids.map_forward(EntityKind::Product, "PDT2"), 101);
        assert_eq!(ids.map_forward(EntityKind::DeviceElement, "DET1"), 100);
        assert_eq!(ids.lookup_forward(EntityKind::DeviceElement, "PDT1"), None);
    }

    #[test]
    fn lookups_do_not_insert() {
        let ids = IdMap::new();
        assert_eq!(ids.lookup_forward(EntityKind::Task, "TSK1"), None);
        assert_eq!(ids.lookup_reverse(EntityKind::Task, 1), None);
        assert!(ids.is_empty());
    }

    #[test]
    fn assign_never_overwrites() {
        let mut ids = IdMap::new();
        assert!(ids.assign(EntityKind::Customer, "CTR7", 1));
        assert!(ids.assign(EntityKind::Customer, "CTR7", 1));
        assert!(!ids.assign(EntityKind::Customer, "CTR7", 2));
        assert!(!ids.assign(EntityKind::Customer, "CTR8", 1));
        assert_eq!(ids.lookup_forward(EntityKind::Customer, "CTR8"), None);
        // the allocator skips the id bound by hand
        assert_eq!(ids.map_forward(EntityKind::Customer, "CTR9"), 2);
    }

    #[test]
    fn kind_from_prefix() {
        assert_eq!(EntityKind::from_iso_ref("PDT-3"), Some(EntityKind::Product));
        assert_eq!(EntityKind::from_iso_ref("DET12"), Some(EntityKind::DeviceElement));
        assert_eq!(EntityKind::from_iso_ref("VPN1"), None);
        assert_eq!(EntityKind::from_iso_ref("PD"), None);
    }
}
