//! Read-only access to the location corpus.
//!
//! The engine never talks to a database directly: everything goes through
//! [`Repository`], and the concrete store is injected at process start.
//! [`Snapshot`] is the in-memory implementation used in production (loaded
//! from Postgres by the db crate and refreshed on a schedule) and in tests.

use std::collections::HashMap;

use uuid::Uuid;

use centrescan_core::{Location, Tenant};

use crate::error::RepositoryError;
use crate::normalize::normalize;

/// Read path into the location corpus. Implementations never expose writes.
pub trait Repository {
    /// Single location lookup.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Unavailable`] if the store cannot be
    /// reached.
    fn location_by_id(&self, id: Uuid) -> Result<Option<Location>, RepositoryError>;

    /// Locations whose normalized name contains the normalized fragment.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Unavailable`] if the store cannot be
    /// reached.
    fn locations_by_name_fragment(&self, fragment: &str)
        -> Result<Vec<Location>, RepositoryError>;

    /// Every location in the corpus, in a stable order.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Unavailable`] if the store cannot be
    /// reached.
    fn all_locations(&self) -> Result<Vec<Location>, RepositoryError>;

    /// Tenants of one location.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Unavailable`] if the store cannot be
    /// reached.
    fn tenants_by_location(&self, id: Uuid) -> Result<Vec<Tenant>, RepositoryError>;

    /// Tenants of several locations in one call. Unknown ids yield nothing.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Unavailable`] if the store cannot be
    /// reached.
    fn tenants_by_locations(&self, ids: &[Uuid]) -> Result<Vec<Tenant>, RepositoryError>;
}

/// Immutable in-memory view of the corpus at a point in time.
///
/// Locations are held sorted by id so every traversal is deterministic,
/// which the resolver's tie-breaking depends on.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    locations: Vec<Location>,
    index: HashMap<Uuid, usize>,
    tenants: HashMap<Uuid, Vec<Tenant>>,
}

impl Snapshot {
    #[must_use]
    pub fn new(mut locations: Vec<Location>, tenants: Vec<Tenant>) -> Self {
        locations.sort_by_key(|l| l.id);
        locations.dedup_by_key(|l| l.id);

        let index = locations
            .iter()
            .enumerate()
            .map(|(i, l)| (l.id, i))
            .collect::<HashMap<_, _>>();

        let mut by_location: HashMap<Uuid, Vec<Tenant>> = HashMap::new();
        for tenant in tenants {
            // Tenants of locations missing from the snapshot are dropped;
            // they cannot be attributed to anything.
            if index.contains_key(&tenant.location_id) {
                by_location.entry(tenant.location_id).or_default().push(tenant);
            }
        }
        for list in by_location.values_mut() {
            list.sort_by_key(|t| t.id);
        }

        Self {
            locations,
            index,
            tenants: by_location,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    #[must_use]
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }
}

impl Repository for Snapshot {
    fn location_by_id(&self, id: Uuid) -> Result<Option<Location>, RepositoryError> {
        Ok(self.index.get(&id).map(|&i| self.locations[i].clone()))
    }

    fn locations_by_name_fragment(
        &self,
        fragment: &str,
    ) -> Result<Vec<Location>, RepositoryError> {
        let needle = normalize(fragment);
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .locations
            .iter()
            .filter(|l| normalize(&l.name).contains(&needle))
            .cloned()
            .collect())
    }

    fn all_locations(&self) -> Result<Vec<Location>, RepositoryError> {
        Ok(self.locations.clone())
    }

    fn tenants_by_location(&self, id: Uuid) -> Result<Vec<Tenant>, RepositoryError> {
        Ok(self.tenants.get(&id).cloned().unwrap_or_default())
    }

    fn tenants_by_locations(&self, ids: &[Uuid]) -> Result<Vec<Tenant>, RepositoryError> {
        let mut out = Vec::new();
        for id in ids {
            if let Some(list) = self.tenants.get(id) {
                out.extend(list.iter().cloned());
            }
        }
        Ok(out)
    }
}
