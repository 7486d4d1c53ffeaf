//! Product allocations keyed by device element, with hierarchy fallback.

use std::collections::{HashMap, HashSet};

use isoxml_model::ProductAllocation;
use tracing::debug;

use crate::catalog::{Catalog, ProductIdentity};
use crate::diagnostics::Diagnostics;
use crate::hierarchy::DeviceElementHierarchies;
use crate::id_map::{EntityKind, IdMap};
use crate::CoreError;

/// Session state consulted while resolving allocations.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionContext<'a> {
    pub hierarchies: &'a DeviceElementHierarchies,
    pub id_map: &'a IdMap,
    pub catalog: &'a Catalog,
}

/// Allocation lists keyed by the device element they were declared on.
///
/// An element with no entry of its own is governed by the entry of its
/// nearest ancestor.
#[derive(Debug, Clone, Default)]
pub struct ProductAllocations {
    keys: Vec<String>,
    entries: HashMap<String, Vec<ProductAllocation>>,
}

impl ProductAllocations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key each allocation on its device element reference. Allocations
    /// naming an element that no device declares are reported and dropped.
    pub fn from_allocations(
        allocations: &[ProductAllocation],
        hierarchies: &DeviceElementHierarchies,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut out = Self::new();
        for allocation in allocations {
            let Some(element_id) = allocation.device_element_id_ref.as_deref() else {
                debug!(
                    product = ?allocation.product_id_ref,
                    "product allocation without device element"
                );
                continue;
            };
            if !hierarchies.contains(element_id) {
                diagnostics.reference(format!(
                    "ProductAllocation referencing DeviceElement={element_id} skipped since no matching device element found"
                ));
                continue;
            }
            out.insert(element_id, allocation.clone());
        }
        out
    }

    pub fn insert(&mut self, element_id: &str, allocation: ProductAllocation) {
        if let Some(list) = self.entries.get_mut(element_id) {
            list.push(allocation);
            return;
        }
        self.keys.push(element_id.to_string());
        self.entries.insert(element_id.to_string(), vec![allocation]);
    }

    /// Allocations declared directly on `element_id`.
    pub fn get(&self, element_id: &str) -> Option<&[ProductAllocation]> {
        self.entries.get(element_id).map(Vec::as_slice)
    }

    /// Allocations governing `element_id`: its own entry, else the entry of
    /// its nearest ancestor that has one.
    pub fn resolve(
        &self,
        element_id: &str,
        hierarchies: &DeviceElementHierarchies,
    ) -> Option<&[ProductAllocation]> {
        if let Some(list) = self.get(element_id) {
            return Some(list);
        }
        hierarchies
            .ancestors(element_id)
            .find_map(|node| self.get(node.id()))
    }

    /// `true` when `element_id` or one of its ancestors has an entry.
    pub fn governs(&self, element_id: &str, hierarchies: &DeviceElementHierarchies) -> bool {
        self.entries.contains_key(element_id)
            || hierarchies
                .ancestors(element_id)
                .any(|node| self.entries.contains_key(node.id()))
    }

    /// Sorted numeric ids of every allocated product. References the id
    /// table does not know are left out.
    pub fn distinct_product_ids(&self, id_map: &IdMap) -> Vec<i32> {
        let mut ids: Vec<i32> = self
            .entries
            .values()
            .flatten()
            .filter_map(|allocation| allocation.product_id_ref.as_deref())
            .filter_map(|product_ref| id_map.lookup_forward(EntityKind::Product, product_ref))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// A copy holding only the entries keyed on `element_ids`.
    pub fn with_element_hierarchies<I, S>(&self, element_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let wanted: HashSet<String> = element_ids
            .into_iter()
            .map(|id| id.as_ref().to_string())
            .collect();
        let mut out = Self::new();
        for key in self.keys.iter().filter(|key| wanted.contains(*key)) {
            out.keys.push(key.clone());
            out.entries.insert(key.clone(), self.entries[key].clone());
        }
        out
    }

    /// Entries in the order their elements were first keyed.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ProductAllocation])> {
        self.keys
            .iter()
            .filter_map(|key| self.entries.get(key).map(|list| (key.as_str(), list.as_slice())))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Partition the logged elements of `device_id` so that every partition
    /// is governed by a single product identity.
    ///
    /// Elements keyed in this map are grouped by the (form, type) of their
    /// products, in first-encounter order. With at most one group the logged
    /// ids come back as one partition. Otherwise each group keeps the logged
    /// ids that survive removing the subtrees of every other group's
    /// elements. Partitions may be empty.
    pub fn split_by_product_identity(
        &self,
        logged: &[String],
        device_id: &str,
        ctx: &ResolutionContext<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<Vec<String>>, CoreError> {
        let hierarchy = ctx
            .hierarchies
            .hierarchy(device_id)
            .ok_or_else(|| CoreError::UnknownDevice(device_id.to_string()))?;

        let mut identities: Vec<ProductIdentity> = Vec::new();
        let mut group_of: HashMap<&str, usize> = HashMap::new();
        for (element_id, allocations) in self.iter() {
            if !hierarchy.contains(element_id) {
                continue;
            }
            for allocation in allocations {
                let Some(identity) = self.product_identity(allocation, ctx, diagnostics) else {
                    continue;
                };
                match group_of.get(element_id).copied() {
                    Some(first) => {
                        if identities[first] != identity {
                            diagnostics.ambiguity(format!(
                                "DeviceElement={element_id} is allocated products of identity {} and {}; kept {}",
                                identities[first], identity, identities[first]
                            ));
                        }
                    }
                    None => {
                        let group = match identities.iter().position(|known| *known == identity) {
                            Some(group) => group,
                            None => {
                                identities.push(identity);
                                identities.len() - 1
                            }
                        };
                        group_of.insert(element_id, group);
                    }
                }
            }
        }

        if identities.len() <= 1 {
            debug!(
                device = %device_id,
                logged = logged.len(),
                "single product identity, no split"
            );
            return Ok(vec![logged.to_vec()]);
        }

        let partitions: Vec<Vec<String>> = (0..identities.len())
            .map(|group| {
                let others: HashSet<String> = group_of
                    .iter()
                    .filter(|(_, other)| **other != group)
                    .map(|(id, _)| id.to_string())
                    .collect();
                let keep = hierarchy.filter_subtree_ids(&others);
                logged
                    .iter()
                    .filter(|id| keep.contains(*id))
                    .cloned()
                    .collect()
            })
            .collect();

        debug!(
            device = %device_id,
            logged = logged.len(),
            groups = partitions.len(),
            "split logged elements by product identity"
        );
        Ok(partitions)
    }

    fn product_identity(
        &self,
        allocation: &ProductAllocation,
        ctx: &ResolutionContext<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Option<ProductIdentity> {
        let product_ref = allocation.product_id_ref.as_deref().unwrap_or_default();
        let product = ctx
            .id_map
            .lookup_forward(EntityKind::Product, product_ref)
            .and_then(|id| ctx.catalog.product(id));
        match product {
            Some(product) => Some(product.identity()),
            None => {
                diagnostics.reference(format!(
                    "ProductAllocation referencing Product={product_ref} skipped since no matching product found"
                ));
                None
            }
        }
    }
}
