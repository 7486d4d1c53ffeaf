//! Target model and resolution engine for ISOXML conversion: the id
//! correspondence table, device element hierarchies and product allocation
//! resolution.

mod allocation;
mod catalog;
mod diagnostics;
mod hierarchy;
mod id_map;
mod logged;

pub use allocation::{ProductAllocations, ResolutionContext};
pub use catalog::{
    Catalog, CompoundId, Farm, Field, Grower, Identified, Indexed, Product, ProductForm,
    ProductIdentity, ProductType,
};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use hierarchy::{Ancestors, DeviceElementHierarchies, DeviceElementHierarchy, HierarchyNode};
pub use id_map::{EntityKind, IdMap};
pub use logged::{LoggedData, OperationData, TimeScope};

use thiserror::Error;

/// Contract violations raised by resolution queries.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The device has no hierarchy in this session.
    #[error("unknown device: {0}")]
    UnknownDevice(String),
}
