//! Target-model catalog: growers, farms, fields and products keyed by
//! numeric reference id.

use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// Numeric id of a target-model entity plus the ISOXML id it was read from
/// or written as, when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompoundId {
    pub reference_id: i32,
    pub iso_id: Option<String>,
}

impl CompoundId {
    pub fn new(reference_id: i32) -> Self {
        Self {
            reference_id,
            iso_id: None,
        }
    }

    pub fn with_iso_id(reference_id: i32, iso_id: impl Into<String>) -> Self {
        Self {
            reference_id,
            iso_id: Some(iso_id.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grower {
    pub id: CompoundId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Farm {
    pub id: CompoundId,
    pub description: String,
    pub grower_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub id: CompoundId,
    pub description: String,
    pub grower_id: Option<i32>,
    pub farm_id: Option<i32>,
    /// Square metres.
    pub area: Option<i64>,
}

/// Physical state a product is applied in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProductForm {
    Liquid,
    Solid,
    Gas,
    Unknown,
}

impl ProductForm {
    /// Form implied by the unit dimension of a quantity DDI: volume is
    /// liquid, mass and count are solid. Covers the application rate ranges
    /// as well as the content and total DDIs a `PDT` usually carries.
    pub fn from_quantity_ddi(ddi: u16) -> Self {
        match ddi {
            // volume per area, per volume, per mass, per time
            0x0001..=0x0005 | 0x0015..=0x0019 | 0x001F..=0x0023 | 0x0024..=0x0028 => {
                ProductForm::Liquid
            }
            // mass and count per area, mass per mass, mass and count per time
            0x0006..=0x000F | 0x001A..=0x001E | 0x0029..=0x0032 => ProductForm::Solid,
            // volume content, total volume
            0x0048 | 0x0050 => ProductForm::Liquid,
            // mass and count content, total mass and count
            0x0049 | 0x004A | 0x0051 | 0x0052 => ProductForm::Solid,
            _ => ProductForm::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProductType {
    Generic,
    Fertilizer,
    Chemical,
    Variety,
    Mix,
}

/// The classification two allocations must share to be logged together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ProductIdentity {
    pub form: ProductForm,
    pub product_type: ProductType,
}

impl fmt::Display for ProductIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}", self.form, self.product_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: CompoundId,
    pub description: String,
    pub form: ProductForm,
    pub product_type: ProductType,
}

impl Product {
    pub fn identity(&self) -> ProductIdentity {
        ProductIdentity {
            form: self.form,
            product_type: self.product_type,
        }
    }
}

/// Entities addressable by their compound id.
pub trait Identified {
    fn id(&self) -> &CompoundId;
}

impl Identified for Grower {
    fn id(&self) -> &CompoundId {
        &self.id
    }
}

impl Identified for Farm {
    fn id(&self) -> &CompoundId {
        &self.id
    }
}

impl Identified for Field {
    fn id(&self) -> &CompoundId {
        &self.id
    }
}

impl Identified for Product {
    fn id(&self) -> &CompoundId {
        &self.id
    }
}

/// Insertion-ordered list with an index on the reference id.
#[derive(Debug, Clone)]
pub struct Indexed<T> {
    items: Vec<T>,
    index: HashMap<i32, usize>,
}

impl<T> Default for Indexed<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Identified> Indexed<T> {
    /// Add an item; an item whose reference id is already present is refused.
    pub fn insert(&mut self, item: T) -> bool {
        let key = item.id().reference_id;
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.items.len());
        self.items.push(item);
        true
    }

    pub fn get(&self, reference_id: i32) -> Option<&T> {
        self.index.get(&reference_id).map(|&pos| &self.items[pos])
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Serialize> Serialize for Indexed<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

/// Entities already converted into the target model.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    pub growers: Indexed<Grower>,
    pub farms: Indexed<Farm>,
    pub fields: Indexed<Field>,
    pub products: Indexed<Product>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grower(&self, reference_id: i32) -> Option<&Grower> {
        self.growers.get(reference_id)
    }

    pub fn farm(&self, reference_id: i32) -> Option<&Farm> {
        self.farms.get(reference_id)
    }

    pub fn field(&self, reference_id: i32) -> Option<&Field> {
        self.fields.get(reference_id)
    }

    pub fn product(&self, reference_id: i32) -> Option<&Product> {
        self.products.get(reference_id)
    }
}
