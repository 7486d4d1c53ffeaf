//! Typed ISOXML elements.

mod allocation;
mod device;
mod partfield;
mod product;
mod task;

pub use allocation::{AllocationStamp, Position, ProductAllocation};
pub use device::{Device, DeviceElement};
pub use partfield::{Customer, Farm, Partfield};
pub use product::Product;
pub use task::{Task, Time, TimeLog};

use crate::enums::IsoEnum;
use crate::node::XmlNode;
use crate::validate::ValidationError;

/// Longest ISOXML object identifier or reference, e.g. `DET-2147483648`.
pub const ID_MAX_LEN: usize = 14;
/// Longest designator string.
pub const DESIGNATOR_MAX_LEN: usize = 32;
/// xs:dateTime with fractional seconds and a zone offset fits in this.
pub const DATE_TIME_MAX_LEN: usize = 40;
/// Upper bound of optional 32-bit quantities; the last value is reserved.
pub const LONG_MAX: i64 = i32::MAX as i64 - 1;

/// Read, validate and write contract shared by every element type.
pub trait IsoElement: Sized {
    /// Element tag, e.g. `PAN`.
    const TAG: &'static str;

    /// Build the element from a generic node. Never fails: absent or
    /// unparsable attributes become `None` and are left to [`IsoElement::validate`].
    fn read(node: &XmlNode) -> Self;

    /// Emit attributes in schema order, skipping `None`, followed by child
    /// elements in schema order.
    fn write(&self) -> XmlNode;

    /// Append every structural violation of this element and its children.
    fn validate(&self, errors: &mut Vec<ValidationError>);

    /// Read all children of `parent` carrying this element's tag.
    fn read_all(parent: &XmlNode) -> Vec<Self> {
        parent.children_named(Self::TAG).map(Self::read).collect()
    }
}

pub(crate) fn read_enum<E: IsoEnum>(node: &XmlNode, name: &str) -> Option<E> {
    node.attr_i64(name).map(E::from_code)
}

pub(crate) fn enum_code<E: IsoEnum>(value: Option<E>) -> Option<i64> {
    value.map(IsoEnum::code)
}

pub(crate) fn write_all<T: IsoElement>(parent: &mut XmlNode, items: &[T]) {
    for item in items {
        parent.push_child(item.write());
    }
}

pub(crate) fn validate_all<T: IsoElement>(items: &[T], errors: &mut Vec<ValidationError>) {
    for item in items {
        item.validate(errors);
    }
}
