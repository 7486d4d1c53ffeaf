#![cfg_attr(docsrs, feature(doc_cfg))]
//! Read, validate and write ISO 11783-10 (ISOXML) task-data documents.
//!
//! Every element type implements [`IsoElement`]: reading is permissive,
//! validation collects violations into a list, and writing emits attributes
//! in schema order.
//!
//! ```rust
//! use isoxml_model::{parse_document, write_document};
//!
//! let xml = r#"<ISO11783_TaskData VersionMajor="4" VersionMinor="3"
//!     ManagementSoftwareManufacturer="FMIS" ManagementSoftwareVersion="1.0"
//!     DataTransferOrigin="1"><PDT A="PDT1" B="Seed"/></ISO11783_TaskData>"#;
//! let doc = parse_document(xml)?;
//! assert!(doc.validation_errors().is_empty());
//! let text = write_document(&doc)?;
//! assert_eq!(parse_document(&text)?, doc);
//! # Ok::<(), isoxml_model::XmlError>(())
//! ```

mod document;
pub mod elements;
pub mod enums;
mod node;
pub mod validate;

use thiserror::Error;
use tracing::debug;

pub use document::TaskData;
pub use elements::{
    AllocationStamp, Customer, Device, DeviceElement, Farm, IsoElement, Partfield, Position,
    Product, ProductAllocation, Task, Time, TimeLog,
};
pub use enums::{
    AllocationStampType, DataTransferOrigin, DeviceElementType, IsoEnum, PositionStatus,
    ProductComposition, TaskStatus, TimeLogType, TimeType, TransferMode,
};
pub use node::XmlNode;
pub use validate::{ValidationError, ViolationKind};

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("xml: {0}")]
    Xml(String),
    #[error("invalid document: {0}")]
    Invalid(String),
}

/// Parse a `TASKDATA.XML` document into typed elements.
///
/// Only syntax errors and a wrong root element fail; structural problems are
/// reported by [`TaskData::validation_errors`].
pub fn parse_document(xml: &str) -> Result<TaskData, XmlError> {
    let root = XmlNode::parse(xml)?;
    if root.name != TaskData::TAG {
        return Err(XmlError::Invalid(format!(
            "expected <{}> root element, found <{}>",
            TaskData::TAG,
            root.name
        )));
    }
    let doc = TaskData::read(&root);
    debug!(
        devices = doc.devices.len(),
        products = doc.products.len(),
        tasks = doc.tasks.len(),
        "parsed task data"
    );
    Ok(doc)
}

/// Serialize a document with its XML declaration.
pub fn write_document(doc: &TaskData) -> Result<String, XmlError> {
    doc.write().to_xml_string()
}
