#![cfg_attr(docsrs, feature(doc_cfg))]
//! ISOXML conversion facade that re-exports the workspace crates and runs
//! import and export passes.
//!
//! ```rust,no_run
//! use isoxml::{ConversionOptions, ConversionSession, TaskImporter};
//!
//! # fn run() -> Result<(), isoxml::ConvertError> {
//! let doc = isoxml::read_task_data("TASKDATA/TASKDATA.XML")?;
//! let mut session = ConversionSession::from_document(&doc, ConversionOptions::default());
//! let output = TaskImporter::new().import(&doc, &mut session)?;
//! for logged in &output.logged_data {
//!     println!("task {} -> {} operations", logged.id, logged.operation_data.len());
//! }
//! for diagnostic in session.diagnostics().iter() {
//!     eprintln!("{diagnostic}");
//! }
//! # Ok(())
//! # }
//! ```

pub use isoxml_core as adm;
pub use isoxml_model as iso;

pub mod export;
pub mod import;
mod session;

use std::path::Path;

use isoxml_core::CoreError;
use isoxml_model::{TaskData, XmlError};
use thiserror::Error;
use tracing::debug;

pub use export::{BinaryTimeLogMapper, IdRegistry, TaskMapper, TimeLogMapper, TimeMapper};
pub use import::{ImportOutput, TaskImporter};
pub use session::{ConversionOptions, ConversionSession};

/// Error type produced by conversion passes.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The document could not be parsed or written.
    #[error(transparent)]
    Xml(#[from] XmlError),
    /// A resolution query named something the session does not hold.
    #[error(transparent)]
    Core(#[from] CoreError),
    /// No task with this id in the document.
    #[error("unknown task: {0}")]
    UnknownTask(String),
    /// No device with this id in the document.
    #[error("unknown device: {0}")]
    UnknownDevice(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Read and parse a `TASKDATA.XML` file.
pub fn read_task_data(path: impl AsRef<Path>) -> Result<TaskData, ConvertError> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = xml.len(), "read task data");
    Ok(isoxml_model::parse_document(&xml)?)
}

/// Serialize `doc` and write it to `path`.
pub fn write_task_data(path: impl AsRef<Path>, doc: &TaskData) -> Result<(), ConvertError> {
    let path = path.as_ref();
    let xml = isoxml_model::write_document(doc)?;
    std::fs::write(path, xml.as_bytes())?;
    debug!(path = %path.display(), bytes = xml.len(), "wrote task data");
    Ok(())
}
