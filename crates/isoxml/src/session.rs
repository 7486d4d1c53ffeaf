//! State owned by one conversion pass.

use isoxml_core::{
    Catalog, DeviceElementHierarchies, Diagnostics, IdMap, ProductAllocations, ResolutionContext,
};
use isoxml_model::{Task, TaskData};
use tracing::info;

use crate::ConvertError;

/// Knobs for a conversion pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Export logged data that follows a prescription.
    pub include_if_prescription: bool,
    /// First numeric id handed out per entity kind.
    pub id_seed: i32,
    /// Record codec violations as structural diagnostics when opening a
    /// document.
    pub validate: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            include_if_prescription: true,
            id_seed: 1,
            validate: true,
        }
    }
}

/// Id table, hierarchies, catalog and diagnostics of a single document.
///
/// Nothing here is shared between sessions; convert independent documents
/// with independent sessions.
#[derive(Debug)]
pub struct ConversionSession {
    options: ConversionOptions,
    pub(crate) id_map: IdMap,
    pub(crate) hierarchies: DeviceElementHierarchies,
    pub(crate) catalog: Catalog,
    pub(crate) diagnostics: Diagnostics,
    next_operation_id: i32,
}

impl ConversionSession {
    pub fn new(options: ConversionOptions) -> Self {
        Self {
            options,
            id_map: IdMap::with_seed(options.id_seed),
            hierarchies: DeviceElementHierarchies::default(),
            catalog: Catalog::new(),
            diagnostics: Diagnostics::new(),
            next_operation_id: options.id_seed,
        }
    }

    /// Validate `doc` unless disabled and build the hierarchies of its
    /// devices.
    pub fn from_document(doc: &TaskData, options: ConversionOptions) -> Self {
        let mut session = Self::new(options);
        if options.validate {
            session.diagnostics.extend_validation(doc.validation_errors());
        }
        session.hierarchies = DeviceElementHierarchies::from_devices(&doc.devices, &mut session.diagnostics);
        info!(
            devices = session.hierarchies.len(),
            diagnostics = session.diagnostics.len(),
            "opened conversion session"
        );
        session
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    pub fn id_map(&self) -> &IdMap {
        &self.id_map
    }

    pub fn id_map_mut(&mut self) -> &mut IdMap {
        &mut self.id_map
    }

    pub fn hierarchies(&self) -> &DeviceElementHierarchies {
        &self.hierarchies
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    pub fn context(&self) -> ResolutionContext<'_> {
        ResolutionContext {
            hierarchies: &self.hierarchies,
            id_map: &self.id_map,
            catalog: &self.catalog,
        }
    }

    /// Allocation map of `task`, keyed on the device elements its `PAN`s name.
    pub fn allocations(&mut self, task: &Task) -> ProductAllocations {
        ProductAllocations::from_allocations(
            &task.product_allocations,
            &self.hierarchies,
            &mut self.diagnostics,
        )
    }

    /// Split the logged elements of `device_id` within task `task_id` into
    /// product-homogeneous partitions.
    pub fn split(
        &mut self,
        doc: &TaskData,
        task_id: &str,
        device_id: &str,
        logged: &[String],
    ) -> Result<Vec<Vec<String>>, ConvertError> {
        let task = doc
            .task(task_id)
            .ok_or_else(|| ConvertError::UnknownTask(task_id.to_string()))?;
        let allocations = self.allocations(task);
        let device_ids: Vec<String> = self
            .hierarchies
            .hierarchy(device_id)
            .ok_or_else(|| ConvertError::UnknownDevice(device_id.to_string()))?
            .ids()
            .map(str::to_string)
            .collect();
        let scoped = allocations.with_element_hierarchies(&device_ids);
        let ctx = ResolutionContext {
            hierarchies: &self.hierarchies,
            id_map: &self.id_map,
            catalog: &self.catalog,
        };
        let partitions =
            scoped.split_by_product_identity(logged, device_id, &ctx, &mut self.diagnostics)?;
        Ok(partitions)
    }

    /// Past `i32::MAX` operation ids restart at the seed.
    pub(crate) fn next_operation_id(&mut self) -> i32 {
        let id = self.next_operation_id;
        self.next_operation_id = id.checked_add(1).unwrap_or(self.options.id_seed);
        id
    }

    /// Hand back the collected diagnostics, ending the session.
    pub fn finish(self) -> Diagnostics {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isoxml_core::{DiagnosticKind, EntityKind};

    #[test]
    fn seed_applies_to_ids() {
        let mut session = ConversionSession::new(ConversionOptions {
            id_seed: 100,
            ..ConversionOptions::default()
        });
        assert_eq!(session.id_map_mut().map_forward(EntityKind::Task, "TSK1"), 100);
        assert_eq!(session.next_operation_id(), 100);
        assert_eq!(session.next_operation_id(), 101);

        let mut top = ConversionSession::new(ConversionOptions {
            id_seed: i32::MAX,
            ..ConversionOptions::default()
        });
        assert_eq!(top.next_operation_id(), i32::MAX);
        assert_eq!(top.next_operation_id(), i32::MAX);
    }

    #[test]
    fn document_defects_become_diagnostics() {
        let doc = isoxml_model::parse_document(
            r#"<ISO11783_TaskData VersionMajor="4" VersionMinor="3" ManagementSoftwareManufacturer="acme" ManagementSoftwareVersion="1.0" DataTransferOrigin="1">
                 <DVC A="DVC1" D="A00084000F000000" F="0" G="0">
                   <DET A="DET1" B="1" C="1" E="0" F="0"/>
                   <DET A="DET2" C="3" E="1" F="1"/>
                 </DVC>
               </ISO11783_TaskData>"#,
        )
        .unwrap();
        let session = ConversionSession::from_document(&doc, ConversionOptions::default());
        assert_eq!(session.hierarchies().len(), 1);
        assert_eq!(session.diagnostics().count(DiagnosticKind::Structural), 1);
        assert_eq!(
            session.hierarchies().element("DET2").and_then(|n| n.parent()),
            Some("DET1")
        );
    }

    #[test]
    fn validation_can_be_left_out() {
        let doc = isoxml_model::parse_document(
            r#"<ISO11783_TaskData VersionMajor="4" VersionMinor="3" ManagementSoftwareManufacturer="acme" ManagementSoftwareVersion="1.0" DataTransferOrigin="1">
                 <PDT A="PDT1"/>
                 <TSK A="TSK1" G="1"><PAN A="PDT1" E="DET7"/></TSK>
               </ISO11783_TaskData>"#,
        )
        .unwrap();
        let options = ConversionOptions {
            validate: false,
            ..ConversionOptions::default()
        };
        let mut session = ConversionSession::from_document(&doc, options);
        assert!(session.diagnostics().is_empty());
        let task = doc.task("TSK1").unwrap();
        assert!(session.allocations(task).is_empty());
        assert_eq!(session.diagnostics().count(DiagnosticKind::Reference), 1);
    }

    #[test]
    fn split_needs_known_task_and_device() {
        let doc = TaskData::new("acme", "1.0");
        let mut session = ConversionSession::from_document(&doc, ConversionOptions::default());
        let err = session.split(&doc, "TSK1", "DVC1", &[]).unwrap_err();
        assert!(matches!(err, ConvertError::UnknownTask(_)));
    }
}
