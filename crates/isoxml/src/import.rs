//! ISOXML document to target model.

use std::collections::BTreeSet;

use isoxml_core::{
    CompoundId, EntityKind, Farm, Field, Grower, LoggedData, OperationData, Product,
    ProductAllocations, ProductForm, ProductType, TimeScope,
};
use isoxml_model::{ProductComposition, Task, TaskData, Time};
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::{debug, info};

use crate::session::ConversionSession;
use crate::ConvertError;

/// Result of importing one document.
#[derive(Debug)]
pub struct ImportOutput {
    pub logged_data: Vec<LoggedData>,
}

/// Converts catalog entities and tasks of a document.
#[derive(Debug, Default)]
pub struct TaskImporter;

impl TaskImporter {
    pub fn new() -> Self {
        Self
    }

    /// Import `doc` into `session`: catalog first, then one [`LoggedData`]
    /// per task.
    pub fn import(
        &self,
        doc: &TaskData,
        session: &mut ConversionSession,
    ) -> Result<ImportOutput, ConvertError> {
        self.import_catalog(doc, session);
        for device in &doc.devices {
            if let Some(device_id) = device.device_id.as_deref() {
                session.id_map.map_forward(EntityKind::Device, device_id);
            }
            for element in &device.elements {
                if let Some(element_id) = element.device_element_id.as_deref() {
                    session.id_map.map_forward(EntityKind::DeviceElement, element_id);
                }
            }
        }

        let mut logged_data = Vec::with_capacity(doc.tasks.len());
        for task in &doc.tasks {
            logged_data.push(self.import_task(task, session)?);
        }
        info!(
            tasks = logged_data.len(),
            products = session.catalog.products.len(),
            diagnostics = session.diagnostics.len(),
            "imported task data"
        );
        Ok(ImportOutput { logged_data })
    }

    /// Map customers, farms, partfields and products into the catalog.
    pub fn import_catalog(&self, doc: &TaskData, session: &mut ConversionSession) {
        for customer in &doc.customers {
            let Some(iso_id) = customer.customer_id.as_deref() else {
                continue;
            };
            let id = session.id_map.map_forward(EntityKind::Customer, iso_id);
            let name = match (&customer.first_name, &customer.last_name) {
                (Some(first), Some(last)) => format!("{first} {last}"),
                (None, Some(last)) => last.clone(),
                (Some(first), None) => first.clone(),
                (None, None) => String::new(),
            };
            session.catalog.growers.insert(Grower {
                id: CompoundId::with_iso_id(id, iso_id),
                name,
            });
        }

        for farm in &doc.farms {
            let Some(iso_id) = farm.farm_id.as_deref() else {
                continue;
            };
            let id = session.id_map.map_forward(EntityKind::Farm, iso_id);
            let grower_id = resolve_ref(session, EntityKind::Customer, farm.customer_id_ref.as_deref(), iso_id);
            session.catalog.farms.insert(Farm {
                id: CompoundId::with_iso_id(id, iso_id),
                description: farm.designator.clone().unwrap_or_default(),
                grower_id,
            });
        }

        for partfield in &doc.partfields {
            let Some(iso_id) = partfield.partfield_id.as_deref() else {
                continue;
            };
            let id = session.id_map.map_forward(EntityKind::Partfield, iso_id);
            let grower_id = resolve_ref(session, EntityKind::Customer, partfield.customer_id_ref.as_deref(), iso_id);
            let farm_id = resolve_ref(session, EntityKind::Farm, partfield.farm_id_ref.as_deref(), iso_id);
            session.catalog.fields.insert(Field {
                id: CompoundId::with_iso_id(id, iso_id),
                description: partfield.designator.clone().unwrap_or_default(),
                grower_id,
                farm_id,
                area: partfield.area,
            });
        }

        for product in &doc.products {
            let Some(iso_id) = product.product_id.as_deref() else {
                continue;
            };
            let id = session.id_map.map_forward(EntityKind::Product, iso_id);
            let form = product
                .quantity_ddi_value()
                .map(ProductForm::from_quantity_ddi)
                .unwrap_or(ProductForm::Unknown);
            let product_type = match product.composition {
                Some(ProductComposition::Mixture) | Some(ProductComposition::TemporaryMixture) => {
                    ProductType::Mix
                }
                _ => ProductType::Generic,
            };
            debug!(product = %iso_id, id, ?form, ?product_type, "mapped product");
            session.catalog.products.insert(Product {
                id: CompoundId::with_iso_id(id, iso_id),
                description: product.designator.clone().unwrap_or_default(),
                form,
                product_type,
            });
        }
    }

    fn import_task(
        &self,
        task: &Task,
        session: &mut ConversionSession,
    ) -> Result<LoggedData, ConvertError> {
        let task_id = task.task_id.as_deref().unwrap_or_default();
        let id = session.id_map.map_forward(EntityKind::Task, task_id);
        let mut logged = LoggedData {
            id,
            description: task.designator.clone(),
            grower_id: resolve_ref(session, EntityKind::Customer, task.customer_id_ref.as_deref(), task_id),
            farm_id: resolve_ref(session, EntityKind::Farm, task.farm_id_ref.as_deref(), task_id),
            field_id: resolve_ref(session, EntityKind::Partfield, task.partfield_id_ref.as_deref(), task_id),
            time_scopes: task.times.iter().map(time_scope).collect(),
            operation_data: Vec::new(),
        };

        let allocations = session.allocations(task);
        if allocations.is_empty() {
            return Ok(logged);
        }
        let time_log = task.time_logs.first().and_then(|tlg| tlg.filename.clone());

        let device_ids: Vec<String> = session
            .hierarchies
            .iter()
            .filter(|hierarchy| hierarchy.ids().any(|id| allocations.get(id).is_some()))
            .map(|hierarchy| hierarchy.device_id().to_string())
            .collect();

        for device_id in device_ids {
            let Some(hierarchy) = session.hierarchies.hierarchy(&device_id) else {
                continue;
            };
            let element_ids: Vec<String> = hierarchy.ids().map(str::to_string).collect();
            let scoped = allocations.with_element_hierarchies(&element_ids);
            let ctx = isoxml_core::ResolutionContext {
                hierarchies: &session.hierarchies,
                id_map: &session.id_map,
                catalog: &session.catalog,
            };
            let partitions =
                scoped.split_by_product_identity(&element_ids, &device_id, &ctx, &mut session.diagnostics)?;
            for partition in partitions.into_iter().filter(|part| !part.is_empty()) {
                let operation = self.operation_data(&partition, &scoped, session, time_log.clone());
                logged.operation_data.push(operation);
            }
        }
        debug!(
            task = %task_id,
            operations = logged.operation_data.len(),
            "imported task"
        );
        Ok(logged)
    }

    fn operation_data(
        &self,
        partition: &[String],
        allocations: &ProductAllocations,
        session: &mut ConversionSession,
        time_log: Option<String>,
    ) -> OperationData {
        let mut product_ids = BTreeSet::new();
        let mut device_element_ids = Vec::with_capacity(partition.len());
        for element_id in partition {
            if let Some(id) = session.id_map.lookup_forward(EntityKind::DeviceElement, element_id) {
                device_element_ids.push(id);
            }
            let governing = allocations
                .resolve(element_id, &session.hierarchies)
                .unwrap_or_default();
            product_ids.extend(
                governing
                    .iter()
                    .filter_map(|pan| pan.product_id_ref.as_deref())
                    .filter_map(|product_ref| session.id_map.lookup_forward(EntityKind::Product, product_ref)),
            );
        }
        OperationData {
            id: session.next_operation_id(),
            prescription_id: None,
            product_ids: product_ids.into_iter().collect(),
            device_element_ids,
            time_log,
        }
    }
}

/// Numeric id of `iso_ref`, reporting references the table has not seen.
fn resolve_ref(
    session: &mut ConversionSession,
    kind: EntityKind,
    iso_ref: Option<&str>,
    owner: &str,
) -> Option<i32> {
    let iso_ref = iso_ref?;
    let id = session.id_map.lookup_forward(kind, iso_ref);
    if id.is_none() {
        session
            .diagnostics
            .reference(format!("{owner} references unknown {iso_ref}"));
    }
    id
}

fn time_scope(time: &Time) -> TimeScope {
    TimeScope {
        start: time.start.as_deref().and_then(parse_timestamp),
        stop: time.stop.as_deref().and_then(parse_timestamp),
        duration: time.duration,
    }
}

/// ISOXML timestamps usually carry no offset; those are taken as UTC.
pub(crate) fn parse_timestamp(text: &str) -> Option<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(value);
    }
    match PrimitiveDateTime::parse(text, &Iso8601::DEFAULT) {
        Ok(value) => Some(value.assume_utc()),
        Err(err) => {
            debug!(value = %text, error = %err, "unparsable timestamp");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ConversionOptions;
    use isoxml_core::DiagnosticKind;

    const TASK_DATA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ISO11783_TaskData VersionMajor="4" VersionMinor="3" ManagementSoftwareManufacturer="acme" ManagementSoftwareVersion="1.0" DataTransferOrigin="1">
  <CTR A="CTR1" B="Miller" C="Anna"/>
  <DVC A="DVC1" B="Planter" D="A00084000F000000" F="31" G="656E">
    <DET A="DET1" B="1" C="1" E="0" F="0"/>
    <DET A="DET2" B="2" C="3" E="1" F="1"/>
    <DET A="DET3" B="3" C="3" E="2" F="1"/>
    <DET A="DET4" B="4" C="4" E="3" F="2"/>
    <DET A="DET5" B="5" C="4" E="4" F="3"/>
  </DVC>
  <FRM A="FRM1" B="Home" I="CTR1"/>
  <PFD A="PFD1" C="North" D="120000" E="CTR1" F="FRM1"/>
  <PDT A="PDT1" B="UAN 28" E="0001"/>
  <PDT A="PDT2" B="Corn seed" E="000B"/>
  <TSK A="TSK1" B="Planting" C="CTR1" D="FRM1" E="PFD1" G="4">
    <TIM A="2024-05-01T08:00:00" B="2024-05-01T10:30:00Z" D="4"/>
    <PAN A="PDT1" E="DET2"/>
    <PAN A="PDT2" E="DET3"/>
    <TLG A="TLG00001" C="1"/>
  </TSK>
  <TSK A="TSK2" G="1" E="PFD9"/>
</ISO11783_TaskData>"#;

    fn import() -> (ImportOutput, ConversionSession) {
        let doc = isoxml_model::parse_document(TASK_DATA).unwrap();
        let mut session = ConversionSession::from_document(&doc, ConversionOptions::default());
        let output = TaskImporter::new().import(&doc, &mut session).unwrap();
        (output, session)
    }

    #[test]
    fn catalog_entities_are_linked() {
        let (_, session) = import();
        let catalog = session.catalog();
        assert_eq!(catalog.growers.as_slice()[0].name, "Anna Miller");
        let field = &catalog.fields.as_slice()[0];
        assert_eq!(field.area, Some(120000));
        assert_eq!(field.farm_id, Some(catalog.farms.as_slice()[0].id.reference_id));
        let forms: Vec<ProductForm> = catalog.products.as_slice().iter().map(|p| p.form).collect();
        assert_eq!(forms, [ProductForm::Liquid, ProductForm::Solid]);
    }

    #[test]
    fn task_splits_into_one_operation_per_identity() {
        let (output, session) = import();
        let logged = &output.logged_data[0];
        assert_eq!(logged.description.as_deref(), Some("Planting"));
        assert_eq!(logged.operation_data.len(), 2);

        let id_map = session.id_map();
        let det = |iso: &str| id_map.lookup_forward(EntityKind::DeviceElement, iso).unwrap();
        let pdt = |iso: &str| id_map.lookup_forward(EntityKind::Product, iso).unwrap();
        let liquid = &logged.operation_data[0];
        assert_eq!(liquid.device_element_ids, [det("DET1"), det("DET2"), det("DET4")]);
        assert_eq!(liquid.product_ids, [pdt("PDT1")]);
        assert_eq!(liquid.time_log.as_deref(), Some("TLG00001"));
        let solid = &logged.operation_data[1];
        assert_eq!(solid.device_element_ids, [det("DET1"), det("DET3"), det("DET5")]);
        assert_eq!(solid.product_ids, [pdt("PDT2")]);
    }

    #[test]
    fn content_ddis_split_liquid_from_solid() {
        let xml = TASK_DATA
            .replace(r#"E="0001"/>"#, r#"E="0048"/>"#)
            .replace(r#"E="000B"/>"#, r#"E="0049"/>"#);
        let doc = isoxml_model::parse_document(&xml).unwrap();
        let mut session = ConversionSession::from_document(&doc, ConversionOptions::default());
        let output = TaskImporter::new().import(&doc, &mut session).unwrap();

        let forms: Vec<ProductForm> = session
            .catalog()
            .products
            .as_slice()
            .iter()
            .map(|p| p.form)
            .collect();
        assert_eq!(forms, [ProductForm::Liquid, ProductForm::Solid]);
        assert_eq!(output.logged_data[0].operation_data.len(), 2);
    }

    #[test]
    fn time_scopes_parse_with_and_without_offset() {
        let (output, _) = import();
        let scope = &output.logged_data[0].time_scopes[0];
        let start = scope.start.unwrap();
        let stop = scope.stop.unwrap();
        assert_eq!((stop - start).whole_minutes(), 150);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn dangling_task_reference_is_reported() {
        let (output, session) = import();
        assert_eq!(output.logged_data[1].field_id, None);
        assert!(output.logged_data[1].operation_data.is_empty());
        assert!(session
            .diagnostics()
            .iter()
            .any(|d| d.kind == DiagnosticKind::Reference && d.message.contains("PFD9")));
    }
}
