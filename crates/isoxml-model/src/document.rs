use crate::elements::{
    read_enum, validate_all, write_all, Customer, Device, Farm, IsoElement, Partfield, Product,
    Task, DESIGNATOR_MAX_LEN,
};
use crate::enums::{DataTransferOrigin, IsoEnum};
use crate::node::XmlNode;
use crate::validate::{require_enum, require_range, require_string, validate_string, ValidationError};

/// Root element of a `TASKDATA.XML` document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskData {
    pub version_major: Option<i64>,
    pub version_minor: Option<i64>,
    pub management_software_manufacturer: Option<String>,
    pub management_software_version: Option<String>,
    pub task_controller_manufacturer: Option<String>,
    pub task_controller_version: Option<String>,
    pub data_transfer_origin: Option<DataTransferOrigin>,
    pub customers: Vec<Customer>,
    pub devices: Vec<Device>,
    pub farms: Vec<Farm>,
    pub partfields: Vec<Partfield>,
    pub products: Vec<Product>,
    pub tasks: Vec<Task>,
}

impl TaskData {
    /// Empty version 4.3 document originating from a farm management system.
    pub fn new(software_manufacturer: &str, software_version: &str) -> Self {
        Self {
            version_major: Some(4),
            version_minor: Some(3),
            management_software_manufacturer: Some(software_manufacturer.to_string()),
            management_software_version: Some(software_version.to_string()),
            data_transfer_origin: Some(DataTransferOrigin::Fmis),
            ..Self::default()
        }
    }

    pub fn device(&self, device_id: &str) -> Option<&Device> {
        self.devices
            .iter()
            .find(|device| device.device_id.as_deref() == Some(device_id))
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks
            .iter()
            .find(|task| task.task_id.as_deref() == Some(task_id))
    }

    /// Every structural violation in the document.
    pub fn validation_errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        self.validate(&mut errors);
        errors
    }
}

impl IsoElement for TaskData {
    const TAG: &'static str = "ISO11783_TaskData";

    fn read(node: &XmlNode) -> Self {
        Self {
            version_major: node.attr_i64("VersionMajor"),
            version_minor: node.attr_i64("VersionMinor"),
            management_software_manufacturer: node.attr_string("ManagementSoftwareManufacturer"),
            management_software_version: node.attr_string("ManagementSoftwareVersion"),
            task_controller_manufacturer: node.attr_string("TaskControllerManufacturer"),
            task_controller_version: node.attr_string("TaskControllerVersion"),
            data_transfer_origin: read_enum(node, "DataTransferOrigin"),
            customers: Customer::read_all(node),
            devices: Device::read_all(node),
            farms: Farm::read_all(node),
            partfields: Partfield::read_all(node),
            products: Product::read_all(node),
            tasks: Task::read_all(node),
        }
    }

    fn write(&self) -> XmlNode {
        let mut node = XmlNode::new(Self::TAG)
            .with_attr("VersionMajor", self.version_major)
            .with_attr("VersionMinor", self.version_minor)
            .with_attr(
                "ManagementSoftwareManufacturer",
                self.management_software_manufacturer.as_deref(),
            )
            .with_attr(
                "ManagementSoftwareVersion",
                self.management_software_version.as_deref(),
            )
            .with_attr(
                "TaskControllerManufacturer",
                self.task_controller_manufacturer.as_deref(),
            )
            .with_attr("TaskControllerVersion", self.task_controller_version.as_deref())
            .with_attr(
                "DataTransferOrigin",
                self.data_transfer_origin.map(IsoEnum::code),
            );
        write_all(&mut node, &self.customers);
        write_all(&mut node, &self.farms);
        write_all(&mut node, &self.partfields);
        write_all(&mut node, &self.products);
        write_all(&mut node, &self.devices);
        write_all(&mut node, &self.tasks);
        node
    }

    fn validate(&self, errors: &mut Vec<ValidationError>) {
        require_range(Self::TAG, "VersionMajor", self.version_major, 0, 4, errors);
        require_range(Self::TAG, "VersionMinor", self.version_minor, 0, 99, errors);
        require_string(
            Self::TAG,
            "ManagementSoftwareManufacturer",
            self.management_software_manufacturer.as_deref(),
            DESIGNATOR_MAX_LEN,
            errors,
        );
        require_string(
            Self::TAG,
            "ManagementSoftwareVersion",
            self.management_software_version.as_deref(),
            DESIGNATOR_MAX_LEN,
            errors,
        );
        validate_string(
            Self::TAG,
            "TaskControllerManufacturer",
            self.task_controller_manufacturer.as_deref(),
            DESIGNATOR_MAX_LEN,
            errors,
        );
        validate_string(
            Self::TAG,
            "TaskControllerVersion",
            self.task_controller_version.as_deref(),
            DESIGNATOR_MAX_LEN,
            errors,
        );
        require_enum(Self::TAG, "DataTransferOrigin", self.data_transfer_origin, errors);
        validate_all(&self.customers, errors);
        validate_all(&self.devices, errors);
        validate_all(&self.farms, errors);
        validate_all(&self.partfields, errors);
        validate_all(&self.products, errors);
        validate_all(&self.tasks, errors);
    }
}
