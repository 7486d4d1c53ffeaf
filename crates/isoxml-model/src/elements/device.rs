use super::{
    enum_code, read_enum, validate_all, write_all, IsoElement, DESIGNATOR_MAX_LEN, ID_MAX_LEN,
};
use crate::enums::DeviceElementType;
use crate::node::XmlNode;
use crate::validate::{
    require_enum, require_range, require_string, validate_string, ValidationError,
};

/// A machine or implement description (`DVC`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Device {
    /// `A`
    pub device_id: Option<String>,
    /// `B`
    pub designator: Option<String>,
    /// `C`
    pub software_version: Option<String>,
    /// `D`, 8-byte ISO NAME as 16 hex digits.
    pub client_name: Option<String>,
    /// `E`
    pub serial_number: Option<String>,
    /// `F`, hex.
    pub structure_label: Option<String>,
    /// `G`, hex.
    pub localization_label: Option<String>,
    pub elements: Vec<DeviceElement>,
}

impl IsoElement for Device {
    const TAG: &'static str = "DVC";

    fn read(node: &XmlNode) -> Self {
        Self {
            device_id: node.attr_string("A"),
            designator: node.attr_string("B"),
            software_version: node.attr_string("C"),
            client_name: node.attr_string("D"),
            serial_number: node.attr_string("E"),
            structure_label: node.attr_string("F"),
            localization_label: node.attr_string("G"),
            elements: DeviceElement::read_all(node),
        }
    }

    fn write(&self) -> XmlNode {
        let mut node = XmlNode::new(Self::TAG)
            .with_attr("A", self.device_id.as_deref())
            .with_attr("B", self.designator.as_deref())
            .with_attr("C", self.software_version.as_deref())
            .with_attr("D", self.client_name.as_deref())
            .with_attr("E", self.serial_number.as_deref())
            .with_attr("F", self.structure_label.as_deref())
            .with_attr("G", self.localization_label.as_deref());
        write_all(&mut node, &self.elements);
        node
    }

    fn validate(&self, errors: &mut Vec<ValidationError>) {
        require_string(Self::TAG, "A", self.device_id.as_deref(), ID_MAX_LEN, errors);
        validate_string(Self::TAG, "B", self.designator.as_deref(), DESIGNATOR_MAX_LEN, errors);
        validate_string(
            Self::TAG,
            "C",
            self.software_version.as_deref(),
            DESIGNATOR_MAX_LEN,
            errors,
        );
        require_string(Self::TAG, "D", self.client_name.as_deref(), 16, errors);
        validate_string(Self::TAG, "E", self.serial_number.as_deref(), DESIGNATOR_MAX_LEN, errors);
        require_string(Self::TAG, "F", self.structure_label.as_deref(), 78, errors);
        require_string(Self::TAG, "G", self.localization_label.as_deref(), 14, errors);
        validate_all(&self.elements, errors);
    }
}

/// A node of a device's element tree (`DET`).
///
/// Parent links are numeric: `F` names the `B` object id of the parent
/// element within the same device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceElement {
    /// `A`
    pub device_element_id: Option<String>,
    /// `B`
    pub object_id: Option<i64>,
    /// `C`
    pub element_type: Option<DeviceElementType>,
    /// `D`
    pub designator: Option<String>,
    /// `E`
    pub element_number: Option<i64>,
    /// `F`
    pub parent_object_id: Option<i64>,
}

impl DeviceElement {
    pub fn new(id: &str, object_id: i64, parent_object_id: i64, element_type: DeviceElementType) -> Self {
        Self {
            device_element_id: Some(id.to_string()),
            object_id: Some(object_id),
            element_type: Some(element_type),
            designator: None,
            element_number: Some(object_id),
            parent_object_id: Some(parent_object_id),
        }
    }
}

impl IsoElement for DeviceElement {
    const TAG: &'static str = "DET";

    fn read(node: &XmlNode) -> Self {
        Self {
            device_element_id: node.attr_string("A"),
            object_id: node.attr_i64("B"),
            element_type: read_enum(node, "C"),
            designator: node.attr_string("D"),
            element_number: node.attr_i64("E"),
            parent_object_id: node.attr_i64("F"),
        }
    }

    fn write(&self) -> XmlNode {
        XmlNode::new(Self::TAG)
            .with_attr("A", self.device_element_id.as_deref())
            .with_attr("B", self.object_id)
            .with_attr("C", enum_code(self.element_type))
            .with_attr("D", self.designator.as_deref())
            .with_attr("E", self.element_number)
            .with_attr("F", self.parent_object_id)
    }

    fn validate(&self, errors: &mut Vec<ValidationError>) {
        require_string(Self::TAG, "A", self.device_element_id.as_deref(), ID_MAX_LEN, errors);
        require_range(Self::TAG, "B", self.object_id, 1, 65534, errors);
        require_enum(Self::TAG, "C", self.element_type, errors);
        validate_string(Self::TAG, "D", self.designator.as_deref(), DESIGNATOR_MAX_LEN, errors);
        require_range(Self::TAG, "E", self.element_number, 0, 4095, errors);
        require_range(Self::TAG, "F", self.parent_object_id, 0, 65534, errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPRAYER: &str = r#"<DVC A="DVC1" B="Sprayer" D="A00086000DE0FFFF" F="31303030" G="656E504F5200FF"><DET A="DET1" B="1" C="1" D="Boom" E="0" F="0"/><DET A="DET2" B="2" C="4" E="1" F="1"/></DVC>"#;

    #[test]
    fn device_reads_elements_in_order() {
        let node = XmlNode::parse(SPRAYER).expect("parse");
        let device = Device::read(&node);
        assert_eq!(device.device_id.as_deref(), Some("DVC1"));
        assert_eq!(device.elements.len(), 2);
        assert_eq!(device.elements[1].element_type, Some(DeviceElementType::Section));
        assert_eq!(device.elements[1].parent_object_id, Some(1));

        let mut errors = Vec::new();
        device.validate(&mut errors);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(device.write(), node);
    }

    #[test]
    fn element_ranges_are_checked() {
        let node = XmlNode::parse(r#"<DET A="DET9" B="0" C="8" E="5000"/>"#).expect("parse");
        let mut errors = Vec::new();
        DeviceElement::read(&node).validate(&mut errors);
        let attributes: Vec<&str> = errors.iter().map(|err| err.attribute.as_str()).collect();
        assert_eq!(attributes, ["B", "C", "E", "F"]);
    }
}
