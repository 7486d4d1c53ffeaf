use rust_decimal::Decimal;

use super::{
    enum_code, read_enum, validate_all, write_all, IsoElement, DATE_TIME_MAX_LEN, ID_MAX_LEN, LONG_MAX,
};
use crate::enums::{AllocationStampType, PositionStatus, TransferMode};
use crate::node::XmlNode;
use crate::validate::{
    require_decimal_range, require_enum, require_string, validate_enum, validate_range,
    validate_string, ValidationError,
};

/// Assignment of a product to a device element (`PAN`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductAllocation {
    /// `A`, required.
    pub product_id_ref: Option<String>,
    /// `B`, hex DDI of the quantity value.
    pub quantity_ddi: Option<String>,
    /// `C`
    pub quantity_value: Option<i64>,
    /// `D`
    pub transfer_mode: Option<TransferMode>,
    /// `E`, the element the allocation is declared on.
    pub device_element_id_ref: Option<String>,
    /// `F`
    pub value_presentation_id_ref: Option<String>,
    pub allocation_stamp: Option<AllocationStamp>,
}

impl ProductAllocation {
    /// Allocation of `product` declared on `device_element`.
    pub fn new(product: &str, device_element: &str) -> Self {
        Self {
            product_id_ref: Some(product.to_string()),
            device_element_id_ref: Some(device_element.to_string()),
            ..Self::default()
        }
    }
}

impl IsoElement for ProductAllocation {
    const TAG: &'static str = "PAN";

    fn read(node: &XmlNode) -> Self {
        Self {
            product_id_ref: node.attr_string("A"),
            quantity_ddi: node.attr_string("B"),
            quantity_value: node.attr_i64("C"),
            transfer_mode: read_enum(node, "D"),
            device_element_id_ref: node.attr_string("E"),
            value_presentation_id_ref: node.attr_string("F"),
            allocation_stamp: node.child(AllocationStamp::TAG).map(AllocationStamp::read),
        }
    }

    fn write(&self) -> XmlNode {
        let mut node = XmlNode::new(Self::TAG)
            .with_attr("A", self.product_id_ref.as_deref())
            .with_attr("B", self.quantity_ddi.as_deref())
            .with_attr("C", self.quantity_value)
            .with_attr("D", enum_code(self.transfer_mode))
            .with_attr("E", self.device_element_id_ref.as_deref())
            .with_attr("F", self.value_presentation_id_ref.as_deref());
        if let Some(stamp) = &self.allocation_stamp {
            node.push_child(stamp.write());
        }
        node
    }

    fn validate(&self, errors: &mut Vec<ValidationError>) {
        require_string(Self::TAG, "A", self.product_id_ref.as_deref(), ID_MAX_LEN, errors);
        // DDIs are 4 hex digits; the digits themselves are not checked.
        validate_string(Self::TAG, "B", self.quantity_ddi.as_deref(), 4, errors);
        validate_range(Self::TAG, "C", self.quantity_value, 0, LONG_MAX, errors);
        validate_enum(Self::TAG, "D", self.transfer_mode, errors);
        validate_string(Self::TAG, "E", self.device_element_id_ref.as_deref(), ID_MAX_LEN, errors);
        validate_string(
            Self::TAG,
            "F",
            self.value_presentation_id_ref.as_deref(),
            ID_MAX_LEN,
            errors,
        );
        if let Some(stamp) = &self.allocation_stamp {
            stamp.validate(errors);
        }
    }
}

/// When and where an allocation applied (`ASP`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationStamp {
    /// `A`, xs:dateTime text.
    pub start: Option<String>,
    /// `B`
    pub stop: Option<String>,
    /// `C`, seconds.
    pub duration: Option<i64>,
    /// `D`
    pub stamp_type: Option<AllocationStampType>,
    pub positions: Vec<Position>,
}

impl IsoElement for AllocationStamp {
    const TAG: &'static str = "ASP";

    fn read(node: &XmlNode) -> Self {
        Self {
            start: node.attr_string("A"),
            stop: node.attr_string("B"),
            duration: node.attr_i64("C"),
            stamp_type: read_enum(node, "D"),
            positions: Position::read_all(node),
        }
    }

    fn write(&self) -> XmlNode {
        let mut node = XmlNode::new(Self::TAG)
            .with_attr("A", self.start.as_deref())
            .with_attr("B", self.stop.as_deref())
            .with_attr("C", self.duration)
            .with_attr("D", enum_code(self.stamp_type));
        write_all(&mut node, &self.positions);
        node
    }

    fn validate(&self, errors: &mut Vec<ValidationError>) {
        require_string(Self::TAG, "A", self.start.as_deref(), DATE_TIME_MAX_LEN, errors);
        validate_range(Self::TAG, "C", self.duration, 0, u32::MAX as i64 - 2, errors);
        require_enum(Self::TAG, "D", self.stamp_type, errors);
        validate_all(&self.positions, errors);
    }
}

/// A GNSS position (`PTN`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Position {
    /// `A`, degrees.
    pub north: Option<Decimal>,
    /// `B`, degrees.
    pub east: Option<Decimal>,
    /// `C`, millimetres.
    pub up: Option<i64>,
    /// `D`
    pub status: Option<PositionStatus>,
}

impl IsoElement for Position {
    const TAG: &'static str = "PTN";

    fn read(node: &XmlNode) -> Self {
        Self {
            north: node.attr_decimal("A"),
            east: node.attr_decimal("B"),
            up: node.attr_i64("C"),
            status: read_enum(node, "D"),
        }
    }

    fn write(&self) -> XmlNode {
        XmlNode::new(Self::TAG)
            .with_attr("A", self.north)
            .with_attr("B", self.east)
            .with_attr("C", self.up)
            .with_attr("D", enum_code(self.status))
    }

    fn validate(&self, errors: &mut Vec<ValidationError>) {
        require_decimal_range(
            Self::TAG,
            "A",
            self.north,
            Decimal::from(-90),
            Decimal::from(90),
            errors,
        );
        require_decimal_range(
            Self::TAG,
            "B",
            self.east,
            Decimal::from(-180),
            Decimal::from(180),
            errors,
        );
        validate_range(Self::TAG, "C", self.up, i32::MIN as i64, LONG_MAX, errors);
        require_enum(Self::TAG, "D", self.status, errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ViolationKind;

    #[test]
    fn product_allocation_roundtrip() {
        let xml = r#"<PAN A="PDT1" B="0048" C="1200" D="1" E="DET-3" F="VPN1"><ASP A="2021-04-01T08:00:00Z" B="2021-04-01T09:00:00Z" C="3600" D="4"><PTN A="52.1200" B="7.0045" D="4"/></ASP></PAN>"#;
        let node = XmlNode::parse(xml).expect("parse");
        let pan = ProductAllocation::read(&node);
        assert_eq!(pan.product_id_ref.as_deref(), Some("PDT1"));
        assert_eq!(pan.transfer_mode, Some(TransferMode::Filling));
        let stamp = pan.allocation_stamp.as_ref().expect("stamp");
        assert_eq!(stamp.stamp_type, Some(AllocationStampType::Effective));
        assert_eq!(stamp.positions.len(), 1);

        let mut errors = Vec::new();
        pan.validate(&mut errors);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(pan.write(), node);
    }

    #[test]
    fn optional_attributes_are_omitted_on_write() {
        let pan = ProductAllocation::new("PDT2", "DET1");
        let node = pan.write();
        let names: Vec<&str> = node.attributes.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["A", "E"]);
        assert!(node.children.is_empty());
        assert_eq!(ProductAllocation::read(&node), pan);
    }

    #[test]
    fn missing_product_reference_is_one_violation() {
        let node = XmlNode::parse(r#"<PAN C="5" E="DET1"/>"#).expect("parse");
        let pan = ProductAllocation::read(&node);
        assert_eq!(pan.product_id_ref, None);
        let mut errors = Vec::new();
        pan.validate(&mut errors);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].element, "PAN");
        assert_eq!(errors[0].attribute, "A");
        assert_eq!(errors[0].kind, ViolationKind::Missing);
    }

    #[test]
    fn validation_visits_nested_elements() {
        let node = XmlNode::parse(
            r#"<PAN A="PDT1" C="-4" D="9"><ASP D="2"><PTN A="91" B="0" D="1"/></ASP></PAN>"#,
        )
        .expect("parse");
        let mut errors = Vec::new();
        ProductAllocation::read(&node).validate(&mut errors);
        let found: Vec<(&str, &str)> = errors
            .iter()
            .map(|err| (err.element.as_str(), err.attribute.as_str()))
            .collect();
        assert_eq!(
            found,
            [("PAN", "C"), ("PAN", "D"), ("ASP", "A"), ("ASP", "D"), ("PTN", "A")]
        );
    }
}
