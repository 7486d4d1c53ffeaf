use super::{IsoElement, DESIGNATOR_MAX_LEN, ID_MAX_LEN};
use crate::node::XmlNode;
use crate::validate::{require_range, require_string, validate_string, ValidationError};

/// Customer (`CTR`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Customer {
    /// `A`
    pub customer_id: Option<String>,
    /// `B`
    pub last_name: Option<String>,
    /// `C`
    pub first_name: Option<String>,
}

impl IsoElement for Customer {
    const TAG: &'static str = "CTR";

    fn read(node: &XmlNode) -> Self {
        Self {
            customer_id: node.attr_string("A"),
            last_name: node.attr_string("B"),
            first_name: node.attr_string("C"),
        }
    }

    fn write(&self) -> XmlNode {
        XmlNode::new(Self::TAG)
            .with_attr("A", self.customer_id.as_deref())
            .with_attr("B", self.last_name.as_deref())
            .with_attr("C", self.first_name.as_deref())
    }

    fn validate(&self, errors: &mut Vec<ValidationError>) {
        require_string(Self::TAG, "A", self.customer_id.as_deref(), ID_MAX_LEN, errors);
        require_string(Self::TAG, "B", self.last_name.as_deref(), DESIGNATOR_MAX_LEN, errors);
        validate_string(Self::TAG, "C", self.first_name.as_deref(), DESIGNATOR_MAX_LEN, errors);
    }
}

/// Farm (`FRM`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Farm {
    /// `A`
    pub farm_id: Option<String>,
    /// `B`
    pub designator: Option<String>,
    /// `I`
    pub customer_id_ref: Option<String>,
}

impl IsoElement for Farm {
    const TAG: &'static str = "FRM";

    fn read(node: &XmlNode) -> Self {
        Self {
            farm_id: node.attr_string("A"),
            designator: node.attr_string("B"),
            customer_id_ref: node.attr_string("I"),
        }
    }

    fn write(&self) -> XmlNode {
        XmlNode::new(Self::TAG)
            .with_attr("A", self.farm_id.as_deref())
            .with_attr("B", self.designator.as_deref())
            .with_attr("I", self.customer_id_ref.as_deref())
    }

    fn validate(&self, errors: &mut Vec<ValidationError>) {
        require_string(Self::TAG, "A", self.farm_id.as_deref(), ID_MAX_LEN, errors);
        require_string(Self::TAG, "B", self.designator.as_deref(), DESIGNATOR_MAX_LEN, errors);
        validate_string(Self::TAG, "I", self.customer_id_ref.as_deref(), ID_MAX_LEN, errors);
    }
}

/// Field (`PFD`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partfield {
    /// `A`
    pub partfield_id: Option<String>,
    /// `B`
    pub code: Option<String>,
    /// `C`
    pub designator: Option<String>,
    /// `D`, square metres.
    pub area: Option<i64>,
    /// `E`
    pub customer_id_ref: Option<String>,
    /// `F`
    pub farm_id_ref: Option<String>,
}

impl IsoElement for Partfield {
    const TAG: &'static str = "PFD";

    fn read(node: &XmlNode) -> Self {
        Self {
            partfield_id: node.attr_string("A"),
            code: node.attr_string("B"),
            designator: node.attr_string("C"),
            area: node.attr_i64("D"),
            customer_id_ref: node.attr_string("E"),
            farm_id_ref: node.attr_string("F"),
        }
    }

    fn write(&self) -> XmlNode {
        XmlNode::new(Self::TAG)
            .with_attr("A", self.partfield_id.as_deref())
            .with_attr("B", self.code.as_deref())
            .with_attr("C", self.designator.as_deref())
            .with_attr("D", self.area)
            .with_attr("E", self.customer_id_ref.as_deref())
            .with_attr("F", self.farm_id_ref.as_deref())
    }

    fn validate(&self, errors: &mut Vec<ValidationError>) {
        require_string(Self::TAG, "A", self.partfield_id.as_deref(), ID_MAX_LEN, errors);
        validate_string(Self::TAG, "B", self.code.as_deref(), DESIGNATOR_MAX_LEN, errors);
        require_string(Self::TAG, "C", self.designator.as_deref(), DESIGNATOR_MAX_LEN, errors);
        require_range(Self::TAG, "D", self.area, 0, u32::MAX as i64 - 1, errors);
        validate_string(Self::TAG, "E", self.customer_id_ref.as_deref(), ID_MAX_LEN, errors);
        validate_string(Self::TAG, "F", self.farm_id_ref.as_deref(), ID_MAX_LEN, errors);
    }
}
