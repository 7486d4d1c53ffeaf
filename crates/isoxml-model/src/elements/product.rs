use super::{enum_code, read_enum, IsoElement, DESIGNATOR_MAX_LEN, ID_MAX_LEN, LONG_MAX};
use crate::enums::ProductComposition;
use crate::node::XmlNode;
use crate::validate::{require_string, validate_enum, validate_range, validate_string, ValidationError};

/// A product that can be allocated to device elements (`PDT`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Product {
    /// `A`
    pub product_id: Option<String>,
    /// `B`
    pub designator: Option<String>,
    /// `C`
    pub product_group_id_ref: Option<String>,
    /// `D`
    pub value_presentation_id_ref: Option<String>,
    /// `E`, hex DDI describing how the product is quantified.
    pub quantity_ddi: Option<String>,
    /// `F`
    pub composition: Option<ProductComposition>,
    /// `G`
    pub mixture_recipe_quantity: Option<i64>,
    /// `H`, mg/l.
    pub density_mass_per_volume: Option<i64>,
    /// `I`, mg/1000.
    pub density_mass_per_count: Option<i64>,
    /// `J`, ml/1000.
    pub density_volume_per_count: Option<i64>,
}

impl Product {
    pub fn new(id: &str, designator: &str) -> Self {
        Self {
            product_id: Some(id.to_string()),
            designator: Some(designator.to_string()),
            ..Self::default()
        }
    }

    /// Quantity DDI decoded from its hex text.
    pub fn quantity_ddi_value(&self) -> Option<u16> {
        self.quantity_ddi
            .as_deref()
            .and_then(|ddi| u16::from_str_radix(ddi, 16).ok())
    }
}

impl IsoElement for Product {
    const TAG: &'static str = "PDT";

    fn read(node: &XmlNode) -> Self {
        Self {
            product_id: node.attr_string("A"),
            designator: node.attr_string("B"),
            product_group_id_ref: node.attr_string("C"),
            value_presentation_id_ref: node.attr_string("D"),
            quantity_ddi: node.attr_string("E"),
            composition: read_enum(node, "F"),
            mixture_recipe_quantity: node.attr_i64("G"),
            density_mass_per_volume: node.attr_i64("H"),
            density_mass_per_count: node.attr_i64("I"),
            density_volume_per_count: node.attr_i64("J"),
        }
    }

    fn write(&self) -> XmlNode {
        XmlNode::new(Self::TAG)
            .with_attr("A", self.product_id.as_deref())
            .with_attr("B", self.designator.as_deref())
            .with_attr("C", self.product_group_id_ref.as_deref())
            .with_attr("D", self.value_presentation_id_ref.as_deref())
            .with_attr("E", self.quantity_ddi.as_deref())
            .with_attr("F", enum_code(self.composition))
            .with_attr("G", self.mixture_recipe_quantity)
            .with_attr("H", self.density_mass_per_volume)
            .with_attr("I", self.density_mass_per_count)
            .with_attr("J", self.density_volume_per_count)
    }

    fn validate(&self, errors: &mut Vec<ValidationError>) {
        require_string(Self::TAG, "A", self.product_id.as_deref(), ID_MAX_LEN, errors);
        require_string(Self::TAG, "B", self.designator.as_deref(), DESIGNATOR_MAX_LEN, errors);
        validate_string(Self::TAG, "C", self.product_group_id_ref.as_deref(), ID_MAX_LEN, errors);
        validate_string(
            Self::TAG,
            "D",
            self.value_presentation_id_ref.as_deref(),
            ID_MAX_LEN,
            errors,
        );
        validate_string(Self::TAG, "E", self.quantity_ddi.as_deref(), 4, errors);
        validate_enum(Self::TAG, "F", self.composition, errors);
        validate_range(Self::TAG, "G", self.mixture_recipe_quantity, 0, LONG_MAX, errors);
        validate_range(Self::TAG, "H", self.density_mass_per_volume, 0, LONG_MAX, errors);
        validate_range(Self::TAG, "I", self.density_mass_per_count, 0, LONG_MAX, errors);
        validate_range(Self::TAG, "J", self.density_volume_per_count, 0, LONG_MAX, errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_quantity_ddi_and_composition() {
        let node = XmlNode::parse(r#"<PDT A="PDT1" B="UAN 28" E="0048" F="1" H="1280000"/>"#)
            .expect("parse");
        let product = Product::read(&node);
        assert_eq!(product.quantity_ddi_value(), Some(0x48));
        assert_eq!(product.composition, Some(ProductComposition::Single));
        let mut errors = Vec::new();
        product.validate(&mut errors);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(product.write(), node);
    }
}
