use super::{
    enum_code, read_enum, validate_all, write_all, IsoElement, Position, ProductAllocation,
    DATE_TIME_MAX_LEN, DESIGNATOR_MAX_LEN, ID_MAX_LEN,
};
use crate::enums::{TaskStatus, TimeLogType, TimeType};
use crate::node::XmlNode;
use crate::validate::{
    require_enum, require_fixed_string, require_string, validate_range, validate_string,
    ValidationError,
};

/// A unit of field work (`TSK`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Task {
    /// `A`
    pub task_id: Option<String>,
    /// `B`
    pub designator: Option<String>,
    /// `C`
    pub customer_id_ref: Option<String>,
    /// `D`
    pub farm_id_ref: Option<String>,
    /// `E`
    pub partfield_id_ref: Option<String>,
    /// `F`
    pub responsible_worker_id_ref: Option<String>,
    /// `G`
    pub status: Option<TaskStatus>,
    /// `H`
    pub default_treatment_zone_code: Option<i64>,
    /// `I`
    pub position_lost_treatment_zone_code: Option<i64>,
    /// `J`
    pub out_of_field_treatment_zone_code: Option<i64>,
    pub times: Vec<Time>,
    pub product_allocations: Vec<ProductAllocation>,
    pub time_logs: Vec<TimeLog>,
}

impl IsoElement for Task {
    const TAG: &'static str = "TSK";

    fn read(node: &XmlNode) -> Self {
        Self {
            task_id: node.attr_string("A"),
            designator: node.attr_string("B"),
            customer_id_ref: node.attr_string("C"),
            farm_id_ref: node.attr_string("D"),
            partfield_id_ref: node.attr_string("E"),
            responsible_worker_id_ref: node.attr_string("F"),
            status: read_enum(node, "G"),
            default_treatment_zone_code: node.attr_i64("H"),
            position_lost_treatment_zone_code: node.attr_i64("I"),
            out_of_field_treatment_zone_code: node.attr_i64("J"),
            times: Time::read_all(node),
            product_allocations: ProductAllocation::read_all(node),
            time_logs: TimeLog::read_all(node),
        }
    }

    fn write(&self) -> XmlNode {
        let mut node = XmlNode::new(Self::TAG)
            .with_attr("A", self.task_id.as_deref())
            .with_attr("B", self.designator.as_deref())
            .with_attr("C", self.customer_id_ref.as_deref())
            .with_attr("D", self.farm_id_ref.as_deref())
            .with_attr("E", self.partfield_id_ref.as_deref())
            .with_attr("F", self.responsible_worker_id_ref.as_deref())
            .with_attr("G", enum_code(self.status))
            .with_attr("H", self.default_treatment_zone_code)
            .with_attr("I", self.position_lost_treatment_zone_code)
            .with_attr("J", self.out_of_field_treatment_zone_code);
        write_all(&mut node, &self.times);
        write_all(&mut node, &self.product_allocations);
        write_all(&mut node, &self.time_logs);
        node
    }

    fn validate(&self, errors: &mut Vec<ValidationError>) {
        require_string(Self::TAG, "A", self.task_id.as_deref(), ID_MAX_LEN, errors);
        validate_string(Self::TAG, "B", self.designator.as_deref(), DESIGNATOR_MAX_LEN, errors);
        validate_string(Self::TAG, "C", self.customer_id_ref.as_deref(), ID_MAX_LEN, errors);
        validate_string(Self::TAG, "D", self.farm_id_ref.as_deref(), ID_MAX_LEN, errors);
        validate_string(Self::TAG, "E", self.partfield_id_ref.as_deref(), ID_MAX_LEN, errors);
        validate_string(
            Self::TAG,
            "F",
            self.responsible_worker_id_ref.as_deref(),
            ID_MAX_LEN,
            errors,
        );
        require_enum(Self::TAG, "G", self.status, errors);
        validate_range(Self::TAG, "H", self.default_treatment_zone_code, 0, 254, errors);
        validate_range(Self::TAG, "I", self.position_lost_treatment_zone_code, 0, 254, errors);
        validate_range(Self::TAG, "J", self.out_of_field_treatment_zone_code, 0, 254, errors);
        validate_all(&self.times, errors);
        validate_all(&self.product_allocations, errors);
        validate_all(&self.time_logs, errors);
    }
}

/// A time span of a task (`TIM`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Time {
    /// `A`, xs:dateTime text.
    pub start: Option<String>,
    /// `B`
    pub stop: Option<String>,
    /// `C`, seconds.
    pub duration: Option<i64>,
    /// `D`
    pub time_type: Option<TimeType>,
    pub positions: Vec<Position>,
}

impl IsoElement for Time {
    const TAG: &'static str = "TIM";

    fn read(node: &XmlNode) -> Self {
        Self {
            start: node.attr_string("A"),
            stop: node.attr_string("B"),
            duration: node.attr_i64("C"),
            time_type: read_enum(node, "D"),
            positions: Position::read_all(node),
        }
    }

    fn write(&self) -> XmlNode {
        let mut node = XmlNode::new(Self::TAG)
            .with_attr("A", self.start.as_deref())
            .with_attr("B", self.stop.as_deref())
            .with_attr("C", self.duration)
            .with_attr("D", enum_code(self.time_type));
        write_all(&mut node, &self.positions);
        node
    }

    fn validate(&self, errors: &mut Vec<ValidationError>) {
        require_string(Self::TAG, "A", self.start.as_deref(), DATE_TIME_MAX_LEN, errors);
        validate_string(Self::TAG, "B", self.stop.as_deref(), DATE_TIME_MAX_LEN, errors);
        validate_range(Self::TAG, "C", self.duration, 0, u32::MAX as i64 - 2, errors);
        require_enum(Self::TAG, "D", self.time_type, errors);
        validate_all(&self.positions, errors);
    }
}

/// Reference to a binary time log stored next to the document (`TLG`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeLog {
    /// `A`, file name without extension, e.g. `TLG00001`.
    pub filename: Option<String>,
    /// `B`, bytes.
    pub file_length: Option<i64>,
    /// `C`
    pub log_type: Option<TimeLogType>,
}

impl TimeLog {
    pub fn binary(filename: &str) -> Self {
        Self {
            filename: Some(filename.to_string()),
            file_length: None,
            log_type: Some(TimeLogType::Binary),
        }
    }
}

impl IsoElement for TimeLog {
    const TAG: &'static str = "TLG";

    fn read(node: &XmlNode) -> Self {
        Self {
            filename: node.attr_string("A"),
            file_length: node.attr_i64("B"),
            log_type: read_enum(node, "C"),
        }
    }

    fn write(&self) -> XmlNode {
        XmlNode::new(Self::TAG)
            .with_attr("A", self.filename.as_deref())
            .with_attr("B", self.file_length)
            .with_attr("C", enum_code(self.log_type))
    }

    fn validate(&self, errors: &mut Vec<ValidationError>) {
        require_fixed_string(Self::TAG, "A", self.filename.as_deref(), 8, errors);
        validate_range(Self::TAG, "B", self.file_length, 0, u32::MAX as i64 - 2, errors);
        require_enum(Self::TAG, "C", self.log_type, errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TASK: &str = r#"<TSK A="TSK1" B="Spraying" C="CTR1" D="FRM1" E="PFD1" G="4"><TIM A="2021-04-01T08:00:00Z" B="2021-04-01T10:30:00Z" D="4"/><PAN A="PDT1" E="DET2"/><PAN A="PDT2" E="DET3"/><TLG A="TLG00001" C="1"/></TSK>"#;

    #[test]
    fn task_children_roundtrip() {
        let node = XmlNode::parse(TASK).expect("parse");
        let task = Task::read(&node);
        assert_eq!(task.status, Some(TaskStatus::Completed));
        assert_eq!(task.times.len(), 1);
        assert_eq!(task.time_logs[0].filename.as_deref(), Some("TLG00001"));
        assert_eq!(task.product_allocations.len(), 2);

        let mut errors = Vec::new();
        task.validate(&mut errors);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(task.write(), node);
    }

    #[test]
    fn time_log_name_must_have_eight_characters() {
        let mut errors = Vec::new();
        TimeLog::binary("TLG1").validate(&mut errors);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].attribute, "A");
    }
}
