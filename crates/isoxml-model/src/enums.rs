//! Enumerated attribute codes.
//!
//! Codes outside the declared domain are kept as `Unknown(code)` so a document
//! still reads and writes back unchanged; validation reports them.

/// Common surface of the enumerated attribute types.
pub trait IsoEnum: Copy {
    /// Name used in validation messages.
    const NAME: &'static str;

    fn from_code(code: i64) -> Self;

    fn code(self) -> i64;

    /// `false` for codes outside the declared domain.
    fn is_known(self) -> bool;
}

/// Transfer mode of a product allocation (`PAN@D`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferMode {
    Filling,
    Emptying,
    Remainder,
    Unknown(i64),
}

impl IsoEnum for TransferMode {
    const NAME: &'static str = "TransferMode";

    fn from_code(code: i64) -> Self {
        match code {
            1 => TransferMode::Filling,
            2 => TransferMode::Emptying,
            3 => TransferMode::Remainder,
            other => TransferMode::Unknown(other),
        }
    }

    fn code(self) -> i64 {
        match self {
            TransferMode::Filling => 1,
            TransferMode::Emptying => 2,
            TransferMode::Remainder => 3,
            TransferMode::Unknown(code) => code,
        }
    }

    fn is_known(self) -> bool {
        !matches!(self, TransferMode::Unknown(_))
    }
}

/// Type of an allocation stamp (`ASP@D`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocationStampType {
    Planned,
    Effective,
    Unknown(i64),
}

impl IsoEnum for AllocationStampType {
    const NAME: &'static str = "AllocationStampType";

    fn from_code(code: i64) -> Self {
        match code {
            1 => AllocationStampType::Planned,
            4 => AllocationStampType::Effective,
            other => AllocationStampType::Unknown(other),
        }
    }

    fn code(self) -> i64 {
        match self {
            AllocationStampType::Planned => 1,
            AllocationStampType::Effective => 4,
            AllocationStampType::Unknown(code) => code,
        }
    }

    fn is_known(self) -> bool {
        !matches!(self, AllocationStampType::Unknown(_))
    }
}

/// Type of a time element (`TIM@D`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeType {
    Planned,
    Preliminary,
    Effective,
    Ineffective,
    Repair,
    Clearing,
    PoweredDown,
    Unknown(i64),
}

impl IsoEnum for TimeType {
    const NAME: &'static str = "TimeType";

    fn from_code(code: i64) -> Self {
        match code {
            1 => TimeType::Planned,
            2 => TimeType::Preliminary,
            4 => TimeType::Effective,
            5 => TimeType::Ineffective,
            6 => TimeType::Repair,
            7 => TimeType::Clearing,
            8 => TimeType::PoweredDown,
            other => TimeType::Unknown(other),
        }
    }

    fn code(self) -> i64 {
        match self {
            TimeType::Planned => 1,
            TimeType::Preliminary => 2,
            TimeType::Effective => 4,
            TimeType::Ineffective => 5,
            TimeType::Repair => 6,
            TimeType::Clearing => 7,
            TimeType::PoweredDown => 8,
            TimeType::Unknown(code) => code,
        }
    }

    fn is_known(self) -> bool {
        !matches!(self, TimeType::Unknown(_))
    }
}

/// GNSS fix quality of a position (`PTN@D`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionStatus {
    NoGps,
    Gnss,
    Dgnss,
    PreciseGnss,
    RtkFixedInteger,
    RtkFloat,
    DeadReckoning,
    ManualInput,
    Simulated,
    Error,
    NotAvailable,
    Unknown(i64),
}

impl IsoEnum for PositionStatus {
    const NAME: &'static str = "PositionStatus";

    fn from_code(code: i64) -> Self {
        match code {
            0 => PositionStatus::NoGps,
            1 => PositionStatus::Gnss,
            2 => PositionStatus::Dgnss,
            3 => PositionStatus::PreciseGnss,
            4 => PositionStatus::RtkFixedInteger,
            5 => PositionStatus::RtkFloat,
            6 => PositionStatus::DeadReckoning,
            7 => PositionStatus::ManualInput,
            8 => PositionStatus::Simulated,
            14 => PositionStatus::Error,
            15 => PositionStatus::NotAvailable,
            other => PositionStatus::Unknown(other),
        }
    }

    fn code(self) -> i64 {
        match self {
            PositionStatus::NoGps => 0,
            PositionStatus::Gnss => 1,
            PositionStatus::Dgnss => 2,
            PositionStatus::PreciseGnss => 3,
            PositionStatus::RtkFixedInteger => 4,
            PositionStatus::RtkFloat => 5,
            PositionStatus::DeadReckoning => 6,
            PositionStatus::ManualInput => 7,
            PositionStatus::Simulated => 8,
            PositionStatus::Error => 14,
            PositionStatus::NotAvailable => 15,
            PositionStatus::Unknown(code) => code,
        }
    }

    fn is_known(self) -> bool {
        !matches!(self, PositionStatus::Unknown(_))
    }
}

/// Role of a device element inside its device (`DET@C`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceElementType {
    Device,
    Function,
    Bin,
    Section,
    Unit,
    Connector,
    NavigationReference,
    Unknown(i64),
}

impl IsoEnum for DeviceElementType {
    const NAME: &'static str = "DeviceElementType";

    fn from_code(code: i64) -> Self {
        match code {
            1 => DeviceElementType::Device,
            2 => DeviceElementType::Function,
            3 => DeviceElementType::Bin,
            4 => DeviceElementType::Section,
            5 => DeviceElementType::Unit,
            6 => DeviceElementType::Connector,
            7 => DeviceElementType::NavigationReference,
            other => DeviceElementType::Unknown(other),
        }
    }

    fn code(self) -> i64 {
        match self {
            DeviceElementType::Device => 1,
            DeviceElementType::Function => 2,
            DeviceElementType::Bin => 3,
            DeviceElementType::Section => 4,
            DeviceElementType::Unit => 5,
            DeviceElementType::Connector => 6,
            DeviceElementType::NavigationReference => 7,
            DeviceElementType::Unknown(code) => code,
        }
    }

    fn is_known(self) -> bool {
        !matches!(self, DeviceElementType::Unknown(_))
    }
}

/// Composition of a product (`PDT@F`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductComposition {
    Single,
    Mixture,
    TemporaryMixture,
    Unknown(i64),
}

impl IsoEnum for ProductComposition {
    const NAME: &'static str = "ProductType";

    fn from_code(code: i64) -> Self {
        match code {
            1 => ProductComposition::Single,
            2 => ProductComposition::Mixture,
            3 => ProductComposition::TemporaryMixture,
            other => ProductComposition::Unknown(other),
        }
    }

    fn code(self) -> i64 {
        match self {
            ProductComposition::Single => 1,
            ProductComposition::Mixture => 2,
            ProductComposition::TemporaryMixture => 3,
            ProductComposition::Unknown(code) => code,
        }
    }

    fn is_known(self) -> bool {
        !matches!(self, ProductComposition::Unknown(_))
    }
}

/// Status of a task (`TSK@G`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Planned,
    Running,
    Paused,
    Completed,
    Template,
    Canceled,
    Unknown(i64),
}

impl IsoEnum for TaskStatus {
    const NAME: &'static str = "TaskStatus";

    fn from_code(code: i64) -> Self {
        match code {
            1 => TaskStatus::Planned,
            2 => TaskStatus::Running,
            3 => TaskStatus::Paused,
            4 => TaskStatus::Completed,
            5 => TaskStatus::Template,
            6 => TaskStatus::Canceled,
            other => TaskStatus::Unknown(other),
        }
    }

    fn code(self) -> i64 {
        match self {
            TaskStatus::Planned => 1,
            TaskStatus::Running => 2,
            TaskStatus::Paused => 3,
            TaskStatus::Completed => 4,
            TaskStatus::Template => 5,
            TaskStatus::Canceled => 6,
            TaskStatus::Unknown(code) => code,
        }
    }

    fn is_known(self) -> bool {
        !matches!(self, TaskStatus::Unknown(_))
    }
}

/// Encoding of a time log (`TLG@C`). Only binary logs are defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeLogType {
    Binary,
    Unknown(i64),
}

impl IsoEnum for TimeLogType {
    const NAME: &'static str = "TimeLogType";

    fn from_code(code: i64) -> Self {
        match code {
            1 => TimeLogType::Binary,
            other => TimeLogType::Unknown(other),
        }
    }

    fn code(self) -> i64 {
        match self {
            TimeLogType::Binary => 1,
            TimeLogType::Unknown(code) => code,
        }
    }

    fn is_known(self) -> bool {
        !matches!(self, TimeLogType::Unknown(_))
    }
}

/// Which side produced the document (`ISO11783_TaskData@DataTransferOrigin`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataTransferOrigin {
    Fmis,
    Mics,
    Unknown(i64),
}

impl IsoEnum for DataTransferOrigin {
    const NAME: &'static str = "DataTransferOrigin";

    fn from_code(code: i64) -> Self {
        match code {
            1 => DataTransferOrigin::Fmis,
            2 => DataTransferOrigin::Mics,
            other => DataTransferOrigin::Unknown(other),
        }
    }

    fn code(self) -> i64 {
        match self {
            DataTransferOrigin::Fmis => 1,
            DataTransferOrigin::Mics => 2,
            DataTransferOrigin::Unknown(code) => code,
        }
    }

    fn is_known(self) -> bool {
        !matches!(self, DataTransferOrigin::Unknown(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_codes_survive() {
        let mode = TransferMode::from_code(7);
        assert_eq!(mode, TransferMode::Unknown(7));
        assert_eq!(mode.code(), 7);
        assert!(!mode.is_known());
    }

    #[test]
    fn sparse_domains_map_both_ways() {
        for code in [1, 2, 4, 5, 6, 7, 8] {
            let ty = TimeType::from_code(code);
            assert!(ty.is_known(), "code {code}");
            assert_eq!(ty.code(), code);
        }
        assert!(!TimeType::from_code(3).is_known());
        assert!(!AllocationStampType::from_code(2).is_known());
        assert_eq!(PositionStatus::from_code(15), PositionStatus::NotAvailable);
    }
}
