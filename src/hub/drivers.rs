use std::fmt;

/// Attribute codes understood by the hub profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Driver {
    St,
    Cpw,
    Gv1,
    Gv2,
    Gv3,
    Gv4,
    Gv5,
    Gv6,
    Gv7,
    Gv8,
    Gv9,
    Gv10,
    Gv11,
    Gv12,
    Gv13,
    Gv14,
}

impl Driver {
    pub fn code(&self) -> &'static str {
        match self {
            Self::St => "ST",
            Self::Cpw => "CPW",
            Self::Gv1 => "GV1",
            Self::Gv2 => "GV2",
            Self::Gv3 => "GV3",
            Self::Gv4 => "GV4",
            Self::Gv5 => "GV5",
            Self::Gv6 => "GV6",
            Self::Gv7 => "GV7",
            Self::Gv8 => "GV8",
            Self::Gv9 => "GV9",
            Self::Gv10 => "GV10",
            Self::Gv11 => "GV11",
            Self::Gv12 => "GV12",
            Self::Gv13 => "GV13",
            Self::Gv14 => "GV14",
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Unit-of-measure codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Uom {
    /// 0/1 flag
    Boolean = 2,
    KilowattHours = 30,
    /// Plain counter
    Count = 56,
    Watts = 73,
    /// 0 = off, 100 = on
    OnOffPercent = 78,
}

impl Uom {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Node definition: the profile id and the drivers it declares, with their
/// unit and initial value.
#[derive(Debug)]
pub struct NodeDef {
    pub id: &'static str,
    pub drivers: &'static [(Driver, Uom, i64)],
}

impl NodeDef {
    pub fn uom(&self, driver: Driver) -> Option<Uom> {
        self.drivers
            .iter()
            .find(|(d, _, _)| *d == driver)
            .map(|(_, uom, _)| *uom)
    }
}

pub static CONTROLLER_DEF: NodeDef = NodeDef {
    id: "controller",
    drivers: &[
        (Driver::St, Uom::Boolean, 1),
        (Driver::Cpw, Uom::Watts, 0),
        (Driver::Gv6, Uom::Watts, 0),
        (Driver::Gv7, Uom::KilowattHours, 0),
        (Driver::Gv8, Uom::KilowattHours, 0),
        (Driver::Gv9, Uom::KilowattHours, 0),
        (Driver::Gv10, Uom::KilowattHours, 0),
        (Driver::Gv11, Uom::KilowattHours, 0),
        (Driver::Gv12, Uom::KilowattHours, 0),
        (Driver::Gv13, Uom::KilowattHours, 0),
        (Driver::Gv14, Uom::KilowattHours, 0),
    ],
};

pub static DEVICE_DEF: NodeDef = NodeDef {
    id: "SENSEDEVICE",
    drivers: &[
        (Driver::St, Uom::OnOffPercent, 0),
        (Driver::Gv5, Uom::Watts, 0),
        (Driver::Gv1, Uom::Count, 0),
        (Driver::Gv2, Uom::KilowattHours, 0),
        (Driver::Gv3, Uom::Count, 0),
        (Driver::Gv4, Uom::KilowattHours, 0),
    ],
};

/// Commands a node reports back to the hub
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportCommand {
    On,
    Off,
}

impl ReportCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::On => "DON",
            Self::Off => "DOF",
        }
    }
}

/// Keys of the user-visible notices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKey {
    Email,
    Pass,
    Cfg,
}

impl NoticeKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Pass => "pass",
            Self::Cfg => "cfg",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_codes_are_stable() {
        assert_eq!(Driver::St.code(), "ST");
        assert_eq!(Driver::Cpw.code(), "CPW");
        assert_eq!(Driver::Gv14.to_string(), "GV14");
        assert_eq!(Uom::Boolean.code(), 2);
        assert_eq!(Uom::KilowattHours.code(), 30);
        assert_eq!(Uom::Count.code(), 56);
        assert_eq!(Uom::Watts.code(), 73);
        assert_eq!(Uom::OnOffPercent.code(), 78);
    }

    #[test]
    fn node_defs_carry_units() {
        assert_eq!(CONTROLLER_DEF.uom(Driver::St), Some(Uom::Boolean));
        assert_eq!(CONTROLLER_DEF.uom(Driver::Gv6), Some(Uom::Watts));
        assert_eq!(CONTROLLER_DEF.uom(Driver::Gv1), None);
        assert_eq!(DEVICE_DEF.uom(Driver::St), Some(Uom::OnOffPercent));
        assert_eq!(DEVICE_DEF.uom(Driver::Gv3), Some(Uom::Count));
        assert_eq!(DEVICE_DEF.drivers.len(), 6);
    }

    #[test]
    fn report_and_notice_names() {
        assert_eq!(ReportCommand::On.as_str(), "DON");
        assert_eq!(ReportCommand::Off.as_str(), "DOF");
        assert_eq!(NoticeKey::Pass.as_str(), "pass");
    }
}
