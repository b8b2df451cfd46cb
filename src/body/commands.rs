//! Order-code tables: command names and the passive-command set.
//!
//! Order codes are 32-bit tags identifying the command an event
//! records. Codes below 2000 come off the wire; the 2000..=2019 range
//! is synthetic — per-tick money and statistics samples injected by an
//! external collaborator — and never decoded from the file itself.
//!
//! The passive set marks commands that don't evidence deliberate play:
//! selections, camera moves, checksums, cancellations, and every
//! synthetic change code. Winner fallback detection scans for the last
//! *non*-passive command.

/// Order code of the end-of-replay marker.
pub const ORDER_END_REPLAY: u32 = 27;

/// Order code of a special power used without a target.
pub const ORDER_SPECIAL_POWER: u32 = 1040;

/// Order code of a special power aimed at a location.
pub const ORDER_SPECIAL_POWER_AT_LOCATION: u32 = 1041;

/// Order code of a special power aimed at an object.
pub const ORDER_SPECIAL_POWER_AT_OBJECT: u32 = 1042;

/// Order code of an upgrade purchase.
pub const ORDER_BUILD_UPGRADE: u32 = 1045;

/// Order code of a unit production command.
pub const ORDER_CREATE_UNIT: u32 = 1047;

/// Order code of a building placement command.
pub const ORDER_BUILD_OBJECT: u32 = 1049;

/// Order code of a surrender.
pub const ORDER_SURRENDER: u32 = 1093;

/// First synthetic change code (money value samples).
pub const ORDER_MONEY_VALUE_CHANGE: u32 = 2000;

/// Last synthetic change code.
pub const ORDER_LAST_CHANGE: u32 = 2019;

/// Returns the human-readable name for an order code, or `""` for
/// codes with no known mapping.
#[must_use]
pub fn command_name(order_code: u32) -> &'static str {
    match order_code {
        27 => "EndReplay",
        1001 => "SetSelection",
        1002 => "SelectAll", // the bool arg looks like everywhere-vs-on-screen
        1003 => "ClearSelection",
        1006 => "CreateGroup0",
        1007 => "CreateGroup1",
        1008 => "CreateGroup2",
        1009 => "CreateGroup3",
        1010 => "CreateGroup4",
        1011 => "CreateGroup5",
        1012 => "CreateGroup6",
        1013 => "CreateGroup7",
        1014 => "CreateGroup8",
        1015 => "CreateGroup9",
        1016 => "SelectGroup0",
        1017 => "SelectGroup1",
        1018 => "SelectGroup2",
        1019 => "SelectGroup3",
        1020 => "SelectGroup4",
        1021 => "SelectGroup5",
        1022 => "SelectGroup6",
        1023 => "SelectGroup7",
        1024 => "SelectGroup8",
        1025 => "SelectGroup9",
        1037 => "DetonateNow", // bomb truck
        1038 => "FlamewallRocketPodContaminate",
        1040 => "SpecialPower",
        1041 => "SpecialPowerAtLocation",
        1042 => "SpecialPowerAtObject",
        1043 => "SetRallyPoint",
        1044 => "PurchaseScience",
        1045 => "BuildUpgrade",
        1046 => "CancelUpgrade",
        1047 => "CreateUnit",
        1048 => "CancelUnit",
        1049 => "BuildObject",
        1051 => "CancelBuild",
        1052 => "Sell",
        1053 => "EvacSingleUnit",
        1054 => "EvacAll",
        1058 => "SelectBox",
        1059 => "AttackObject",
        1060 => "ForceAttackObject",
        1061 => "ForceAttackGround",
        1062 => "Unknown1062", // 555 or 554 for USA, 972 for China
        1064 => "Unknown1064", // arg 628 or 630, rare; maybe attack move
        1065 => "ResumeBuild",
        1066 => "Enter",
        1067 => "Unknown1067", // USA only, arg 402 or 409
        1068 => "MoveTo",
        1069 => "AttackMove",
        1072 => "Guard",
        1074 => "Stop",
        1075 => "Scatter",
        1076 => "HackInternet",
        1078 => "ToggleOvercharge",
        1079 => "ToggleUnitMode",
        1087 => "Unknown1087", // takes one position arg
        1092 => "SetCameraPosition",
        1093 => "Surrender",
        1095 => "Checksum",
        1097 => "DeclareUserId",
        2000 => "MoneyValueChange",
        2001 => "MoneyEarnedChange",
        2002 => "UnitsBuiltChange",
        2003 => "UnitsLostChange",
        2004 => "BuildingsBuiltChange",
        2005 => "BuildingsLostChange",
        2006 => "BuildingsKilledChange",
        2007 => "UnitsKilledChange",
        2008 => "GeneralsPointsTotalChange",
        2009 => "GeneralsPointsUsedChange",
        2010 => "RadarsBuiltChange",
        2011 => "SearchAndDestroyChange",
        2012 => "HoldTheLineChange",
        2013 => "BombardmentChange",
        2014 => "XPChange",
        2015 => "XPLevelChange",
        2016 => "TechBuildingsCapturedChange",
        2017 => "FactionBuildingsCapturedChange",
        2018 => "PowerTotalChange",
        2019 => "PowerUsedChange",
        _ => "",
    }
}

/// Returns `true` for commands that don't by themselves imply player
/// activity.
///
/// Sell (1052) is arguably active, but selling off a base is how losing
/// players exit, so it must not count as a winning move.
#[must_use]
pub fn is_passive(order_code: u32) -> bool {
    matches!(
        order_code,
        27 | 1001..=1003
            | 1016..=1025
            | 1048
            | 1051
            | 1052
            | 1058
            | 1092
            | 1095
            | 2000..=2019
    )
}
