//! Enriched event details resolved through the data stores.
//!
//! A handful of order codes reference static game data by id: unit
//! production, building placement, upgrade purchases, and special
//! powers. After an event's arguments are decoded, the referenced entry
//! is looked up and attached as a [`Detail`] so consumers see names and
//! costs instead of bare ids.

use std::fmt;

use log::error;
use serde::Serialize;

use crate::body::args::ArgValue;
use crate::body::commands;
use crate::stores::{ObjectStore, PowerStore, UpgradeStore};

/// Placeholder name for an upgrade that couldn't be resolved.
pub const DUMMY_UPGRADE: &str = "dummy";

/// Resolved detail for an event, dispatched on the order code.
///
/// A closed variant rather than a name/cost trait: every consumer can
/// match exhaustively, and the "power has no cost" rule lives in one
/// place ([`Detail::cost`]) instead of in each implementation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum Detail {
    /// No detail applies to this order code, or the lookup failed.
    #[default]
    None,
    /// A produced unit.
    Unit {
        /// Object name from the INI tables.
        name: String,
        /// Build cost in credits.
        cost: u32,
    },
    /// A placed building.
    Building {
        /// Object name from the INI tables.
        name: String,
        /// Build cost in credits.
        cost: u32,
    },
    /// A purchased upgrade.
    Upgrade {
        /// Upgrade name, or [`DUMMY_UPGRADE`] when unresolved.
        name: String,
        /// Research cost in credits; 0 for the placeholder.
        cost: u32,
    },
    /// A used special power.
    Power {
        /// Power name from the INI tables.
        name: String,
    },
}

impl Detail {
    /// The detail's name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Detail::None => None,
            Detail::Unit { name, .. }
            | Detail::Building { name, .. }
            | Detail::Upgrade { name, .. }
            | Detail::Power { name } => Some(name),
        }
    }

    /// The detail's cost. Powers are definitionally free; `None` has no
    /// cost either.
    #[must_use]
    pub fn cost(&self) -> u32 {
        match self {
            Detail::Unit { cost, .. }
            | Detail::Building { cost, .. }
            | Detail::Upgrade { cost, .. } => *cost,
            Detail::None | Detail::Power { .. } => 0,
        }
    }

    /// Returns `true` when a detail is attached.
    #[must_use]
    pub fn is_some(&self) -> bool {
        !matches!(self, Detail::None)
    }
}

impl fmt::Display for Detail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Detail::None => write!(f, "-"),
            Detail::Unit { name, cost } => write!(f, "unit {name} ({cost})"),
            Detail::Building { name, cost } => write!(f, "building {name} ({cost})"),
            Detail::Upgrade { name, cost } => write!(f, "upgrade {name} ({cost})"),
            Detail::Power { name } => write!(f, "power {name}"),
        }
    }
}

/// Resolves the detail for an event from its order code and arguments.
///
/// Lookup failures are recoverable: the event keeps decoding, it just
/// carries [`Detail::None`] — except upgrades, which always attach
/// something and use the [`DUMMY_UPGRADE`] placeholder when the id does
/// not resolve.
#[must_use]
pub fn attach_details(
    order_code: u32,
    arguments: &[ArgValue],
    objects: &ObjectStore,
    powers: &PowerStore,
    upgrades: &UpgradeStore,
) -> Detail {
    if arguments.is_empty() {
        return Detail::None;
    }

    match order_code {
        commands::ORDER_CREATE_UNIT => unit_detail(arguments, objects),
        commands::ORDER_BUILD_OBJECT => building_detail(arguments, objects),
        commands::ORDER_SPECIAL_POWER
        | commands::ORDER_SPECIAL_POWER_AT_LOCATION
        | commands::ORDER_SPECIAL_POWER_AT_OBJECT => power_detail(arguments, powers),
        commands::ORDER_BUILD_UPGRADE => upgrade_detail(arguments, upgrades),
        _ => Detail::None,
    }
}

fn unit_detail(arguments: &[ArgValue], objects: &ObjectStore) -> Detail {
    let Some(id) = arguments[0].as_int() else {
        return Detail::None;
    };
    match objects.get(id) {
        Ok(entry) => Detail::Unit {
            name: entry.name.clone(),
            cost: entry.cost,
        },
        Err(_) => Detail::None,
    }
}

fn building_detail(arguments: &[ArgValue], objects: &ObjectStore) -> Detail {
    let Some(id) = arguments[0].as_int() else {
        return Detail::None;
    };
    match objects.get(id) {
        Ok(entry) => Detail::Building {
            name: entry.name.clone(),
            cost: entry.cost,
        },
        Err(_) => Detail::None,
    }
}

fn power_detail(arguments: &[ArgValue], powers: &PowerStore) -> Detail {
    let Some(id) = arguments[0].as_int() else {
        return Detail::None;
    };
    match powers.get(id) {
        Ok(entry) => Detail::Power {
            name: entry.name.clone(),
        },
        Err(_) => Detail::None,
    }
}

/// Upgrades reference the store through args[1]; args[0] is the
/// initiating player/faction context.
fn upgrade_detail(arguments: &[ArgValue], upgrades: &UpgradeStore) -> Detail {
    let Some(id) = arguments.get(1).and_then(ArgValue::as_int) else {
        return Detail::Upgrade {
            name: DUMMY_UPGRADE.to_string(),
            cost: 0,
        };
    };
    match upgrades.get(id) {
        Ok(entry) => Detail::Upgrade {
            name: entry.name.clone(),
            cost: entry.cost,
        },
        Err(e) => {
            error!("upgrade lookup failed: {e}");
            Detail::Upgrade {
                name: DUMMY_UPGRADE.to_string(),
                cost: 0,
            }
        }
    }
}
