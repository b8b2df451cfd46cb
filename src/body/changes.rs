//! Typed catalog of the synthetic change events (order codes
//! 2001..=2019).
//!
//! Alongside the money samples (order code 2000), an external
//! collaborator can submit per-tick statistics snapshots: units built
//! and lost, generals points, captured buildings, and so on. Each
//! sample kind has its own order code and carries one value per player
//! slot, indexed like the money vector.
//!
//! [`StatKind`] names the catalog so callers don't juggle raw order
//! codes when constructing or interpreting samples.

use serde::Serialize;

use crate::body::{commands, BodyChunk};

/// A per-player statistics sample kind.
///
/// The discriminant is the sample's order code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u32)]
pub enum StatKind {
    /// Cumulative money earned.
    MoneyEarned = 2001,
    /// Units built so far.
    UnitsBuilt = 2002,
    /// Units lost so far.
    UnitsLost = 2003,
    /// Buildings built so far.
    BuildingsBuilt = 2004,
    /// Buildings lost so far.
    BuildingsLost = 2005,
    /// Enemy buildings destroyed.
    BuildingsKilled = 2006,
    /// Enemy units destroyed.
    UnitsKilled = 2007,
    /// Generals points earned.
    GeneralsPointsTotal = 2008,
    /// Generals points spent.
    GeneralsPointsUsed = 2009,
    /// Radars built.
    RadarsBuilt = 2010,
    /// Search-and-destroy battle plan activations.
    SearchAndDestroy = 2011,
    /// Hold-the-line battle plan activations.
    HoldTheLine = 2012,
    /// Bombardment battle plan activations.
    Bombardment = 2013,
    /// Experience points.
    Xp = 2014,
    /// Experience level.
    XpLevel = 2015,
    /// Neutral tech buildings captured.
    TechBuildingsCaptured = 2016,
    /// Enemy faction buildings captured.
    FactionBuildingsCaptured = 2017,
    /// Power supplied.
    PowerTotal = 2018,
    /// Power consumed.
    PowerUsed = 2019,
}

impl StatKind {
    /// The sample's order code.
    #[must_use]
    pub fn order_code(self) -> u32 {
        self as u32
    }

    /// The catalog entry for an order code, if it is a stat sample.
    #[must_use]
    pub fn from_order_code(order_code: u32) -> Option<Self> {
        Some(match order_code {
            2001 => StatKind::MoneyEarned,
            2002 => StatKind::UnitsBuilt,
            2003 => StatKind::UnitsLost,
            2004 => StatKind::BuildingsBuilt,
            2005 => StatKind::BuildingsLost,
            2006 => StatKind::BuildingsKilled,
            2007 => StatKind::UnitsKilled,
            2008 => StatKind::GeneralsPointsTotal,
            2009 => StatKind::GeneralsPointsUsed,
            2010 => StatKind::RadarsBuilt,
            2011 => StatKind::SearchAndDestroy,
            2012 => StatKind::HoldTheLine,
            2013 => StatKind::Bombardment,
            2014 => StatKind::Xp,
            2015 => StatKind::XpLevel,
            2016 => StatKind::TechBuildingsCaptured,
            2017 => StatKind::FactionBuildingsCaptured,
            2018 => StatKind::PowerTotal,
            2019 => StatKind::PowerUsed,
            _ => return None,
        })
    }
}

impl BodyChunk {
    /// Builds a synthetic statistics sample.
    #[must_use]
    pub fn stat_change(kind: StatKind, time_code: u32, values: [u32; 8]) -> Self {
        Self::synthetic_change(kind.order_code(), time_code, values)
    }

    /// Interprets this event as a statistics sample.
    ///
    /// Returns the kind and the per-player vector, or `None` for other
    /// order codes (including money samples — see
    /// [`BodyChunk::money_vector`]) and malformed argument shapes.
    #[must_use]
    pub fn stat_vector(&self) -> Option<(StatKind, [u32; 8])> {
        let kind = StatKind::from_order_code(self.order_code)?;
        let mut vector = [0u32; 8];
        for (slot, value) in vector.iter_mut().zip(self.arguments.iter()) {
            *slot = value.as_int()?;
        }
        (self.arguments.len() >= 8).then_some((kind, vector))
    }

    /// Returns `true` for any synthetic change event, money or stats.
    #[must_use]
    pub fn is_change_event(&self) -> bool {
        (commands::ORDER_MONEY_VALUE_CHANGE..=commands::ORDER_LAST_CHANGE)
            .contains(&self.order_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::command_name;

    #[test]
    fn test_order_code_round_trip() {
        for code in 2001..=2019 {
            let kind = StatKind::from_order_code(code).unwrap();
            assert_eq!(kind.order_code(), code);
        }
    }

    #[test]
    fn test_non_stat_codes_rejected() {
        assert_eq!(StatKind::from_order_code(2000), None); // money, not stats
        assert_eq!(StatKind::from_order_code(2020), None);
        assert_eq!(StatKind::from_order_code(1047), None);
    }

    #[test]
    fn test_stat_change_construction() {
        let chunk = BodyChunk::stat_change(StatKind::UnitsBuilt, 700, [3, 5, 0, 0, 0, 0, 0, 0]);
        assert_eq!(chunk.order_code, 2002);
        assert_eq!(chunk.order_name, command_name(2002));
        assert_eq!(
            chunk.stat_vector(),
            Some((StatKind::UnitsBuilt, [3, 5, 0, 0, 0, 0, 0, 0]))
        );
        assert!(chunk.is_change_event());
        assert!(chunk.is_passive());
    }

    #[test]
    fn test_money_sample_is_change_but_not_stat() {
        let chunk = BodyChunk::money_change(700, [1; 8]);
        assert!(chunk.is_change_event());
        assert_eq!(chunk.stat_vector(), None);
        assert!(chunk.money_vector().is_some());
    }

    #[test]
    fn test_decoded_command_is_not_change_event() {
        let chunk = BodyChunk {
            order_code: 1047,
            ..BodyChunk::default()
        };
        assert!(!chunk.is_change_event());
    }
}
