//! Per-player match summaries: aggregation, faction inference, and
//! winner determination.
//!
//! Summaries are seeded from the header roster, filled by scanning the
//! event stream, and finished by one of two winner policies:
//!
//! 1. **Money policy** — when the record carries synthetic money
//!    samples (order code 2000), the last sample tells who still had a
//!    bank balance at the end. A single team with money is the winner.
//! 2. **Heuristic fallback** — surrendered players sink their team; if
//!    that still leaves several candidate teams, the team behind the
//!    last non-passive command wins.
//!
//! Both are deterministic and idempotent; the caller may re-run the
//! whole pass at any time.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::body::{commands, BodyChunk, Detail};
use crate::header::RosterPlayer;

/// Side label for observer slots.
pub const OBSERVER_SIDE: &str = "Observer";

/// Team id assigned to observer slots.
pub const OBSERVER_TEAM: i32 = -1;

/// Count/cost tally for one object, upgrade, or building name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ObjectSummary {
    /// How many times the player ordered it.
    pub count: u32,
    /// Total credits spent on those orders.
    pub total_spent: u32,
}

/// One player's aggregated match statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerSummary {
    /// Roster name.
    pub name: String,

    /// Inferred sub-faction, e.g. `GLA Stealth` or `USA Airforce`.
    /// Empty until the player builds their first construction unit;
    /// `Observer` for observer slots.
    pub side: String,

    /// One-based team id (roster team + 1); [`OBSERVER_TEAM`] for
    /// observers.
    pub team: i32,

    /// Whether this player's team won. Seeded `true`, settled by the
    /// winner policies.
    pub win: bool,

    /// Total credits spent on units, buildings, and upgrades.
    pub money_spent: u32,

    /// Tallies for order code 1047, keyed by unit name.
    pub units_created: BTreeMap<String, ObjectSummary>,

    /// Tallies for order code 1049, keyed by building name.
    pub buildings_built: BTreeMap<String, ObjectSummary>,

    /// Tallies for order code 1045, keyed by upgrade name.
    pub upgrades_built: BTreeMap<String, ObjectSummary>,

    /// Use counts for order codes 1041/1042, keyed by power name.
    pub powers_used: BTreeMap<String, u32>,
}

impl PlayerSummary {
    /// Returns `true` for observer slots.
    #[must_use]
    pub fn is_observer(&self) -> bool {
        self.side == OBSERVER_SIDE
    }
}

/// Maps a construction unit name to the sub-faction that fields it.
///
/// Dozers and workers are faction-unique, so the first one a player
/// trains pins their side down exactly.
#[must_use]
pub fn constructor_side(unit_name: &str) -> Option<&'static str> {
    match unit_name {
        "GLAInfantryWorker" => Some("GLA"),
        "Slth_GLAInfantryWorker" => Some("GLA Stealth"),
        "Chem_GLAInfantryWorker" => Some("GLA Toxin"),
        "Demo_GLAInfantryWorker" => Some("GLA Demo"),
        "AmericaVehicleDozer" => Some("USA"),
        "AirF_AmericaVehicleDozer" => Some("USA Airforce"),
        "Lazr_AmericaVehicleDozer" => Some("USA Lazr"),
        "SupW_AmericaVehicleDozer" => Some("USA Superweapon"),
        "ChinaVehicleDozer" => Some("China"),
        "Infa_ChinaVehicleDozer" => Some("China Infantry"),
        "Nuke_ChinaVehicleDozer" => Some("China Nuke"),
        "Tank_ChinaVehicleDozer" => Some("China Tank"),
        _ => None,
    }
}

/// Seeds one summary per roster slot.
///
/// Non-observers start optimistic (`win = true`); the winner policies
/// only ever take wins away or restore them wholesale.
#[must_use]
pub fn seed_summaries(roster: &[RosterPlayer]) -> Vec<PlayerSummary> {
    roster
        .iter()
        .map(|player| {
            let mut summary = PlayerSummary {
                name: player.name.clone(),
                team: player.team_index().unwrap_or(0) + 1,
                win: true,
                ..PlayerSummary::default()
            };
            if player.is_observer() {
                summary.side = OBSERVER_SIDE.to_string();
                summary.team = OBSERVER_TEAM;
            }
            summary
        })
        .collect()
}

/// Scans the event stream into each summary's tallies.
///
/// Events count toward the summary whose name matches their attached
/// `player_name`; events with no attached detail contribute nothing to
/// the name-keyed buckets.
pub fn aggregate(summaries: &mut [PlayerSummary], events: &[BodyChunk]) {
    for summary in summaries.iter_mut() {
        for event in events {
            if event.player_name != summary.name {
                continue;
            }
            match event.order_code {
                commands::ORDER_CREATE_UNIT => {
                    if let Detail::Unit { name, cost } = &event.details {
                        if summary.side.is_empty() {
                            if let Some(side) = constructor_side(name) {
                                summary.side = side.to_string();
                            }
                        }
                        let tally = summary.units_created.entry(name.clone()).or_default();
                        tally.count += 1;
                        tally.total_spent += cost;
                        summary.money_spent += cost;
                    }
                }
                commands::ORDER_BUILD_OBJECT => {
                    if let Detail::Building { name, cost } = &event.details {
                        let tally = summary.buildings_built.entry(name.clone()).or_default();
                        tally.count += 1;
                        tally.total_spent += cost;
                        summary.money_spent += cost;
                    }
                }
                commands::ORDER_BUILD_UPGRADE => {
                    if let Detail::Upgrade { name, cost } = &event.details {
                        let tally = summary.upgrades_built.entry(name.clone()).or_default();
                        tally.count += 1;
                        tally.total_spent += cost;
                        summary.money_spent += cost;
                    }
                }
                commands::ORDER_SPECIAL_POWER_AT_LOCATION
                | commands::ORDER_SPECIAL_POWER_AT_OBJECT => {
                    if let Detail::Power { name } = &event.details {
                        *summary.powers_used.entry(name.clone()).or_default() += 1;
                    }
                }
                commands::ORDER_SURRENDER => {
                    summary.win = false;
                }
                _ => {}
            }
        }
    }
}

/// Settles the `win` flags: money policy when samples are present and
/// conclusive, heuristic fallback otherwise.
pub fn determine_winners(summaries: &mut [PlayerSummary], events: &[BodyChunk]) {
    if let Some(vector) = last_money_vector(events) {
        if try_money_policy(summaries, events, vector) {
            return;
        }
    }
    fallback_winner_detection(summaries, events);
}

/// Finds the money vector of the last order-code-2000 event, if any.
fn last_money_vector(events: &[BodyChunk]) -> Option<[u32; 8]> {
    events.iter().rev().find_map(BodyChunk::money_vector)
}

/// The wire player id a name appears under, from the first matching
/// event.
fn player_id_from_name(events: &[BodyChunk], name: &str) -> Option<u32> {
    events
        .iter()
        .find(|event| event.player_name == name)
        .map(|event| event.player_id)
}

/// Applies the money policy. Returns `false` when more than one team
/// still holds money, leaving every `win` flag untouched so the
/// fallback can work from the surrender-derived state.
fn try_money_policy(
    summaries: &mut [PlayerSummary],
    events: &[BodyChunk],
    vector: [u32; 8],
) -> bool {
    let mut funded_teams: Vec<i32> = Vec::new();
    for summary in summaries.iter() {
        if summary.is_observer() {
            continue;
        }
        let Some(player_id) = player_id_from_name(events, &summary.name) else {
            continue;
        };
        // The vector is indexed by wire id minus the human base of 2.
        let Some(index) = player_id.checked_sub(2) else {
            continue;
        };
        let Some(&money) = vector.get(index as usize) else {
            continue;
        };
        if money > 0 && !funded_teams.contains(&summary.team) {
            funded_teams.push(summary.team);
        }
    }

    if funded_teams.len() > 1 {
        return false;
    }

    let winning_team = funded_teams.first().copied();
    for summary in summaries.iter_mut() {
        summary.win = !summary.is_observer() && Some(summary.team) == winning_team;
    }
    true
}

/// The heuristic fallback, from the surrender-derived flags.
fn fallback_winner_detection(summaries: &mut [PlayerSummary], events: &[BodyChunk]) {
    // Teams start winning; any losing member sinks the whole team.
    let mut team_wins: BTreeMap<i32, bool> = BTreeMap::new();
    for summary in summaries.iter() {
        team_wins.insert(summary.team, true);
    }
    for summary in summaries.iter() {
        if !summary.win {
            team_wins.insert(summary.team, false);
        }
    }
    for summary in summaries.iter_mut() {
        if !team_wins.get(&summary.team).copied().unwrap_or(false) {
            summary.win = false;
        }
    }

    let winners = team_wins.values().filter(|&&won| won).count();
    if winners <= 1 {
        return;
    }

    // Several teams still standing: award the team behind the last
    // command that evidences actual play. Both sides selling out or
    // being wiped simultaneously would still defeat this.
    for summary in summaries.iter_mut() {
        summary.win = false;
    }

    let last_active_team = events.iter().rev().find_map(|event| {
        if event.is_passive() {
            return None;
        }
        summaries
            .iter()
            .find(|summary| !summary.name.is_empty() && summary.name == event.player_name)
            .map(|summary| summary.team)
    });

    if let Some(team) = last_active_team {
        for summary in summaries.iter_mut() {
            if summary.team == team {
                summary.win = true;
            }
        }
    }
}
