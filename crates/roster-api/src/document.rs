//! The persisted roster document
//!
//! The whole guild state lives in one JSON document, persisted as a unit.
//! Field names serialize in camelCase to match the on-disk layout written
//! by earlier versions of the bot, so the same file can be read back and
//! forth across deployments.

use serde::{Deserialize, Serialize};

use crate::Timer;

/// Placeholder used for every free-text field that has no value yet.
pub const EMPTY_FIELD: &str = "-";

/// Upper bound for deposits and legacy numeric prices.
pub const MAX_DEPOSIT: i64 = 100_000;

/// Maximum length of a price string.
pub const MAX_PRICE_LEN: usize = 30;

/// Root of the persisted state. Always fully populated after validation:
/// no field is ever legitimately absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub prices: Prices,
    pub guild_members: Vec<GuildMember>,
    pub reservations: Reservations,
    pub departure_times: DepartureTimes,
    pub timers: Vec<Timer>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            prices: Prices::default(),
            guild_members: Vec::new(),
            reservations: Reservations::default(),
            departure_times: DepartureTimes::default(),
            timers: Vec::new(),
        }
    }
}

impl Document {
    /// Projection for the admin panel: everything except timers, which have
    /// their own snapshot with reconciled remaining times.
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            prices: self.prices.clone(),
            guild_members: self.guild_members.clone(),
            reservations: self.reservations.clone(),
            departure_times: self.departure_times.clone(),
        }
    }
}

/// The four advertised price strings (free text, length-capped).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prices {
    /// Price for 1st/2nd positions
    pub first_second: String,
    /// Price for the 3rd position
    pub third: String,
    pub skillbook1: String,
    pub skillbook2: String,
}

impl Default for Prices {
    fn default() -> Self {
        Self {
            first_second: "1000".into(),
            third: "800".into(),
            skillbook1: "1000".into(),
            skillbook2: "300".into(),
        }
    }
}

/// One guild roster entry. Nicknames are unique within the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildMember {
    pub nickname: String,
    pub job: String,
}

/// All reservation slots: two turns of three positions, two skillbook
/// slots, and the unordered waitlist.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservations {
    pub turn1: Turn,
    pub turn2: Turn,
    pub skillbook1: SkillbookSlot,
    pub skillbook2: SkillbookSlot,
    /// Waitlist: unordered customer names outside the turn structure.
    pub enre_eat: Vec<String>,
}

/// The three ordered positions of one dispatch turn.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub first: Slot,
    pub second: Slot,
    pub third: Slot,
}

/// A single turn/position reservation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub customer: String,
    pub incentive_member: String,
    pub deposit: i64,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            customer: EMPTY_FIELD.into(),
            incentive_member: EMPTY_FIELD.into(),
            deposit: 0,
        }
    }
}

/// A skillbook reservation carries the item name alongside the usual slot
/// fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillbookSlot {
    pub customer: String,
    pub incentive_member: String,
    pub deposit: i64,
    pub skillbook_name: String,
}

impl Default for SkillbookSlot {
    fn default() -> Self {
        Self {
            customer: EMPTY_FIELD.into(),
            incentive_member: EMPTY_FIELD.into(),
            deposit: 0,
            skillbook_name: EMPTY_FIELD.into(),
        }
    }
}

/// Departure times for both turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartureTimes {
    pub turn1: DepartureTime,
    pub turn2: DepartureTime,
}

impl Default for DepartureTimes {
    fn default() -> Self {
        Self {
            turn1: DepartureTime { hour: 20, minute: 30 },
            turn2: DepartureTime { hour: 21, minute: 30 },
        }
    }
}

/// Wall-clock departure time, hour in [0,23], minute in [0,59].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartureTime {
    pub hour: u8,
    pub minute: u8,
}

/// Admin-panel view of the non-timer state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub prices: Prices,
    pub guild_members: Vec<GuildMember>,
    pub reservations: Reservations,
    pub departure_times: DepartureTimes,
}
