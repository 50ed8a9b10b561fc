//! Document validation, repair, and legacy-schema migration
//!
//! `validate` is total: whatever arrives (stale schema, hand-edited file,
//! truncated garbage), it produces a fully populated [`Document`]. It is
//! also idempotent, so running it on every read and every save is safe.

use roster_api::{
    DepartureTime, DepartureTimes, Document, GuildMember, Prices, Reservations, SkillbookSlot,
    Slot, Timer, Turn, EMPTY_FIELD, MAX_DEPOSIT, MAX_PRICE_LEN,
};
use roster_util::{clamp_duration_ms, TimerId};
use serde_json::{Map, Value};
use tracing::info;

/// Default display name for a timer entry repaired during validation.
const REPAIRED_TIMER_NAME: &str = "타이머";

/// Maximum timer display-name length in characters.
const MAX_TIMER_NAME_LEN: usize = 60;

/// Produce a document conforming to the current schema from arbitrary
/// input. Missing fields get defaults, malformed values are coerced, and
/// legacy field names are migrated.
pub fn validate(raw: &Value) -> Document {
    let Some(obj) = raw.as_object() else {
        return Document::default();
    };

    let mut obj = obj.clone();
    migrate_legacy_fields(&mut obj);

    let doc = Document {
        prices: coerce_prices(obj.get("prices")),
        guild_members: coerce_members(obj.get("guildMembers")),
        reservations: coerce_reservations(obj.get("reservations")),
        departure_times: coerce_departure_times(obj.get("departureTimes")),
        timers: coerce_timers(obj.get("timers")),
    };

    normalize(doc)
}

/// Typed normalization pass, shared by `validate` and by `save` so that a
/// caller-constructed document gets the same repairs as one read from disk.
pub fn normalize(mut doc: Document) -> Document {
    doc.prices = normalize_prices(doc.prices);
    doc.guild_members = normalize_members(doc.guild_members);
    doc.reservations = normalize_reservations(doc.reservations);
    doc.departure_times = normalize_departure_times(doc.departure_times);
    doc.timers = doc.timers.into_iter().map(normalize_timer).collect();
    doc
}

/// One-time field renames from legacy schema versions. Each rename only
/// fires when the old key is present and the new one is not, so repeated
/// validation of an already-migrated document is a no-op.
fn migrate_legacy_fields(obj: &mut Map<String, Value>) {
    if let Some(reservations) = obj.get_mut("reservations").and_then(Value::as_object_mut) {
        rename_key(reservations, "skillbook", "skillbook1", "reservations");
        rename_key(reservations, "skillbookNoLying", "skillbook2", "reservations");
    }

    if let Some(prices) = obj.get_mut("prices").and_then(Value::as_object_mut) {
        rename_key(prices, "skillbook", "skillbook1", "prices");
        rename_key(prices, "skillbookPerTurn", "skillbook2", "prices");
    }
}

fn rename_key(map: &mut Map<String, Value>, from: &str, to: &str, section: &str) {
    if map.contains_key(from) && !map.contains_key(to) {
        if let Some(value) = map.remove(from) {
            map.insert(to.to_string(), value);
            info!(section, from, to, "Migrated legacy field");
        }
    } else {
        // Old key with the new one already present is stale leftover data
        map.remove(from);
    }
}

fn coerce_prices(value: Option<&Value>) -> Prices {
    let defaults = Prices::default();
    let Some(obj) = value.and_then(Value::as_object) else {
        return defaults;
    };

    Prices {
        first_second: coerce_price(obj.get("firstSecond"), &defaults.first_second),
        third: coerce_price(obj.get("third"), &defaults.third),
        skillbook1: coerce_price(obj.get("skillbook1"), &defaults.skillbook1),
        skillbook2: coerce_price(obj.get("skillbook2"), &defaults.skillbook2),
    }
}

/// A price is free text up to 30 characters. Legacy documents stored
/// numbers; those are stringified when in the plausible range.
fn coerce_price(value: Option<&Value>, default: &str) -> String {
    match value {
        Some(Value::String(s)) if s.chars().count() <= MAX_PRICE_LEN => s.clone(),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64()
                && (0..=MAX_DEPOSIT).contains(&i)
            {
                i.to_string()
            } else if let Some(f) = n.as_f64()
                && f.is_finite()
                && (0.0..=MAX_DEPOSIT as f64).contains(&f)
            {
                f.to_string()
            } else {
                default.to_string()
            }
        }
        _ => default.to_string(),
    }
}

fn coerce_members(value: Option<&Value>) -> Vec<GuildMember> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter(|v| v.is_object())
        .map(|v| GuildMember {
            nickname: coerce_text(v.get("nickname")),
            job: coerce_text(v.get("job")),
        })
        .collect()
}

/// Trimmed string, `-` placeholder when missing or blank.
fn coerce_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                EMPTY_FIELD.to_string()
            } else {
                trimmed.to_string()
            }
        }
        _ => EMPTY_FIELD.to_string(),
    }
}

/// Free-text slot field: any string passes through untouched, anything
/// else becomes the placeholder.
fn coerce_slot_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        _ => EMPTY_FIELD.to_string(),
    }
}

fn coerce_deposit(value: Option<&Value>) -> i64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.unwrap_or(0).clamp(0, MAX_DEPOSIT)
}

fn coerce_slot(value: Option<&Value>) -> Slot {
    let Some(obj) = value.and_then(Value::as_object) else {
        return Slot::default();
    };

    Slot {
        customer: coerce_slot_text(obj.get("customer")),
        incentive_member: coerce_slot_text(obj.get("incentiveMember")),
        deposit: coerce_deposit(obj.get("deposit")),
    }
}

fn coerce_skillbook_slot(value: Option<&Value>) -> SkillbookSlot {
    let Some(obj) = value.and_then(Value::as_object) else {
        return SkillbookSlot::default();
    };

    let base = coerce_slot(value);
    SkillbookSlot {
        customer: base.customer,
        incentive_member: base.incentive_member,
        deposit: base.deposit,
        skillbook_name: coerce_slot_text(obj.get("skillbookName")),
    }
}

fn coerce_turn(value: Option<&Value>) -> Turn {
    let Some(obj) = value.and_then(Value::as_object) else {
        return Turn::default();
    };

    Turn {
        first: coerce_slot(obj.get("first")),
        second: coerce_slot(obj.get("second")),
        third: coerce_slot(obj.get("third")),
    }
}

fn coerce_reservations(value: Option<&Value>) -> Reservations {
    let Some(obj) = value.and_then(Value::as_object) else {
        return Reservations::default();
    };

    let enre_eat = obj
        .get("enreEat")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    Reservations {
        turn1: coerce_turn(obj.get("turn1")),
        turn2: coerce_turn(obj.get("turn2")),
        skillbook1: coerce_skillbook_slot(obj.get("skillbook1")),
        skillbook2: coerce_skillbook_slot(obj.get("skillbook2")),
        enre_eat,
    }
}

fn coerce_departure_times(value: Option<&Value>) -> DepartureTimes {
    let defaults = DepartureTimes::default();
    let Some(obj) = value.and_then(Value::as_object) else {
        return defaults;
    };

    DepartureTimes {
        turn1: coerce_departure_time(obj.get("turn1"), defaults.turn1),
        turn2: coerce_departure_time(obj.get("turn2"), defaults.turn2),
    }
}

/// Hour and minute are validated independently: a bad hour falls back to
/// the default hour while a valid minute is kept, and vice versa.
fn coerce_departure_time(value: Option<&Value>, default: DepartureTime) -> DepartureTime {
    let Some(obj) = value.and_then(Value::as_object) else {
        return default;
    };

    DepartureTime {
        hour: coerce_clock_field(obj.get("hour"), 23, default.hour),
        minute: coerce_clock_field(obj.get("minute"), 59, default.minute),
    }
}

fn coerce_clock_field(value: Option<&Value>, max: u8, default: u8) -> u8 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if (0..=max as i64).contains(&v) => v as u8,
        _ => default,
    }
}

fn coerce_timers(value: Option<&Value>) -> Vec<Timer> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|v| v.as_object())
        .map(|obj| Timer {
            id: match obj.get("id").and_then(Value::as_str).map(str::trim) {
                Some(id) if !id.is_empty() => TimerId::new(id),
                _ => TimerId::generate(),
            },
            name: obj
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
            duration_ms: coerce_millis(obj.get("durationMs")).unwrap_or(0),
            remaining_ms: coerce_millis(obj.get("remainingMs")).unwrap_or(i64::MAX),
            is_running: obj
                .get("isRunning")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            started_at: coerce_timestamp(obj.get("startedAt")),
            repeat: obj.get("repeat").and_then(Value::as_bool).unwrap_or(false),
            updated_at: coerce_timestamp(obj.get("updatedAt")),
        })
        .map(|mut timer| {
            // A non-finite stored remaining defaults to the full duration
            if timer.remaining_ms == i64::MAX {
                timer.remaining_ms = timer.duration_ms;
            }
            timer
        })
        .collect()
}

fn coerce_millis(value: Option<&Value>) -> Option<i64> {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        _ => None,
    }
}

fn coerce_timestamp(value: Option<&Value>) -> Option<i64> {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        _ => None,
    }
}

fn normalize_prices(prices: Prices) -> Prices {
    let defaults = Prices::default();
    let cap = |s: String, default: String| {
        if s.chars().count() <= MAX_PRICE_LEN {
            s
        } else {
            default
        }
    };

    Prices {
        first_second: cap(prices.first_second, defaults.first_second),
        third: cap(prices.third, defaults.third),
        skillbook1: cap(prices.skillbook1, defaults.skillbook1),
        skillbook2: cap(prices.skillbook2, defaults.skillbook2),
    }
}

/// Trim, fill blanks with the placeholder, then deduplicate by nickname
/// keeping the first occurrence.
fn normalize_members(members: Vec<GuildMember>) -> Vec<GuildMember> {
    let mut seen: Vec<GuildMember> = Vec::with_capacity(members.len());
    for member in members {
        let nickname = non_blank(member.nickname);
        let job = non_blank(member.job);
        if !seen.iter().any(|m| m.nickname == nickname) {
            seen.push(GuildMember { nickname, job });
        }
    }
    seen
}

fn non_blank(s: String) -> String {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        EMPTY_FIELD.to_string()
    } else {
        trimmed.to_string()
    }
}

fn normalize_reservations(mut reservations: Reservations) -> Reservations {
    let clamp_slot = |slot: &mut Slot| {
        slot.deposit = slot.deposit.clamp(0, MAX_DEPOSIT);
    };

    clamp_slot(&mut reservations.turn1.first);
    clamp_slot(&mut reservations.turn1.second);
    clamp_slot(&mut reservations.turn1.third);
    clamp_slot(&mut reservations.turn2.first);
    clamp_slot(&mut reservations.turn2.second);
    clamp_slot(&mut reservations.turn2.third);
    reservations.skillbook1.deposit = reservations.skillbook1.deposit.clamp(0, MAX_DEPOSIT);
    reservations.skillbook2.deposit = reservations.skillbook2.deposit.clamp(0, MAX_DEPOSIT);

    reservations
}

fn normalize_departure_times(times: DepartureTimes) -> DepartureTimes {
    let defaults = DepartureTimes::default();
    let fix = |t: DepartureTime, d: DepartureTime| DepartureTime {
        hour: if t.hour <= 23 { t.hour } else { d.hour },
        minute: if t.minute <= 59 { t.minute } else { d.minute },
    };

    DepartureTimes {
        turn1: fix(times.turn1, defaults.turn1),
        turn2: fix(times.turn2, defaults.turn2),
    }
}

/// Repair a single timer entry so the engine can trust its invariants:
/// `0 <= remaining <= duration <= 12h`, and `started_at` set exactly while
/// running.
pub fn normalize_timer(mut timer: Timer) -> Timer {
    if timer.id.is_empty() {
        timer.id = TimerId::generate();
    }

    let name = timer.name.trim();
    timer.name = if name.is_empty() {
        REPAIRED_TIMER_NAME.to_string()
    } else {
        name.chars().take(MAX_TIMER_NAME_LEN).collect()
    };

    timer.duration_ms = clamp_duration_ms(timer.duration_ms);
    timer.remaining_ms = clamp_duration_ms(timer.remaining_ms).min(timer.duration_ms);

    timer.is_running = timer.is_running && timer.remaining_ms > 0 && timer.started_at.is_some();
    if !timer.is_running {
        timer.started_at = None;
    }

    timer
}
