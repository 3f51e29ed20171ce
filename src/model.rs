//! Canonical player-card record and request normalization.
//!
//! `normalize` is the only way to build a [`CardModel`] from untrusted input.
//! Once built, every field is defaulted and range-checked, so layout and
//! rendering never validate again.

use serde_json::{Map, Value};

use crate::error::ValidationError;

pub const DEFAULT_NICKNAME: &str = "Игрок";
pub const DEFAULT_RANK: &str = "F";
pub const DEFAULT_LEVEL: u32 = 1;
pub const DEFAULT_STAT: u8 = 50;

pub const MAX_NICKNAME_CHARS: usize = 100;
pub const MAX_RANK_CHARS: usize = 16;
pub const MIN_LEVEL: i64 = 1;
pub const MAX_LEVEL: i64 = 1000;
pub const MAX_STAT: i64 = 100;

/// The five recognized abilities, in canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    Strength,
    Agility,
    Endurance,
    Intelligence,
    Charisma,
}

impl StatKind {
    pub const ALL: [StatKind; 5] = [
        StatKind::Strength,
        StatKind::Agility,
        StatKind::Endurance,
        StatKind::Intelligence,
        StatKind::Charisma,
    ];

    /// Request key for this stat.
    pub fn key(self) -> &'static str {
        match self {
            StatKind::Strength => "strength",
            StatKind::Agility => "agility",
            StatKind::Endurance => "endurance",
            StatKind::Intelligence => "intelligence",
            StatKind::Charisma => "charisma",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Stat values indexed by [`StatKind`]. Every value is within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats([u8; 5]);

impl Stats {
    pub fn get(&self, kind: StatKind) -> u8 {
        self.0[kind.index()]
    }

    /// Iterates in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (StatKind, u8)> + '_ {
        StatKind::ALL.iter().map(|kind| (*kind, self.get(*kind)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for Stats {
    fn default() -> Self {
        Stats([DEFAULT_STAT; 5])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardModel {
    nickname: String,
    level: u32,
    rank: String,
    experience: u64,
    rating_position: Option<u64>,
    days_streak: Option<u64>,
    stats: Stats,
    photo_reference: Option<String>,
}

impl CardModel {
    /// A fully defaulted card, used when there is no player data at all.
    pub fn placeholder() -> Self {
        Self {
            nickname: DEFAULT_NICKNAME.to_string(),
            level: DEFAULT_LEVEL,
            rank: DEFAULT_RANK.to_string(),
            experience: 0,
            rating_position: None,
            days_streak: None,
            stats: Stats::default(),
            photo_reference: None,
        }
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn rank(&self) -> &str {
        &self.rank
    }

    pub fn experience(&self) -> u64 {
        self.experience
    }

    pub fn rating_position(&self) -> Option<u64> {
        self.rating_position
    }

    pub fn days_streak(&self) -> Option<u64> {
        self.days_streak
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Unresolved photo handle. Hand it to `PhotoResolver`, never open it directly.
    pub fn photo_reference(&self) -> Option<&str> {
        self.photo_reference.as_deref()
    }
}

/// Validates a raw request object and applies defaults.
///
/// JSON `null` is treated exactly like an absent key. A present value of zero
/// is kept as zero.
pub fn normalize(raw: &Value) -> Result<CardModel, ValidationError> {
    let Some(object) = raw.as_object() else {
        return Err(ValidationError::invalid_type("request", "expected a JSON object"));
    };

    let nickname = match field(object, "nickname") {
        None => return Err(ValidationError::missing("nickname")),
        Some(value) => parse_nickname(value)?,
    };

    let stats = match field(object, "stats") {
        None => return Err(ValidationError::missing("stats")),
        Some(value) => parse_stats(value)?,
    };

    let level = match field(object, "level") {
        None => DEFAULT_LEVEL,
        Some(value) => match integral(value) {
            Some(level) if (MIN_LEVEL..=MAX_LEVEL).contains(&level) => level as u32,
            _ => {
                return Err(ValidationError::out_of_range(
                    "level",
                    format!("must be an integer from {MIN_LEVEL} to {MAX_LEVEL}"),
                ));
            }
        },
    };

    let experience = match field(object, "experience") {
        None => 0,
        Some(value) => non_negative(value, "experience")?,
    };

    let rank = match field(object, "rank") {
        None => DEFAULT_RANK.to_string(),
        Some(value) => parse_rank(value)?,
    };

    let rating_position = match field(object, "ratingPosition") {
        None => None,
        Some(value) => match integral(value) {
            Some(position) if position >= 1 => Some(position as u64),
            _ => {
                return Err(ValidationError::out_of_range(
                    "ratingPosition",
                    "must be a positive integer",
                ));
            }
        },
    };

    let days_streak = match field(object, "daysStreak") {
        None => None,
        Some(value) => Some(non_negative(value, "daysStreak")?),
    };

    let photo_reference = match field(object, "photoPath") {
        None => None,
        Some(Value::String(path)) if path.trim().is_empty() => None,
        Some(Value::String(path)) => Some(path.clone()),
        Some(_) => {
            return Err(ValidationError::invalid_type(
                "photoPath",
                "must be a string or null",
            ));
        }
    };

    Ok(CardModel {
        nickname,
        level,
        rank,
        experience,
        rating_position,
        days_streak,
        stats,
        photo_reference,
    })
}

fn field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|value| !value.is_null())
}

fn parse_nickname(value: &Value) -> Result<String, ValidationError> {
    let Value::String(nickname) = value else {
        return Err(ValidationError::invalid_type("nickname", "must be a string"));
    };
    if nickname.trim().is_empty() {
        return Err(ValidationError::invalid_type("nickname", "must not be empty"));
    }
    if nickname.chars().count() > MAX_NICKNAME_CHARS {
        return Err(ValidationError::invalid_type(
            "nickname",
            format!("must be at most {MAX_NICKNAME_CHARS} characters"),
        ));
    }
    Ok(nickname.clone())
}

fn parse_rank(value: &Value) -> Result<String, ValidationError> {
    let Value::String(rank) = value else {
        return Err(ValidationError::invalid_type("rank", "must be a string"));
    };
    let rank = rank.trim();
    if rank.is_empty() || rank.chars().count() > MAX_RANK_CHARS {
        return Err(ValidationError::invalid_type(
            "rank",
            format!("must be 1 to {MAX_RANK_CHARS} characters"),
        ));
    }
    Ok(rank.to_string())
}

fn parse_stats(value: &Value) -> Result<Stats, ValidationError> {
    let Value::Object(entries) = value else {
        return Err(ValidationError::invalid_type("stats", "must be an object"));
    };

    let mut stats = Stats::default();
    for kind in StatKind::ALL {
        // Unrecognized keys are ignored.
        let Some(raw) = field(entries, kind.key()) else {
            continue;
        };
        match integral(raw) {
            Some(value) if (0..=MAX_STAT).contains(&value) => stats.0[kind.index()] = value as u8,
            _ => {
                return Err(ValidationError::out_of_range(
                    kind.key(),
                    format!("must be an integer from 0 to {MAX_STAT}"),
                ));
            }
        }
    }
    Ok(stats)
}

fn non_negative(value: &Value, name: &str) -> Result<u64, ValidationError> {
    match integral(value) {
        Some(n) if n >= 0 => Ok(n as u64),
        _ => Err(ValidationError::out_of_range(
            name,
            "must be a non-negative integer",
        )),
    }
}

/// Integer view of a JSON number. `12.0` counts, `12.5` does not.
fn integral(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let n = value.as_f64()?;
    if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationKind;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn fills_defaults() {
        let model = normalize(&json!({"nickname": "X", "stats": {}})).expect("valid");
        assert_eq!(model.nickname(), "X");
        assert_eq!(model.level(), 1);
        assert_eq!(model.rank(), "F");
        assert_eq!(model.experience(), 0);
        assert_eq!(model.rating_position(), None);
        assert_eq!(model.days_streak(), None);
        assert_eq!(model.photo_reference(), None);
        for (_, value) in model.stats().iter() {
            assert_eq!(value, 50);
        }
    }

    #[test]
    fn rejects_out_of_range_stat_by_name() {
        let err = normalize(&json!({"nickname": "X", "stats": {"strength": 150}})).unwrap_err();
        assert_eq!(err.kind, ValidationKind::OutOfRange);
        assert_eq!(err.field, "strength");
    }

    #[test]
    fn rejects_level_zero() {
        let err = normalize(&json!({"nickname": "X", "stats": {}, "level": 0})).unwrap_err();
        assert_eq!(err.kind, ValidationKind::OutOfRange);
        assert_eq!(err.field, "level");

        let err = normalize(&json!({"nickname": "X", "stats": {}, "level": 1001})).unwrap_err();
        assert_eq!(err.field, "level");
    }

    #[test]
    fn missing_required_fields() {
        let err = normalize(&json!({"stats": {}})).unwrap_err();
        assert_eq!((err.field.as_str(), err.kind), ("nickname", ValidationKind::MissingField));

        let err = normalize(&json!({"nickname": "X"})).unwrap_err();
        assert_eq!((err.field.as_str(), err.kind), ("stats", ValidationKind::MissingField));

        let err = normalize(&json!({"nickname": null, "stats": {}})).unwrap_err();
        assert_eq!(err.kind, ValidationKind::MissingField);
    }

    #[test]
    fn type_errors() {
        let err = normalize(&json!({"nickname": 7, "stats": {}})).unwrap_err();
        assert_eq!((err.field.as_str(), err.kind), ("nickname", ValidationKind::InvalidType));

        let long = "n".repeat(101);
        let err = normalize(&json!({"nickname": long, "stats": {}})).unwrap_err();
        assert_eq!(err.kind, ValidationKind::InvalidType);

        let err = normalize(&json!({"nickname": "X", "stats": [1, 2]})).unwrap_err();
        assert_eq!((err.field.as_str(), err.kind), ("stats", ValidationKind::InvalidType));

        let err = normalize(&json!([])).unwrap_err();
        assert_eq!(err.kind, ValidationKind::InvalidType);
    }

    #[test]
    fn nickname_limit_counts_characters_not_bytes() {
        let cyrillic = "Ж".repeat(100);
        let model = normalize(&json!({"nickname": cyrillic, "stats": {}})).expect("100 chars");
        assert_eq!(model.nickname().chars().count(), 100);
    }

    #[test]
    fn zero_is_a_value_not_absence() {
        let model = normalize(&json!({
            "nickname": "X",
            "experience": 0,
            "daysStreak": 0,
            "stats": {"charisma": 0}
        }))
        .expect("valid");
        assert_eq!(model.experience(), 0);
        assert_eq!(model.days_streak(), Some(0));
        assert_eq!(model.stats().get(StatKind::Charisma), 0);
        assert_eq!(model.stats().get(StatKind::Strength), 50);
    }

    #[test]
    fn ignores_unknown_stats_and_rejects_non_numeric_known_stats() {
        let model = normalize(&json!({"nickname": "X", "stats": {"luck": 999}})).expect("valid");
        assert_eq!(model.stats(), &Stats::default());

        let err = normalize(&json!({"nickname": "X", "stats": {"agility": "fast"}})).unwrap_err();
        assert_eq!((err.field.as_str(), err.kind), ("agility", ValidationKind::OutOfRange));

        let err = normalize(&json!({"nickname": "X", "stats": {"agility": 12.5}})).unwrap_err();
        assert_eq!(err.field, "agility");
    }

    #[test]
    fn experience_and_rating_position() {
        let err = normalize(&json!({"nickname": "X", "stats": {}, "experience": -1})).unwrap_err();
        assert_eq!((err.field.as_str(), err.kind), ("experience", ValidationKind::OutOfRange));

        let err =
            normalize(&json!({"nickname": "X", "stats": {}, "ratingPosition": 0})).unwrap_err();
        assert_eq!(err.field, "ratingPosition");

        let model = normalize(&json!({
            "nickname": "X",
            "stats": {},
            "ratingPosition": 42,
            "experience": 1200.0,
            "rank": " A ",
            "photoPath": "player_photos/x.png"
        }))
        .expect("valid");
        assert_eq!(model.rating_position(), Some(42));
        assert_eq!(model.experience(), 1200);
        assert_eq!(model.rank(), "A");
        assert_eq!(model.photo_reference(), Some("player_photos/x.png"));
    }

    #[test]
    fn blank_photo_path_is_absent() {
        let model =
            normalize(&json!({"nickname": "X", "stats": {}, "photoPath": "  "})).expect("valid");
        assert_eq!(model.photo_reference(), None);

        let err = normalize(&json!({"nickname": "X", "stats": {}, "photoPath": 5})).unwrap_err();
        assert_eq!(err.field, "photoPath");
    }

    proptest! {
        #[test]
        fn accepts_every_in_range_stat(value in 0u8..=100, slot in 0usize..5) {
            let kind = StatKind::ALL[slot];
            let mut stats = serde_json::Map::new();
            stats.insert(kind.key().to_string(), json!(value));
            let model = normalize(&json!({"nickname": "P", "stats": stats})).unwrap();
            prop_assert_eq!(model.stats().get(kind), value);
        }

        #[test]
        fn rejects_every_stat_above_range(value in 101i64..100_000) {
            let err = normalize(&json!({"nickname": "P", "stats": {"endurance": value}})).unwrap_err();
            prop_assert_eq!(err.field.as_str(), "endurance");
            prop_assert_eq!(err.kind, ValidationKind::OutOfRange);
        }
    }
}
