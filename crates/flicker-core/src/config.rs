//! User configuration snapshot, partial patches, and lenient decoding.
//!
//! Stored settings arrive as loosely typed JSON. Decoding never fails: each
//! field is read on its own and a missing or malformed field keeps its
//! default, so one bad key cannot disable the whole effect.

use std::fmt;
use std::str::FromStr;

use fnv::FnvHashMap;
use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};
use smallvec::SmallVec;

use crate::error::{FlickerError, FlickerResult};

/// Light edge of the viewport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Top,
    Bottom,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Top,
        Direction::Bottom,
        Direction::Left,
        Direction::Right,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Top => "top",
            Direction::Bottom => "bottom",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// Single-letter code used in element tags and selectors.
    pub fn code(self) -> char {
        match self {
            Direction::Top => 't',
            Direction::Bottom => 'b',
            Direction::Left => 'l',
            Direction::Right => 'r',
        }
    }

    pub fn code_str(self) -> &'static str {
        match self {
            Direction::Top => "t",
            Direction::Bottom => "b",
            Direction::Left => "l",
            Direction::Right => "r",
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.code() == code)
    }

    /// Light along the top or bottom edge sways horizontally.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Top | Direction::Bottom)
    }

    /// Position in `ALL`.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = FlickerError;

    fn from_str(s: &str) -> FlickerResult<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| FlickerError::config(format!("unknown direction {s:?}")))
    }
}

/// Ordered set of active light edges. Insertion order is kept, duplicates
/// are dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Directions(SmallVec<[Direction; 4]>);

impl Directions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the direction was already present.
    pub fn insert(&mut self, dir: Direction) -> bool {
        if self.contains(dir) {
            return false;
        }
        self.0.push(dir);
        true
    }

    pub fn contains(&self, dir: Direction) -> bool {
        self.0.contains(&dir)
    }

    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        self.0.iter().copied()
    }

    pub fn first(&self) -> Option<Direction> {
        self.0.first().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Direction> for Directions {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut dirs = Self::new();
        for d in iter {
            dirs.insert(d);
        }
        dirs
    }
}

impl<const N: usize> From<[Direction; N]> for Directions {
    fn from(dirs: [Direction; N]) -> Self {
        dirs.into_iter().collect()
    }
}

impl Serialize for Directions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

pub type SiteOverrides = FnvHashMap<String, bool>;

/// Complete configuration snapshot. A tick always sees one whole snapshot.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub enabled: bool,
    pub shadows: bool,
    pub site_overrides: SiteOverrides,
    pub directions: Directions,
    /// Reach of each light edge, percent of the viewport.
    pub distance: u8,
    /// Animation speed; 30 is real time.
    pub speed: u8,
    pub warmth: u8,
    pub intensity: u8,
    pub shadow_intensity: u8,
    pub ambient_flicker: bool,
    pub ambient_intensity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            shadows: true,
            site_overrides: SiteOverrides::default(),
            directions: Directions::from([Direction::Top]),
            distance: 60,
            speed: 30,
            warmth: 50,
            intensity: 25,
            shadow_intensity: 50,
            ambient_flicker: true,
            ambient_intensity: 30,
        }
    }
}

impl Config {
    /// Decode a stored settings object over the default table.
    pub fn from_value(value: &Value) -> Self {
        let mut cfg = Self::default();
        cfg.merge(&ConfigPatch::from_value(value));
        cfg
    }

    /// Effective on/off state for a page: a site override wins.
    pub fn is_active(&self, hostname: &str) -> bool {
        self.site_overrides
            .get(hostname)
            .copied()
            .unwrap_or(self.enabled)
    }

    pub fn merge(&mut self, patch: &ConfigPatch) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if let Some(v) = &patch.$field { self.$field = v.clone(); })*
            };
        }
        take!(
            enabled,
            shadows,
            site_overrides,
            directions,
            distance,
            speed,
            warmth,
            intensity,
            shadow_intensity,
            ambient_flicker,
            ambient_intensity
        );
    }

    pub fn merged(&self, patch: &ConfigPatch) -> Self {
        let mut next = self.clone();
        next.merge(patch);
        next
    }

    /// Reach of the light ramp as a fraction (`distance / 100`).
    pub fn reach(&self) -> f64 {
        self.distance as f64 / 100.0
    }
}

/// Partial configuration; `None` fields leave the snapshot untouched.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadows: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_overrides: Option<SiteOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directions: Option<Directions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warmth: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_intensity: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ambient_flicker: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ambient_intensity: Option<u8>,
}

impl ConfigPatch {
    /// Lenient decode of a plain `{key: value}` object.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            log::warn!("[config] expected an object, got {value}");
            return Self::default();
        };
        Self {
            enabled: flag(obj, "enabled"),
            shadows: flag(obj, "shadows"),
            site_overrides: site_overrides(obj),
            directions: directions(obj),
            distance: percent(obj, "distance"),
            speed: percent(obj, "speed"),
            warmth: percent(obj, "warmth"),
            intensity: percent(obj, "intensity"),
            shadow_intensity: percent(obj, "shadowIntensity"),
            ambient_flicker: flag(obj, "ambientFlicker"),
            ambient_intensity: percent(obj, "ambientIntensity"),
        }
    }

    /// Decode a storage change record: `{key: {newValue, oldValue}}`.
    ///
    /// A key without `newValue` was removed from storage and reverts to its
    /// default.
    pub fn from_storage_changes(changes: &Value) -> Self {
        let Some(obj) = changes.as_object() else {
            return Self::default();
        };
        let defaults = serde_json::to_value(Config::default()).unwrap_or(Value::Null);
        let values: Map<String, Value> = obj
            .iter()
            .map(|(key, change)| {
                let next = change
                    .get("newValue")
                    .cloned()
                    .unwrap_or_else(|| defaults.get(key).cloned().unwrap_or(Value::Null));
                (key.clone(), next)
            })
            .collect();
        Self::from_value(&Value::Object(values))
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn flag(obj: &Map<String, Value>, key: &str) -> Option<bool> {
    let value = obj.get(key)?;
    let parsed = value.as_bool();
    if parsed.is_none() {
        log::warn!("[config] {key}: expected a boolean, got {value}; keeping default");
    }
    parsed
}

fn percent(obj: &Map<String, Value>, key: &str) -> Option<u8> {
    let value = obj.get(key)?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite());
    match parsed {
        Some(v) => Some(v.round().clamp(0.0, 100.0) as u8),
        None => {
            log::warn!("[config] {key}: expected a number, got {value}; keeping default");
            None
        }
    }
}

fn directions(obj: &Map<String, Value>) -> Option<Directions> {
    let value = obj.get("directions")?;
    let Some(items) = value.as_array() else {
        log::warn!("[config] directions: expected a list, got {value}; keeping default");
        return None;
    };
    Some(
        items
            .iter()
            .filter_map(|item| {
                let name = item.as_str()?;
                name.parse::<Direction>()
                    .map_err(|e| log::warn!("[config] {e}; dropped"))
                    .ok()
            })
            .collect(),
    )
}

fn site_overrides(obj: &Map<String, Value>) -> Option<SiteOverrides> {
    let value = obj.get("siteOverrides")?;
    let Some(map) = value.as_object() else {
        log::warn!("[config] siteOverrides: expected an object, got {value}; keeping default");
        return None;
    };
    Some(
        map.iter()
            .filter_map(|(host, on)| Some((host.clone(), on.as_bool()?)))
            .collect(),
    )
}
