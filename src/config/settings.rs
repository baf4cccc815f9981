//! The `settings` domain
//!
//! Five independent sub-trees: general options, shortcut bindings, live meter
//! columns, past-encounter columns and buff display. Each sub-tree is restored
//! on its own, so a damaged section only costs that section.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::shortcut_binding::Shortcuts;
use crate::common::constants::defaults;
use crate::store::StoreValue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneralSettings {
    pub show_names: bool,
    pub show_gear_score: bool,
    pub show_esther: bool,
    pub positional_dmg_percent: bool,
    pub hide_logo: bool,
    /// Theme class name, e.g. `theme-pink`
    pub accent_color: String,
    pub raw_socket: bool,
    pub auto_iface: bool,
    /// Interface description, used when `auto_iface` is off
    pub if_desc: String,
    pub ip: String,
    pub port: u16,
    pub blur: bool,
    pub transparent: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            show_names: true,
            show_gear_score: false,
            show_esther: true,
            positional_dmg_percent: false,
            hide_logo: false,
            accent_color: defaults::general::ACCENT_COLOR.to_string(),
            raw_socket: false,
            auto_iface: true,
            if_desc: String::new(),
            ip: String::new(),
            port: defaults::general::PORT,
            blur: true,
            transparent: true,
        }
    }
}

/// Per-skill breakdown columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BreakdownSettings {
    pub damage: bool,
    pub dps: bool,
    pub damage_percent: bool,
    pub crit_rate: bool,
    pub front_atk: bool,
    pub back_atk: bool,
    pub avg_damage: bool,
    pub max_damage: bool,
    pub casts: bool,
    pub cpm: bool,
    pub hits: bool,
    pub hpm: bool,
    pub positional_dmg_percent: bool,
    pub percent_buff_by_sup: bool,
    pub percent_brand: bool,
}

impl Default for BreakdownSettings {
    fn default() -> Self {
        Self {
            damage: true,
            dps: true,
            damage_percent: true,
            crit_rate: true,
            front_atk: true,
            back_atk: true,
            avg_damage: false,
            max_damage: false,
            casts: true,
            cpm: true,
            hits: false,
            hpm: false,
            positional_dmg_percent: false,
            percent_buff_by_sup: false,
            percent_brand: false,
        }
    }
}

/// Columns of the live meter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeterSettings {
    pub boss_hp: bool,
    pub boss_hp_bar: bool,
    pub split_boss_hp_bar: bool,
    pub abbreviate_header: bool,
    pub show_class_colors: bool,
    pub damage: bool,
    pub dps: bool,
    pub damage_percent: bool,
    pub death_time: bool,
    pub crit_rate: bool,
    pub front_atk: bool,
    pub back_atk: bool,
    pub counters: bool,
    pub positional_dmg_percent: bool,
    pub percent_buff_by_sup: bool,
    pub percent_brand: bool,
    pub breakdown: BreakdownSettings,
}

impl Default for MeterSettings {
    fn default() -> Self {
        Self {
            boss_hp: true,
            boss_hp_bar: true,
            split_boss_hp_bar: false,
            abbreviate_header: true,
            show_class_colors: true,
            damage: false,
            dps: true,
            damage_percent: true,
            death_time: false,
            crit_rate: true,
            front_atk: true,
            back_atk: true,
            counters: false,
            positional_dmg_percent: false,
            percent_buff_by_sup: false,
            percent_brand: false,
            breakdown: BreakdownSettings::default(),
        }
    }
}

/// Columns of the past encounter browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogsSettings {
    pub abbreviate_header: bool,
    pub damage: bool,
    pub dps: bool,
    pub damage_percent: bool,
    pub death_time: bool,
    pub crit_rate: bool,
    pub front_atk: bool,
    pub back_atk: bool,
    pub counters: bool,
    /// Encounters shorter than this many seconds are hidden
    pub min_encounter_duration: u32,
    pub positional_dmg_percent: bool,
    pub percent_buff_by_sup: bool,
    pub percent_brand: bool,
    pub breakdown: BreakdownSettings,
}

impl Default for LogsSettings {
    fn default() -> Self {
        Self {
            abbreviate_header: false,
            damage: true,
            dps: true,
            damage_percent: true,
            death_time: true,
            crit_rate: true,
            front_atk: true,
            back_atk: true,
            counters: false,
            min_encounter_duration: defaults::logs::MIN_ENCOUNTER_DURATION,
            positional_dmg_percent: false,
            percent_buff_by_sup: false,
            percent_brand: false,
            breakdown: BreakdownSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuffSettings {
    pub default: bool,
}

impl Default for BuffSettings {
    fn default() -> Self {
        Self { default: true }
    }
}

/// Top-level settings document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub shortcuts: Shortcuts,
    pub meter: MeterSettings,
    pub logs: LogsSettings,
    pub buffs: BuffSettings,
}

impl StoreValue for Settings {
    fn restore(document: Value, fallback: &Self) -> Self {
        let Value::Object(mut tree) = document else {
            warn!("Settings document is not an object, using fallback");
            return fallback.clone();
        };

        Self {
            general: restore_section(&mut tree, "general", &fallback.general),
            shortcuts: restore_section(&mut tree, "shortcuts", &fallback.shortcuts),
            meter: restore_section(&mut tree, "meter", &fallback.meter),
            logs: restore_section(&mut tree, "logs", &fallback.logs),
            buffs: restore_section(&mut tree, "buffs", &fallback.buffs),
        }
    }
}

/// Take one sub-tree out of `tree`, keeping `fallback` if it's missing or invalid.
/// Options missing inside a valid sub-tree take their defaults.
fn restore_section<T>(tree: &mut Map<String, Value>, name: &str, fallback: &T) -> T
where
    T: DeserializeOwned + Clone,
{
    match tree.remove(name) {
        Some(section) => serde_json::from_value(section).unwrap_or_else(|e| {
            warn!(section = name, error = %e, "Invalid settings section, keeping previous value");
            fallback.clone()
        }),
        None => {
            debug!(section = name, "Settings section missing, keeping previous value");
            fallback.clone()
        }
    }
}
