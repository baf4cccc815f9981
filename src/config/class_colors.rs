//! The `classColors` domain: per-class bar colors

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::common::color::HexColor;
use crate::store::StoreValue;

/// Built-in palette, one entry per playable class
const PALETTE: &[(&str, &str)] = &[
    ("Unknown", "#7f7f7f"),
    ("Warrior (Male)", "#7f7f7f"),
    ("Berserker", "#ee2e48"),
    ("Destroyer", "#7b9aa2"),
    ("Gunlancer", "#e1907e"),
    ("Paladin", "#ff9900"),
    ("Slayer", "#db6a42"),
    ("Arcanist", "#b38915"),
    ("Summoner", "#22aa99"),
    ("Bard", "#674598"),
    ("Sorceress", "#66cc00"),
    ("Wardancer", "#aaaa11"),
    ("Scrapper", "#990099"),
    ("Soulfist", "#316395"),
    ("Glaivier", "#f6da6a"),
    ("Striker", "#994499"),
    ("Breaker", "#4a8ce8"),
    ("Deathblade", "#a91a16"),
    ("Shadowhunter", "#0099c6"),
    ("Reaper", "#685e52"),
    ("Souleater", "#c16ed0"),
    ("Sharpshooter", "#dd4477"),
    ("Deadeye", "#4442a8"),
    ("Artillerist", "#33670b"),
    ("Machinist", "#3cb371"),
    ("Gunslinger", "#6699cc"),
    ("Artist", "#a85f82"),
    ("Aeromancer", "#084da0"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassColor {
    pub color: String,
}

impl ClassColor {
    pub fn new(color: HexColor) -> Self {
        Self {
            color: color.to_css(),
        }
    }

    pub fn parsed(&self) -> Option<HexColor> {
        HexColor::parse(&self.color)
    }
}

/// Class name to color, persisted as `{"Bard": {"color": "#674598"}, ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassColors(pub BTreeMap<String, ClassColor>);

impl ClassColors {
    pub fn palette() -> Self {
        Self(
            PALETTE
                .iter()
                .map(|(class, color)| {
                    (
                        class.to_string(),
                        ClassColor {
                            color: color.to_string(),
                        },
                    )
                })
                .collect(),
        )
    }

    pub fn get(&self, class: &str) -> Option<HexColor> {
        self.0.get(class).and_then(ClassColor::parsed)
    }

    pub fn set(&mut self, class: impl Into<String>, color: HexColor) {
        self.0.insert(class.into(), ClassColor::new(color));
    }
}

impl Default for ClassColors {
    fn default() -> Self {
        Self::palette()
    }
}

impl StoreValue for ClassColors {
    /// Entries are repaired one by one. The document decides which classes
    /// exist; `fallback` only supplies a color for an entry that is invalid,
    /// and invalid entries it doesn't know are dropped.
    fn restore(document: Value, fallback: &Self) -> Self {
        let Value::Object(entries) = document else {
            warn!("Class colors document is not an object, using fallback");
            return fallback.clone();
        };

        let mut colors = BTreeMap::new();
        for (class, entry) in entries {
            let valid = serde_json::from_value::<ClassColor>(entry)
                .ok()
                .filter(|entry| entry.parsed().is_some());

            match (valid, fallback.0.get(&class)) {
                (Some(entry), _) => {
                    colors.insert(class, entry);
                }
                (None, Some(previous)) => {
                    warn!(class = %class, "Invalid class color, keeping previous value");
                    colors.insert(class, previous.clone());
                }
                (None, None) => {
                    warn!(class = %class, "Invalid color for unknown class, dropping it");
                }
            }
        }

        Self(colors)
    }
}
