//! The `skillIcon` and `classIconCache` domains

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use crate::store::StoreValue;

/// Resolved icon reference per skill or class id
pub type IconCache = BTreeMap<String, String>;

impl StoreValue for IconCache {
    /// Entries that aren't strings are dropped; the rest of the cache survives
    fn restore(document: Value, fallback: &Self) -> Self {
        let Value::Object(entries) = document else {
            warn!("Icon cache document is not an object, using fallback");
            return fallback.clone();
        };

        entries
            .into_iter()
            .filter_map(|(id, icon)| match icon {
                Value::String(icon) => Some((id, icon)),
                _ => {
                    warn!(id = %id, "Dropping invalid icon cache entry");
                    None
                }
            })
            .collect()
    }
}
