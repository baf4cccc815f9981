//! Process-wide settings context
//!
//! Built once at startup and handed to whatever needs configuration; there is
//! exactly one store per domain key in a process.

use std::sync::Arc;

use crate::common::constants::storage;
use crate::config::{ClassColors, IconCache, Settings};
use crate::daemon::SettingsSink;
use crate::store::{DurableBackend, KeyedStore};

#[derive(Clone)]
pub struct SettingsContext {
    pub settings: KeyedStore<Settings>,
    pub colors: KeyedStore<ClassColors>,
    pub skill_icon: KeyedStore<IconCache>,
    pub class_icon_cache: KeyedStore<IconCache>,
}

impl SettingsContext {
    pub fn new(backend: Arc<dyn DurableBackend>, sink: Arc<dyn SettingsSink>) -> Self {
        Self {
            settings: KeyedStore::new(
                storage::SETTINGS_KEY,
                Settings::default(),
                Arc::clone(&backend),
                Arc::clone(&sink),
            ),
            colors: KeyedStore::new(
                storage::CLASS_COLORS_KEY,
                ClassColors::palette(),
                Arc::clone(&backend),
                Arc::clone(&sink),
            ),
            skill_icon: KeyedStore::new(
                storage::SKILL_ICON_KEY,
                IconCache::new(),
                Arc::clone(&backend),
                Arc::clone(&sink),
            ),
            class_icon_cache: KeyedStore::new(
                storage::CLASS_ICON_CACHE_KEY,
                IconCache::new(),
                backend,
                sink,
            ),
        }
    }
}
