//! Configuration domains
//!
//! Each domain is one JSON document in the durable store: the general
//! settings, the class color palette and two icon caches.

pub mod class_colors;
pub mod icon_cache;
pub mod settings;
pub mod shortcut_binding;

pub use class_colors::ClassColors;
pub use icon_cache::IconCache;
pub use settings::{GeneralSettings, Settings};
pub use shortcut_binding::{ActionId, ShortcutBinding, Shortcuts};
