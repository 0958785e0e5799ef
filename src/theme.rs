use anyhow::{Context, Result};
use strum::{Display, EnumString};

use crate::storage::{StorageHandle, THEME_KEY};

const DARK_SENTINEL: &str = "enabled";
const LIGHT_SENTINEL: &str = "disabled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DisplayMode {
    #[default]
    Light,
    Dark,
}

impl DisplayMode {
    pub fn from_sentinel(raw: &str) -> Self {
        if raw == DARK_SENTINEL {
            DisplayMode::Dark
        } else {
            DisplayMode::Light
        }
    }

    pub fn sentinel(self) -> &'static str {
        match self {
            DisplayMode::Dark => DARK_SENTINEL,
            DisplayMode::Light => LIGHT_SENTINEL,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Light => DisplayMode::Dark,
            DisplayMode::Dark => DisplayMode::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        self == DisplayMode::Dark
    }

    pub fn toggle_label(self) -> &'static str {
        match self {
            DisplayMode::Dark => "☀️ Light Mode",
            DisplayMode::Light => "🌙 Dark Mode",
        }
    }
}

pub fn load(storage: &StorageHandle) -> Result<DisplayMode> {
    let raw = storage
        .read_blob(THEME_KEY)
        .context("reading display mode preference")?;
    Ok(raw
        .as_deref()
        .map(DisplayMode::from_sentinel)
        .unwrap_or_default())
}

pub fn save(storage: &StorageHandle, mode: DisplayMode) -> Result<()> {
    storage
        .write_blob(THEME_KEY, mode.sentinel())
        .context("persisting display mode preference")
}

pub fn toggle(storage: &StorageHandle, current: DisplayMode) -> Result<DisplayMode> {
    let next = current.toggled();
    save(storage, next)?;
    tracing::debug!(mode = %next, "display mode toggled");
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn missing_or_unknown_preference_reads_light() -> anyhow::Result<()> {
        let storage = StorageHandle::in_memory();
        assert_eq!(load(&storage)?, DisplayMode::Light);
        storage.write_blob(THEME_KEY, "true")?;
        assert_eq!(load(&storage)?, DisplayMode::Light);
        Ok(())
    }

    #[test]
    fn toggle_persists_sentinels() -> anyhow::Result<()> {
        let storage = StorageHandle::in_memory();
        let mode = toggle(&storage, DisplayMode::Light)?;
        assert_eq!(mode, DisplayMode::Dark);
        assert_eq!(storage.read_blob(THEME_KEY)?.as_deref(), Some("enabled"));
        assert_eq!(load(&storage)?, DisplayMode::Dark);

        toggle(&storage, mode)?;
        assert_eq!(storage.read_blob(THEME_KEY)?.as_deref(), Some("disabled"));
        Ok(())
    }

    #[test]
    fn label_names_the_other_mode() {
        assert_eq!(DisplayMode::Dark.toggle_label(), "☀️ Light Mode");
        assert_eq!(DisplayMode::Light.toggle_label(), "🌙 Dark Mode");
        assert_eq!(DisplayMode::from_str("DARK").ok(), Some(DisplayMode::Dark));
        assert_eq!(DisplayMode::Dark.to_string(), "dark");
    }
}
