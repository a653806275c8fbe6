use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CountingSettings {
    /// A count further than this ratio from the expectation gets a warning.
    pub large_difference_ratio: f64,
    /// Discrepancies printed in the completion summary before truncating.
    pub discrepancy_preview_limit: usize,
    /// Items generated by the stub session source.
    pub stub_item_count: usize,
    pub employee_name: String,
}

impl Default for CountingSettings {
    fn default() -> Self {
        Self {
            large_difference_ratio: 0.2,
            discrepancy_preview_limit: 5,
            stub_item_count: 10,
            employee_name: "Unknown".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct UserSettings {
    #[serde(default)]
    counting: CountingSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn counting(&self) -> CountingSettings {
        match self.data.read() {
            Ok(guard) => guard.counting.clone(),
            Err(poisoned) => poisoned.into_inner().counting.clone(),
        }
    }

    pub fn update_counting(&self, settings: CountingSettings) -> Result<()> {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.counting = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir().join(format!("inventory-count-settings-{}.json", Uuid::new_v4()))
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let store = SettingsStore::new(scratch_path()).unwrap();
        assert_eq!(store.counting(), CountingSettings::default());
    }

    #[test]
    fn updates_are_persisted_and_reloaded() {
        let path = scratch_path();
        let store = SettingsStore::new(path.clone()).unwrap();
        let settings = CountingSettings {
            large_difference_ratio: 0.1,
            employee_name: "Dana".into(),
            ..CountingSettings::default()
        };
        store.update_counting(settings.clone()).unwrap();

        let reloaded = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(reloaded.counting(), settings);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let path = scratch_path();
        fs::write(&path, r#"{"counting":{"stub_item_count":3}}"#).unwrap();

        let store = SettingsStore::new(path.clone()).unwrap();
        let settings = store.counting();
        assert_eq!(settings.stub_item_count, 3);
        assert_eq!(settings.large_difference_ratio, 0.2);
        let _ = fs::remove_file(path);
    }
}
