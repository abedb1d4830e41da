// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::path::{Path, PathBuf};

use crate::error::Result;

use super::Settings;

impl Settings {
    /// Get the default settings file path.
    pub fn default_path() -> PathBuf {
        Self::sitepilot_home().join("settings.json")
    }

    /// Load settings from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load settings from a specific path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create the content mirror root and the database directory.
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.storage.mirror_root)?;
        if let Some(parent) = self
            .storage
            .database_path
            .as_deref()
            .and_then(Path::parent)
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Path of the conversation and preference database
    pub fn state_database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::sitepilot_home().join("state.db"))
    }

    /// Get the sitepilot home directory (~/.sitepilot or $SITEPILOT_HOME).
    pub fn sitepilot_home() -> PathBuf {
        if let Ok(home) = std::env::var("SITEPILOT_HOME") {
            return PathBuf::from(home);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".sitepilot")
    }
}
