// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use config::{Environment, File};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::folders::{SystemFolder, SystemFolderPolicy};

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_INBOX_PATH: &str = "INBOX";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Seconds between count snapshot polls.
    pub poll_interval_secs: u64,
    /// Upper bound for any single gateway request.
    pub request_timeout_secs: u64,
    /// Distinguished inbox path for accounts that do not declare one.
    pub inbox_path: String,
    #[serde(default)]
    pub expansion_state_path: Option<PathBuf>,
    /// Overrides the built-in system folder priority list.
    #[serde(default)]
    pub system_folders: Option<Vec<SystemFolder>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    pub id: String,
    #[serde(default)]
    pub inbox_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub log: LogConfig,
    pub panel: PanelConfig,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

impl Settings {
    pub fn new(config_path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut config_builder = config::Config::builder()
            .set_default("log.level", "info")?
            .set_default("panel.poll_interval_secs", DEFAULT_POLL_INTERVAL_SECS)?
            .set_default("panel.request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS)?
            .set_default("panel.inbox_path", DEFAULT_INBOX_PATH)?;

        if let Some(path) = config_path {
            config_builder = config_builder.add_source(File::with_name(path));
        }

        // e.g. `MAILPANEL_PANEL__POLL_INTERVAL_SECS=30` overrides `panel.poll_interval_secs`
        config_builder = config_builder.add_source(
            Environment::with_prefix("MAILPANEL")
                .prefix_separator("_")
                .separator("__")
                .ignore_empty(true),
        );

        // Short-hand variables for the most common settings
        let env_vars = [
            ("MAILPANEL_LOG_LEVEL", "log.level"),
            ("MAILPANEL_POLL_INTERVAL", "panel.poll_interval_secs"),
            ("MAILPANEL_INBOX_PATH", "panel.inbox_path"),
            ("MAILPANEL_STATE_PATH", "panel.expansion_state_path"),
        ];

        for (env_var, config_path) in &env_vars {
            if let Ok(value) = env::var(env_var) {
                if *env_var == "MAILPANEL_POLL_INTERVAL" {
                    if let Ok(secs) = value.parse::<u64>() {
                        config_builder = config_builder.set_override(config_path, secs)?;
                    } else {
                        warn!("Invalid interval value in {}: {}", env_var, value);
                    }
                } else {
                    config_builder = config_builder.set_override(config_path, value)?;
                }
            }
        }

        config_builder.build()?.try_deserialize()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.panel.poll_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.panel.request_timeout_secs.max(1))
    }

    /// Configured path, or `<data dir>/mailpanel/expanded_folders.json`.
    pub fn expansion_state_path(&self) -> PathBuf {
        self.panel.expansion_state_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("mailpanel")
                .join("expanded_folders.json")
        })
    }

    pub fn system_folder_policy(&self) -> SystemFolderPolicy {
        match &self.panel.system_folders {
            Some(folders) if !folders.is_empty() => SystemFolderPolicy::new(folders),
            _ => SystemFolderPolicy::default(),
        }
    }

    pub fn inbox_path_for(&self, account_id: &str) -> String {
        self.accounts
            .iter()
            .find(|a| a.id == account_id)
            .and_then(|a| a.inbox_path.clone())
            .unwrap_or_else(|| self.panel.inbox_path.clone())
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig { level: "info".to_string() }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            inbox_path: DEFAULT_INBOX_PATH.to_string(),
            expansion_state_path: None,
            system_folders: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            panel: PanelConfig::default(),
            accounts: Vec::new(),
        }
    }
}
