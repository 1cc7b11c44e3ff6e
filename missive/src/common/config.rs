/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// Configuration for Missive distributors.
///
/// Loaded from `$XDG_CONFIG_HOME/missive/config.toml` by [`MissiveConfig::load`].
/// Missing sections and fields take their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MissiveConfig {
    /// Background delivery pool settings
    pub background: BackgroundConfig,
    /// Behavioral switches
    pub behavior: BehaviorConfig,
    /// Default values
    pub defaults: DefaultsConfig,
}

/// Settings for the runtime built when a distributor is created outside Tokio.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    /// Worker threads of the distributor-owned runtime
    pub worker_threads: usize,
    /// Name given to the distributor-owned runtime's threads
    pub thread_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Emit an `error!` event for background failures no hook handled
    pub log_unhandled_background_failures: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Name reported for handlers whose `name()` is blank
    pub handler_name: String,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            worker_threads: 2,
            thread_name: "missive-background".to_string(),
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            log_unhandled_background_failures: true,
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            handler_name: "handler".to_string(),
        }
    }
}

impl MissiveConfig {
    /// Load configuration from XDG-compliant locations.
    ///
    /// Looks for `missive/config.toml` under `$XDG_CONFIG_HOME` (falling back
    /// to `~/.config`). A missing file yields the defaults; an unreadable or
    /// malformed file is logged and also yields the defaults.
    pub fn load() -> Self {
        use tracing::{error, info};

        let xdg_dirs = match xdg::BaseDirectories::with_prefix("missive") {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                return Self::default();
            }
        };

        let Some(path) = xdg_dirs.find_config_file("config.toml") else {
            info!("No configuration file found, using defaults");
            return Self::default();
        };

        info!("Loading configuration from: {}", path.display());
        match std::fs::read_to_string(&path) {
            Ok(config_str) => Self::parse(&config_str).unwrap_or_else(|e| {
                error!("Failed to parse configuration file {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                error!("Failed to read configuration file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parses a TOML document into a configuration.
    pub fn parse(config_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(config_str)
    }

    /// Worker thread count for a distributor-owned runtime, never zero.
    pub fn worker_threads(&self) -> usize {
        self.background.worker_threads.max(1)
    }
}

lazy_static! {
    /// Global configuration loaded from XDG-compliant locations on first use
    pub static ref CONFIG: MissiveConfig = MissiveConfig::load();
}
