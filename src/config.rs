use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

/// Location of the user overlay, relative to the home directory.
const USER_CONFIG: &str = "~/.config/microsh/config.toml";

// ── Final (merged) config types ──

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub inspiration: Inspiration,
    #[serde(default)]
    pub builtins: Builtins,
    #[serde(default)]
    pub logging: Logging,
}

/// Line-level behaviour of the read loop and dispatcher.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Settings {
    /// Printed before each interactive read.
    #[serde(default)]
    pub prompt: String,
    /// A line equal to this (ignoring ASCII case) ends the session.
    #[serde(default)]
    pub exit_keyword: String,
    /// Script lines starting with this are skipped.
    #[serde(default)]
    pub comment_prefix: String,
    /// A trailing token equal to this runs the command in the background.
    #[serde(default)]
    pub background_marker: String,
    /// Collect finished background children before each line.
    #[serde(default)]
    pub reap_background: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Inspiration {
    #[serde(default)]
    pub keyword: String,
    /// Environment variable holding the phrase to print.
    #[serde(default)]
    pub env_var: String,
    /// Printed when `env_var` is unset.
    #[serde(default)]
    pub fallback: String,
}

/// Names handled inside the shell instead of being spawned.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Builtins {
    /// Names of the directory-change built-in.
    #[serde(default)]
    pub change_dir: Vec<String>,
    /// Record-store verbs that are recognized.
    #[serde(default)]
    pub record_verbs: Vec<String>,
    /// Operand prefix addressing the record store.
    #[serde(default)]
    pub record_prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Logging {
    /// Log file; `~` is expanded. Empty disables file logging.
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub level: String,
}

impl Logging {
    /// The log file with `~` and `$VAR` references expanded.
    pub fn file_path(&self) -> Option<PathBuf> {
        if self.file.is_empty() {
            return None;
        }
        let expanded = shellexpand::full(&self.file)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| shellexpand::tilde(&self.file).into_owned());
        Some(PathBuf::from(expanded))
    }
}

// ── Overlay types (user config, all fields optional) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    inspiration: InspirationOverlay,
    #[serde(default)]
    builtins: BuiltinsOverlay,
    #[serde(default)]
    logging: LoggingOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    prompt: Option<String>,
    exit_keyword: Option<String>,
    comment_prefix: Option<String>,
    background_marker: Option<String>,
    reap_background: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct InspirationOverlay {
    keyword: Option<String>,
    env_var: Option<String>,
    fallback: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct BuiltinsOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    change_dir: Vec<String>,
    #[serde(default)]
    record_verbs: Vec<String>,
    record_prefix: Option<String>,
    #[serde(default)]
    remove_change_dir: Vec<String>,
    #[serde(default)]
    remove_record_verbs: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct LoggingOverlay {
    file: Option<String>,
    level: Option<String>,
}

/// Why a user overlay could not be applied.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ── Merge logic ──

/// Merge a user list into a default list.
/// In replace mode: user list replaces default entirely.
/// In merge mode: remove items first, then extend with additions (deduped).
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        base.retain(|item| !remove.contains(item));
        for item in add {
            if !base.contains(&item) {
                base.push(item);
            }
        }
    }
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// The user overlay path, `~/.config/microsh/config.toml`.
    pub fn user_config_path() -> PathBuf {
        PathBuf::from(shellexpand::tilde(USER_CONFIG).into_owned())
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge the overlay at `path`, or the user overlay if it exists
    ///
    /// User config merges with defaults: lists extend, scalars override.
    /// Set `replace = true` in `[builtins]` to replace its default lists.
    /// Use `remove_<field>` lists to subtract specific items from defaults.
    ///
    /// An explicitly named file must exist; a missing user overlay is fine.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default_config();
        let overlay = match path {
            Some(path) => Some(Self::read_overlay(path)?),
            None => {
                let path = Self::user_config_path();
                if path.is_file() {
                    Some(Self::read_overlay(&path)?)
                } else {
                    None
                }
            }
        };
        if let Some(overlay) = overlay {
            config.apply_overlay(overlay);
        }
        Ok(config)
    }

    fn read_overlay(path: &Path) -> Result<ConfigOverlay, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        // Settings: scalar overrides
        let s = overlay.settings;
        override_with(&mut self.settings.prompt, s.prompt);
        override_with(&mut self.settings.exit_keyword, s.exit_keyword);
        override_with(&mut self.settings.comment_prefix, s.comment_prefix);
        override_with(&mut self.settings.background_marker, s.background_marker);
        override_with(&mut self.settings.reap_background, s.reap_background);

        let i = overlay.inspiration;
        override_with(&mut self.inspiration.keyword, i.keyword);
        override_with(&mut self.inspiration.env_var, i.env_var);
        override_with(&mut self.inspiration.fallback, i.fallback);

        // Builtins
        let b = overlay.builtins;
        merge_list(
            &mut self.builtins.change_dir,
            b.change_dir,
            &b.remove_change_dir,
            b.replace,
        );
        merge_list(
            &mut self.builtins.record_verbs,
            b.record_verbs,
            &b.remove_record_verbs,
            b.replace,
        );
        override_with(&mut self.builtins.record_prefix, b.record_prefix);

        let l = overlay.logging;
        override_with(&mut self.logging.file, l.file);
        override_with(&mut self.logging.level, l.level);
    }

    /// The merged configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}
