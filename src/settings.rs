//! The tool's own settings: which files to use and how to behave.
//!
//! Layers, lowest to highest priority:
//!
//! ```text
//! Compiled defaults     #[config(default = ...)]
//!        ↑ overridden by
//! Settings file         ./confguard.toml, or --settings <FILE>
//!        ↑ overridden by
//! Environment vars      CONFGUARD_<SETTING>
//!        ↑ overridden by
//! Command-line flags
//! ```
//!
//! Every layer is sparse. [`resolve_settings`] does no I/O so the whole
//! pipeline can be tested with synthetic inputs; [`load_settings`] gathers
//! the real file and process environment.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use confique::Config;
use confique::meta::{FieldKind, Meta};
use toml::{Table, Value};

use crate::error::ConfguardError;
use crate::merge::overlay;

/// Prefix of environment variables that set [`GuardSettings`] fields.
pub const ENV_PREFIX: &str = "CONFGUARD_";

/// Settings file picked up from the working directory when present.
pub const SETTINGS_FILE: &str = "confguard.toml";

type SettingsLayer = <GuardSettings as Config>::Layer;

#[derive(Config, Debug, Clone, PartialEq)]
pub struct GuardSettings {
    /// Template describing every configuration key and its rules.
    #[config(default = "utils/.config.template.toml")]
    pub template: PathBuf,

    /// Configuration file to validate and repair.
    #[config(default = "config.toml")]
    pub config: PathBuf,

    /// Also write secrets from the environment into the configuration file.
    #[config(default = false)]
    pub persist_secrets: bool,

    /// Fail instead of prompting when a value is missing or invalid.
    #[config(default = false)]
    pub non_interactive: bool,

    /// Print the banner before checking.
    #[config(default = true)]
    pub banner: bool,
}

/// Highest-priority layer, usually filled from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    entries: Vec<(String, Value)>,
}

impl SettingsOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an override. `None` values are ignored (useful for optional clap args).
    pub fn set<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.entries.push((key.to_string(), v.into()));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Later entries for the same key win.
    fn to_table(&self, valid: &HashSet<String>) -> Result<Table, ConfguardError> {
        let mut table = Table::new();
        for (key, value) in &self.entries {
            if !valid.contains(key) {
                return Err(ConfguardError::InvalidSetting {
                    key: key.clone(),
                    reason: "no such setting".into(),
                });
            }
            table.insert(key.clone(), value.clone());
        }
        Ok(table)
    }
}

/// All pre-loaded data needed to resolve settings. No I/O happens here.
#[derive(Debug, Clone, Default)]
pub struct SettingsInput {
    /// Settings file path and content, if one was found.
    pub file: Option<(PathBuf, String)>,
    /// Raw environment pairs; anything without [`ENV_PREFIX`] is ignored.
    pub env_vars: Vec<(String, String)>,
    pub overrides: SettingsOverrides,
}

/// Merge every layer and let confique fill in the defaults.
pub fn resolve_settings(input: SettingsInput) -> Result<GuardSettings, ConfguardError> {
    let valid = valid_keys(&GuardSettings::META);
    let mut merged = Table::new();

    if let Some((path, content)) = &input.file {
        reject_unknown_keys(content, path)?;
        let table: Table = toml::from_str(content).map_err(|e| ConfguardError::SettingsParse {
            path: path.clone(),
            source: e,
        })?;
        overlay(&mut merged, table);
    }

    overlay(&mut merged, env_to_table(input.env_vars, &valid));
    overlay(&mut merged, input.overrides.to_table(&valid)?);

    let layer: SettingsLayer = Value::Table(merged)
        .try_into()
        .map_err(|e: toml::de::Error| ConfguardError::InvalidSetting {
            key: "<merged>".into(),
            reason: e.to_string(),
        })?;

    let settings = GuardSettings::builder().preloaded(layer).load()?;
    tracing::debug!(?settings, "settings resolved");
    Ok(settings)
}

/// Read the settings file and process environment, then resolve.
///
/// An explicit `file` must exist. Without one, [`SETTINGS_FILE`] in the
/// working directory is used when present.
pub fn load_settings(
    file: Option<&Path>,
    overrides: SettingsOverrides,
) -> Result<GuardSettings, ConfguardError> {
    let file = match file {
        Some(path) => Some(read_settings_file(path)?),
        None => match read_settings_file(Path::new(SETTINGS_FILE)) {
            Ok(found) => Some(found),
            Err(ConfguardError::ConfigRead { source, .. }) if source.kind() == ErrorKind::NotFound => {
                None
            }
            Err(e) => return Err(e),
        },
    };

    resolve_settings(SettingsInput {
        file,
        env_vars: std::env::vars().collect(),
        overrides,
    })
}

fn read_settings_file(path: &Path) -> Result<(PathBuf, String), ConfguardError> {
    let content = fs::read_to_string(path).map_err(|e| ConfguardError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok((path.to_path_buf(), content))
}

/// `CONFGUARD_PERSIST_SECRETS=true` becomes `persist_secrets = true`.
///
/// Variables that do not name a setting are skipped, so unrelated ones such
/// as `CONFGUARD_LOG` pass through untouched.
fn env_to_table(vars: impl IntoIterator<Item = (String, String)>, valid: &HashSet<String>) -> Table {
    let mut table = Table::new();
    for (name, value) in vars {
        let Some(rest) = name.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let key = rest.to_lowercase();
        if !valid.contains(&key) {
            continue;
        }
        table.insert(key, parse_env_value(&value));
    }
    table
}

fn parse_env_value(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Boolean(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Boolean(false);
    }
    Value::String(s.to_string())
}

fn valid_keys(meta: &Meta) -> HashSet<String> {
    meta.fields
        .iter()
        .filter(|field| matches!(field.kind, FieldKind::Leaf { .. }))
        .map(|field| field.name.to_string())
        .collect()
}

fn reject_unknown_keys(content: &str, path: &Path) -> Result<(), ConfguardError> {
    let mut unknown: Vec<String> = Vec::new();
    let deserializer = toml::Deserializer::new(content);
    let _layer: SettingsLayer = serde_ignored::deserialize(deserializer, |ignored| {
        unknown.push(ignored.to_string());
    })
    .map_err(|e| ConfguardError::SettingsParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    match unknown.into_iter().next() {
        Some(key) => Err(ConfguardError::UnknownSetting {
            key,
            path: path.to_path_buf(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn file(content: &str) -> Option<(PathBuf, String)> {
        Some(("confguard.toml".into(), content.into()))
    }

    #[test]
    fn defaults_only() {
        let settings = resolve_settings(SettingsInput::default()).unwrap();
        assert_eq!(settings.template, PathBuf::from("utils/.config.template.toml"));
        assert_eq!(settings.config, PathBuf::from("config.toml"));
        assert!(!settings.persist_secrets);
        assert!(!settings.non_interactive);
        assert!(settings.banner);
    }

    #[test]
    fn file_overrides_default() {
        let settings = resolve_settings(SettingsInput {
            file: file("config = \"conf/app.toml\"\nbanner = false\n"),
            ..SettingsInput::default()
        })
        .unwrap();
        assert_eq!(settings.config, PathBuf::from("conf/app.toml"));
        assert!(!settings.banner);
        assert_eq!(settings.template, PathBuf::from("utils/.config.template.toml"));
    }

    #[test]
    fn env_overrides_file() {
        let settings = resolve_settings(SettingsInput {
            file: file("non_interactive = false\n"),
            env_vars: vars(&[("CONFGUARD_NON_INTERACTIVE", "TRUE")]),
            ..SettingsInput::default()
        })
        .unwrap();
        assert!(settings.non_interactive);
    }

    #[test]
    fn override_beats_env() {
        let settings = resolve_settings(SettingsInput {
            env_vars: vars(&[("CONFGUARD_CONFIG", "from-env.toml")]),
            overrides: SettingsOverrides::new().set("config", Some("from-cli.toml")),
            ..SettingsInput::default()
        })
        .unwrap();
        assert_eq!(settings.config, PathBuf::from("from-cli.toml"));
    }

    #[test]
    fn none_override_is_ignored() {
        let overrides = SettingsOverrides::new().set::<bool>("banner", None);
        assert!(overrides.is_empty());
    }

    #[test]
    fn unrelated_env_vars_are_ignored() {
        let settings = resolve_settings(SettingsInput {
            env_vars: vars(&[("CONFGUARD_LOG", "debug"), ("PATH", "/usr/bin")]),
            ..SettingsInput::default()
        })
        .unwrap();
        assert_eq!(settings, resolve_settings(SettingsInput::default()).unwrap());
    }

    #[test]
    fn unknown_file_key_is_rejected() {
        let err = resolve_settings(SettingsInput {
            file: file("templat = \"x.toml\"\n"),
            ..SettingsInput::default()
        })
        .unwrap_err();
        match err {
            ConfguardError::UnknownSetting { key, .. } => assert_eq!(key, "templat"),
            other => panic!("Expected UnknownSetting, got: {other:?}"),
        }
    }

    #[test]
    fn unknown_override_key_is_rejected() {
        let err = resolve_settings(SettingsInput {
            overrides: SettingsOverrides::new().set("colour", Some(true)),
            ..SettingsInput::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfguardError::InvalidSetting { ref key, .. } if key == "colour"));
    }

    #[test]
    fn malformed_settings_file_is_parse_error() {
        let err = resolve_settings(SettingsInput {
            file: file("banner = = true"),
            ..SettingsInput::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfguardError::SettingsParse { .. }));
    }

    #[test]
    fn wrong_type_is_rejected() {
        let err = resolve_settings(SettingsInput {
            file: file("banner = \"loud\"\n"),
            ..SettingsInput::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ConfguardError::SettingsParse { .. } | ConfguardError::InvalidSetting { .. }
        ));
    }

    #[test]
    fn explicit_missing_settings_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = load_settings(Some(&dir.path().join("nope.toml")), SettingsOverrides::new())
            .unwrap_err();
        assert!(matches!(err, ConfguardError::ConfigRead { .. }));
    }

    #[test]
    fn explicit_settings_file_is_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("guard.toml");
        fs::write(&path, "template = \"t.toml\"\n").unwrap();
        let settings = load_settings(
            Some(&path),
            SettingsOverrides::new().set("template", Some("cli.toml")),
        )
        .unwrap();
        // the flag still wins over the file
        assert_eq!(settings.template, PathBuf::from("cli.toml"));
    }
}
