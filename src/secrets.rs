//! Secret overlay: credentials supplied through environment variables take
//! precedence over whatever the configuration file holds.
//!
//! Overlay values bypass the checker entirely. They are written as strings,
//! creating missing sections on the way, and replace validated values.

use toml::{Table, Value};

use crate::merge::overlay;

/// One environment variable and the configuration key it feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretBinding {
    pub var: &'static str,
    pub path: &'static [&'static str],
}

impl SecretBinding {
    pub const fn new(var: &'static str, path: &'static [&'static str]) -> Self {
        Self { var, path }
    }

    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }
}

/// Credentials and API keys read from the environment by default.
pub const DEFAULT_SECRETS: &[SecretBinding] = &[
    SecretBinding::new("REDDIT_CLIENT_ID", &["reddit", "creds", "client_id"]),
    SecretBinding::new("REDDIT_CLIENT_SECRET", &["reddit", "creds", "client_secret"]),
    SecretBinding::new("REDDIT_USERNAME", &["reddit", "creds", "username"]),
    SecretBinding::new("REDDIT_PASSWORD", &["reddit", "creds", "password"]),
    SecretBinding::new("TIKTOK_SESSIONID", &["settings", "tts", "tiktok_sessionid"]),
    SecretBinding::new("ELEVENLABS_API_KEY", &["settings", "tts", "elevenlabs_api_key"]),
];

/// Build a sparse table holding every bound variable present in `vars`.
///
/// Unset and empty variables are skipped. Takes an iterator so tests can pass
/// synthetic data instead of `std::env::vars()`.
pub fn secrets_to_table(
    bindings: &[SecretBinding],
    vars: impl IntoIterator<Item = (String, String)>,
) -> Table {
    let vars: Vec<(String, String)> = vars.into_iter().collect();
    let mut table = Table::new();

    for binding in bindings {
        let Some((_, value)) = vars.iter().rev().find(|(name, _)| name == binding.var) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        tracing::debug!(var = binding.var, key = %binding.dotted_path(), "secret found in environment");
        insert_nested(&mut table, binding.path, Value::String(value.clone()));
    }

    table
}

fn insert_nested(table: &mut Table, segments: &[&str], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };

    if rest.is_empty() {
        table.insert(first.to_string(), value);
        return;
    }

    let sub = table
        .entry(*first)
        .or_insert_with(|| Value::Table(Table::new()));
    if let Value::Table(sub_table) = sub {
        insert_nested(sub_table, rest, value);
    }
}

/// Write every present secret into `config`. Returns the dotted keys that were
/// overwritten or created.
pub fn apply_secrets(
    config: &mut Table,
    bindings: &[SecretBinding],
    vars: impl IntoIterator<Item = (String, String)>,
) -> Vec<String> {
    let secrets = secrets_to_table(bindings, vars);
    overlay(config, secrets)
}
