//! Template-driven validation and interactive repair of TOML configuration
//! files.
//!
//! A template mirrors the configuration's layout. Every leaf table in it is a
//! rule set for the key at the same path:
//!
//! ```toml
//! [settings]
//! times_to_run = { optional = true, type = "int", nmin = 1, nmax = 10, default = 1 }
//!
//! [settings.tts]
//! voice_choice = { default = "tiktok", options = ["tiktok", "googletranslate"] }
//! ```
//!
//! A run walks the template, checks the configured value for each key, and
//! asks a [`Prompter`] for a replacement whenever the value is missing or
//! rejected. The repaired document is written back with comments intact, then
//! secrets from the environment are overlaid on top.
//!
//! ```ignore
//! let report = Guard::builder()
//!     .template_path("utils/.config.template.toml")
//!     .config_path("config.toml")
//!     .run(&mut ConsolePrompter::new())?;
//! ```
//!
//! # Rule attributes
//!
//! | Attribute     | Meaning |
//! |---------------|---------|
//! | `type`        | `int`, `float`, `bool` or `str`; the value is converted first |
//! | `options`     | the value must equal one of these |
//! | `regex`       | a string value must match from its start |
//! | `nmin`/`nmax` | inclusive bounds on numbers, or on length for strings and arrays |
//! | `optional`    | shown in the prompt; an empty answer takes `default` |
//! | `default`     | answer used for empty input |
//! | `example`, `explanation`, `input_error`, `oob_error` | prompt texts |
//!
//! A key that is missing from the configuration is always prompted for, even
//! when it is optional and has a default.
//!
//! # Non-interactive use
//!
//! [`RefusingPrompter`] turns every prompt into an error, so CI runs fail with
//! the offending key instead of waiting on stdin.
//!
//! # Secrets
//!
//! [`DEFAULT_SECRETS`] maps variables such as `REDDIT_CLIENT_ID` to keys. Their
//! values replace the validated ones without being checked and, unless
//! [`persist_secrets`](GuardBuilder::persist_secrets) is set, are never written
//! to disk.

pub mod error;

mod check;
#[cfg(feature = "clap")]
mod cli;
mod coerce;
mod crawl;
mod document;
mod guard;
pub(crate) mod merge;
mod prompt;
mod secrets;
mod settings;
mod template;
mod validate;

#[cfg(test)]
mod fixtures;

pub use check::{Rejection, Verdict, check, evaluate};
#[cfg(feature = "clap")]
pub use cli::GuardArgs;
pub use coerce::Coercion;
pub use crawl::{KeyPath, crawl, crawl_table, dotted, value_at};
pub use document::{LoadStatus, LoadedConfig, load_config, load_template, patch_document, persist_config};
pub use error::ConfguardError;
pub use guard::{Guard, GuardBuilder, RunReport};
pub use prompt::{ConsolePrompter, PromptRequest, Prompter, RefusingPrompter};
pub use secrets::{DEFAULT_SECRETS, SecretBinding, apply_secrets, secrets_to_table};
pub use settings::{
    ENV_PREFIX, GuardSettings, SETTINGS_FILE, SettingsInput, SettingsOverrides, load_settings,
    resolve_settings,
};
pub use template::{Pattern, RuleSet, Template, TemplateNode};
pub use validate::{ValidationSummary, validate_path, validate_tree};
