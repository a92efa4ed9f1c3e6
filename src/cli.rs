//! Clap adapter for the `confguard` binary.
//!
//! Compiled only with the `clap` Cargo feature (on by default). The only
//! bridge to the core is [`GuardArgs::into_overrides()`], which turns the
//! flags that were actually passed into the highest-priority settings layer.
//! Flags left out fall through to `CONFGUARD_*` variables, the settings file,
//! and the compiled defaults.

use std::path::PathBuf;

use clap::Parser;

use crate::settings::SettingsOverrides;

/// Validate a TOML configuration against its template, prompting for
/// anything missing or invalid.
#[derive(Debug, Parser)]
#[command(name = "confguard", version)]
pub struct GuardArgs {
    /// Template describing the expected keys.
    #[arg(long, value_name = "FILE")]
    pub template: Option<PathBuf>,

    /// Configuration file to check and repair.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Settings file for confguard itself (default: ./confguard.toml if present).
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Write secrets from the environment into the configuration file.
    #[arg(long)]
    pub persist_secrets: bool,

    /// Fail instead of prompting (for CI).
    #[arg(long)]
    pub non_interactive: bool,

    /// Do not print the banner.
    #[arg(long)]
    pub no_banner: bool,
}

impl GuardArgs {
    /// Boolean flags only override when present, so an absent flag never
    /// masks a `true` from a lower layer.
    pub fn into_overrides(self) -> SettingsOverrides {
        SettingsOverrides::new()
            .set("template", self.template.map(|p| p.display().to_string()))
            .set("config", self.config.map(|p| p.display().to_string()))
            .set("persist_secrets", self.persist_secrets.then_some(true))
            .set("non_interactive", self.non_interactive.then_some(true))
            .set("banner", self.no_banner.then_some(false))
    }
}
