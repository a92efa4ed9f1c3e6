use std::fmt;
use std::path::{Path, PathBuf};

use colored::Colorize;
use toml::Table;

use crate::document::{self, LoadStatus};
use crate::error::ConfguardError;
use crate::prompt::Prompter;
use crate::secrets::{DEFAULT_SECRETS, SecretBinding, apply_secrets};
use crate::settings::GuardSettings;
use crate::validate::validate_tree;

const DEFAULT_TEMPLATE: &str = "utils/.config.template.toml";
const DEFAULT_CONFIG: &str = "config.toml";
const DEFAULT_DOTENV: &str = ".env";

/// Entry point for a guarded configuration run.
pub struct Guard;

impl Guard {
    pub fn builder() -> GuardBuilder {
        GuardBuilder::new()
    }

    /// Builder preset from resolved [`GuardSettings`].
    pub fn from_settings(settings: &GuardSettings) -> GuardBuilder {
        GuardBuilder::new()
            .template_path(&settings.template)
            .config_path(&settings.config)
            .persist_secrets(settings.persist_secrets)
            .banner(settings.banner)
    }
}

/// Builder for one validate-and-repair pass over a configuration file.
///
/// A run loads the template, loads (or creates) the configuration, checks
/// every template key, persists the repaired document and finally overlays
/// secrets from the environment.
pub struct GuardBuilder {
    template_path: PathBuf,
    config_path: PathBuf,
    secrets: Vec<SecretBinding>,
    persist_secrets: bool,
    env_vars: Option<Vec<(String, String)>>,
    dotenv_path: Option<PathBuf>,
    banner: bool,
}

impl GuardBuilder {
    fn new() -> Self {
        Self {
            template_path: PathBuf::from(DEFAULT_TEMPLATE),
            config_path: PathBuf::from(DEFAULT_CONFIG),
            secrets: DEFAULT_SECRETS.to_vec(),
            persist_secrets: false,
            env_vars: None,
            dotenv_path: Some(PathBuf::from(DEFAULT_DOTENV)),
            banner: true,
        }
    }

    pub fn template_path(mut self, path: impl AsRef<Path>) -> Self {
        self.template_path = path.as_ref().to_path_buf();
        self
    }

    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = path.as_ref().to_path_buf();
        self
    }

    /// Replace the environment-to-key bindings (default: [`DEFAULT_SECRETS`]).
    pub fn secrets(mut self, bindings: &[SecretBinding]) -> Self {
        self.secrets = bindings.to_vec();
        self
    }

    /// Write overlaid secrets back to the configuration file (default: `false`).
    ///
    /// When off, secrets only appear in the returned [`RunReport::config`].
    pub fn persist_secrets(mut self, persist: bool) -> Self {
        self.persist_secrets = persist;
        self
    }

    /// Use these pairs instead of the process environment for secrets.
    pub fn env_vars(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env_vars = Some(vars.into_iter().collect());
        self
    }

    /// Dotenv file read before secrets are looked up (default: `.env`).
    ///
    /// Its variables never replace ones already in the environment. A missing
    /// file is not an error.
    pub fn dotenv_path(mut self, path: impl AsRef<Path>) -> Self {
        self.dotenv_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Do not read a dotenv file.
    pub fn no_dotenv(mut self) -> Self {
        self.dotenv_path = None;
        self
    }

    pub fn banner(mut self, show: bool) -> Self {
        self.banner = show;
        self
    }

    /// Run the full pass. Any error aborts before the remaining steps.
    pub fn run(self, prompter: &mut dyn Prompter) -> Result<RunReport, ConfguardError> {
        let template = document::load_template(&self.template_path)?;
        let loaded = document::load_config(&self.config_path, prompter)?;

        if self.banner {
            print_banner();
        }

        let mut config = loaded.table.clone();
        let summary = validate_tree(&template, &mut config, prompter)?;
        let content = document::persist_config(&loaded.path, &loaded.content, &loaded.table, &config)?;

        let validated = self.persist_secrets.then(|| config.clone());
        // Later pairs win, so the environment shadows the dotenv file.
        let mut env_vars = match &self.dotenv_path {
            Some(path) => read_dotenv(path),
            None => Vec::new(),
        };
        env_vars.extend(self.env_vars.unwrap_or_else(|| std::env::vars().collect()));
        let overridden = apply_secrets(&mut config, &self.secrets, env_vars);

        if let Some(validated) = validated
            && !overridden.is_empty()
        {
            document::persist_config(&loaded.path, &content, &validated, &config)?;
        }

        tracing::info!(
            path = %loaded.path.display(),
            checked = summary.checked,
            prompts = summary.prompts,
            overridden = overridden.len(),
            "configuration checked"
        );

        Ok(RunReport {
            config,
            checked: summary.checked,
            prompts: summary.prompts,
            created: loaded.status == LoadStatus::Created,
            reset: loaded.status == LoadStatus::Reset,
            overridden,
            path: loaded.path,
        })
    }
}

/// Variables from a dotenv file, without touching the process environment.
fn read_dotenv(path: &Path) -> Vec<(String, String)> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => return Vec::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read dotenv file");
            return Vec::new();
        }
    };

    let mut vars = Vec::new();
    for (index, item) in iter.enumerate() {
        match item {
            Ok(pair) => vars.push(pair),
            // The error text quotes the line, which may hold a secret.
            Err(_) => {
                tracing::warn!(path = %path.display(), entry = index + 1, "skipping unparsable dotenv entry")
            }
        }
    }
    tracing::debug!(path = %path.display(), count = vars.len(), "dotenv file read");
    vars
}

fn print_banner() {
    let banner = "\
###############################
#                             #
# Checking TOML configuration #
#                             #
###############################";
    eprintln!("{}", banner.blue().bold());
    eprintln!(
        "{}",
        "If you see any prompts, that means that you have unset/incorrectly set variables, please input the correct values."
            .blue()
    );
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Validated configuration with secrets overlaid.
    pub config: Table,
    /// Template keys visited.
    pub checked: usize,
    /// Values that had to be entered.
    pub prompts: usize,
    /// The configuration file did not exist and was created.
    pub created: bool,
    /// The configuration file was unreadable and emptied.
    pub reset: bool,
    /// Dotted keys replaced by environment secrets.
    pub overridden: Vec<String>,
    pub path: PathBuf,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.created {
            writeln!(f, "Created {}", self.path.display())?;
        }
        if self.reset {
            writeln!(f, "Reset {}", self.path.display())?;
        }
        writeln!(
            f,
            "Checked {} keys in {}, {} entered",
            self.checked,
            self.path.display(),
            self.prompts
        )?;
        if !self.overridden.is_empty() {
            writeln!(f, "From environment: {}", self.overridden.join(", "))?;
        }
        Ok(())
    }
}
