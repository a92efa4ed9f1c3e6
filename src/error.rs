use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum ConfguardError {
    #[error("Failed to read template {path}: {source}")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(confguard::template::read),
            help("pass --template with the path to the template file")
        )
    )]
    TemplateRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse template {path}: {source}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(confguard::template::parse)))]
    TemplateParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid template entry '{key}': {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(confguard::template::entry)))]
    InvalidTemplate { key: String, reason: String },

    #[error("Failed to read {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(confguard::config::write),
            help("check the file and folder permissions for the current user")
        )
    )]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unable to read {path}, and not allowed to overwrite it")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(confguard::config::declined),
            help("fix the TOML syntax by hand, or accept the reset when prompted")
        )
    )]
    OverwriteDeclined { path: PathBuf },

    #[error("Failed to update {path}: {reason}")]
    DocumentEdit { path: PathBuf, reason: String },

    #[error("Failed to parse settings file {path}: {source}")]
    SettingsParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Unknown setting '{key}' in {path}")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(confguard::settings::unknown),
            help("valid settings are template, config, persist_secrets, non_interactive and banner")
        )
    )]
    UnknownSetting { key: String, path: PathBuf },

    #[error("Value of '{key}' ({value}) cannot be compared against numeric bounds")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(confguard::check::incomparable)))]
    Incomparable { key: String, value: String },

    #[error("Invalid value for '{key}': {reason}")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(confguard::check::invalid),
            help("run without --non-interactive to repair the value")
        )
    )]
    InvalidValue { key: String, reason: String },

    #[error("Prompt for '{key}' failed: {reason}")]
    Prompt { key: String, reason: String },

    #[error("Settings error: {0}")]
    Settings(#[from] confique::Error),

    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },
}

impl ConfguardError {
    /// Errors that stop the run before the configuration was touched.
    pub fn is_document_level(&self) -> bool {
        matches!(
            self,
            ConfguardError::TemplateRead { .. }
                | ConfguardError::TemplateParse { .. }
                | ConfguardError::InvalidTemplate { .. }
                | ConfguardError::ConfigRead { .. }
                | ConfguardError::WriteFailed { .. }
                | ConfguardError::OverwriteDeclined { .. }
        )
    }
}
