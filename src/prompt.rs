//! Prompt collaborators: whoever supplies a corrected value when the checker
//! rejects one.
//!
//! [`ConsolePrompter`] asks the operator on the terminal and keeps asking until
//! the answer satisfies the key's rules. [`RefusingPrompter`] never asks and
//! turns every rejection into an error, for unattended runs.

use colored::Colorize;
use console::Term;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};
use toml::Value;

use crate::check::{Rejection, Verdict, evaluate};
use crate::error::ConfguardError;
use crate::template::{RuleSet, format_value};

const DEFAULT_INPUT_ERROR: &str = "Incorrect input";
const DEFAULT_OOB_ERROR: &str = "Input out of bounds(Value too high/low/long/short)";

/// Source of corrected values and yes/no answers.
pub trait Prompter {
    /// Obtain a value for a rejected key. The returned value is used as-is.
    fn collect(&mut self, request: &PromptRequest<'_>) -> Result<Value, ConfguardError>;

    /// Ask a yes/no question about a document-level problem.
    fn confirm(&mut self, message: &str) -> Result<bool, ConfguardError>;
}

/// Everything a prompter needs to ask for one value.
#[derive(Debug, Clone, Copy)]
pub struct PromptRequest<'a> {
    /// Dotted key path.
    pub key: &'a str,
    pub rules: &'a RuleSet,
    pub reason: Rejection,
}

impl<'a> PromptRequest<'a> {
    pub fn new(key: &'a str, rules: &'a RuleSet, reason: Rejection) -> Self {
        Self { key, rules, reason }
    }

    pub fn marker(&self) -> &'static str {
        if self.rules.optional {
            "Optional "
        } else {
            "Non-optional "
        }
    }

    /// Plain-text label: an optional example line, then `<marker><key>=`.
    pub fn label(&self) -> String {
        let head = format!("{}{}=", self.marker(), self.key);
        match &self.rules.example {
            Some(example) => format!("Example: {}\n{head}", format_value(example)),
            None => head,
        }
    }

    pub fn extra_info(&self) -> &str {
        self.rules.explanation.as_deref().unwrap_or("")
    }

    pub fn input_error(&self) -> &str {
        self.rules.input_error.as_deref().unwrap_or(DEFAULT_INPUT_ERROR)
    }

    pub fn oob_error(&self) -> &str {
        self.rules.oob_error.as_deref().unwrap_or(DEFAULT_OOB_ERROR)
    }

    /// Turn typed input into an accepted value, or the message to show.
    ///
    /// Empty input falls back to the default. On an optional key with no
    /// default, empty input is accepted as an empty string.
    pub fn interpret(&self, raw: &str) -> Result<Value, String> {
        let raw = raw.trim();
        let candidate = if raw.is_empty() {
            match (&self.rules.default, self.rules.optional) {
                (Some(default), _) => default.clone(),
                (None, true) => return Ok(Value::String(String::new())),
                (None, false) => return Err(self.input_error().to_string()),
            }
        } else {
            match self.rules.coercion {
                Some(coercion) => coercion
                    .parse(raw)
                    .ok_or_else(|| self.input_error().to_string())?,
                None => Value::String(raw.to_string()),
            }
        };

        match evaluate(candidate, self.rules, self.key) {
            Ok(Verdict::Accepted(value)) => Ok(value),
            Ok(Verdict::Rejected(Rejection::OutOfBounds)) => Err(self.oob_error().to_string()),
            Ok(Verdict::Rejected(_)) | Err(_) => Err(self.input_error().to_string()),
        }
    }
}

/// Interactive terminal prompter.
pub struct ConsolePrompter {
    term: Term,
    theme: ColorfulTheme,
}

impl ConsolePrompter {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for ConsolePrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for ConsolePrompter {
    fn collect(&mut self, request: &PromptRequest<'_>) -> Result<Value, ConfguardError> {
        let rules = request.rules;
        let label = request.label();
        let (example, head) = match label.rsplit_once('\n') {
            Some((example, head)) => (Some(example), head),
            None => (None, label.as_str()),
        };
        if let Some(example) = example {
            eprintln!("{}", example.blue());
        }
        if !request.extra_info().is_empty() {
            eprintln!("{}", request.extra_info().dimmed());
        }
        if let Some(options) = &rules.options {
            let listed: Vec<String> = options.iter().map(format_value).collect();
            eprintln!("{} {}", "Options:".cyan(), listed.join(", "));
        }

        let mut prompt = head.trim_end_matches('=').to_string();
        if let Some(default) = &rules.default {
            prompt.push_str(&format!(" (default: {})", format_value(default)));
        }

        let raw: String = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .validate_with(|input: &String| request.interpret(input).map(|_| ()))
            .interact_text_on(&self.term)
            .map_err(|e| ConfguardError::Prompt {
                key: request.key.to_string(),
                reason: e.to_string(),
            })?;

        request
            .interpret(&raw)
            .map_err(|reason| ConfguardError::InvalidValue {
                key: request.key.to_string(),
                reason,
            })
    }

    fn confirm(&mut self, message: &str) -> Result<bool, ConfguardError> {
        Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(false)
            .interact_on(&self.term)
            .map_err(|e| ConfguardError::Prompt {
                key: "<confirm>".into(),
                reason: e.to_string(),
            })
    }
}

/// Prompter for unattended runs: every rejection becomes an error and every
/// confirmation is declined.
#[derive(Debug, Default)]
pub struct RefusingPrompter;

impl Prompter for RefusingPrompter {
    fn collect(&mut self, request: &PromptRequest<'_>) -> Result<Value, ConfguardError> {
        Err(ConfguardError::InvalidValue {
            key: request.key.to_string(),
            reason: request.reason.to_string(),
        })
    }

    fn confirm(&mut self, message: &str) -> Result<bool, ConfguardError> {
        tracing::debug!(message, "declining confirmation in non-interactive mode");
        Ok(false)
    }
}
