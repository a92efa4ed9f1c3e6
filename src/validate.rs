//! Template-driven validation: walk every rule set in the template and make
//! sure the configuration holds an accepted value at the same key path.
//!
//! Missing sections and keys are created as empty tables on the way down, so
//! a key that was never written reaches the checker as the "unset" sentinel
//! and is always prompted for. Keys that exist only in the configuration are
//! left alone.

use toml::{Table, Value};

use crate::check::check;
use crate::crawl::{crawl, dotted};
use crate::error::ConfguardError;
use crate::prompt::{PromptRequest, Prompter};
use crate::template::{RuleSet, Template};

/// Outcome of one full validation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    /// Template leaves visited.
    pub checked: usize,
    /// Values the prompter had to supply.
    pub prompts: usize,
}

/// Validate every template leaf against `config`, repairing it in place.
pub fn validate_tree(
    template: &Template,
    config: &mut Table,
    prompter: &mut dyn Prompter,
) -> Result<ValidationSummary, ConfguardError> {
    let mut counting = CountingPrompter {
        inner: prompter,
        prompts: 0,
    };
    let mut checked = 0;

    crawl(template.root(), &mut |path, rules| {
        checked += 1;
        tracing::debug!(key = %dotted(&path), "checking");
        validate_path(config, &path, rules, &mut counting)
    })?;

    Ok(ValidationSummary {
        checked,
        prompts: counting.prompts,
    })
}

/// Check the value at one key path, creating missing levels first, and write
/// the accepted value back in place.
pub fn validate_path(
    config: &mut Table,
    path: &[String],
    rules: &RuleSet,
    prompter: &mut dyn Prompter,
) -> Result<(), ConfguardError> {
    let Some((head, tail)) = path.split_first() else {
        return Ok(());
    };
    let key = dotted(path);
    let slot = config
        .entry(head)
        .or_insert_with(|| Value::Table(Table::new()));
    descend(slot, tail, &key, rules, prompter)
}

fn descend(
    slot: &mut Value,
    remaining: &[String],
    key: &str,
    rules: &RuleSet,
    prompter: &mut dyn Prompter,
) -> Result<(), ConfguardError> {
    let Some((head, tail)) = remaining.split_first() else {
        *slot = check(slot.clone(), rules, key, prompter)?;
        return Ok(());
    };

    if !slot.is_table() {
        tracing::warn!(
            key,
            found = slot.type_str(),
            "replacing a non-table value where the template expects a section"
        );
        *slot = Value::Table(Table::new());
    }
    match slot {
        Value::Table(table) => {
            let child = table
                .entry(head)
                .or_insert_with(|| Value::Table(Table::new()));
            descend(child, tail, key, rules, prompter)
        }
        _ => Ok(()),
    }
}

struct CountingPrompter<'a> {
    inner: &'a mut dyn Prompter,
    prompts: usize,
}

impl Prompter for CountingPrompter<'_> {
    fn collect(&mut self, request: &PromptRequest<'_>) -> Result<Value, ConfguardError> {
        self.prompts += 1;
        self.inner.collect(request)
    }

    fn confirm(&mut self, message: &str) -> Result<bool, ConfguardError> {
        self.inner.confirm(message)
    }
}
