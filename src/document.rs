//! Template and configuration documents on disk.
//!
//! Loading decides what to do with a missing or unreadable configuration.
//! Persisting patches the original text with `toml_edit`, so comments and
//! formatting survive and only values that actually changed are rewritten.
//! Sections created during validation are written as implicit tables, which
//! avoids empty `[section]` headers.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use toml::{Table, Value};
use toml_edit::{DocumentMut, Item};

use crate::crawl::{crawl_table, value_at};
use crate::error::ConfguardError;
use crate::prompt::Prompter;
use crate::template::Template;

/// How the configuration document was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Parsed from an existing file.
    Existing,
    /// The file did not exist and an empty one was created.
    Created,
    /// The file could not be parsed and the operator agreed to empty it.
    Reset,
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub path: PathBuf,
    /// Text as it was on disk after loading; the base for persisting.
    pub content: String,
    pub table: Table,
    pub status: LoadStatus,
}

/// Read and parse the template. Any failure is fatal for the run.
pub fn load_template(path: &Path) -> Result<Template, ConfguardError> {
    let content = fs::read_to_string(path).map_err(|e| ConfguardError::TemplateRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let table: Table = toml::from_str(&content).map_err(|e| ConfguardError::TemplateParse {
        path: path.to_path_buf(),
        source: e,
    })?;
    let template = Template::from_table(table)?;
    tracing::debug!(path = %path.display(), leaves = template.leaf_count(), "template loaded");
    Ok(template)
}

/// Load the configuration document, creating or resetting it when needed.
///
/// - missing file: an empty file is created without asking
/// - unparsable or non-UTF-8 file: the operator is asked whether to empty
///   it; declining aborts with [`ConfguardError::OverwriteDeclined`]
/// - any other read error is returned as-is
pub fn load_config(path: &Path, prompter: &mut dyn Prompter) -> Result<LoadedConfig, ConfguardError> {
    let loaded = |content: String, table: Table, status: LoadStatus| LoadedConfig {
        path: path.to_path_buf(),
        content,
        table,
        status,
    };

    let parsed = match fs::read_to_string(path) {
        Ok(content) => match toml::from_str::<Table>(&content) {
            Ok(table) => Ok((content, table)),
            Err(e) => Err(e.to_string()),
        },
        Err(e) if e.kind() == ErrorKind::NotFound => {
            create_empty(path)?;
            tracing::info!(path = %path.display(), "configuration not found, created an empty one");
            return Ok(loaded(String::new(), Table::new(), LoadStatus::Created));
        }
        // Not UTF-8: as unusable as a syntax error, so it gets the same offer.
        Err(e) if e.kind() == ErrorKind::InvalidData => Err(e.to_string()),
        Err(e) => {
            return Err(ConfguardError::ConfigRead {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    match parsed {
        Ok((content, table)) => Ok(loaded(content, table, LoadStatus::Existing)),
        Err(reason) => {
            tracing::warn!(path = %path.display(), error = %reason, "configuration cannot be parsed");
            let question = format!("Couldn't read {}. Overwrite it?", path.display());
            if !prompter.confirm(&question)? {
                return Err(ConfguardError::OverwriteDeclined {
                    path: path.to_path_buf(),
                });
            }
            write_document(path, "")?;
            tracing::info!(path = %path.display(), "configuration reset to an empty document");
            Ok(loaded(String::new(), Table::new(), LoadStatus::Reset))
        }
    }
}

fn create_empty(path: &Path) -> Result<(), ConfguardError> {
    let write_failed = |e| ConfguardError::WriteFailed {
        path: path.to_path_buf(),
        source: e,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(write_failed)?;
    }
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map(drop)
        .map_err(write_failed)
}

/// Write `content` to `path`, creating parent directories.
pub fn write_document(path: &Path, content: &str) -> Result<(), ConfguardError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| ConfguardError::WriteFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    fs::write(path, content).map_err(|e| ConfguardError::WriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Pure function: rewrite `content` so that it holds `updated`.
///
/// Leaves whose value equals the one in `before` are not touched, so their
/// formatting and comments stay exactly as written. Returns the new text.
pub fn patch_document(
    path: &Path,
    content: &str,
    before: &Table,
    updated: &Table,
) -> Result<String, ConfguardError> {
    let edit_failed = |reason: String| ConfguardError::DocumentEdit {
        path: path.to_path_buf(),
        reason,
    };

    let mut doc: DocumentMut = content
        .parse()
        .map_err(|e: toml_edit::TomlError| edit_failed(e.to_string()))?;

    let mut changed: Vec<(Vec<String>, Value)> = Vec::new();
    crawl_table(updated, &mut |path, value| {
        let keys: Vec<&str> = path.iter().map(String::as_str).collect();
        if value_at(before, &keys) != Some(value) {
            changed.push((path, value.clone()));
        }
    });

    for (keys, value) in &changed {
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        set_leaf(doc.as_item_mut(), &keys, value).map_err(edit_failed)?;
    }

    Ok(doc.to_string())
}

fn set_leaf(root: &mut Item, keys: &[&str], value: &Value) -> Result<(), String> {
    let Some((leaf, parents)) = keys.split_last() else {
        return Ok(());
    };

    // Below an inline table only values are rendered, so missing levels
    // there must be inline tables too.
    let mut current = root;
    for segment in parents {
        if !current.get(segment).is_some_and(Item::is_table_like) {
            let inline = current.is_inline_table();
            current[segment] = if inline {
                Item::Value(toml_edit::Value::InlineTable(toml_edit::InlineTable::new()))
            } else {
                let mut section = toml_edit::Table::new();
                section.set_implicit(true);
                Item::Table(section)
            };
        }
        current = &mut current[segment];
    }

    let mut rendered: toml_edit::Value = value
        .to_string()
        .parse()
        .map_err(|e: toml_edit::TomlError| format!("cannot render {}: {e}", keys.join(".")))?;
    if let Some(old) = current.get(leaf).and_then(Item::as_value) {
        *rendered.decor_mut() = old.decor().clone();
    }
    current[leaf] = Item::Value(rendered);
    Ok(())
}

/// I/O wrapper: patch `content` with the changes from `before` to `updated`
/// and write the result. Returns the text written.
pub fn persist_config(
    path: &Path,
    content: &str,
    before: &Table,
    updated: &Table,
) -> Result<String, ConfguardError> {
    let new_content = patch_document(path, content, before, updated)?;
    write_document(path, &new_content)?;
    tracing::info!(path = %path.display(), "configuration written");
    Ok(new_content)
}
