//! Depth-first walks over nested trees, reporting every leaf with its key path.
//!
//! Each recursive call receives its own copy of the path so far; nothing is
//! shared between sibling branches. Keys are visited in the tree's iteration
//! order, which is document order.

use indexmap::IndexMap;
use toml::{Table, Value};

use crate::template::{RuleSet, TemplateNode};

/// Ordered keys from the root to one leaf.
pub type KeyPath = Vec<String>;

/// Join a key path with dots, e.g. `["reddit", "creds"]` → `"reddit.creds"`.
pub fn dotted(path: &[String]) -> String {
    path.join(".")
}

/// Visit every rule set in a template tree.
///
/// Stops at the first error returned by `visit`.
pub fn crawl<E, F>(nodes: &IndexMap<String, TemplateNode>, visit: &mut F) -> Result<(), E>
where
    F: FnMut(KeyPath, &RuleSet) -> Result<(), E>,
{
    crawl_from(nodes, KeyPath::new(), visit)
}

fn crawl_from<E, F>(nodes: &IndexMap<String, TemplateNode>, path: KeyPath, visit: &mut F) -> Result<(), E>
where
    F: FnMut(KeyPath, &RuleSet) -> Result<(), E>,
{
    for (key, node) in nodes {
        let mut next = path.clone();
        next.push(key.clone());
        match node {
            TemplateNode::Node(children) => crawl_from(children, next, visit)?,
            TemplateNode::Leaf(rules) => visit(next, rules)?,
        }
    }
    Ok(())
}

/// Visit every non-table value in a plain TOML table.
///
/// Empty sub-tables contribute no leaves.
pub fn crawl_table<F>(table: &Table, visit: &mut F)
where
    F: FnMut(KeyPath, &Value),
{
    crawl_table_from(table, KeyPath::new(), visit);
}

fn crawl_table_from<F>(table: &Table, path: KeyPath, visit: &mut F)
where
    F: FnMut(KeyPath, &Value),
{
    for (key, value) in table {
        let mut next = path.clone();
        next.push(key.clone());
        match value {
            Value::Table(sub) => crawl_table_from(sub, next, visit),
            other => visit(next, other),
        }
    }
}

/// Navigate a table by key path.
pub fn value_at<'a>(table: &'a Table, path: &[&str]) -> Option<&'a Value> {
    let (last, parents) = path.split_last()?;
    let mut current = table;
    for segment in parents {
        current = current.get(*segment)?.as_table()?;
    }
    current.get(*last)
}
