use toml::{Table, Value};

use crate::crawl::crawl_table;

/// Overlay `top` onto `base` in place.
/// Where both sides hold a table for the same key, recurse.
/// Otherwise `top`'s value replaces whatever `base` had, including a table.
///
/// Returns the dotted paths of every leaf written, in `top`'s order.
pub fn overlay(base: &mut Table, top: Table) -> Vec<String> {
    let mut written = Vec::new();
    overlay_at(base, top, "", &mut written);
    written
}

fn overlay_at(base: &mut Table, top: Table, prefix: &str, written: &mut Vec<String>) {
    for (key, top_val) in top {
        let dotted = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match top_val {
            Value::Table(top_tbl) if base.get(&key).is_some_and(Value::is_table) => {
                if let Some(Value::Table(base_tbl)) = base.get_mut(&key) {
                    overlay_at(base_tbl, top_tbl, &dotted, written);
                }
            }
            top_val => {
                match &top_val {
                    Value::Table(new_tbl) => crawl_table(new_tbl, &mut |path, _| {
                        written.push(format!("{dotted}.{}", path.join(".")));
                    }),
                    _ => written.push(dotted),
                }
                // Replacing an existing key keeps its position.
                base.insert(key, top_val);
            }
        }
    }
}
