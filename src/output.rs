//! Output formatting for CLI display.
//!
//! Provides the [`PrettyPrint`] trait for human-readable output
//! as an alternative to JSON serialization, and [`render_tree`] for
//! catalogs linked through `id_parent`.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;

use crate::Record;

/// Trait for human-readable key-value output.
///
/// Implemented by record types to provide formatted output
/// suitable for terminal display when `--json` is not specified.
pub trait PrettyPrint {
    /// Returns a formatted string for terminal display.
    fn pretty_print(&self) -> String;
}

/// Fields shown in the header rather than in the field list.
const HEADER_FIELDS: &[&str] = &["id", "subject"];

impl PrettyPrint for Record {
    fn pretty_print(&self) -> String {
        let header = match self.id() {
            Some(id) => format!("Ticket #{id}"),
            None => "Ticket".to_string(),
        };
        let divider = "─".repeat(header.len().max(30));

        let mut lines = vec![header, divider];

        if let Some(subject) = self.subject() {
            lines.push(format!("{:<16}{}", "Subject:", subject));
        }

        let mut keys: Vec<&String> = self
            .keys()
            .filter(|k| !HEADER_FIELDS.contains(&k.as_str()))
            .collect();
        keys.sort();

        for key in keys {
            let label = format!("{key}:");
            let value = self.get(key.as_str()).unwrap_or(&Value::Null);
            lines.push(format!("{:<16}{}", label, render_value(value)));
        }

        lines.join("\n")
    }
}

/// Render a JSON value on one line; nested values stay compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => if *b { "yes" } else { "no" }.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) if items.iter().all(is_scalar) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

/// Render `id_parent` hierarchies (such as the sector catalog) as an
/// indented tree, four spaces per level.
///
/// Roots are entries whose parent is 0, missing or not in the catalog.
/// Siblings keep catalog order. Every entry is printed exactly once:
/// entries only reachable through a parent cycle are appended as extra
/// roots once the regular walk is done.
pub fn render_tree(entries: &[Record]) -> String {
    let ids: HashSet<u64> = entries.iter().filter_map(Record::id).collect();

    // parent id -> entry indices; 0 collects the roots
    let mut children: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
    for (index, entry) in entries.iter().enumerate() {
        let parent = entry
            .get("id_parent")
            .and_then(Value::as_u64)
            .filter(|p| ids.contains(p))
            .unwrap_or(0);
        children.entry(parent).or_default().push(index);
    }

    let mut out = String::new();
    let mut visited: HashSet<usize> = HashSet::with_capacity(entries.len());

    let roots = children.get(&0).cloned().unwrap_or_default();
    let orphans: Vec<usize> = (0..entries.len()).collect();

    for start in roots.into_iter().chain(orphans) {
        let mut stack = vec![(start, 0usize)];
        while let Some((index, depth)) = stack.pop() {
            if !visited.insert(index) {
                continue;
            }
            let entry = &entries[index];
            let id = entry.id().map(|id| id.to_string()).unwrap_or_default();
            let name = entry.subject().unwrap_or("");
            out.push_str(&format!("{}{}: {}\n", "    ".repeat(depth), id, name));

            if let Some(kids) = entry.id().filter(|id| *id != 0).and_then(|id| children.get(&id)) {
                stack.extend(
                    kids.iter()
                        .rev()
                        .filter(|k| !visited.contains(*k))
                        .map(|k| (*k, depth + 1)),
                );
            }
        }
    }
    out
}
