use std::collections::BTreeMap;

use crate::value::Value;

/// Render a value on one line: `{ type: 'DONE', payload: 43 }`.
pub fn inspect(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".into(),
        Value::Null => "null".into(),
        Value::Bool(b) => b.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(n) => n.to_string(),
        Value::String(s) => quote(s),
        Value::List(items) => {
            if items.is_empty() {
                return "[]".into();
            }
            let parts: Vec<String> = items.iter().map(inspect).collect();
            format!("[ {} ]", parts.join(", "))
        }
        Value::Map(entries) => inspect_entries(entries),
        Value::Instance { class, fields } => format!("{class} {}", inspect_entries(fields)),
        Value::FnRef(name) => format!("[Function: {name}]"),
        Value::Handle { kind, id } => format!("[{kind} #{id}]"),
    }
}

fn inspect_entries(entries: &BTreeMap<String, Value>) -> String {
    if entries.is_empty() {
        return "{}".into();
    }
    let parts: Vec<String> = entries
        .iter()
        .map(|(k, v)| format!("{}: {}", key(k), inspect(v)))
        .collect();
    format!("{{ {} }}", parts.join(", "))
}

/// Render a value across lines with two-space indentation, one entry per line.
pub fn pretty(value: &Value) -> String {
    let mut out = String::new();
    write_pretty(value, 0, &mut out);
    out
}

fn write_pretty(value: &Value, depth: usize, out: &mut String) {
    match value {
        Value::List(items) if !items.is_empty() => {
            out.push_str("[\n");
            for item in items {
                indent(depth + 1, out);
                write_pretty(item, depth + 1, out);
                out.push_str(",\n");
            }
            indent(depth, out);
            out.push(']');
        }
        Value::Map(entries) if !entries.is_empty() => write_pretty_entries(entries, depth, out),
        Value::Instance { class, fields } if !fields.is_empty() => {
            out.push_str(class);
            out.push(' ');
            write_pretty_entries(fields, depth, out);
        }
        other => out.push_str(&inspect(other)),
    }
}

fn write_pretty_entries(entries: &BTreeMap<String, Value>, depth: usize, out: &mut String) {
    out.push_str("{\n");
    for (k, v) in entries {
        indent(depth + 1, out);
        out.push_str(&key(k));
        out.push_str(": ");
        write_pretty(v, depth + 1, out);
        out.push_str(",\n");
    }
    indent(depth, out);
    out.push('}');
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Object keys print bare when they are identifiers, quoted otherwise.
fn key(k: &str) -> String {
    let mut chars = k.chars();
    let is_ident = match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    };
    if is_ident {
        k.to_string()
    } else {
        quote(k)
    }
}

/// One line of a text diff.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffLine {
    Same(String),
    /// Present only in the expected text.
    Expected(String),
    /// Present only in the received text.
    Received(String),
}

/// Line diff of two texts via longest common subsequence.
pub fn diff_lines(expected: &str, received: &str) -> Vec<DiffLine> {
    let a: Vec<&str> = expected.lines().collect();
    let b: Vec<&str> = received.lines().collect();

    // lcs[i][j] = LCS length of a[i..] and b[j..]
    let mut lcs = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for i in (0..a.len()).rev() {
        for j in (0..b.len()).rev() {
            lcs[i][j] = if a[i] == b[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut lines = Vec::with_capacity(a.len().max(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            lines.push(DiffLine::Same(a[i].to_string()));
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            lines.push(DiffLine::Expected(a[i].to_string()));
            i += 1;
        } else {
            lines.push(DiffLine::Received(b[j].to_string()));
            j += 1;
        }
    }
    lines.extend(a[i..].iter().map(|l| DiffLine::Expected(l.to_string())));
    lines.extend(b[j..].iter().map(|l| DiffLine::Received(l.to_string())));
    lines
}
