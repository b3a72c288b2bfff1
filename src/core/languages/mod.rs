//! Source-language grammar support
//!
//! Python is the only documented language; the helpers here normalize
//! docstrings and source snippets the way Python's own tooling does.

mod python;

pub use python::PythonParser;

const TAB_SIZE: usize = 8;

/// Normalize docstring indentation like Python's `inspect.cleandoc`
pub fn clean_docstring(raw: &str) -> String {
    let expanded = expand_tabs(raw);
    let lines: Vec<&str> = expanded.lines().collect();
    let Some((first, rest)) = lines.split_first() else {
        return String::new();
    };

    let margin = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned = vec![first.trim().to_string()];
    for line in rest {
        cleaned.push(line.get(margin..).unwrap_or_else(|| line.trim_start()).trim_end().to_string());
    }

    let start = cleaned.iter().position(|l| !l.trim().is_empty());
    let end = cleaned.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(start), Some(end)) => cleaned[start..=end].join("\n"),
        _ => String::new(),
    }
}

/// Replace tabs with spaces up to the next tab stop, per line
fn expand_tabs(text: &str) -> String {
    let mut expanded = String::with_capacity(text.len());
    let mut column = 0;
    for c in text.chars() {
        match c {
            '\t' => {
                let pad = TAB_SIZE - column % TAB_SIZE;
                expanded.extend(std::iter::repeat(' ').take(pad));
                column += pad;
            }
            '\n' | '\r' => {
                expanded.push(c);
                column = 0;
            }
            _ => {
                expanded.push(c);
                column += 1;
            }
        }
    }
    expanded
}

/// Remove the indentation common to every non-blank line
pub fn dedent(text: &str) -> String {
    let margin = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    text.lines()
        .map(|line| line.get(margin..).unwrap_or_else(|| line.trim_start()).trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}
