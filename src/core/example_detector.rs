/// Marker that opens an example section in a docstring
const EXAMPLE_MARKER: &str = "Example";

/// Find a usage example embedded in a docstring.
///
/// Line-oriented heuristic: everything after the first line containing
/// "Example" is collected, skipping blank lines and `>>>` prompt lines,
/// until a line that opens or closes a triple-quoted block. Marker lines
/// are never part of the example, wherever they appear. False positives and negatives are
/// expected; callers depend on the exact behavior, so keep it simple.
pub fn detect_example(docstring: &str) -> Option<String> {
    let mut example_lines = Vec::new();
    let mut in_example = false;

    for line in docstring.lines() {
        if line.contains(EXAMPLE_MARKER) {
            in_example = true;
            continue;
        }
        if !in_example {
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(">>>") {
            continue;
        }
        if trimmed.starts_with("\"\"\"") || trimmed.starts_with("'''") {
            break;
        }
        example_lines.push(line);
    }

    let example = example_lines.join("\n").trim().to_string();
    if example.is_empty() {
        None
    } else {
        Some(example)
    }
}
