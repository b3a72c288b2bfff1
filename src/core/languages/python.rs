use tree_sitter::{Node, Parser, Tree};

use crate::error::{DocEnhancerError, Result};
use super::{clean_docstring, dedent};

/// Python-specific parser using Tree-sitter
pub struct PythonParser {
    parser: Parser,
}

/// A function definition found while walking the tree
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionNode {
    pub name: String,
    pub docstring: Option<String>,
    pub source: String,
    /// 1-based line range of the reconstructed source, decorators included
    pub line_range: (usize, usize),
}

impl PythonParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let python_language = tree_sitter_python::language();
        parser.set_language(&python_language)
            .map_err(|e| DocEnhancerError::Internal(format!("Failed to set Python language: {}", e)))?;

        Ok(Self { parser })
    }

    /// Parse `content` and return every function definition in pre-order.
    ///
    /// Tree-sitter recovers from syntax errors, so a tree that contains any
    /// error or missing node is rejected here instead of being partially
    /// extracted. The `Err` string is the diagnostic for the first bad node.
    pub fn extract_functions(&mut self, content: &str) -> std::result::Result<Vec<FunctionNode>, String> {
        let tree = self.parse_tree(content)?;
        let root = tree.root_node();

        if root.has_error() {
            return Err(self.syntax_diagnostic(root, content));
        }

        let mut functions = Vec::new();
        self.collect_functions(root, content, &mut functions);
        Ok(functions)
    }

    fn parse_tree(&mut self, content: &str) -> std::result::Result<Tree, String> {
        self.parser.parse(content, None)
            .ok_or_else(|| "Failed to parse Python code".to_string())
    }

    /// Pre-order walk: a function is recorded before anything nested in it
    fn collect_functions(&self, node: Node, source: &str, functions: &mut Vec<FunctionNode>) {
        if node.kind() == "function_definition" {
            if let Some(function) = self.parse_python_function(node, source) {
                functions.push(function);
            }
        }

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.collect_functions(child, source, functions);
        }
    }

    /// Parse a Python function definition
    fn parse_python_function(&self, node: Node, source: &str) -> Option<FunctionNode> {
        let name = self.node_text(node.child_by_field_name("name")?, source);

        // Decorators belong to the enclosing decorated_definition node
        let span = match node.parent() {
            Some(parent) if parent.kind() == "decorated_definition" => parent,
            _ => node,
        };

        let line_start = source[..span.start_byte()].rfind('\n').map_or(0, |i| i + 1);
        let source_text = dedent(&source[line_start..span.end_byte()]);

        Some(FunctionNode {
            name: name.to_string(),
            docstring: self.extract_docstring_from_body(node, source),
            source: source_text,
            line_range: (span.start_position().row + 1, span.end_position().row + 1),
        })
    }

    /// Extract text content of a node
    fn node_text<'a>(&self, node: Node, source: &'a str) -> &'a str {
        &source[node.byte_range()]
    }

    /// Docstring is the first statement of the body when it is a plain string
    fn extract_docstring_from_body(&self, node: Node, source: &str) -> Option<String> {
        let body_node = node.child_by_field_name("body")?;
        let mut cursor = body_node.walk();
        let first = body_node
            .named_children(&mut cursor)
            .find(|child| child.kind() != "comment")?;

        if first.kind() != "expression_statement" || first.named_child_count() != 1 {
            return None;
        }

        // ("doc") is still a docstring
        let mut literal = first.named_child(0)?;
        while literal.kind() == "parenthesized_expression" {
            literal = literal.named_child(0)?;
        }

        let value = match literal.kind() {
            "string" => string_literal_value(self.node_text(literal, source))?,
            "concatenated_string" => {
                let mut cursor = literal.walk();
                let parts = literal
                    .named_children(&mut cursor)
                    .filter(|part| part.kind() == "string")
                    .map(|part| string_literal_value(self.node_text(part, source)))
                    .collect::<Option<Vec<_>>>()?;
                parts.concat()
            }
            _ => return None,
        };

        let cleaned = clean_docstring(&value);
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }

    fn syntax_diagnostic(&self, root: Node, source: &str) -> String {
        let Some(bad) = first_error_node(root) else {
            return "invalid syntax".to_string();
        };

        let position = bad.start_position();
        let line_text = source.lines().nth(position.row).unwrap_or("").trim_end();
        let what = if bad.is_missing() {
            format!("missing `{}`", bad.kind())
        } else {
            "invalid syntax".to_string()
        };

        format!(
            "{} at line {}, column {}: {}",
            what,
            position.row + 1,
            position.column + 1,
            line_text
        )
    }
}

fn first_error_node<'a>(node: Node<'a>) -> Option<Node<'a>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error_node)
}

/// Strip the prefix and quotes from a string literal; None for f-strings and bytes
fn string_literal_body(literal: &str) -> Option<&str> {
    let quote_at = literal.find(|c| c == '"' || c == '\'')?;
    let prefix = &literal[..quote_at];
    if prefix.chars().any(|c| !matches!(c, 'r' | 'R' | 'u' | 'U')) {
        return None;
    }

    let quoted = &literal[quote_at..];
    for delimiter in ["\"\"\"", "'''", "\"", "'"] {
        if quoted.len() >= 2 * delimiter.len()
            && quoted.starts_with(delimiter)
            && quoted.ends_with(delimiter)
        {
            return Some(&quoted[delimiter.len()..quoted.len() - delimiter.len()]);
        }
    }
    None
}

/// Value of a string literal with escapes decoded unless it is raw
fn string_literal_value(literal: &str) -> Option<String> {
    let body = string_literal_body(literal)?;
    let prefix = &literal[..literal.find(['"', '\''])?];
    if prefix.contains(['r', 'R']) {
        Some(body.to_string())
    } else {
        Some(decode_escapes(body))
    }
}

/// Decode Python backslash escapes; unknown escapes are kept verbatim
fn decode_escapes(body: &str) -> String {
    let mut decoded = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            decoded.push(c);
            continue;
        }
        let Some(escape) = chars.next() else {
            decoded.push('\\');
            break;
        };

        match escape {
            // Line continuation
            '\n' => {}
            '\r' => {
                chars.next_if_eq(&'\n');
            }
            '\\' | '\'' | '"' => decoded.push(escape),
            'a' => decoded.push('\u{07}'),
            'b' => decoded.push('\u{08}'),
            'f' => decoded.push('\u{0c}'),
            'n' => decoded.push('\n'),
            'r' => decoded.push('\r'),
            't' => decoded.push('\t'),
            'v' => decoded.push('\u{0b}'),
            '0'..='7' => {
                let mut value = escape as u32 - '0' as u32;
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                decoded.extend(char::from_u32(value));
            }
            'x' | 'u' | 'U' => {
                let width = match escape {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = chars.clone().take(width).collect();
                let value = (digits.len() == width && digits.chars().all(|d| d.is_ascii_hexdigit()))
                    .then(|| u32::from_str_radix(&digits, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);

                match value {
                    Some(ch) => {
                        decoded.push(ch);
                        for _ in 0..width {
                            chars.next();
                        }
                    }
                    None => {
                        decoded.push('\\');
                        decoded.push(escape);
                    }
                }
            }
            other => {
                decoded.push('\\');
                decoded.push(other);
            }
        }
    }

    decoded
}
