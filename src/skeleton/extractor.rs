//! Definition extraction with tree-sitter, plus the line-based fallback.

use super::queries::{query_table, LanguageSpec};
use crate::domain::{ContextConfig, Definition, DefinitionKind, Language, RepoFile, Skeleton};
use crate::error::SkeletonError;
use crate::utils::encoding::read_file_safe;
use std::collections::HashSet;
use std::path::Path;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Parser, QueryCursor};

/// Read cap for the fallback path; only the leading lines are needed.
pub const FALLBACK_READ_BYTES: usize = 256 * 1024;

/// Nodes that wrap a definition without changing what it documents.
const WRAPPER_KINDS: &[&str] = &[
    "export_statement",
    "lexical_declaration",
    "variable_declaration",
    "decorated_definition",
    "type_declaration",
];

/// Siblings allowed between a doc comment and its definition.
const SKIPPED_KINDS: &[&str] = &["attribute_item", "decorator"];

const COMMENT_KINDS: &[&str] = &["comment", "line_comment", "block_comment"];

/// Skeleton text for `file`, or its first lines when no skeleton is available.
///
/// Never fails: an unreadable file yields an empty string.
pub fn skeleton_or_fallback(file: &RepoFile, config: &ContextConfig) -> String {
    match extract_skeleton(&file.path, file.language, config) {
        Ok(skeleton) => skeleton.render(),
        Err(e) => {
            tracing::debug!("{}: using line fallback ({e})", file.relative_path);
            fallback_lines(&file.path, config.fallback_max_lines).unwrap_or_else(|e| {
                tracing::debug!("{}: fallback read failed ({e})", file.relative_path);
                String::new()
            })
        }
    }
}

/// Parse the file and collect its definitions.
pub fn extract_skeleton(
    path: &Path,
    language: Language,
    config: &ContextConfig,
) -> Result<Skeleton, SkeletonError> {
    let spec = query_table().get(language)?;
    let (source, truncated) = read_file_safe(path, Some(config.max_parse_bytes))
        .map_err(|source| SkeletonError::Read { path: path.to_path_buf(), source })?;
    if truncated {
        tracing::debug!("{}: parsing first {} bytes only", path.display(), config.max_parse_bytes);
    }
    extract_from_source(&source, language, spec, config.doc_preview_chars)
}

/// Extract definitions from in-memory source.
pub fn parse_skeleton(
    source: &str,
    language: Language,
    doc_preview_chars: usize,
) -> Result<Skeleton, SkeletonError> {
    let spec = query_table().get(language)?;
    extract_from_source(source, language, spec, doc_preview_chars)
}

fn extract_from_source(
    source: &str,
    language: Language,
    spec: &LanguageSpec,
    doc_preview_chars: usize,
) -> Result<Skeleton, SkeletonError> {
    let mut parser = Parser::new();
    parser.set_language(&spec.grammar).map_err(|_| SkeletonError::Parse(language))?;
    let tree = parser.parse(source, None).ok_or(SkeletonError::Parse(language))?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(SkeletonError::Parse(language));
    }

    let bytes = source.as_bytes();
    let mut found: Vec<(Node, DefinitionKind, String)> = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&spec.query, root, bytes);
    while let Some(m) = matches.next() {
        let mut name = None;
        let mut definition = None;
        for cap in m.captures {
            if spec.is_name(cap.index) {
                name = cap.node.utf8_text(bytes).ok().map(str::to_string);
            } else if let Some(kind) = spec.kind_for(cap.index) {
                definition = Some((cap.node, kind));
            }
        }
        if let (Some(name), Some((node, kind))) = (name, definition) {
            found.push((node, kind, name));
        }
    }

    found.sort_by_key(|(node, _, _)| (node.start_byte(), node.end_byte()));
    found.dedup_by_key(|(node, _, _)| node.id());
    if found.is_empty() {
        return Err(SkeletonError::NoDefinitions);
    }

    let mut consumed: HashSet<usize> = HashSet::new();
    let definitions = found
        .into_iter()
        .map(|(node, kind, name)| {
            let raw = match language {
                Language::Python => python_docstring(node, bytes)
                    .or_else(|| leading_comment(node, bytes, &mut consumed)),
                _ => leading_comment(node, bytes, &mut consumed),
            };
            let doc = raw.and_then(|text| doc_preview(&text, doc_preview_chars));
            Definition { kind, name, doc }
        })
        .collect();

    Ok(Skeleton { definitions })
}

/// First statement of the body when it is a bare string literal.
fn python_docstring(node: Node, source: &[u8]) -> Option<String> {
    let body = node.child_by_field_name("body")?;
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let string = first.named_child(0)?;
    if string.kind() != "string" {
        return None;
    }
    string.utf8_text(source).ok().map(str::to_string)
}

/// The run of comments directly above the definition, each used at most once.
fn leading_comment(node: Node, source: &[u8], consumed: &mut HashSet<usize>) -> Option<String> {
    let mut anchor = node;
    while let Some(parent) = anchor.parent() {
        if WRAPPER_KINDS.contains(&parent.kind()) {
            anchor = parent;
        } else {
            break;
        }
    }

    let mut top_row = anchor.start_position().row;
    let mut sibling = anchor.prev_sibling();
    while let Some(s) = sibling {
        if !SKIPPED_KINDS.contains(&s.kind()) {
            break;
        }
        top_row = s.start_position().row;
        sibling = s.prev_sibling();
    }

    let mut parts = Vec::new();
    while let Some(s) = sibling {
        if !COMMENT_KINDS.contains(&s.kind()) || consumed.contains(&s.id()) {
            break;
        }
        // A blank line ends the run.
        if s.end_position().row + 1 < top_row {
            break;
        }
        if let Ok(text) = s.utf8_text(source) {
            parts.push(text.to_string());
        }
        consumed.insert(s.id());
        top_row = s.start_position().row;
        sibling = s.prev_sibling();
    }

    if parts.is_empty() {
        return None;
    }
    parts.reverse();
    Some(parts.join("\n"))
}

/// Strip comment and quote markers, collapse whitespace, cap at `max_chars`.
pub fn doc_preview(raw: &str, max_chars: usize) -> Option<String> {
    let words: Vec<&str> = raw
        .lines()
        .map(strip_markers)
        .flat_map(str::split_whitespace)
        .collect();
    if words.is_empty() {
        return None;
    }
    let joined = words.join(" ");
    if joined.chars().count() > max_chars {
        let cut: String = joined.chars().take(max_chars).collect();
        Some(format!("{}...", cut.trim_end()))
    } else {
        Some(joined)
    }
}

fn strip_markers(line: &str) -> &str {
    let mut line = line.trim();
    for prefix in ["///", "//!", "//", "/**", "/*", "#"] {
        if let Some(rest) = line.strip_prefix(prefix) {
            line = rest;
            break;
        }
    }
    line = line.strip_suffix("*/").unwrap_or(line);
    line = line.trim_start_matches('*');

    // Python string literal prefixes and quotes.
    let unprefixed = line.trim_start_matches(|c: char| matches!(c, 'r' | 'R' | 'b' | 'B' | 'u' | 'U'));
    if unprefixed.starts_with('"') || unprefixed.starts_with('\'') {
        line = unprefixed;
    }
    line.trim_matches(|c: char| c == '"' || c == '\'').trim()
}

/// First `max_lines` lines of a file, verbatim.
pub fn fallback_lines(path: &Path, max_lines: usize) -> Result<String, SkeletonError> {
    let (text, _) = read_file_safe(path, Some(FALLBACK_READ_BYTES))
        .map_err(|source| SkeletonError::Read { path: path.to_path_buf(), source })?;
    Ok(first_lines(&text, max_lines))
}

/// First `max_lines` lines of `text`, keeping their line endings.
pub fn first_lines(text: &str, max_lines: usize) -> String {
    text.split_inclusive('\n').take(max_lines).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn render(source: &str, language: Language) -> String {
        parse_skeleton(source, language, 100).expect("skeleton").render()
    }

    #[test]
    fn python_docstrings_attach_to_their_definitions() {
        let source = r#"
class Greeter:
    """Says hello to people."""

    def greet(self, name):
        """Return a greeting."""
        return f"hi {name}"

def helper():
    return 1
"#;
        insta::assert_snapshot!(render(source, Language::Python), @r#"
        class Greeter
          """ Says hello to people. """
        function greet
          """ Return a greeting. """
        function helper
        "#);
    }

    #[test]
    fn leading_comments_bind_once() {
        let source = "// Adds numbers.\nfunction add(a, b) { return a + b; }\nfunction sub(a, b) { return a - b; }\n";
        assert_eq!(
            render(source, Language::JavaScript),
            "function add\n  \"\"\" Adds numbers. \"\"\"\nfunction sub"
        );
    }

    #[test]
    fn detached_comment_is_not_attached() {
        let source = "// License header.\n\nfunction add(a, b) { return a + b; }\n";
        assert_eq!(render(source, Language::JavaScript), "function add");
    }

    #[test]
    fn typescript_kinds() {
        let source = r#"
/** A shape. */
export interface Shape { area(): number; }
export class Square implements Shape {
  area() { return 1; }
}
export const make = () => new Square();
"#;
        assert_eq!(
            render(source, Language::TypeScript),
            "interface Shape\n  \"\"\" A shape. \"\"\"\nclass Square\nfunction area\nfunction make"
        );
    }

    #[test]
    fn rust_doc_comments_skip_attributes() {
        let source = "/// A point.\n#[derive(Debug)]\npub struct Point { x: i32 }\n\npub trait Shape {}\n\nfn origin() -> Point { Point { x: 0 } }\n";
        assert_eq!(
            render(source, Language::Rust),
            "class Point\n  \"\"\" A point. \"\"\"\ninterface Shape\nfunction origin"
        );
    }

    #[test]
    fn go_types_and_methods() {
        let source = "package main\n\ntype Server struct{}\n\ntype Handler interface{}\n\n// Start runs the server.\nfunc (s *Server) Start() {}\n\nfunc main() {}\n";
        assert_eq!(
            render(source, Language::Go),
            "class Server\ninterface Handler\nfunction Start\n  \"\"\" Start runs the server. \"\"\"\nfunction main"
        );
    }

    #[test]
    fn long_docs_are_truncated() {
        let doc = doc_preview(&format!("# {}", "word ".repeat(50)), 20).expect("doc");
        assert_eq!(doc, "word word word word...");
    }

    #[test]
    fn no_definitions_is_an_error() {
        assert!(matches!(
            parse_skeleton("x = 1\n", Language::Python, 100),
            Err(SkeletonError::NoDefinitions)
        ));
    }

    #[test]
    fn malformed_source_is_an_error() {
        assert!(matches!(
            parse_skeleton("def broken(:\n    pass\n", Language::Python, 100),
            Err(SkeletonError::Parse(Language::Python))
        ));
    }

    fn numbered_lines(n: usize) -> String {
        (1..=n).map(|i| format!("line {i}\n")).collect()
    }

    #[test]
    fn unsupported_language_falls_back_to_first_lines() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes.txt");
        let content = numbered_lines(150);
        fs::write(&path, &content).unwrap();

        let file = RepoFile::new(path, "notes.txt".to_string(), content.len() as u64);
        let out = skeleton_or_fallback(&file, &ContextConfig::default());
        assert_eq!(out, numbered_lines(100));
    }

    #[test]
    fn malformed_file_falls_back_to_first_lines() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.py");
        let content = format!("def broken(:\n{}", numbered_lines(120));
        fs::write(&path, &content).unwrap();

        let file = RepoFile::new(path, "broken.py".to_string(), content.len() as u64);
        let out = skeleton_or_fallback(&file, &ContextConfig::default());
        assert_eq!(out, first_lines(&content, 100));
        assert_eq!(out.lines().count(), 100);
    }

    #[test]
    fn short_file_fallback_is_whole_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Makefile");
        fs::write(&path, "all:\n\techo hi\n").unwrap();
        assert_eq!(fallback_lines(&path, 100).unwrap(), "all:\n\techo hi\n");
    }

    #[test]
    fn unreadable_file_yields_empty_contribution() {
        let file = RepoFile::new(PathBuf::from("/nonexistent/x.py"), "x.py".to_string(), 0);
        assert_eq!(skeleton_or_fallback(&file, &ContextConfig::default()), "");
    }
}
