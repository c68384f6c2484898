//! Core data types shared by the scanner, extractor, ranker and assembler.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Source languages known to the extractor and the import resolver.
///
/// Languages without a structural query (`Java`, `C`, `Cpp`) and
/// `Unsupported` are routed straight to the line-based fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Rust,
    Go,
    Java,
    C,
    Cpp,
    Unsupported,
}

impl Language {
    /// Map a file path to its language by extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
        Self::from_extension(&ext)
    }

    /// Map a bare extension (with or without the leading dot) to a language.
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.') {
            "py" | "pyi" => Language::Python,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "mts" | "cts" => Language::TypeScript,
            "tsx" => Language::Tsx,
            "rs" => Language::Rust,
            "go" => Language::Go,
            "java" => Language::Java,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" => Language::Cpp,
            _ => Language::Unsupported,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Unsupported => "unknown",
        }
    }

    /// Whether import statements of this language are scanned for edges.
    pub fn has_import_patterns(self) -> bool {
        matches!(
            self,
            Language::Python
                | Language::JavaScript
                | Language::TypeScript
                | Language::Tsx
                | Language::Rust
        )
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file selected for the build. Immutable once collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoFile {
    /// Absolute path, the identity of the file.
    pub path: PathBuf,
    /// Path relative to the scan root, always with forward slashes.
    pub relative_path: String,
    pub language: Language,
    pub size_bytes: u64,
}

impl RepoFile {
    pub fn new(path: PathBuf, relative_path: String, size_bytes: u64) -> Self {
        let language = Language::from_path(&path);
        Self { path, relative_path, language, size_bytes }
    }

    /// Lowercased base name, used for the essential-file whitelist.
    pub fn file_name_lower(&self) -> String {
        self.path.file_name().and_then(|n| n.to_str()).unwrap_or("").to_lowercase()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    Function,
    Class,
    Interface,
    Unknown,
}

impl DefinitionKind {
    /// Parse the suffix of a `@definition.<kind>` capture name.
    pub fn from_capture(suffix: &str) -> Self {
        match suffix {
            "function" | "method" => DefinitionKind::Function,
            "class" | "struct" | "enum" => DefinitionKind::Class,
            "interface" | "trait" => DefinitionKind::Interface,
            _ => DefinitionKind::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DefinitionKind::Function => "function",
            DefinitionKind::Class => "class",
            DefinitionKind::Interface => "interface",
            DefinitionKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub kind: DefinitionKind,
    pub name: String,
    /// Truncated preview of the attached docstring or leading comment.
    pub doc: Option<String>,
}

/// Top-level definitions of one file, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Skeleton {
    pub definitions: Vec<Definition>,
}

impl Skeleton {
    /// Render as `<kind> <name>` lines with an indented doc line when present.
    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.definitions.len());
        for def in &self.definitions {
            let mut line = format!("{} {}", def.kind, def.name);
            if let Some(doc) = &def.doc {
                line.push_str(&format!("\n  \"\"\" {} \"\"\"", doc));
            }
            lines.push(line);
        }
        lines.join("\n")
    }
}

/// Tunables for one build. Every field has a default, so partial config
/// files are fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    #[serde(deserialize_with = "deserialize_string_list")]
    pub ignored_dirs: Vec<String>,
    #[serde(deserialize_with = "deserialize_extension_list")]
    pub ignored_extensions: Vec<String>,
    #[serde(deserialize_with = "deserialize_lowercase_list")]
    pub ignored_files: Vec<String>,
    #[serde(deserialize_with = "deserialize_string_list")]
    pub exclude_globs: Vec<String>,
    #[serde(deserialize_with = "deserialize_lowercase_list")]
    pub essential_files: Vec<String>,
    pub full_content_max_bytes: usize,
    pub fallback_max_lines: usize,
    pub max_parse_bytes: usize,
    pub doc_preview_chars: usize,
    pub essentials_workers: usize,
    pub skeleton_workers: usize,
    pub respect_gitignore: bool,
    pub use_git_index: bool,
    pub skip_binary: bool,
    pub default_max_tokens: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            ignored_dirs: to_strings(DEFAULT_IGNORED_DIRS),
            ignored_extensions: to_strings(DEFAULT_IGNORED_EXTENSIONS),
            ignored_files: to_strings(DEFAULT_IGNORED_FILES),
            exclude_globs: Vec::new(),
            essential_files: to_strings(DEFAULT_ESSENTIAL_FILES),
            full_content_max_bytes: 15_000,
            fallback_max_lines: 100,
            max_parse_bytes: 1_048_576,
            doc_preview_chars: 100,
            essentials_workers: 8,
            skeleton_workers: 10,
            respect_gitignore: true,
            use_git_index: true,
            skip_binary: true,
            default_max_tokens: 128_000,
        }
    }
}

impl ContextConfig {
    pub fn is_essential(&self, file: &RepoFile) -> bool {
        let name = file.file_name_lower();
        self.essential_files.iter().any(|e| *e == name)
    }
}

pub const DEFAULT_IGNORED_DIRS: &[&str] = &[
    "node_modules",
    "dist",
    "build",
    "venv",
    ".venv",
    "__pycache__",
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vscode",
    ".repo_cache",
    ".pytest_cache",
    ".mypy_cache",
    ".tox",
    ".eggs",
    "coverage",
    "site-packages",
    "target",
    "bin",
    "obj",
];

pub const DEFAULT_IGNORED_EXTENSIONS: &[&str] = &[
    ".lock", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico", ".eot", ".ttf", ".woff", ".woff2",
    ".mp4", ".mp3", ".pdf", ".zip", ".tar", ".gz", ".pyc", ".class", ".exe", ".dll", ".bin", ".so",
    ".dylib", ".jar", ".war", ".ear", ".psd", ".ai", ".sketch",
];

pub const DEFAULT_IGNORED_FILES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "poetry.lock",
    "pipfile.lock",
    "cargo.lock",
    "gemfile.lock",
    "composer.lock",
    "mix.lock",
    "go.sum",
];

pub const DEFAULT_ESSENTIAL_FILES: &[&str] = &[
    "readme.md",
    "readme.rst",
    "readme.txt",
    "readme",
    "package.json",
    "requirements.txt",
    "pyproject.toml",
    "setup.py",
    "dockerfile",
    "containerfile",
    "cargo.toml",
    "go.mod",
];

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

fn split_list(raw: StringOrList) -> Vec<String> {
    let items = match raw {
        StringOrList::One(s) => s.split(',').map(str::to_string).collect(),
        StringOrList::Many(v) => v,
    };
    items.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
}

/// Accepts `"a, b"` or `["a", "b"]`.
fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(split_list(StringOrList::deserialize(deserializer)?))
}

fn deserialize_lowercase_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_string_list(deserializer)?.into_iter().map(|s| s.to_lowercase()).collect())
}

/// Like [`deserialize_string_list`] but normalizes to `.ext` in lowercase.
fn deserialize_extension_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_string_list(deserializer)?
        .into_iter()
        .map(|s| {
            let lower = s.to_lowercase();
            if lower.starts_with('.') {
                lower
            } else {
                format!(".{lower}")
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_from_extension() {
        assert_eq!(Language::from_path(Path::new("a/b.py")), Language::Python);
        assert_eq!(Language::from_path(Path::new("x.TSX")), Language::Tsx);
        assert_eq!(Language::from_path(Path::new("lib.rs")), Language::Rust);
        assert_eq!(Language::from_path(Path::new("Main.java")), Language::Java);
        assert_eq!(Language::from_path(Path::new("README")), Language::Unsupported);
        assert_eq!(Language::from_path(Path::new("notes.md")), Language::Unsupported);
    }

    #[test]
    fn skeleton_render_places_doc_under_definition() {
        let skeleton = Skeleton {
            definitions: vec![
                Definition {
                    kind: DefinitionKind::Class,
                    name: "Parser".to_string(),
                    doc: Some("Parses things.".to_string()),
                },
                Definition { kind: DefinitionKind::Function, name: "run".to_string(), doc: None },
            ],
        };
        assert_eq!(skeleton.render(), "class Parser\n  \"\"\" Parses things. \"\"\"\nfunction run");
    }

    #[test]
    fn essential_match_is_case_insensitive() {
        let cfg = ContextConfig::default();
        let file = RepoFile::new(PathBuf::from("/r/README.md"), "README.md".to_string(), 10);
        assert!(cfg.is_essential(&file));
        let other = RepoFile::new(PathBuf::from("/r/src/main.py"), "src/main.py".to_string(), 10);
        assert!(!cfg.is_essential(&other));
    }
}
