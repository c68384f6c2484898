//! Regex-based import extraction.
//!
//! Patterns are deliberately shallow: they find import statements, not
//! every way a module can be loaded. Anything they miss simply contributes
//! no edge.

use crate::domain::{Language, RepoFile};
use crate::error::ImportError;
use crate::utils::encoding::read_file_safe;
use once_cell::sync::Lazy;
use regex::Regex;

/// One import statement as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawImport {
    /// `from <dots><module> import <names>` or `import <module>` (level 0).
    Python { level: usize, module: String, names: Vec<String> },
    /// A JavaScript/TypeScript module specifier.
    Specifier(String),
    /// A Rust `mod name;` declaration.
    RustMod(String),
}

static PY_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*from[ \t]+(\.*)([\w.]*)[ \t]+import[ \t]+(\([^)]*\)|[^\n]+)").expect("valid python from-import regex")
});

static PY_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*import[ \t]+([\w.]+)").expect("valid python import regex"));

static JS_IMPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^[ \t]*import\s[^;'"]*?\bfrom\s*['"]([^'"\n]+)['"]"#).expect("valid import-from regex")
});

static JS_IMPORT_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^[ \t]*import\s*['"]([^'"\n]+)['"]"#).expect("valid bare import regex"));

static JS_EXPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^[ \t]*export\s[^;'"]*?\bfrom\s*['"]([^'"\n]+)['"]"#).expect("valid export-from regex")
});

static JS_REQUIRE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\brequire\s*\(\s*['"]([^'"\n]+)['"]\s*\)"#).expect("valid require regex"));

static JS_DYNAMIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bimport\s*\(\s*['"]([^'"\n]+)['"]\s*\)"#).expect("valid dynamic import regex"));

static RUST_MOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:pub(?:\([^)]*\))?[ \t]+)?mod[ \t]+([A-Za-z_][A-Za-z0-9_]*)[ \t]*;")
        .expect("valid mod declaration regex")
});

/// Read a file (up to `max_bytes`) and extract its imports.
pub fn file_imports(file: &RepoFile, max_bytes: usize) -> Result<Vec<RawImport>, ImportError> {
    if !file.language.has_import_patterns() {
        return Err(ImportError::Unsupported(file.language));
    }
    let (text, _) = read_file_safe(&file.path, Some(max_bytes))
        .map_err(|source| ImportError::Read { path: file.path.clone(), source })?;
    Ok(extract_imports(&text, file.language))
}

/// Import statements in `text`, in pattern order then source order.
pub fn extract_imports(text: &str, language: Language) -> Vec<RawImport> {
    match language {
        Language::Python => python_imports(text),
        Language::JavaScript | Language::TypeScript | Language::Tsx => js_imports(text),
        Language::Rust => RUST_MOD
            .captures_iter(text)
            .map(|c| RawImport::RustMod(c[1].to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

fn python_imports(text: &str) -> Vec<RawImport> {
    let mut out = Vec::new();
    for caps in PY_FROM.captures_iter(text) {
        out.push(RawImport::Python {
            level: caps[1].len(),
            module: caps[2].to_string(),
            names: imported_names(&caps[3]),
        });
    }
    for caps in PY_IMPORT.captures_iter(text) {
        out.push(RawImport::Python { level: 0, module: caps[1].to_string(), names: Vec::new() });
    }
    out
}

/// `a, b as c, (d,\n e)  # note` -> `[a, b, d, e]`
fn imported_names(raw: &str) -> Vec<String> {
    let raw = raw.split('#').next().unwrap_or("");
    raw.trim_matches(|c: char| c == '(' || c == ')' || c.is_whitespace())
        .split(',')
        .filter_map(|part| part.split_whitespace().next())
        .map(|name| name.trim_matches(|c: char| c == '(' || c == ')' || c == '\\'))
        .filter(|name| !name.is_empty() && *name != "*")
        .map(str::to_string)
        .collect()
}

fn js_imports(text: &str) -> Vec<RawImport> {
    [&JS_IMPORT_FROM, &JS_IMPORT_BARE, &JS_EXPORT_FROM, &JS_REQUIRE, &JS_DYNAMIC]
        .into_iter()
        .flat_map(|re| re.captures_iter(text).map(|c| RawImport::Specifier(c[1].to_string())))
        .collect()
}
