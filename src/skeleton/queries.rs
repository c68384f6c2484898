//! Static grammar and query table for structural extraction.
//!
//! The table is built at most once and only read afterwards;
//! `ContextBuilder::assemble` forces it before starting its worker pools.
//! `Query` and `tree_sitter::Language` are `Sync`, so workers share it by
//! reference; each worker creates its own `Parser`.

use crate::domain::{DefinitionKind, Language};
use crate::error::SkeletonError;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tree_sitter::{Language as Grammar, Query};

static QUERY_TABLE: Lazy<QueryTable> = Lazy::new(QueryTable::build);

/// Languages with a structural query, in the order they are reported.
pub const STRUCTURAL_LANGUAGES: &[Language] = &[
    Language::Python,
    Language::JavaScript,
    Language::TypeScript,
    Language::Tsx,
    Language::Rust,
    Language::Go,
];

const PYTHON_QUERY: &str = r#"
(function_definition name: (identifier) @name) @definition.function
(class_definition name: (identifier) @name) @definition.class
"#;

const JAVASCRIPT_QUERY: &str = r#"
(function_declaration name: (identifier) @name) @definition.function
(generator_function_declaration name: (identifier) @name) @definition.function
(class_declaration name: (identifier) @name) @definition.class
(method_definition name: (property_identifier) @name) @definition.function
(variable_declarator
  name: (identifier) @name
  value: [(arrow_function) (function_expression)]) @definition.function
"#;

const TYPESCRIPT_QUERY: &str = r#"
(function_declaration name: (identifier) @name) @definition.function
(generator_function_declaration name: (identifier) @name) @definition.function
(class_declaration name: (type_identifier) @name) @definition.class
(abstract_class_declaration name: (type_identifier) @name) @definition.class
(interface_declaration name: (type_identifier) @name) @definition.interface
(method_definition name: (property_identifier) @name) @definition.function
(variable_declarator
  name: (identifier) @name
  value: [(arrow_function) (function_expression)]) @definition.function
"#;

const RUST_QUERY: &str = r#"
(function_item name: (identifier) @name) @definition.function
(function_signature_item name: (identifier) @name) @definition.function
(struct_item name: (type_identifier) @name) @definition.class
(enum_item name: (type_identifier) @name) @definition.class
(trait_item name: (type_identifier) @name) @definition.interface
"#;

const GO_QUERY: &str = r#"
(function_declaration name: (identifier) @name) @definition.function
(method_declaration name: (field_identifier) @name) @definition.function
(type_spec name: (type_identifier) @name type: (struct_type)) @definition.class
(type_spec name: (type_identifier) @name type: (interface_type)) @definition.interface
"#;

/// Grammar and query source for a language, or `None` when it has no
/// structural support.
fn grammar_for(language: Language) -> Option<(Grammar, &'static str)> {
    let entry: (Grammar, &'static str) = match language {
        Language::Python => (tree_sitter_python::LANGUAGE.into(), PYTHON_QUERY),
        Language::JavaScript => (tree_sitter_javascript::LANGUAGE.into(), JAVASCRIPT_QUERY),
        Language::TypeScript => {
            (tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(), TYPESCRIPT_QUERY)
        }
        Language::Tsx => (tree_sitter_typescript::LANGUAGE_TSX.into(), TYPESCRIPT_QUERY),
        Language::Rust => (tree_sitter_rust::LANGUAGE.into(), RUST_QUERY),
        Language::Go => (tree_sitter_go::LANGUAGE.into(), GO_QUERY),
        Language::Java | Language::C | Language::Cpp | Language::Unsupported => return None,
    };
    Some(entry)
}

/// A compiled structural query.
pub struct LanguageSpec {
    pub grammar: Grammar,
    pub query: Query,
    name_index: Option<u32>,
    /// Definition kind per capture index; `None` for non-definition captures.
    kinds: Vec<Option<DefinitionKind>>,
}

impl LanguageSpec {
    fn compile(grammar: Grammar, source: &str) -> Result<Self, tree_sitter::QueryError> {
        let query = Query::new(&grammar, source)?;
        let name_index = query.capture_index_for_name("name");
        let kinds = query
            .capture_names()
            .iter()
            .map(|name| name.strip_prefix("definition.").map(DefinitionKind::from_capture))
            .collect();
        Ok(Self { grammar, query, name_index, kinds })
    }

    pub fn is_name(&self, capture_index: u32) -> bool {
        self.name_index == Some(capture_index)
    }

    pub fn kind_for(&self, capture_index: u32) -> Option<DefinitionKind> {
        self.kinds.get(capture_index as usize).copied().flatten()
    }
}

pub struct QueryTable {
    entries: HashMap<Language, LanguageSpec>,
}

impl QueryTable {
    fn build() -> Self {
        let mut entries = HashMap::new();
        for &language in STRUCTURAL_LANGUAGES {
            let Some((grammar, source)) = grammar_for(language) else {
                continue;
            };
            match LanguageSpec::compile(grammar, source) {
                Ok(spec) => {
                    entries.insert(language, spec);
                }
                Err(e) => tracing::warn!("structural query for {language} failed to compile: {e}"),
            }
        }
        Self { entries }
    }

    pub fn get(&self, language: Language) -> Result<&LanguageSpec, SkeletonError> {
        if grammar_for(language).is_none() {
            return Err(SkeletonError::Unsupported(language));
        }
        self.entries.get(&language).ok_or(SkeletonError::QueryUnavailable(language))
    }

    /// Languages whose query compiled.
    pub fn available(&self) -> Vec<Language> {
        STRUCTURAL_LANGUAGES.iter().copied().filter(|l| self.entries.contains_key(l)).collect()
    }
}

/// The shared table, compiling it on first use.
pub fn query_table() -> &'static QueryTable {
    &QUERY_TABLE
}
