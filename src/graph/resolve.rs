//! Resolution of raw imports to files in the collected set.

use super::imports::RawImport;
use crate::domain::RepoFile;
use crate::utils::paths::normalize_lexically;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Suffixes tried after the exact path, each as `target + ext` then
/// `target/index + ext`.
pub const PROBE_EXTENSIONS: &[&str] = &[".py", ".js", ".ts", ".tsx", ".jsx", ".mjs", ".cjs"];

const JS_EMITTED_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs"];

/// Maps import statements to node indices of the collected files.
///
/// Probing only consults the collected set, never the disk, so ignored and
/// binary files can never become edge targets.
pub struct ImportResolver {
    index: HashMap<PathBuf, usize>,
    files: Vec<PathBuf>,
}

impl ImportResolver {
    pub fn new(files: &[RepoFile]) -> Self {
        let files: Vec<PathBuf> = files.iter().map(|f| normalize_lexically(&f.path)).collect();
        let index = files.iter().enumerate().map(|(i, p)| (p.clone(), i)).collect();
        Self { index, files }
    }

    /// Node indices that `import` (found in file `from`) refers to.
    pub fn resolve(&self, from: usize, import: &RawImport) -> Vec<usize> {
        let Some(dir) = self.files.get(from).and_then(|p| p.parent()) else {
            return Vec::new();
        };
        match import {
            RawImport::Python { level, module, names } => {
                self.resolve_python(dir, *level, module, names)
            }
            RawImport::Specifier(spec) => self.resolve_specifier(dir, spec).into_iter().collect(),
            RawImport::RustMod(name) => {
                self.resolve_rust_mod(&self.files[from], dir, name).into_iter().collect()
            }
        }
    }

    /// Relative imports only; level 0 is an absolute import and is dropped.
    fn resolve_python(
        &self,
        dir: &Path,
        level: usize,
        module: &str,
        names: &[String],
    ) -> Vec<usize> {
        if level == 0 {
            return Vec::new();
        }
        let mut package = dir.to_path_buf();
        for _ in 1..level {
            if !package.pop() {
                return Vec::new();
            }
        }

        let mut hits = Vec::new();
        let target = if module.is_empty() {
            hits.extend(self.lookup(&package.join("__init__.py")));
            package
        } else {
            let target = module.split('.').filter(|s| !s.is_empty()).fold(package, |p, s| p.join(s));
            hits.extend(self.probe(&target));
            target
        };
        // `from pkg import submodule`
        for name in names {
            hits.extend(self.probe(&target.join(name)));
        }
        hits
    }

    fn resolve_specifier(&self, dir: &Path, spec: &str) -> Option<usize> {
        let relative = spec == "."
            || spec == ".."
            || spec.starts_with("./")
            || spec.starts_with("../");
        if !relative {
            return None;
        }
        let target = normalize_lexically(&dir.join(spec));
        self.probe(&target).or_else(|| self.probe_typescript_source(&target))
    }

    /// `import './x.js'` in TypeScript refers to `x.ts` or `x.tsx`.
    fn probe_typescript_source(&self, target: &Path) -> Option<usize> {
        let ext = target.extension().and_then(|e| e.to_str())?;
        if !JS_EMITTED_EXTENSIONS.contains(&ext) {
            return None;
        }
        ["ts", "tsx"].iter().find_map(|ts| self.lookup(&target.with_extension(ts)))
    }

    fn resolve_rust_mod(&self, file: &Path, dir: &Path, name: &str) -> Option<usize> {
        let owns_dir = matches!(
            file.file_name().and_then(|n| n.to_str()),
            Some("lib.rs") | Some("main.rs") | Some("mod.rs")
        );
        let module_dir = if owns_dir {
            dir.to_path_buf()
        } else {
            let stem = file.file_stem()?;
            dir.join(stem)
        };
        self.lookup(&module_dir.join(format!("{name}.rs")))
            .or_else(|| self.lookup(&module_dir.join(name).join("mod.rs")))
    }

    /// Exact path, then each probe extension, then a Python package.
    pub fn probe(&self, target: &Path) -> Option<usize> {
        if let Some(hit) = self.lookup(target) {
            return Some(hit);
        }
        for ext in PROBE_EXTENSIONS {
            if let Some(hit) = self.lookup(&with_suffix(target, ext)) {
                return Some(hit);
            }
            if let Some(hit) = self.lookup(&with_suffix(&target.join("index"), ext)) {
                return Some(hit);
            }
        }
        self.lookup(&target.join("__init__.py"))
    }

    fn lookup(&self, path: &Path) -> Option<usize> {
        self.index.get(path).copied()
    }
}

/// Append `suffix` to the final component (`a/b` + `.py` -> `a/b.py`).
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(paths: &[&str]) -> Vec<RepoFile> {
        paths
            .iter()
            .map(|p| RepoFile::new(PathBuf::from(format!("/repo/{p}")), p.to_string(), 1))
            .collect()
    }

    fn index_of(files: &[RepoFile], rel: &str) -> usize {
        files.iter().position(|f| f.relative_path == rel).unwrap()
    }

    #[test]
    fn python_single_dot_is_current_package() {
        let set = files(&["pkg/a.py", "pkg/b.py"]);
        let resolver = ImportResolver::new(&set);
        let import = RawImport::Python { level: 1, module: "b".into(), names: vec!["x".into()] };
        assert_eq!(resolver.resolve(index_of(&set, "pkg/a.py"), &import), vec![1]);
    }

    #[test]
    fn python_parent_package_and_dotted_module() {
        let set = files(&["app/api/views.py", "app/core/models.py", "app/core/__init__.py"]);
        let resolver = ImportResolver::new(&set);
        let from = index_of(&set, "app/api/views.py");

        let module = RawImport::Python { level: 2, module: "core.models".into(), names: vec![] };
        assert_eq!(resolver.resolve(from, &module), vec![index_of(&set, "app/core/models.py")]);

        let package = RawImport::Python { level: 2, module: "core".into(), names: vec![] };
        assert_eq!(resolver.resolve(from, &package), vec![index_of(&set, "app/core/__init__.py")]);
    }

    #[test]
    fn python_from_dot_import_submodules() {
        let set = files(&["pkg/main.py", "pkg/utils.py", "pkg/models.py"]);
        let resolver = ImportResolver::new(&set);
        let import = RawImport::Python {
            level: 1,
            module: String::new(),
            names: vec!["utils".into(), "models".into(), "missing".into()],
        };
        assert_eq!(resolver.resolve(0, &import), vec![1, 2]);
    }

    #[test]
    fn python_absolute_and_overshooting_imports_are_dropped() {
        let set = files(&["a.py", "external_lib.py"]);
        let resolver = ImportResolver::new(&set);
        let absolute = RawImport::Python { level: 0, module: "external_lib".into(), names: vec![] };
        assert!(resolver.resolve(0, &absolute).is_empty());
        let too_far = RawImport::Python { level: 9, module: "x".into(), names: vec![] };
        assert!(resolver.resolve(0, &too_far).is_empty());
    }

    #[test]
    fn js_index_and_extension_probing() {
        let set = files(&["src/app.js", "src/lib/index.ts", "src/util.jsx", "src/esm.ts"]);
        let resolver = ImportResolver::new(&set);
        let from = index_of(&set, "src/app.js");
        let resolve = |s: &str| resolver.resolve(from, &RawImport::Specifier(s.into()));

        assert_eq!(resolve("./lib"), vec![index_of(&set, "src/lib/index.ts")]);
        assert_eq!(resolve("./util"), vec![index_of(&set, "src/util.jsx")]);
        assert_eq!(resolve("./esm.js"), vec![index_of(&set, "src/esm.ts")]);
        assert_eq!(resolve("../src/util.jsx"), vec![index_of(&set, "src/util.jsx")]);
        assert!(resolve("react").is_empty());
        assert!(resolve("./nope").is_empty());
    }

    #[test]
    fn rust_mod_resolution() {
        let set = files(&["src/lib.rs", "src/scan.rs", "src/scan/walk.rs", "src/graph/mod.rs"]);
        let resolver = ImportResolver::new(&set);
        let lib = index_of(&set, "src/lib.rs");
        let scan = index_of(&set, "src/scan.rs");

        assert_eq!(resolver.resolve(lib, &RawImport::RustMod("scan".into())), vec![scan]);
        assert_eq!(
            resolver.resolve(lib, &RawImport::RustMod("graph".into())),
            vec![index_of(&set, "src/graph/mod.rs")]
        );
        assert_eq!(
            resolver.resolve(scan, &RawImport::RustMod("walk".into())),
            vec![index_of(&set, "src/scan/walk.rs")]
        );
    }
}
