//! Block formats of the assembled map.

use crate::domain::{ContextConfig, RepoFile};
use crate::skeleton::skeleton_or_fallback;
use crate::utils::encoding::read_file_safe;
use crate::utils::tokens::{truncate_to_bytes, TRUNCATION_MARKER};

pub fn header(dir_name: &str, total_files: usize) -> String {
    format!("# Repository Map: {dir_name}\nTotal Files: {total_files}\n\n")
}

pub fn full_block(relative_path: &str, score: f64, content: &str) -> String {
    format!("--- FILE: {relative_path} (Priority: {score:.4}) ---\n{content}\n--- END FILE ---\n\n")
}

pub fn skeleton_block(relative_path: &str, score: f64, skeleton: &str) -> String {
    format!("--- SKELETON: {relative_path} (Priority: {score:.4}) ---\n{skeleton}\n\n")
}

/// Full-content block for an essential file; empty when it cannot be read.
pub fn render_full(file: &RepoFile, score: f64, config: &ContextConfig) -> String {
    let cap = config.full_content_max_bytes;
    match read_file_safe(&file.path, Some(cap)) {
        Ok((content, truncated)) => {
            // Decoded text can be longer than the raw bytes (UTF-16 -> UTF-8).
            let mut content = truncate_to_bytes(&content, cap);
            if truncated && !content.ends_with(TRUNCATION_MARKER) {
                content.push_str(TRUNCATION_MARKER);
            }
            full_block(&file.relative_path, score, &content)
        }
        Err(e) => {
            tracing::debug!("{}: skipped ({e})", file.relative_path);
            String::new()
        }
    }
}

/// Skeleton block; empty when the skeleton is blank.
pub fn render_skeleton(file: &RepoFile, score: f64, config: &ContextConfig) -> String {
    let skeleton = skeleton_or_fallback(file, config);
    if skeleton.trim().is_empty() {
        return String::new();
    }
    skeleton_block(&file.relative_path, score, &skeleton)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn block_formats() {
        assert_eq!(header("demo", 3), "# Repository Map: demo\nTotal Files: 3\n\n");
        assert_eq!(
            full_block("README.md", 0.25, "hi"),
            "--- FILE: README.md (Priority: 0.2500) ---\nhi\n--- END FILE ---\n\n"
        );
        assert_eq!(
            skeleton_block("a.py", 1.0, "function f"),
            "--- SKELETON: a.py (Priority: 1.0000) ---\nfunction f\n\n"
        );
    }

    #[test]
    fn full_content_is_capped() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("README.md");
        fs::write(&path, "x".repeat(40)).unwrap();
        let file = RepoFile::new(path, "README.md".to_string(), 40);
        let config = ContextConfig { full_content_max_bytes: 10, ..ContextConfig::default() };

        let block = render_full(&file, 0.5, &config);
        assert!(block.contains(&format!("{}{TRUNCATION_MARKER}\n--- END FILE ---", "x".repeat(10))));
    }

    #[test]
    fn cut_utf16_file_is_marked() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("README.md");
        let mut bytes = vec![0xff, 0xfe];
        for unit in "readme line\n".repeat(2_000).encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let len = bytes.len() as u64;
        fs::write(&path, bytes).unwrap();
        let file = RepoFile::new(path, "README.md".to_string(), len);
        let config = ContextConfig { full_content_max_bytes: 1_000, ..ContextConfig::default() };

        let block = render_full(&file, 0.5, &config);
        assert!(block.starts_with("--- FILE: README.md (Priority: 0.5000) ---\nreadme line\n"));
        assert!(block.ends_with(&format!("{TRUNCATION_MARKER}\n--- END FILE ---\n\n")));
        assert_eq!(block.matches(TRUNCATION_MARKER).count(), 1);
    }

    #[test]
    fn content_at_cap_is_untouched() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("go.mod");
        fs::write(&path, "module x\n").unwrap();
        let file = RepoFile::new(path, "go.mod".to_string(), 9);
        let config = ContextConfig { full_content_max_bytes: 9, ..ContextConfig::default() };
        assert_eq!(
            render_full(&file, 1.0, &config),
            "--- FILE: go.mod (Priority: 1.0000) ---\nmodule x\n\n--- END FILE ---\n\n"
        );
    }

    #[test]
    fn blank_skeleton_renders_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty.txt");
        fs::write(&path, "\n\n").unwrap();
        let file = RepoFile::new(path, "empty.txt".to_string(), 2);
        assert_eq!(render_skeleton(&file, 1.0, &ContextConfig::default()), "");
    }
}
