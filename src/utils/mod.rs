//! Source-file loading for batch evaluation.

use std::fs;
use std::path::Path;

use anyhow::{bail, Result};

/// Read source fragments from files, one fragment per file, in the
/// order given.
pub fn read_sources(file_paths: &[String]) -> Result<Vec<String>> {
    file_paths.iter().map(|p| read_source(p)).collect()
}

/// Read a single source file. Supports .hs, .lhs, and files without
/// extension.
pub fn read_source(file_path: &str) -> Result<String> {
    let path = Path::new(file_path);

    if !path.exists() {
        bail!("source file '{}' does not exist", file_path);
    }
    if !path.is_file() {
        bail!("'{}' is not a file", file_path);
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "hs" | "lhs" | "" => fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read '{}': {}", file_path, e)),
        _ => {
            bail!(
                "unsupported source file type: .{}\nsupported: .hs, .lhs, and files without extension",
                extension
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_haskell_sources_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = dir.path().join("defs.hs");
        let second = dir.path().join("main.hs");
        fs::write(&first, "square x = x * x\n").expect("write defs");
        fs::write(&second, "square 7\n").expect("write main");

        let fragments = read_sources(&[
            first.to_string_lossy().into_owned(),
            second.to_string_lossy().into_owned(),
        ])
        .expect("both files load");
        assert_eq!(fragments, vec!["square x = x * x\n", "square 7\n"]);
    }

    #[test]
    fn rejects_unsupported_extensions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.py");
        fs::write(&path, "print('nope')\n").expect("write file");

        let err = read_source(&path.to_string_lossy()).expect_err("must be rejected");
        assert!(err.to_string().contains("unsupported source file type"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_source("/definitely/not/here.hs").is_err());
    }
}
