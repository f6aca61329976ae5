use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

/// Soak up all of stdin, then write it to `file` unless the file already
/// holds exactly that content.
pub fn sponge_command(file: &Path) -> Result<()> {
    let mut input = Vec::new();
    std::io::stdin()
        .read_to_end(&mut input)
        .context("failed to read stdin")?;
    write_if_changed(file, &input)?;
    Ok(())
}

/// Returns whether a write happened.
fn write_if_changed(path: &Path, data: &[u8]) -> Result<bool> {
    if std::fs::read(path).is_ok_and(|existing| existing == data) {
        debug!("no change: {}", path.display());
        return Ok(false);
    }
    debug!("changed: {}", path.display());
    std::fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        assert!(write_if_changed(&path, b"hello").unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[test]
    fn skips_identical_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, b"same").unwrap();
        assert!(!write_if_changed(&path, b"same").unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), b"same");
    }

    #[test]
    fn rewrites_changed_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, b"old").unwrap();
        assert!(write_if_changed(&path, b"new").unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.txt");
        assert!(write_if_changed(&path, b"data").is_err());
    }
}
