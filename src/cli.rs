//! Helpers shared by the `pipe-ingest` and `pipe-ingest-par` binaries.

use std::fs::{self, File};
use std::io;
use std::path::Path;

/// Initialize `env_logger` at info level, or debug when `verbose`.
/// `RUST_LOG` still takes precedence.
pub fn setup_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Create the output file, creating missing parent directories first.
pub fn open_output(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    File::create(path)
}

/// The input list concatenated `times` times, in order.
pub fn repeat_inputs(inputs: &[String], times: usize) -> Vec<String> {
    std::iter::repeat_n(inputs.iter().cloned(), times)
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_open_output_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out/records.jsonl");
        let mut file = open_output(&path).unwrap();
        writeln!(file, "x").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_open_output_bare_file_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.jsonl");
        assert!(open_output(&path).is_ok());
    }

    #[test]
    fn test_open_output_fails_under_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        assert!(open_output(&blocker.join("out.jsonl")).is_err());
    }

    #[test]
    fn test_repeat_inputs() {
        let inputs = vec!["a".to_string(), "b".to_string()];
        assert_eq!(repeat_inputs(&inputs, 2), vec!["a", "b", "a", "b"]);
        assert!(repeat_inputs(&inputs, 0).is_empty());
    }
}
