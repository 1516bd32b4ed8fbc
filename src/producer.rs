//! Hand-off helpers for the external export producer.
//!
//! The producer is a separate automation process; it reports where it saved the export on its
//! standard output with a line like `[DOWNLOAD] saved to: /abs/path/file.xlsx (12345 bytes)`.

use std::path::{Component, Path, PathBuf};

const DOWNLOAD_MARKER: &str = "[DOWNLOAD] saved to:";

/// Find the export path reported in the producer's stdout.
///
/// Returns the path from the first marker line, without the trailing ` (<n> bytes)` suffix.
pub fn extract_download_path(stdout: &str) -> Option<PathBuf> {
    stdout.lines().map(str::trim).find_map(|line| {
        let rest = line.strip_prefix(DOWNLOAD_MARKER)?.trim();
        let rest = match rest.rfind(" (") {
            Some(idx) => rest[..idx].trim(),
            None => rest,
        };
        Some(PathBuf::from(rest))
    })
}

/// Whether `path` lives under `root` after both are made absolute and lexically normalized.
///
/// Relative paths are resolved against the current directory. Symlinks are not followed.
pub fn is_within(path: impl AsRef<Path>, root: impl AsRef<Path>) -> bool {
    match (absolute(path.as_ref()), absolute(root.as_ref())) {
        (Some(path), Some(root)) => path.starts_with(root),
        _ => false,
    }
}

fn absolute(path: &Path) -> Option<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_path_and_strips_size() {
        let stdout = "login ok\n  [DOWNLOAD] saved to: /tmp/dl/ventas.xlsx (12345 bytes)\n";
        assert_eq!(extract_download_path(stdout), Some(PathBuf::from("/tmp/dl/ventas.xlsx")));
    }

    #[test]
    fn extracts_path_without_size() {
        let stdout = "[DOWNLOAD] saved to: downloads/report.csv";
        assert_eq!(extract_download_path(stdout), Some(PathBuf::from("downloads/report.csv")));
    }

    #[test]
    fn no_marker_yields_none() {
        assert_eq!(extract_download_path("nothing here\n"), None);
    }

    #[test]
    fn containment_is_lexical() {
        assert!(is_within("/srv/automation/downloads/a.xlsx", "/srv/automation/downloads"));
        assert!(!is_within("/srv/automation/downloads/../data/erp.sqlite", "/srv/automation/downloads"));
        assert!(!is_within("/srv/automation/downloads-old/a.xlsx", "/srv/automation/downloads"));
    }
}
