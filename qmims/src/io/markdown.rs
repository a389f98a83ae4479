//! Markdown file access and README discovery.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, instrument};

/// README file names recognized by [`find_readme`], in order of preference.
const README_NAMES: &[&str] = &[
    "readme.md",
    "readme.markdown",
    "readme",
    "readme.txt",
    "readme.rst",
];

/// Read a markdown file as UTF-8 text.
pub fn read_markdown(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

/// Write markdown text, creating parent directories as needed.
pub fn write_markdown(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

/// Find a README-like file in `dir`, matching names case-insensitively.
///
/// Returns `Ok(None)` when the directory holds no README. When several match
/// (e.g. `README.md` and `readme.txt`), the preferred extension wins, then the
/// lexicographically smallest name.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn find_readme(dir: &Path) -> Result<Option<PathBuf>> {
    let mut best: Option<(usize, String, PathBuf)> = None;
    for entry in fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))? {
        let entry = entry.context("read directory entry")?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(rank) = README_NAMES
            .iter()
            .position(|candidate| name.eq_ignore_ascii_case(candidate))
        else {
            continue;
        };
        if !entry.path().is_file() {
            continue;
        }
        let better = match &best {
            None => true,
            Some((best_rank, best_name, _)) => (rank, &name) < (*best_rank, best_name),
        };
        if better {
            best = Some((rank, name, entry.path()));
        }
    }
    let found = best.map(|(_, _, path)| path);
    debug!(found = ?found, "readme lookup finished");
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_readme_case_insensitively() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("ReadMe.MD"), "# hi\n").expect("write");
        fs::write(temp.path().join("main.rs"), "fn main() {}\n").expect("write");

        let found = find_readme(temp.path()).expect("scan");
        assert_eq!(found, Some(temp.path().join("ReadMe.MD")));
    }

    #[test]
    fn prefers_markdown_over_other_readmes() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("README.txt"), "plain\n").expect("write");
        fs::write(temp.path().join("README.md"), "# md\n").expect("write");

        let found = find_readme(temp.path()).expect("scan");
        assert_eq!(found, Some(temp.path().join("README.md")));
    }

    #[test]
    fn ignores_directories_and_similar_names() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir(temp.path().join("readme")).expect("mkdir");
        fs::write(temp.path().join("README-dev.md"), "x").expect("write");

        assert_eq!(find_readme(temp.path()).expect("scan"), None);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert!(find_readme(&temp.path().join("gone")).is_err());
    }

    #[test]
    fn write_then_read_markdown() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("docs").join("README.md");
        write_markdown(&path, "# Title\n").expect("write");
        assert_eq!(read_markdown(&path).expect("read"), "# Title\n");
        assert!(read_markdown(&temp.path().join("absent.md")).is_err());
    }
}
