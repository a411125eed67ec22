//! Export of a document's raw text for a host save/download collaborator.

use std::fs;
use std::path::{Path, PathBuf};

/// Text plus the suggested file name handed to the save collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub content: String,
}

impl ExportedFile {
    pub(super) fn new(name: &str, content: &str) -> Self {
        Self {
            file_name: suggested_file_name(name),
            content: content.to_string(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }
}

/// Host-level save side effect.
pub trait ExportSink {
    /// Persist `file` somewhere the user can reach it.
    ///
    /// # Errors
    /// Returns an error if the host refuses the write.
    fn save(&mut self, file: &ExportedFile) -> std::io::Result<PathBuf>;
}

/// Saves exports into a directory, like a browser download folder.
#[derive(Debug, Clone)]
pub struct DirectoryExport {
    dir: PathBuf,
}

impl DirectoryExport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ExportSink for DirectoryExport {
    fn save(&mut self, file: &ExportedFile) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(&file.file_name);
        fs::write(&path, file.bytes())?;
        tracing::debug!(path = %path.display(), bytes = file.content.len(), "exported document");
        Ok(path)
    }
}

/// Turn a display name into a safe file name, adding `.md` when the name
/// carries no extension.
pub fn suggested_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') || c.is_control() { '-' } else { c })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        return "untitled.md".to_string();
    }
    if Path::new(cleaned).extension().is_some() {
        cleaned.to_string()
    } else {
        format!("{cleaned}.md")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggested_name_appends_md() {
        assert_eq!(suggested_file_name("Untitled-1"), "Untitled-1.md");
    }

    #[test]
    fn test_suggested_name_keeps_extension() {
        assert_eq!(suggested_file_name("notes.markdown"), "notes.markdown");
    }

    #[test]
    fn test_suggested_name_strips_path_separators() {
        assert_eq!(suggested_file_name("../etc/passwd"), "-etc-passwd.md");
    }

    #[test]
    fn test_suggested_name_for_blank() {
        assert_eq!(suggested_file_name("   "), "untitled.md");
    }

    #[test]
    fn test_directory_export_writes_content() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectoryExport::new(dir.path());
        let file = ExportedFile::new("draft", "# Draft\n");
        let path = sink.save(&file).unwrap();
        assert_eq!(path, dir.path().join("draft.md"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "# Draft\n");
    }
}
