use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @generates: Output path for a run artifact
    // @params: input_file, output_dir, suffix, extension
    pub fn artifact_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        suffix: &str,
        extension: &str,
    ) -> PathBuf {
        let stem = input_file.as_ref().file_stem().unwrap_or_default();

        let mut name = stem.to_string_lossy().to_string();
        name.push('.');
        name.push_str(suffix);
        name.push('.');
        name.push_str(extension);

        output_dir.as_ref().join(name)
    }

    /// Find files with a specific extension in a directory
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        let wanted = extension.trim_start_matches('.');

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext.to_string_lossy().eq_ignore_ascii_case(wanted) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        result.sort();
        Ok(result)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file, creating parent directories
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))
    }

    /// Write a string to a file atomically.
    ///
    /// The content lands in a temp file in the target directory first and is
    /// moved into place, so readers never observe a half-written artifact.
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let path = path.as_ref();
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        Self::ensure_dir(parent)?;

        let mut temp = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to create temp file in {:?}", parent))?;
        temp.write_all(content.as_bytes())
            .context("Failed to write temp file")?;
        temp.flush().context("Failed to flush temp file")?;

        temp.persist(path)
            .with_context(|| format!("Failed to move artifact into place: {:?}", path))?;
        Ok(())
    }

    /// Whether a file looks like a time-coded subtitle file
    pub fn is_subtitle_file<P: AsRef<Path>>(path: P) -> bool {
        let path = path.as_ref();

        if path
            .extension()
            .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case("srt"))
        {
            return true;
        }

        // No .srt extension: peek at the content for a timestamp arrow
        match fs::read_to_string(path) {
            Ok(content) => content.contains("-->"),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_artifactPath_shouldComposeNameFromStem() {
        let path = FileManager::artifact_path(
            "/videos/lesson01.de.srt",
            "/out",
            "vocabulary",
            "json",
        );
        assert_eq!(path, PathBuf::from("/out/lesson01.de.vocabulary.json"));
    }

    #[test]
    fn test_findFiles_shouldFilterByExtensionCaseInsensitive() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.srt"), "x").unwrap();
        fs::write(dir.path().join("b.SRT"), "x").unwrap();
        fs::write(dir.path().join("c.txt"), "x").unwrap();

        let found = FileManager::find_files(dir.path(), "srt").unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_writeAtomic_shouldCreateParentAndContent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("artifact.json");

        FileManager::write_atomic(&path, "{\"ok\":true}").unwrap();

        assert_eq!(FileManager::read_to_string(&path).unwrap(), "{\"ok\":true}");
    }

    #[test]
    fn test_writeAtomic_shouldReplaceExisting() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("artifact.json");

        FileManager::write_atomic(&path, "first").unwrap();
        FileManager::write_atomic(&path, "second").unwrap();

        assert_eq!(FileManager::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_isSubtitleFile_shouldDetectByExtensionOrContent() {
        let dir = tempdir().unwrap();

        let srt = dir.path().join("a.srt");
        fs::write(&srt, "anything").unwrap();
        assert!(FileManager::is_subtitle_file(&srt));

        let timed = dir.path().join("b.txt");
        fs::write(&timed, "1\n00:00:01,000 --> 00:00:02,000\nHi\n").unwrap();
        assert!(FileManager::is_subtitle_file(&timed));

        let plain = dir.path().join("c.txt");
        fs::write(&plain, "just text").unwrap();
        assert!(!FileManager::is_subtitle_file(&plain));
    }
}
