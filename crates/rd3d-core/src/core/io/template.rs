use crate::core::models::simulation::Directive;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("I/O error for '{path}': {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Keyword '{keyword}' not found in '{path}'", path = .path.display())]
    KeywordNotFound { keyword: String, path: PathBuf },
}

/// A line-oriented simulator input, kept line for line.
///
/// Lines retain their original terminators so that a document written back
/// is byte-identical apart from the lines that were patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateDocument {
    lines: Vec<String>,
}

impl TemplateDocument {
    pub fn parse(content: &str) -> Self {
        Self {
            lines: content.split_inclusive('\n').map(str::to_string).collect(),
        }
    }

    pub fn read_from_path(path: &Path) -> Result<Self, TemplateError> {
        let content = fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&content))
    }

    pub fn write_to_path(&self, path: &Path) -> Result<(), TemplateError> {
        fs::write(path, self.render()).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn render(&self) -> String {
        self.lines.concat()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterates over the lines without their terminators.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| strip_terminator(line).0)
    }

    /// Replaces the first line starting with `keyword`.
    ///
    /// Returns the index of the replaced line, or `None` when no line matches,
    /// in which case the document is unchanged. A commented-out directive
    /// (`# FLUX ...`) never matches.
    pub fn patch(&mut self, keyword: &str, replacement: &str) -> Option<usize> {
        let index = self.lines.iter().position(|line| line.starts_with(keyword))?;
        let (_, terminator) = strip_terminator(&self.lines[index]);
        let (body, _) = strip_terminator(replacement);
        self.lines[index] = format!("{}{}", body, terminator);
        Some(index)
    }
}

fn strip_terminator(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Rewrites the first line of the file at `path` that starts with `keyword`.
///
/// # Errors
///
/// Returns [`TemplateError::KeywordNotFound`] if no line starts with
/// `keyword`; the file is not touched in that case.
pub fn patch(path: &Path, keyword: &str, replacement: &str) -> Result<(), TemplateError> {
    let mut document = TemplateDocument::read_from_path(path)?;
    if document.patch(keyword, replacement).is_none() {
        return Err(TemplateError::KeywordNotFound {
            keyword: keyword.to_string(),
            path: path.to_path_buf(),
        });
    }
    document.write_to_path(path)
}

/// Applies each directive with its own read-modify-write cycle.
///
/// Stops at the first missing keyword; directives before it stay applied.
pub fn apply_directives(path: &Path, directives: &[Directive]) -> Result<(), TemplateError> {
    for directive in directives {
        tracing::debug!("Patching '{}' in {:?}", directive.keyword, path);
        patch(path, directive.keyword, &directive.line)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const TEMPLATE: &str = "\
##### Crystal
Crystal
Type Cuboid
DIMENSION 20 20 20
PIXELSPERMICRON 0.5
# FLUX 1e10 commented out
Beam
TYPE GAUSSIAN
FLUX 3.5e12
FLUX 9.9e9
ENERGY 12.66
";

    #[test]
    fn patch_replaces_exactly_first_matching_line() {
        let mut doc = TemplateDocument::parse(TEMPLATE);
        let index = doc.patch("FLUX", "FLUX 4.00e+12").unwrap();
        assert_eq!(index, 8);

        let expected = TEMPLATE.replace("FLUX 3.5e12\n", "FLUX 4.00e+12\n");
        assert_eq!(doc.render(), expected);
    }

    #[test]
    fn patch_ignores_commented_directives() {
        let mut doc = TemplateDocument::parse(TEMPLATE);
        doc.patch("FLUX", "FLUX 1.00e+12").unwrap();
        assert!(doc.render().contains("# FLUX 1e10 commented out\n"));
    }

    #[test]
    fn patch_preserves_crlf_and_missing_final_newline() {
        let mut doc = TemplateDocument::parse("FLUX 1\r\nENERGY 12");
        doc.patch("FLUX", "FLUX 2\n").unwrap();
        doc.patch("ENERGY", "ENERGY 13").unwrap();
        assert_eq!(doc.render(), "FLUX 2\r\nENERGY 13");
    }

    #[test]
    fn file_patch_round_trips_and_leaves_other_lines_byte_identical() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("input.txt");
        fs::write(&path, TEMPLATE).unwrap();

        patch(&path, "DIMENSION", "DIMENSION 1.0 52.0 1.0").unwrap();

        let patched = fs::read_to_string(&path).unwrap();
        let before: Vec<&str> = TEMPLATE.lines().collect();
        let after: Vec<&str> = patched.lines().collect();
        assert_eq!(before.len(), after.len());
        let changed: Vec<usize> = (0..before.len()).filter(|&i| before[i] != after[i]).collect();
        assert_eq!(changed, vec![3]);
        assert_eq!(after[3], "DIMENSION 1.0 52.0 1.0");
    }

    #[test]
    fn missing_keyword_fails_and_leaves_file_unmodified() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("input.txt");
        fs::write(&path, TEMPLATE).unwrap();

        let err = patch(&path, "STARTOFFSET", "STARTOFFSET 0 0 0").unwrap_err();
        assert!(err.to_string().contains("'STARTOFFSET'"));
        match err {
            TemplateError::KeywordNotFound { keyword, .. } => assert_eq!(keyword, "STARTOFFSET"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), TEMPLATE);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let result = patch(&dir.path().join("absent.txt"), "FLUX", "FLUX 1");
        assert!(matches!(result, Err(TemplateError::Io { .. })));
    }

    #[test]
    fn apply_directives_patches_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("input.txt");
        fs::write(&path, TEMPLATE).unwrap();

        let directives = vec![
            Directive::new("ENERGY", "ENERGY 13.00"),
            Directive::new("PIXELSPERMICRON", "PIXELSPERMICRON 2.0"),
        ];
        apply_directives(&path, &directives).unwrap();

        let doc = TemplateDocument::read_from_path(&path).unwrap();
        let lines: Vec<&str> = doc.lines().collect();
        assert!(lines.contains(&"ENERGY 13.00"));
        assert!(lines.contains(&"PIXELSPERMICRON 2.0"));
        assert_eq!(doc.len(), TEMPLATE.lines().count());
    }
}
