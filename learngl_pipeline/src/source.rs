//! File: source.rs
//! Splits a single annotated shader file into vertex and fragment sources.
//!
//! A shader file looks like this:
//!
//! ```text
//! #shader vertex
//! #version 330 core
//! ...
//!
//! #shader fragment
//! #version 330 core
//! ...
//! ```
//!
//! Any line containing `#shader` is a marker line. If it also mentions `vertex` or `fragment`,
//! the lines after it go to that stage. Everything else is copied into the current stage as-is.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Token that makes a line a section marker.
pub const MARKER: &str = "#shader";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment
}

impl ShaderKind {
    pub const ALL: [ShaderKind; 2] = [ShaderKind::Vertex, ShaderKind::Fragment];

    /// The sub-token that selects this stage on a marker line.
    pub fn token(self) -> &'static str {
        match self {
            ShaderKind::Vertex => "vertex",
            ShaderKind::Fragment => "fragment"
        }
    }

    // Vertex is checked first, so a marker naming both stages selects vertex.
    fn from_marker(line: &str) -> Option<Self> {
        Self::ALL.iter()
            .copied()
            .find(|kind| line.contains(kind.token()))
    }
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// The two stage sources of a shader file. Owned by whoever asked for the split.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String
}

impl ShaderSources {
    pub fn get(&self, kind: ShaderKind) -> &str {
        match kind {
            ShaderKind::Vertex => &self.vertex,
            ShaderKind::Fragment => &self.fragment
        }
    }

    fn get_mut(&mut self, kind: ShaderKind) -> &mut String {
        match kind {
            ShaderKind::Vertex => &mut self.vertex,
            ShaderKind::Fragment => &mut self.fragment
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("error reading shader file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error
    },

    #[error("line {line} comes before any `{}` marker", MARKER)]
    Preamble { line: usize }
}

/// Splits `text` into its vertex and fragment sections.
///
/// Blank lines before the first marker are skipped, but any other content there is an error:
/// there's no stage for it to belong to. A marker that names neither stage leaves the current
/// stage alone. Empty sections are fine here; the driver will reject them when compiling.
pub fn split(text: &str) -> Result<ShaderSources, SourceError> {
    let mut sources = ShaderSources::default();
    let mut active: Option<ShaderKind> = None;

    for (n, line) in text.lines().enumerate() {
        if line.contains(MARKER) {
            match ShaderKind::from_marker(line) {
                Some(kind) => active = Some(kind),
                None => log::warn!(
                    "line {}: marker {:?} names no stage, staying in {}",
                    n + 1,
                    line.trim(),
                    active.map_or("none", ShaderKind::token)
                )
            }

            continue;
        }

        match active {
            Some(kind) => {
                let section = sources.get_mut(kind);
                section.push_str(line);
                section.push('\n');
            },

            None if line.trim().is_empty() => {},

            None => return Err(SourceError::Preamble { line: n + 1 })
        }
    }

    Ok(sources)
}

/// Reads the shader file at `path` and splits it.
pub fn load<P: AsRef<Path>>(path: P) -> Result<ShaderSources, SourceError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|source| SourceError::Io { path: path.to_path_buf(), source })?;

    log::debug!("read {} bytes of shader source from {}", text.len(), path.display());

    split(&text)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn splits_vertex_and_fragment_sections() {
        let text = "#shader vertex\nA\nB\n#shader fragment\nC\n";
        let sources = split(text).unwrap();

        assert_eq!(sources.vertex, "A\nB\n");
        assert_eq!(sources.fragment, "C\n");
    }

    #[test]
    fn missing_section_is_empty() {
        let sources = split("#shader fragment\nX").unwrap();

        assert_eq!(sources.vertex, "");
        assert_eq!(sources.fragment, "X\n");
    }

    #[test]
    fn empty_input_gives_empty_sections() {
        let sources = split("").unwrap();

        assert_eq!(sources, ShaderSources::default());
        assert_eq!(sources.get(ShaderKind::Vertex), "");
        assert_eq!(sources.get(ShaderKind::Fragment), "");
    }

    #[test]
    fn splitting_twice_gives_the_same_result() {
        let text = "#shader vertex\nvoid main() {}\n#shader fragment\nvoid main() {}\n";

        assert_eq!(split(text).unwrap(), split(text).unwrap());
    }

    #[test]
    fn unknown_marker_keeps_the_current_section() {
        let text = "#shader vertex\nA\n#shader geometry\nB\n#shader fragment\nC\n";
        let sources = split(text).unwrap();

        assert_eq!(sources.vertex, "A\nB\n");
        assert_eq!(sources.fragment, "C\n");
    }

    #[test]
    fn unknown_marker_before_any_section_still_rejects_content() {
        let err = split("#shader tessellation\nA\n").unwrap_err();

        match err {
            SourceError::Preamble { line } => assert_eq!(line, 2),
            e => panic!("unexpected error: {}", e)
        }
    }

    #[test]
    fn content_before_first_marker_is_rejected() {
        let err = split("\n  \nfloat x;\n#shader vertex\nA\n").unwrap_err();

        match err {
            SourceError::Preamble { line } => assert_eq!(line, 3),
            e => panic!("unexpected error: {}", e)
        }
    }

    #[test]
    fn blank_lines_before_first_marker_are_skipped() {
        let sources = split("\n\n#shader vertex\nA\n").unwrap();

        assert_eq!(sources.vertex, "A\n");
    }

    #[test]
    fn lines_are_copied_verbatim() {
        let text = "#shader vertex\n    gl_Position = position;   \n\n#shader fragment\n";
        let sources = split(text).unwrap();

        assert_eq!(sources.vertex, "    gl_Position = position;   \n\n");
        assert_eq!(sources.fragment, "");
    }

    #[test]
    fn marker_can_appear_anywhere_on_the_line() {
        let text = "// #shader vertex stage\nA\n  #shader   fragment\nB\n";
        let sources = split(text).unwrap();

        assert_eq!(sources.vertex, "A\n");
        assert_eq!(sources.fragment, "B\n");
    }

    #[test]
    fn sections_can_be_reopened() {
        let text = "#shader vertex\nA\n#shader fragment\nB\n#shader vertex\nC\n";
        let sources = split(text).unwrap();

        assert_eq!(sources.vertex, "A\nC\n");
        assert_eq!(sources.fragment, "B\n");
    }

    #[test]
    fn loads_shader_file() {
        let sources = load("src/test_shaders/basic.shader").unwrap();

        assert!(sources.vertex.starts_with("#version 330 core\n"));
        assert!(sources.vertex.contains("gl_Position"));
        assert!(sources.fragment.contains("u_Texture"));
        assert!(!sources.fragment.contains(MARKER));
    }

    #[test]
    fn unreadable_file_is_an_io_error() {
        let err = load("src/test_shaders/does_not_exist.shader").unwrap_err();

        assert!(matches!(err, SourceError::Io { .. }));
        assert!(err.to_string().contains("does_not_exist.shader"));
    }
}
