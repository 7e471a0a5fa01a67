//! Works out what kind of reads file a blob holds from its naming hints.

use crate::error::ReadsError;

pub const SUPPORTED_EXTENSIONS: [&str; 4] = [".fq", ".fastq", ".fq.gz", ".fastq.gz"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileKind {
    pub extension: &'static str,
    pub gzipped: bool,
}

/// Naming hints for one blob, in order of precedence.
#[derive(Debug, Clone, Copy)]
pub struct NameHints<'a> {
    pub node: &'a str,
    pub file_type: Option<&'a str>,
    pub handle_file_name: Option<&'a str>,
    pub node_file_name: &'a str,
}

/// Resolves the file kind from the first non-empty hint only. A first hint
/// with an unsupported extension fails without consulting later hints.
pub fn resolve(hints: NameHints<'_>) -> Result<FileKind, ReadsError> {
    let file_type = hints
        .file_type
        .filter(|value| !value.is_empty())
        .map(|value| {
            if value.starts_with('.') {
                value.to_string()
            } else {
                format!(".{value}")
            }
        });

    let candidate = file_type
        .as_deref()
        .or(hints.handle_file_name.filter(|value| !value.is_empty()))
        .or(Some(hints.node_file_name).filter(|value| !value.is_empty()));

    if let Some(kind) = candidate.and_then(match_extension) {
        return Ok(kind);
    }
    Err(ReadsError::InvalidFileKind {
        node: hints.node.to_string(),
        file_type,
        handle_file_name: hints.handle_file_name.map(str::to_string),
        node_file_name: hints.node_file_name.to_string(),
        accepted: SUPPORTED_EXTENSIONS.join(" "),
    })
}

fn match_extension(name: &str) -> Option<FileKind> {
    let lower = name.to_lowercase();
    SUPPORTED_EXTENSIONS
        .into_iter()
        .find(|ext| lower.ends_with(ext))
        .map(|extension| FileKind {
            extension,
            gzipped: extension.ends_with(".gz"),
        })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn hints<'a>(
        file_type: Option<&'a str>,
        handle_file_name: Option<&'a str>,
        node_file_name: &'a str,
    ) -> NameHints<'a> {
        NameHints {
            node: "node-1",
            file_type,
            handle_file_name,
            node_file_name,
        }
    }

    #[test]
    fn declared_type_is_normalized() {
        let kind = resolve(hints(Some("fastq"), None, "")).unwrap();
        assert_eq!(kind.extension, ".fastq");
        assert!(!kind.gzipped);

        let kind = resolve(hints(Some(".fq.gz"), None, "")).unwrap();
        assert_eq!(kind.extension, ".fq.gz");
        assert!(kind.gzipped);
    }

    #[test]
    fn handle_name_is_case_insensitive() {
        let kind = resolve(hints(Some(""), Some("test_rev.FQ"), "upload")).unwrap();
        assert_eq!(kind.extension, ".fq");
    }

    #[test]
    fn falls_through_empty_hints_to_node_name() {
        let kind = resolve(hints(None, Some(""), "reads.fastq.gz")).unwrap();
        assert_eq!(kind.extension, ".fastq.gz");
        assert!(kind.gzipped);
    }

    #[test]
    fn first_nonempty_hint_decides() {
        let a = resolve(hints(Some("fq"), Some("x.fastq.gz"), "y.bad")).unwrap();
        let b = resolve(hints(Some("fq"), Some("junk"), "")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn bad_first_hint_is_not_rescued_by_later_hints() {
        let err = resolve(hints(Some("xls"), Some("small.forward.fastq"), "a.fq")).unwrap_err();
        assert_matches!(
            err,
            ReadsError::InvalidFileKind { file_type: Some(ref t), .. } if t == ".xls"
        );

        let err = resolve(hints(None, Some("file.terrible"), "a.fq")).unwrap_err();
        assert_matches!(err, ReadsError::InvalidFileKind { .. });
    }

    #[test]
    fn all_empty_fails_with_diagnostics() {
        let err = resolve(hints(None, None, "")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("node-1"));
        assert!(message.contains(".fq .fastq .fq.gz .fastq.gz"));
    }
}
