use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::ReadsError;

const DOWNLOAD_DIR: &str = "downloads";

/// Which set of reads a local FASTQ file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadsDirection {
    Forward,
    Reverse,
    Interleaved,
    Single,
}

impl ReadsDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadsDirection::Forward => "fwd",
            ReadsDirection::Reverse => "rev",
            ReadsDirection::Interleaved => "inter",
            ReadsDirection::Single => "sing",
        }
    }
}

/// Scratch area layout. Raw blob downloads are kept in their own
/// subdirectory so handle-id names never collide with generated outputs.
#[derive(Debug, Clone)]
pub struct Scratch {
    root: Utf8PathBuf,
}

impl Scratch {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn download_dir(&self) -> Utf8PathBuf {
        self.root.join(DOWNLOAD_DIR)
    }

    pub fn download_path(&self, handle_id: &str, gzipped: bool) -> Utf8PathBuf {
        let name = if gzipped {
            format!("{handle_id}.gz")
        } else {
            handle_id.to_string()
        };
        self.download_dir().join(name)
    }

    /// Uncompressed intermediate file produced while transforming a library.
    pub fn work_path(&self, prefix: &str, direction: ReadsDirection) -> Utf8PathBuf {
        self.download_dir()
            .join(format!("{prefix}.{}.fastq", direction.as_str()))
    }

    pub fn output_path(&self, prefix: &str, direction: ReadsDirection, gzipped: bool) -> Utf8PathBuf {
        let suffix = if gzipped { ".gz" } else { "" };
        self.root
            .join(format!("{prefix}.{}.fastq{suffix}", direction.as_str()))
    }

    pub fn ensure_dirs(&self) -> Result<(), ReadsError> {
        fs::create_dir_all(self.download_dir().as_std_path())
            .map_err(|err| ReadsError::Filesystem(format!("create {}: {err}", self.root)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let scratch = Scratch::new(Utf8PathBuf::from("/tmp/scratch"));

        assert!(
            scratch
                .download_path("abc-123", true)
                .ends_with("downloads/abc-123.gz")
        );
        assert!(scratch.download_path("abc-123", false).ends_with("downloads/abc-123"));
        assert!(
            scratch
                .work_path("frbasic", ReadsDirection::Interleaved)
                .ends_with("downloads/frbasic.inter.fastq")
        );
        assert_eq!(
            scratch.output_path("frbasic", ReadsDirection::Forward, true),
            Utf8PathBuf::from("/tmp/scratch/frbasic.fwd.fastq.gz")
        );
        assert_eq!(
            scratch.output_path("frbasic", ReadsDirection::Single, false),
            Utf8PathBuf::from("/tmp/scratch/frbasic.sing.fastq")
        );
    }
}
