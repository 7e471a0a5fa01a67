use std::collections::{BTreeMap, BTreeSet};

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::blobstore::BlobStoreClient;
use crate::compression;
use crate::domain::{ObjectName, TriState, WorkspaceName};
use crate::download::{self, DownloadedReads};
use crate::error::ReadsError;
use crate::fastq;
use crate::fs_util;
use crate::library::{ReadsFile, ReadsLayout, ReadsLibrary};
use crate::scratch::{ReadsDirection, Scratch};
use crate::workspace::WorkspaceClient;

pub const PARAM_GZIP: &str = "gzip";
pub const PARAM_INTERLEAVED: &str = "interleaved";

/// Request as received from callers; literals are checked by [`ConvertRequest::validate`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvertRequest {
    #[serde(default)]
    pub workspace_name: String,
    #[serde(default)]
    pub read_libraries: Vec<String>,
    #[serde(default)]
    pub gzip: Option<String>,
    #[serde(default)]
    pub interleaved: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub workspace: WorkspaceName,
    pub libraries: BTreeSet<ObjectName>,
    pub gzip: TriState,
    pub interleaved: TriState,
}

impl ConvertRequest {
    /// Checks names and flags. Duplicate library names collapse into one.
    pub fn validate(&self) -> Result<ValidatedRequest, ReadsError> {
        let workspace: WorkspaceName = self.workspace_name.parse()?;
        if self.read_libraries.is_empty() {
            return Err(ReadsError::NoLibraries);
        }
        let libraries = self
            .read_libraries
            .iter()
            .map(|name| name.parse::<ObjectName>())
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(ValidatedRequest {
            workspace,
            libraries,
            gzip: TriState::from_param(PARAM_GZIP, self.gzip.as_deref())?,
            interleaved: TriState::from_param(PARAM_INTERLEAVED, self.interleaved.as_deref())?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReadsFiles {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fwd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fwd_gz: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rev_gz: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inter_gz: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sing_gz: Option<bool>,
}

impl ReadsFiles {
    fn set(&mut self, direction: ReadsDirection, path: &Utf8Path, gzipped: bool) {
        let (slot, flag) = match direction {
            ReadsDirection::Forward => (&mut self.fwd, &mut self.fwd_gz),
            ReadsDirection::Reverse => (&mut self.rev, &mut self.rev_gz),
            ReadsDirection::Interleaved => (&mut self.inter, &mut self.inter_gz),
            ReadsDirection::Single => (&mut self.sing, &mut self.sing_gz),
        };
        *slot = Some(path.to_string());
        *flag = Some(gzipped);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertedLibrary {
    pub files: ReadsFiles,
    #[serde(rename = "ref")]
    pub reference: String,
    pub single_genome: TriState,
    pub read_orientation_outward: TriState,
    pub sequencing_tech: Option<Value>,
    pub strain: Option<Value>,
    pub source: Option<Value>,
    pub insert_size_mean: Option<Value>,
    pub insert_size_std_dev: Option<Value>,
    pub read_count: Option<Value>,
    pub read_size: Option<Value>,
    pub gc_content: Option<Value>,
}

impl ConvertedLibrary {
    fn new(library: ReadsLibrary, files: ReadsFiles) -> Self {
        let metadata = library.metadata;
        Self {
            files,
            reference: library.reference,
            single_genome: metadata.single_genome,
            read_orientation_outward: metadata.read_orientation_outward,
            sequencing_tech: metadata.sequencing_tech,
            strain: metadata.strain,
            source: metadata.source,
            insert_size_mean: metadata.insert_size_mean,
            insert_size_std_dev: metadata.insert_size_std_dev,
            read_count: metadata.read_count,
            read_size: metadata.read_size,
            gc_content: metadata.gc_content,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversionOutput {
    pub files: BTreeMap<String, ConvertedLibrary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResult {
    pub state: String,
    pub message: String,
    pub version: String,
    pub git_url: String,
    pub git_commit_hash: String,
}

/// Service health; needs no configuration or remote access. The commit hash
/// is taken from `GIT_COMMIT_HASH` at build time and is empty when unset.
pub fn status() -> StatusResult {
    StatusResult {
        state: "OK".to_string(),
        message: String::new(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_url: env!("CARGO_PKG_REPOSITORY").to_string(),
        git_commit_hash: option_env!("GIT_COMMIT_HASH").unwrap_or_default().to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Clone)]
pub struct App<W: WorkspaceClient, B: BlobStoreClient> {
    scratch: Scratch,
    workspace: W,
    blobs: B,
}

impl<W: WorkspaceClient, B: BlobStoreClient> App<W, B> {
    pub fn new(scratch: Scratch, workspace: W, blobs: B) -> Self {
        Self {
            scratch,
            workspace,
            blobs,
        }
    }

    /// Converts every requested library or none: the first failure aborts
    /// the whole request.
    pub fn convert(
        &self,
        request: &ConvertRequest,
        token: &str,
        sink: &dyn ProgressSink,
    ) -> Result<ConversionOutput, ReadsError> {
        let request = request.validate()?;
        let refs = request
            .libraries
            .iter()
            .map(|name| name.reference_in(&request.workspace))
            .collect::<Vec<_>>();

        sink.event(ProgressEvent {
            message: format!("phase=Resolve; fetching {} reads objects", refs.len()),
        });
        tracing::info!(workspace = %request.workspace, count = refs.len(), "fetching reads objects");
        let objects = self.workspace.get_objects(&refs, token)?;
        if objects.len() != refs.len() {
            return Err(ReadsError::WorkspaceHttp(format!(
                "requested {} objects but received {}",
                refs.len(),
                objects.len()
            )));
        }

        let libraries = request
            .libraries
            .iter()
            .zip(objects)
            .map(|(name, object)| Ok((name, ReadsLibrary::from_object(object)?)))
            .collect::<Result<Vec<_>, ReadsError>>()?;

        self.scratch.ensure_dirs()?;
        let mut output = ConversionOutput::default();
        for (name, library) in libraries {
            sink.event(ProgressEvent {
                message: format!("phase=Convert; {name} ({}, {})", library.reference, library.kind),
            });
            tracing::info!(library = %name, reference = %library.reference, kind = %library.kind, "converting reads library");
            let files = self.convert_library(name, &library, &request, token)?;
            output
                .files
                .insert(name.to_string(), ConvertedLibrary::new(library, files));
        }
        Ok(output)
    }

    fn convert_library(
        &self,
        name: &ObjectName,
        library: &ReadsLibrary,
        request: &ValidatedRequest,
        token: &str,
    ) -> Result<ReadsFiles, ReadsError> {
        let prefix = name.as_str();
        let gzip = request.gzip;
        let mut files = ReadsFiles::default();

        match &library.layout {
            ReadsLayout::Single(file) => {
                let raw = self.fetch(library, file, token)?;
                let (path, gz) = self.finish(&raw.path, raw.gzipped, gzip, prefix, ReadsDirection::Single)?;
                files.set(ReadsDirection::Single, &path, gz);
            }
            ReadsLayout::Split { forward, reverse } if request.interleaved == TriState::True => {
                let raw = self.fetch(library, forward, token)?;
                let fwd = self.plain(raw, prefix, ReadsDirection::Forward)?;
                let raw = self.fetch(library, reverse, token)?;
                let rev = self.plain(raw, prefix, ReadsDirection::Reverse)?;

                let merged = self.scratch.work_path(prefix, ReadsDirection::Interleaved);
                tracing::debug!(%fwd, %rev, %merged, "interleaving reads");
                fastq::interleave(&fwd, &rev, &merged)?;
                fs_util::remove_file(&fwd)?;
                fs_util::remove_file(&rev)?;

                let (path, gz) = self.finish(&merged, false, gzip, prefix, ReadsDirection::Interleaved)?;
                files.set(ReadsDirection::Interleaved, &path, gz);
            }
            ReadsLayout::Split { forward, reverse } => {
                for (file, direction) in [
                    (forward, ReadsDirection::Forward),
                    (reverse, ReadsDirection::Reverse),
                ] {
                    let raw = self.fetch(library, file, token)?;
                    let (path, gz) = self.finish(&raw.path, raw.gzipped, gzip, prefix, direction)?;
                    files.set(direction, &path, gz);
                }
            }
            ReadsLayout::Interleaved(file) if request.interleaved == TriState::False => {
                let raw = self.fetch(library, file, token)?;
                let source = self.plain(raw, prefix, ReadsDirection::Interleaved)?;
                let fwd = self.scratch.work_path(prefix, ReadsDirection::Forward);
                let rev = self.scratch.work_path(prefix, ReadsDirection::Reverse);
                tracing::debug!(%source, %fwd, %rev, "deinterleaving reads");
                fastq::deinterleave(&source, &fwd, &rev)?;
                fs_util::remove_file(&source)?;

                for (path, direction) in [(fwd, ReadsDirection::Forward), (rev, ReadsDirection::Reverse)] {
                    let (path, gz) = self.finish(&path, false, gzip, prefix, direction)?;
                    files.set(direction, &path, gz);
                }
            }
            ReadsLayout::Interleaved(file) => {
                let raw = self.fetch(library, file, token)?;
                let (path, gz) =
                    self.finish(&raw.path, raw.gzipped, gzip, prefix, ReadsDirection::Interleaved)?;
                files.set(ReadsDirection::Interleaved, &path, gz);
            }
        }
        Ok(files)
    }

    fn fetch(
        &self,
        library: &ReadsLibrary,
        file: &ReadsFile,
        token: &str,
    ) -> Result<DownloadedReads, ReadsError> {
        download::download_reads(&self.blobs, &self.scratch, token, file).map_err(|err| {
            ReadsError::Download {
                reference: library.reference.clone(),
                name: library.name.clone(),
                node: file.handle.id.clone(),
                source: Box::new(err),
            }
        })
    }

    /// Moves or gunzips a download into an uncompressed per-library work file.
    fn plain(
        &self,
        raw: DownloadedReads,
        prefix: &str,
        direction: ReadsDirection,
    ) -> Result<Utf8PathBuf, ReadsError> {
        let target = self.scratch.work_path(prefix, direction);
        let (path, _) = compression::normalize(&raw.path, TriState::False, raw.gzipped, |_| target)?;
        Ok(path)
    }

    fn finish(
        &self,
        current: &Utf8Path,
        gzipped: bool,
        requested: TriState,
        prefix: &str,
        direction: ReadsDirection,
    ) -> Result<(Utf8PathBuf, bool), ReadsError> {
        compression::normalize(current, requested, gzipped, |gz| {
            self.scratch.output_path(prefix, direction, gz)
        })
    }
}
