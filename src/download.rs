use camino::{Utf8Path, Utf8PathBuf};

use crate::blobstore::BlobStoreClient;
use crate::error::ReadsError;
use crate::filename::{self, NameHints};
use crate::library::ReadsFile;
use crate::scratch::Scratch;

/// A blob saved to the scratch download area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedReads {
    pub path: Utf8PathBuf,
    pub gzipped: bool,
}

/// Resolves the file kind of `file` and streams its blob into scratch.
/// Partial files are left in place on failure.
pub fn download_reads<B: BlobStoreClient>(
    client: &B,
    scratch: &Scratch,
    token: &str,
    file: &ReadsFile,
) -> Result<DownloadedReads, ReadsError> {
    let handle = &file.handle;
    check_handle_id(&handle.id)?;
    let node_file_name = client.node_file_name(handle, token)?;
    tracing::debug!(
        node = %handle.id,
        file_type = ?file.declared_type,
        handle_file_name = ?handle.file_name,
        %node_file_name,
        "resolving reads file name"
    );
    let kind = filename::resolve(NameHints {
        node: &handle.id,
        file_type: file.declared_type.as_deref(),
        handle_file_name: handle.file_name.as_deref(),
        node_file_name: &node_file_name,
    })?;

    let path = scratch.download_path(&handle.id, kind.gzipped);
    tracing::info!(node = %handle.id, extension = kind.extension, %path, "downloading reads file");
    client.download(handle, token, path.as_std_path())?;
    Ok(DownloadedReads {
        path,
        gzipped: kind.gzipped,
    })
}

/// Handle ids come from stored objects and name files under the download
/// directory, so they must be a single plain path component.
fn check_handle_id(id: &str) -> Result<(), ReadsError> {
    let unsafe_id = id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\', '\0'])
        || Utf8Path::new(id).has_root();
    if unsafe_id {
        return Err(ReadsError::UnsafeHandleId(id.to_string()));
    }
    Ok(())
}
