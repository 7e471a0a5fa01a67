use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};
use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use tempfile::Builder;

use crate::domain::TriState;
use crate::error::ReadsError;
use crate::fs_util;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionAction {
    Move,
    Gzip,
    Gunzip,
}

/// Maps the requested and current compression to an action and the final state.
pub fn plan(requested: TriState, gzipped: bool) -> (CompressionAction, bool) {
    match (requested, gzipped) {
        (TriState::True, false) => (CompressionAction::Gzip, true),
        (TriState::False, true) => (CompressionAction::Gunzip, false),
        (_, current) => (CompressionAction::Move, current),
    }
}

/// Brings `current` to the requested compression state at the path chosen by
/// `destination`, which receives the final gzip flag. The source is consumed.
pub fn normalize<F>(
    current: &Utf8Path,
    requested: TriState,
    gzipped: bool,
    destination: F,
) -> Result<(Utf8PathBuf, bool), ReadsError>
where
    F: FnOnce(bool) -> Utf8PathBuf,
{
    let (action, final_gz) = plan(requested, gzipped);
    let target = destination(final_gz);
    tracing::debug!(source = %current, target = %target, ?action, "normalizing compression");
    match action {
        CompressionAction::Move => fs_util::move_file(current, &target)?,
        CompressionAction::Gzip => {
            gzip(current, &target)?;
            fs_util::remove_file(current)?;
        }
        CompressionAction::Gunzip => {
            gunzip(current, &target)?;
            fs_util::remove_file(current)?;
        }
    }
    Ok((target, final_gz))
}

pub fn has_gz_marker(path: &Utf8Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

/// Gzips `source` into `target`, streaming through a temporary file next to it.
pub fn gzip(source: &Utf8Path, target: &Utf8Path) -> Result<(), ReadsError> {
    if has_gz_marker(source) {
        return Err(ReadsError::AlreadyCompressed(source.to_string()));
    }
    stream_through(source, target, |input, output| {
        let mut encoder = GzEncoder::new(output, Compression::default());
        io::copy(&mut BufReader::new(input), &mut encoder)?;
        encoder.finish()?.flush()
    })
}

pub fn gunzip(source: &Utf8Path, target: &Utf8Path) -> Result<(), ReadsError> {
    if !has_gz_marker(source) {
        return Err(ReadsError::NotCompressed(source.to_string()));
    }
    stream_through(source, target, |input, mut output| {
        let mut decoder = MultiGzDecoder::new(BufReader::new(input));
        io::copy(&mut decoder, &mut output)?;
        output.flush()
    })
}

fn stream_through<F>(
    source: &Utf8Path,
    target: &Utf8Path,
    transform: F,
) -> Result<(), ReadsError>
where
    F: FnOnce(File, BufWriter<&mut File>) -> io::Result<()>,
{
    fs_util::ensure_parent(target)?;
    let parent = target
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or(Utf8Path::new("."));
    let input = File::open(source.as_std_path())
        .map_err(|err| ReadsError::Filesystem(format!("open {source}: {err}")))?;
    let mut temp = Builder::new()
        .prefix("reads-to-fastq")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| ReadsError::Filesystem(err.to_string()))?;
    transform(input, BufWriter::new(temp.as_file_mut()))
        .map_err(|err| ReadsError::Filesystem(format!("{source} -> {target}: {err}")))?;
    temp.persist(target.as_std_path())
        .map_err(|err| ReadsError::Filesystem(err.to_string()))?;
    Ok(())
}
