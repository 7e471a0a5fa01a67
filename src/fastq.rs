//! Line-level conversion between split and interleaved 4-line FASTQ.
//!
//! Records are not parsed or validated; the transforms only count lines.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};

use camino::Utf8Path;

use crate::error::ReadsError;
use crate::fs_util;

const RECORD_LINES: usize = 4;

/// Splits an interleaved file: lines 0-3 of every 8-line block go forward,
/// lines 4-7 go reverse. Bytes are copied verbatim.
pub fn deinterleave(
    source: &Utf8Path,
    forward: &Utf8Path,
    reverse: &Utf8Path,
) -> Result<(), ReadsError> {
    let mut input = open_reader(source)?;
    let mut fwd = create_writer(forward)?;
    let mut rev = create_writer(reverse)?;
    deinterleave_stream(&mut input, &mut fwd, &mut rev)
        .and_then(|()| fwd.flush())
        .and_then(|()| rev.flush())
        .map_err(|err| ReadsError::Filesystem(format!("deinterleave {source}: {err}")))
}

pub fn deinterleave_stream<R, W1, W2>(
    input: &mut R,
    forward: &mut W1,
    reverse: &mut W2,
) -> io::Result<()>
where
    R: BufRead,
    W1: Write,
    W2: Write,
{
    let mut line = Vec::new();
    let mut index = 0usize;
    loop {
        line.clear();
        if input.read_until(b'\n', &mut line)? == 0 {
            return Ok(());
        }
        if index % (2 * RECORD_LINES) < RECORD_LINES {
            forward.write_all(&line)?;
        } else {
            reverse.write_all(&line)?;
        }
        index += 1;
    }
}

/// Merges forward and reverse files record by record. Stops at the end of the
/// forward input; leftover reverse records are dropped, while a reverse input
/// that runs out first is an error.
pub fn interleave(
    forward: &Utf8Path,
    reverse: &Utf8Path,
    target: &Utf8Path,
) -> Result<(), ReadsError> {
    let mut fwd = open_reader(forward)?;
    let mut rev = open_reader(reverse)?;
    let mut output = create_writer(target)?;
    interleave_stream(&mut fwd, &mut rev, &mut output).map_err(|err| match err {
        StreamError::Mismatch(message) => ReadsError::FastqMismatch(message),
        StreamError::Io(err) => {
            ReadsError::Filesystem(format!("interleave {forward} + {reverse}: {err}"))
        }
    })?;
    output
        .flush()
        .map_err(|err| ReadsError::Filesystem(format!("write {target}: {err}")))
}

#[derive(Debug)]
pub enum StreamError {
    Mismatch(String),
    Io(io::Error),
}

impl From<io::Error> for StreamError {
    fn from(err: io::Error) -> Self {
        StreamError::Io(err)
    }
}

pub fn interleave_stream<R1, R2, W>(
    forward: &mut R1,
    reverse: &mut R2,
    output: &mut W,
) -> Result<(), StreamError>
where
    R1: BufRead,
    R2: BufRead,
    W: Write,
{
    let mut record = 0usize;
    let mut line = Vec::new();
    loop {
        line.clear();
        forward.read_until(b'\n', &mut line)?;
        let header = line.trim_ascii();
        if header.is_empty() {
            return Ok(());
        }
        write_line(output, header)?;
        copy_lines(forward, output, RECORD_LINES - 1)
            .map_err(|err| mismatch(err, "forward", record))?;
        copy_lines(reverse, output, RECORD_LINES)
            .map_err(|err| mismatch(err, "reverse", record))?;
        record += 1;
    }
}

fn mismatch(err: StreamError, side: &str, record: usize) -> StreamError {
    match err {
        StreamError::Mismatch(_) => StreamError::Mismatch(format!(
            "{side} reads ended before record {} was complete",
            record + 1
        )),
        other => other,
    }
}

fn copy_lines<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    count: usize,
) -> Result<(), StreamError> {
    let mut line = Vec::new();
    for _ in 0..count {
        line.clear();
        if input.read_until(b'\n', &mut line)? == 0 {
            return Err(StreamError::Mismatch(String::new()));
        }
        write_line(output, line.trim_ascii())?;
    }
    Ok(())
}

fn write_line<W: Write>(output: &mut W, line: &[u8]) -> io::Result<()> {
    output.write_all(line)?;
    output.write_all(b"\n")
}

fn open_reader(path: &Utf8Path) -> Result<BufReader<File>, ReadsError> {
    File::open(path.as_std_path())
        .map(BufReader::new)
        .map_err(|err| ReadsError::Filesystem(format!("open {path}: {err}")))
}

fn create_writer(path: &Utf8Path) -> Result<BufWriter<File>, ReadsError> {
    fs_util::ensure_parent(path)?;
    File::create(path.as_std_path())
        .map(BufWriter::new)
        .map_err(|err| ReadsError::Filesystem(format!("create {path}: {err}")))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const FWD: &[u8] = b"@r1/1\nACGT\n+\nIIII\n@r2/1\nTGCA\n+\nHHHH\n";
    const REV: &[u8] = b"@r1/2\nGGGG\n+\nJJJJ\n@r2/2\nCCCC\n+\nKKKK\n";
    const INTER: &[u8] =
        b"@r1/1\nACGT\n+\nIIII\n@r1/2\nGGGG\n+\nJJJJ\n@r2/1\nTGCA\n+\nHHHH\n@r2/2\nCCCC\n+\nKKKK\n";

    fn interleave_bytes(fwd: &[u8], rev: &[u8]) -> Result<Vec<u8>, StreamError> {
        let mut output = Vec::new();
        interleave_stream(&mut &fwd[..], &mut &rev[..], &mut output)?;
        Ok(output)
    }

    #[test]
    fn interleave_alternates_records() {
        assert_eq!(interleave_bytes(FWD, REV).unwrap(), INTER);
    }

    #[test]
    fn interleave_trims_and_reterminates_lines() {
        let fwd = b"@r1/1 \r\nACGT\r\n+\r\nIIII\r\n";
        let rev = b"@r1/2\nGGGG\n+\nJJJJ";
        let output = interleave_bytes(fwd, rev).unwrap();
        assert_eq!(output, b"@r1/1\nACGT\n+\nIIII\n@r1/2\nGGGG\n+\nJJJJ\n");
    }

    #[test]
    fn interleave_stops_at_blank_forward_line() {
        let fwd = b"@r1/1\nACGT\n+\nIIII\n\n@ignored\nA\n+\nI\n";
        let output = interleave_bytes(fwd, REV).unwrap();
        assert_eq!(output, &INTER[..36]);
    }

    #[test]
    fn interleave_drops_extra_reverse_records() {
        let fwd = &FWD[..18];
        let output = interleave_bytes(fwd, REV).unwrap();
        assert_eq!(output, b"@r1/1\nACGT\n+\nIIII\n@r1/2\nGGGG\n+\nJJJJ\n");
    }

    #[test]
    fn interleave_fails_when_reverse_runs_out() {
        let rev = &REV[..18];
        let err = interleave_bytes(FWD, rev).unwrap_err();
        assert_matches!(
            err,
            StreamError::Mismatch(message)
                if message.contains("reverse") && message.contains("record 2")
        );
    }

    #[test]
    fn interleave_fails_on_truncated_forward_record() {
        let err = interleave_bytes(b"@r1/1\nACGT\n", REV).unwrap_err();
        assert_matches!(err, StreamError::Mismatch(message) if message.contains("forward"));
    }

    #[test]
    fn deinterleave_splits_blocks() {
        let mut fwd = Vec::new();
        let mut rev = Vec::new();
        deinterleave_stream(&mut &INTER[..], &mut fwd, &mut rev).unwrap();
        assert_eq!(fwd, FWD);
        assert_eq!(rev, REV);
    }

    fn interleaved_pairs(pairs: usize) -> Vec<u8> {
        const BASES: &[u8] = b"ACGTN";
        let mut output = Vec::new();
        for pair in 0..pairs {
            for mate in 1..=2 {
                let sequence = (0..(pair % 9) + 3)
                    .map(|offset| BASES[(pair * 7 + mate + offset) % BASES.len()] as char)
                    .collect::<String>();
                let quality = "I".repeat(sequence.len());
                output.extend_from_slice(
                    format!("@pair{pair}/{mate} lane:{pair}\n{sequence}\n+\n{quality}\n").as_bytes(),
                );
            }
        }
        output
    }

    #[test]
    fn round_trip_holds_for_any_pair_count() {
        for pairs in [0, 1, 2, 7, 250] {
            let interleaved = interleaved_pairs(pairs);
            let mut fwd = Vec::new();
            let mut rev = Vec::new();
            deinterleave_stream(&mut &interleaved[..], &mut fwd, &mut rev).unwrap();
            assert_eq!(fwd.iter().filter(|byte| **byte == b'\n').count(), pairs * 4);
            assert_eq!(rev.iter().filter(|byte| **byte == b'\n').count(), pairs * 4);

            let merged = interleave_bytes(&fwd, &rev).unwrap();
            assert_eq!(merged, interleaved, "{pairs} pairs");
        }
    }

    #[test]
    fn round_trip_preserves_records() {
        let mut fwd = Vec::new();
        let mut rev = Vec::new();
        deinterleave_stream(&mut &INTER[..], &mut fwd, &mut rev).unwrap();
        let merged = interleave_bytes(&fwd, &rev).unwrap();
        assert_eq!(merged, INTER);

        let mut fwd_again = Vec::new();
        let mut rev_again = Vec::new();
        deinterleave_stream(&mut &merged[..], &mut fwd_again, &mut rev_again).unwrap();
        assert_eq!(fwd_again, fwd);
        assert_eq!(rev_again, rev);
    }
}
