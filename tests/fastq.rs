use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use reads_to_fastq::error::ReadsError;
use reads_to_fastq::fastq;

fn fixture(name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn read(path: &Utf8PathBuf) -> Vec<u8> {
    std::fs::read(path.as_std_path()).unwrap()
}

#[test]
fn fixtures_interleave_and_split_back() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();

    let merged = root.join("nested").join("lib.inter.fastq");
    fastq::interleave(
        &fixture("small.forward.fq"),
        &fixture("small.reverse.fq"),
        &merged,
    )
    .unwrap();
    assert_eq!(read(&merged), read(&fixture("interleaved.fq")));

    let fwd = root.join("lib.fwd.fastq");
    let rev = root.join("lib.rev.fastq");
    fastq::deinterleave(&merged, &fwd, &rev).unwrap();
    assert_eq!(read(&fwd), read(&fixture("small.forward.fq")));
    assert_eq!(read(&rev), read(&fixture("small.reverse.fq")));
}

#[test]
fn reverse_without_records_is_a_mismatch() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let empty = root.join("empty.fq");
    std::fs::write(empty.as_std_path(), b"").unwrap();

    let err = fastq::interleave(&fixture("small.forward.fq"), &empty, &root.join("out.fq"))
        .unwrap_err();
    assert_matches!(err, ReadsError::FastqMismatch(ref message) if message.contains("record 1"));
}

#[test]
fn missing_input_is_a_filesystem_error() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let err = fastq::deinterleave(&root.join("absent.fq"), &root.join("f"), &root.join("r"))
        .unwrap_err();
    assert_matches!(err, ReadsError::Filesystem(_));
}
