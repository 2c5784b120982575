/**
 * file: genome_tests.rs
 * desc: Genome FASTA summary tests.
 */
use std::fs;

use crate::genome::GenomeSummary;

#[test]
fn test_genome_from_fasta() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.fna");

    fs::write(
        &path,
        ">header1\nACGTACGTAC\nGTACGT\n>header2 plasmid\nNNNNACGT\n",
    )
    .unwrap();

    let genome = GenomeSummary::from_fasta(&path).unwrap();

    assert!(genome.filepath == path);
    assert!(genome.num_seqs == 2);
    assert!(genome.size == 24);
    assert!(genome.to_string().contains("2 sequences, 24bp"));
}

#[test]
fn test_genome_from_invalid_fasta() {
    let dir = tempfile::tempdir().unwrap();
    let empty = dir.path().join("empty.fa");
    let html = dir.path().join("error.fa");

    fs::write(&empty, "").unwrap();
    fs::write(&html, "<html><body>404 Not Found</body></html>\n").unwrap();

    assert!(GenomeSummary::from_fasta(&empty).is_err());
    assert!(GenomeSummary::from_fasta(&html).is_err());
    assert!(GenomeSummary::from_fasta(&dir.path().join("missing.fa")).is_err());
}
