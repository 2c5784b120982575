/**
 * file: files_tests.rs
 * desc: Genome list parsing and community table tests.
 */
use std::fs;
use std::path::{Path, PathBuf};

use crate::assign::AssignmentRecord;
use crate::files::{self, CommunityTables};
use shared::taxonomy::TaxId;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);

    fs::write(&path, contents).unwrap();

    path
}

#[test]
fn test_ftp_to_http() {
    assert!(
        files::ftp_to_http("ftp://ftp.ncbi.nlm.nih.gov/genomes/all/GCF")
            == "http://ftp.ncbi.nlm.nih.gov/genomes/all/GCF"
    );
    assert!(files::ftp_to_http("https://example.org/g.fa") == "https://example.org/g.fa");
    assert!(files::ftp_to_http("/data/ftp://g.fa") == "/data/ftp://g.fa");
}

#[test]
fn test_parse_genome_list() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "genomes.tsv",
        "562\tEscherichia coli\tftp://ftp.ncbi.nlm.nih.gov/genomes/all/GCF_000005845.2_ASM584v2\n\
         1423\tBacillus subtilis\t/data/bsubtilis.fa\n",
    );
    let records = files::parse_genome_list(&path).unwrap();

    assert!(records.len() == 2);
    assert!(records[0].taxid == "562");
    assert!(records[0].name == "Escherichia coli");
    assert!(records[1].location == "/data/bsubtilis.fa");
}

#[test]
fn test_parse_genome_list_missing_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "genomes.tsv", "562\tEscherichia coli\n");

    assert!(files::parse_genome_list(&path).is_err());
}

#[test]
fn test_read_genome_lists() {
    let dir = tempfile::tempdir().unwrap();
    let primary = write(
        dir.path(),
        "genomes.tsv",
        "562\tEscherichia coli\tftp://ftp.ncbi.nlm.nih.gov/genomes/all/GCF_1\n\
         28901\tSalmonella enterica\thttp://example.org/GCF_2\n",
    );
    let additional = write(
        dir.path(),
        "extra.tsv",
        "562\tEscherichia coli\tftp://mirror.example.org/ecoli.fa\n\
         1423\tBacillus subtilis\t/data/bsubtilis.fa\n",
    );
    let catalog = files::read_genome_lists(&primary, Some(&additional)).unwrap();

    assert!(catalog.len() == 3);

    // Primary locations are rewritten, additional ones are kept verbatim
    let ecoli = &catalog[&TaxId(562)];

    assert!(
        ecoli.locations
            == vec![
                "http://ftp.ncbi.nlm.nih.gov/genomes/all/GCF_1",
                "ftp://mirror.example.org/ecoli.fa",
            ]
    );
    assert!(catalog[&TaxId(1423)].name == "Bacillus subtilis");

    // Ordered by taxid
    let taxids: Vec<TaxId> = catalog.keys().copied().collect();

    assert!(taxids == vec![TaxId(562), TaxId(1423), TaxId(28901)]);
}

#[test]
fn test_read_genome_lists_bad_taxid() {
    let dir = tempfile::tempdir().unwrap();
    let primary = write(dir.path(), "genomes.tsv", "E. coli\tEscherichia coli\t/data/e.fa\n");

    assert!(files::read_genome_lists(&primary, None).is_err());
}

#[test]
fn test_community_tables() {
    let dir = tempfile::tempdir().unwrap();
    let genome_to_id = dir.path().join("genome_to_id.tsv");
    let metadata = dir.path().join("metadata.tsv");
    let abundances = vec![
        dir.path().join("abundance0.tsv"),
        dir.path().join("abundance1.tsv"),
    ];
    let record = AssignmentRecord {
        strain_id: "OTU_1.0".to_string(),
        otu_id: "OTU_1".to_string(),
        taxid: TaxId(561),
        genome_id: TaxId(562),
        location: "/data/ecoli.fa".to_string(),
        abundances: vec![0.25, 3.0],
    };

    let mut tables = CommunityTables::create(&genome_to_id, &metadata, &abundances).unwrap();

    tables
        .write_strain(&record, Path::new("out/genomes/ecoli.fa"))
        .unwrap();
    tables.flush().unwrap();

    assert!(fs::read_to_string(&genome_to_id).unwrap() == "OTU_1.0\tout/genomes/ecoli.fa\n");
    assert!(
        fs::read_to_string(&metadata).unwrap()
            == "genome_ID\tOTU\tNCBI_ID\tnovelty_category\nOTU_1.0\t561\t562\tnew_strain\n"
    );
    assert!(fs::read_to_string(&abundances[0]).unwrap() == "OTU_1.0\t0.25\n");
    assert!(fs::read_to_string(&abundances[1]).unwrap() == "OTU_1.0\t3\n");
}
