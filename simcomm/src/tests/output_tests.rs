/**
 * file: output_tests.rs
 * desc: Community output tests.
 */
use std::fs;
use std::path::{Path, PathBuf};

use crate::assign::AssignmentRecord;
use crate::output::{plan_destinations, write_community};
use crate::retrieve::{AttemptError, GenomeRetriever, SourceRetriever};
use shared::taxonomy::TaxId;

fn record(strain_id: &str, genome_id: u32, location: &str, abundances: &[f64]) -> AssignmentRecord {
    AssignmentRecord {
        strain_id: strain_id.to_string(),
        otu_id: strain_id.split('.').next().unwrap().to_string(),
        taxid: TaxId(genome_id),
        genome_id: TaxId(genome_id),
        location: location.to_string(),
        abundances: abundances.to_vec(),
    }
}

fn write_genome(dir: &Path, name: &str) -> String {
    let path = dir.join(name);

    fs::write(&path, format!(">{}\nACGTACGTACGTACGT\n", name)).unwrap();

    path.to_string_lossy().to_string()
}

/**
 * Refuses to retrieve anything from the given location.
 */
struct BlockingRetriever {
    blocked: String,
}

impl GenomeRetriever for BlockingRetriever {
    fn fetch(&self, location: &str, destination: &Path) -> Result<(), AttemptError> {
        if location == self.blocked {
            return Err(AttemptError::Fatal("blocked".to_string()));
        }

        SourceRetriever::default().fetch(location, destination)
    }
}

#[test]
fn test_plan_destinations() {
    let genomes_dir = PathBuf::from("out/genomes");
    let records = vec![
        record("OTU_1.0", 562, "/refs/b/genome.fa", &[1.0]),
        record("OTU_2.0", 562, "/refs/b/genome.fa", &[1.0]),
        record("OTU_3.0", 623, "/refs/a/genome.fa", &[1.0]),
        record("OTU_4.0", 28901, "http://example.org/all/GCF_1", &[1.0]),
    ];
    let destinations = plan_destinations(&records, &genomes_dir);

    assert!(destinations.len() == 3);
    assert!(destinations["/refs/b/genome.fa"] == genomes_dir.join("genome.fa"));
    assert!(destinations["/refs/a/genome.fa"] == genomes_dir.join("1_genome.fa"));
    assert!(destinations["http://example.org/all/GCF_1"] == genomes_dir.join("GCF_1.fa"));
}

#[test]
fn test_write_community() {
    let refs = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let ecoli = write_genome(refs.path(), "ecoli.fa");
    let bsub = write_genome(refs.path(), "bsubtilis.fa");
    let records = vec![
        record("OTU_1.0", 562, &ecoli, &[1.5, 0.0]),
        record("OTU_1.1", 1423, &bsub, &[0.5, 2.0]),
        record("OTU_2.0", 562, &ecoli, &[3.0, 1.0]),
    ];

    let files = write_community(&records, 2, out.path(), &SourceRetriever::default()).unwrap();
    let genome_path = out.path().join("genomes").join("ecoli.fa");

    assert!(files.num_genomes == 3);
    assert!(files.genomes_dir == out.path().join("genomes"));
    assert!(files.abundances == vec![out.path().join("abundance0.tsv"), out.path().join("abundance1.tsv")]);
    assert!(genome_path.exists());
    assert!(out.path().join("genomes").join("bsubtilis.fa").exists());

    let genome_to_id = fs::read_to_string(&files.genome_to_id).unwrap();
    let lines: Vec<&str> = genome_to_id.lines().collect();

    assert!(lines.len() == 3);
    assert!(lines[0] == format!("OTU_1.0\t{}", genome_path.display()));
    assert!(lines[2] == format!("OTU_2.0\t{}", genome_path.display()));

    let metadata = fs::read_to_string(&files.metadata).unwrap();

    assert!(metadata.lines().count() == 4);
    assert!(metadata.lines().nth(2) == Some("OTU_1.1\t1423\t1423\tnew_strain"));

    assert!(fs::read_to_string(&files.abundances[0]).unwrap() == "OTU_1.0\t1.5\nOTU_1.1\t0.5\nOTU_2.0\t3\n");
    assert!(fs::read_to_string(&files.abundances[1]).unwrap() == "OTU_1.0\t0\nOTU_1.1\t2\nOTU_2.0\t1\n");
}

#[test]
fn test_write_community_skips_failed_genomes() {
    let refs = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let ecoli = write_genome(refs.path(), "ecoli.fa");
    let bsub = write_genome(refs.path(), "bsubtilis.fa");
    let records = vec![
        record("OTU_1.0", 562, &ecoli, &[1.0]),
        record("OTU_2.0", 1423, &bsub, &[2.0]),
    ];
    let retriever = BlockingRetriever {
        blocked: bsub.clone(),
    };

    let files = write_community(&records, 1, out.path(), &retriever).unwrap();

    assert!(files.num_genomes == 1);
    assert!(fs::read_to_string(&files.genome_to_id).unwrap().lines().count() == 1);
    assert!(fs::read_to_string(&files.metadata).unwrap().lines().count() == 2);
    assert!(fs::read_to_string(&files.abundances[0]).unwrap() == "OTU_1.0\t1\n");
    assert!(!out.path().join("genomes").join("bsubtilis.fa").exists());
}

#[test]
fn test_write_community_empty() {
    let out = tempfile::tempdir().unwrap();
    let files = write_community(&[], 1, out.path(), &SourceRetriever::default()).unwrap();

    assert!(files.num_genomes == 0);
    assert!(fs::read_to_string(&files.metadata).unwrap() == "genome_ID\tOTU\tNCBI_ID\tnovelty_category\n");
    assert!(fs::read_to_string(&files.genome_to_id).unwrap().is_empty());
}
