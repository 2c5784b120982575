/**
 * file: output.rs
 * desc: Retrieve assigned genomes and write the community tables.
 */
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::assign::AssignmentRecord;
use crate::error::Result;
use crate::files::CommunityTables;
use crate::retrieve::{self, GenomeRetriever, RetrievalError};

/**
 * Paths of the generated community files.
 *
 * fields
 *  genome_to_id: strain ID -> genome filepath table
 *  metadata:     strain metadata table
 *  abundances:   abundance table per sample
 *  genomes_dir:  directory holding the retrieved genomes
 *  num_genomes:  number of strains written to the tables
 */
#[derive(Debug, Clone, PartialEq)]
pub struct CommunityFiles {
    pub genome_to_id: PathBuf,
    pub metadata: PathBuf,
    pub abundances: Vec<PathBuf>,
    pub genomes_dir: PathBuf,
    pub num_genomes: usize,
}

/**
 * Pick a local destination for each distinct genome location. Locations that would end up
 * with the same filename get a numeric prefix ("1_name.fa").
 */
pub fn plan_destinations(
    records: &[AssignmentRecord],
    genomes_dir: &Path,
) -> BTreeMap<String, PathBuf> {
    let mut taken = HashSet::new();
    let mut destinations = BTreeMap::new();

    for record in records {
        if destinations.contains_key(&record.location) {
            continue;
        }

        let name = retrieve::destination_name(&record.location);
        let mut candidate = name.clone();
        let mut n = 1;

        while !taken.insert(candidate.clone()) {
            candidate = format!("{}_{}", n, name);
            n += 1;
        }

        destinations.insert(record.location.clone(), genomes_dir.join(candidate));
    }

    destinations
}

/**
 * Retrieve the genomes for all assignment records and write the genome ID, metadata, and
 * per sample abundance tables to out_dir. Genomes are retrieved in parallel, once per
 * distinct location. Records whose genome couldn't be retrieved are logged and left out of
 * every table.
 *
 * args
 *  records:     assigned strains, written in this order
 *  num_samples: number of abundance tables to write
 *  out_dir:     output directory, genomes go into out_dir/genomes
 *  retriever:   fetches genomes
 *
 * returns
 *  the paths of the generated files
 */
pub fn write_community<R: GenomeRetriever + ?Sized>(
    records: &[AssignmentRecord],
    num_samples: usize,
    out_dir: &Path,
    retriever: &R,
) -> Result<CommunityFiles> {
    let genomes_dir = out_dir.join("genomes");

    fs::create_dir_all(&genomes_dir)?;

    let destinations = plan_destinations(records, &genomes_dir);

    info!(
        "Retrieving {} genomes for {} strains",
        destinations.len(),
        records.len()
    );

    let retrieved: HashMap<&String, std::result::Result<PathBuf, RetrievalError>> = destinations
        .par_iter()
        .map(|(location, dest)| {
            (
                location,
                retrieve::retrieve_genome(retriever, location, dest, retrieve::MAX_ATTEMPTS),
            )
        })
        .collect();

    let files = CommunityFiles {
        genome_to_id: out_dir.join("genome_to_id.tsv"),
        metadata: out_dir.join("metadata.tsv"),
        abundances: (0..num_samples)
            .map(|i| out_dir.join(format!("abundance{}.tsv", i)))
            .collect(),
        genomes_dir,
        num_genomes: 0,
    };
    let mut tables = CommunityTables::create(&files.genome_to_id, &files.metadata, &files.abundances)?;
    let mut written = 0;

    for record in records {
        match retrieved.get(&record.location) {
            Some(Ok(path)) => {
                tables.write_strain(record, path)?;
                written += 1;
            }
            Some(Err(e)) => {
                error!("{}", e);
                error!(
                    "Genome for {} could not be retrieved, check your connection settings",
                    record.strain_id
                );
            }
            None => error!("No destination planned for {}", record.location),
        }
    }

    tables.flush()?;

    info!("Wrote {} of {} strains", written, records.len());

    Ok(CommunityFiles {
        num_genomes: written,
        ..files
    })
}

#[cfg(test)]
#[path = "tests/output_tests.rs"]
mod output_tests;
