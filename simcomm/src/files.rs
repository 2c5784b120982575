/**
 * file: files.rs
 * desc: Functions related to file reading, writing, and parsing.
 */
use csv;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::assign::AssignmentRecord;
use crate::catalog::{GenomeCatalog, ReferenceGenome};
use crate::error::{Error, Result};
use shared::taxonomy::TaxId;

// Novelty category written to the metadata table for every genome
pub const NOVELTY_CATEGORY: &str = "new_strain";

/**
 * A single line from a reference genome list.
 */
#[derive(Debug, Deserialize)]
pub struct GenomeListRecord {
    pub taxid: String,
    pub name: String,
    pub location: String,
}

/**
 * NCBI's FTP paths are served over HTTP as well, which works better behind proxies.
 */
pub fn ftp_to_http(location: &str) -> String {
    match location.strip_prefix("ftp://") {
        Some(rest) => format!("http://{}", rest),
        None => location.to_string(),
    }
}

/**
 * Parse a reference genome list. The format is a headerless TSV with three columns:
 *      taxid  scientific_name  location
 * where location is either a URL (usually an NCBI assembly directory) or a local filepath.
 */
pub fn parse_genome_list(filepath: &Path) -> Result<Vec<GenomeListRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quoting(false)
        .from_path(filepath)
        .map_err(|e| Error::csv(filepath, e))?;
    let mut recs = Vec::new();

    for rec_result in reader.deserialize() {
        let rec: GenomeListRecord = rec_result.map_err(|e| Error::csv(filepath, e))?;

        recs.push(rec);
    }

    Ok(recs)
}

/**
 * Merge genome list records into the catalog. Locations for a taxid that's already in the
 * catalog are appended in list order.
 */
fn merge_into_catalog(
    catalog: &mut GenomeCatalog,
    filepath: &Path,
    records: Vec<GenomeListRecord>,
    rewrite_ftp: bool,
) -> Result<()> {
    for (i, rec) in records.into_iter().enumerate() {
        let taxid: TaxId = rec
            .taxid
            .parse()
            .map_err(|e: String| {
                Error::invalid_input(filepath, format!("line {}: {}", i + 1, e))
            })?;
        let location = if rewrite_ftp {
            ftp_to_http(rec.location.trim())
        } else {
            rec.location.trim().to_string()
        };

        catalog
            .entry(taxid)
            .or_insert_with(|| ReferenceGenome {
                taxid,
                name: rec.name.clone(),
                locations: Vec::new(),
            })
            .locations
            .push(location);
    }

    Ok(())
}

/**
 * Read the primary reference genome list and an optional list of additional genomes into
 * a single catalog keyed by taxid.
 *
 * args
 *  primary:    list of (usually NCBI hosted) reference genomes, ftp:// paths become http://
 *  additional: optional list of extra genomes, locations are used verbatim
 *
 * returns
 *  the genome catalog
 */
pub fn read_genome_lists(primary: &Path, additional: Option<&Path>) -> Result<GenomeCatalog> {
    let mut catalog = BTreeMap::new();

    merge_into_catalog(&mut catalog, primary, parse_genome_list(primary)?, true)?;

    if let Some(path) = additional {
        merge_into_catalog(&mut catalog, path, parse_genome_list(path)?, false)?;
    }

    Ok(catalog)
}

/**
 * A tab separated output table.
 */
pub struct TsvTable {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl TsvTable {
    /**
     * Create the table, truncating any existing file.
     */
    pub fn create(path: &Path) -> Result<Self> {
        let writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_path(path)
            .map_err(|e| Error::csv(path, e))?;

        Ok(TsvTable {
            path: path.to_path_buf(),
            writer,
        })
    }

    pub fn write_row<I, T>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer
            .write_record(row)
            .map_err(|e| Error::csv(&self.path, e))
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(Error::from)
    }
}

/**
 * Writers for the generated community tables.
 *
 * fields
 *  genome_to_id: strain ID -> local genome filepath
 *  metadata:     strain ID, taxid, genome ID, and novelty category, with a header
 *  abundances:   one table per sample, strain ID -> abundance
 */
pub struct CommunityTables {
    genome_to_id: TsvTable,
    metadata: TsvTable,
    abundances: Vec<TsvTable>,
}

impl CommunityTables {
    pub fn create(genome_to_id: &Path, metadata: &Path, abundances: &[PathBuf]) -> Result<Self> {
        let mut tables = CommunityTables {
            genome_to_id: TsvTable::create(genome_to_id)?,
            metadata: TsvTable::create(metadata)?,
            abundances: abundances
                .iter()
                .map(|p| TsvTable::create(p))
                .collect::<Result<Vec<_>>>()?,
        };

        tables
            .metadata
            .write_row(&["genome_ID", "OTU", "NCBI_ID", "novelty_category"])?;

        Ok(tables)
    }

    /**
     * Write every table row for a single strain.
     *
     * args
     *  record:      the strain's assignment
     *  genome_path: local filepath of the strain's genome
     */
    pub fn write_strain(&mut self, record: &AssignmentRecord, genome_path: &Path) -> Result<()> {
        self.genome_to_id.write_row(&[
            record.strain_id.clone(),
            genome_path.to_string_lossy().to_string(),
        ])?;
        self.metadata.write_row(&[
            record.strain_id.clone(),
            record.taxid.to_string(),
            record.genome_id.to_string(),
            NOVELTY_CATEGORY.to_string(),
        ])?;

        for (table, abundance) in self.abundances.iter_mut().zip(record.abundances.iter()) {
            table.write_row(&[record.strain_id.clone(), abundance.to_string()])?;
        }

        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.genome_to_id.flush()?;
        self.metadata.flush()?;

        for t in self.abundances.iter_mut() {
            t.flush()?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/files_tests.rs"]
mod files_tests;
