/**
 * file: profile.rs
 * desc: Read OTU abundance profiles. Supports BIOM 1.0 (JSON) tables and the classic
 *       tab separated OTU table written by `biom convert --to-tsv`.
 */
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::error::{Error, Result};

/**
 * STRUCTS
 */

/**
 * A single OTU from the abundance profile.
 *
 * fields
 *  id:         OTU identifier
 *  lineage:    rank prefixed lineage tokens (e.g. "g__Escherichia"), least specific first
 *  abundances: abundance per sample, aligned with Profile::samples
 */
#[derive(Debug, Clone, PartialEq)]
pub struct OtuRecord {
    pub id: String,
    pub lineage: Vec<String>,
    pub abundances: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub samples: Vec<String>,
    pub otus: Vec<OtuRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BiomLineage {
    Tokens(Vec<String>),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct BiomMetadata {
    taxonomy: Option<BiomLineage>,
}

#[derive(Debug, Deserialize)]
struct BiomEntry {
    id: String,
    metadata: Option<BiomMetadata>,
}

#[derive(Debug, Deserialize)]
struct BiomTable {
    rows: Vec<BiomEntry>,
    columns: Vec<BiomEntry>,
    matrix_type: String,
    data: Vec<Vec<f64>>,
}

/**
 * FUNCTIONS
 */

/**
 * Split a textual lineage ("k__Bacteria; p__Proteobacteria") into trimmed tokens.
 */
pub fn split_lineage(lineage: &str) -> Vec<String> {
    lineage.split(';').map(|t| t.trim().to_string()).collect()
}

impl BiomLineage {
    fn into_tokens(self) -> Vec<String> {
        match self {
            BiomLineage::Tokens(ts) => ts.into_iter().map(|t| t.trim().to_string()).collect(),
            BiomLineage::Text(s) => split_lineage(&s),
        }
    }
}

/**
 * Figure out how many samples to use given the number of samples in the profile and an
 * optional user override. Mismatches are reported but never fatal.
 *
 * args
 *  available: number of samples in the profile
 *  requested: number of samples the user asked for
 *
 * returns
 *  the number of samples to use, always <= available
 */
pub fn select_sample_count(available: usize, requested: Option<usize>) -> usize {
    let requested = match requested {
        Some(n) => n,
        None => return available,
    };

    if requested != available && requested != 1 {
        warn!(
            "Number of samples ({}) does not match number of samples in the profile ({})",
            requested, available
        );

        let used = requested.min(available);

        warn!("Using the first {} samples", used);

        return used;
    }

    requested.min(available)
}

fn parse_biom(path: &Path, contents: &str) -> Result<Profile> {
    let table: BiomTable = serde_json::from_str(contents)?;
    let samples: Vec<String> = table.columns.into_iter().map(|c| c.id).collect();
    let mut matrix = vec![vec![0.0; samples.len()]; table.rows.len()];

    match table.matrix_type.as_str() {
        "sparse" => {
            for entry in table.data.iter() {
                if entry.len() != 3 {
                    return Err(Error::invalid_input(
                        path,
                        "sparse BIOM entries must be [row, column, value]",
                    ));
                }

                let (row, col) = (entry[0] as usize, entry[1] as usize);

                if row >= matrix.len() || col >= samples.len() {
                    return Err(Error::invalid_input(
                        path,
                        format!("sparse BIOM entry ({}, {}) is out of bounds", row, col),
                    ));
                }

                matrix[row][col] = entry[2];
            }
        }
        "dense" => {
            if table.data.len() != matrix.len()
                || table.data.iter().any(|r| r.len() != samples.len())
            {
                return Err(Error::invalid_input(
                    path,
                    "dense BIOM matrix doesn't match the table shape",
                ));
            }

            matrix = table.data;
        }
        x => {
            return Err(Error::invalid_input(
                path,
                format!("unsupported BIOM matrix type `{}`", x),
            ))
        }
    }

    let mut otus = Vec::with_capacity(table.rows.len());

    for (row, abundances) in table.rows.into_iter().zip(matrix.into_iter()) {
        let lineage = match row.metadata.and_then(|m| m.taxonomy) {
            Some(l) => l.into_tokens(),
            None => {
                return Err(Error::invalid_input(
                    path,
                    format!("OTU {} has no taxonomy metadata", row.id),
                ))
            }
        };

        otus.push(OtuRecord {
            id: row.id,
            lineage,
            abundances,
        });
    }

    Ok(Profile { samples, otus })
}

fn parse_tsv(path: &Path, contents: &str) -> Result<Profile> {
    // biom convert writes a "# Constructed from biom file" comment before the real header,
    // which itself starts with '#'
    let body = contents
        .lines()
        .skip_while(|l| l.trim().is_empty() || (l.starts_with('#') && !l.starts_with("#OTU")))
        .collect::<Vec<&str>>()
        .join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let header = reader.headers().map_err(|e| Error::csv(path, e))?.clone();

    if header.len() < 3 || header.get(header.len() - 1).map(|h| h.trim()) != Some("taxonomy") {
        return Err(Error::invalid_input(
            path,
            "expected an `#OTU ID` column, sample columns, and a final `taxonomy` column",
        ));
    }

    let samples: Vec<String> = header
        .iter()
        .skip(1)
        .take(header.len() - 2)
        .map(|s| s.to_string())
        .collect();
    let mut otus = Vec::new();

    for (i, rec_result) in reader.records().enumerate() {
        let rec = rec_result.map_err(|e| Error::csv(path, e))?;

        if rec.len() != header.len() {
            return Err(Error::invalid_input(
                path,
                format!(
                    "row {} has {} columns, expected {}",
                    i + 1,
                    rec.len(),
                    header.len()
                ),
            ));
        }

        let abundances = rec
            .iter()
            .skip(1)
            .take(samples.len())
            .map(|v| v.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<f64>, _>>()
            .map_err(|e| Error::invalid_input(path, format!("row {}: {}", i + 1, e)))?;

        otus.push(OtuRecord {
            id: rec[0].trim().to_string(),
            lineage: split_lineage(&rec[rec.len() - 1]),
            abundances,
        });
    }

    Ok(Profile { samples, otus })
}

/**
 * Read an abundance profile from disk. The format is sniffed from the first non-blank
 * character: '{' means BIOM JSON, anything else is treated as a classic OTU table.
 *
 * args
 *  path:    profile filepath
 *  samples: optional number of samples to use, see select_sample_count
 *
 * returns
 *  the profile restricted to the selected samples
 */
pub fn read_profile(path: &Path, samples: Option<usize>) -> Result<Profile> {
    let contents = fs::read_to_string(path)?;

    let mut profile = if contents.trim_start().starts_with('{') {
        parse_biom(path, &contents)?
    } else {
        parse_tsv(path, &contents)?
    };

    let mut seen = HashSet::new();

    if let Some(otu) = profile.otus.iter().find(|otu| !seen.insert(otu.id.as_str())) {
        return Err(Error::invalid_input(
            path,
            format!("duplicate OTU id `{}`", otu.id),
        ));
    }

    if profile.samples.is_empty() {
        return Err(Error::invalid_input(path, "profile doesn't contain any samples"));
    }

    let used = select_sample_count(profile.samples.len(), samples);

    profile.samples.truncate(used);
    profile
        .otus
        .iter_mut()
        .for_each(|otu| otu.abundances.truncate(used));

    Ok(profile)
}

#[cfg(test)]
#[path = "tests/profile_tests.rs"]
mod profile_tests;
