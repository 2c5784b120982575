/**
 * file: retrieve.rs
 * desc: Retrieve reference genomes from remote or local sources with bounded retries.
 */
use flate2::read::MultiGzDecoder;
use std::fs;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::files;
use crate::genome::GenomeSummary;

// Number of times a genome retrieval is attempted before giving up
pub const MAX_ATTEMPTS: usize = 10;

/**
 * STRUCTS
 */

/**
 * Why a single retrieval attempt failed. Only retryable failures are attempted again.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptError {
    Retryable(String),
    Fatal(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error(
    "Genome {location} could not be retrieved to {} after {attempts} attempt(s): {reason}",
    .destination.display()
)]
pub struct RetrievalError {
    pub location: String,
    pub destination: PathBuf,
    pub attempts: usize,
    pub reason: String,
}

/**
 * Fetches a single genome from its location to a local destination. Implementations only
 * make one attempt, retries are handled by retrieve_genome.
 */
pub trait GenomeRetriever: Sync {
    fn fetch(&self, location: &str, destination: &Path) -> Result<(), AttemptError>;
}

/**
 * Retrieves genomes over HTTP (NCBI assembly directories or direct file URLs) or by
 * copying local files.
 */
pub struct SourceRetriever {
    pub timeout: Duration,
}

impl Default for SourceRetriever {
    fn default() -> Self {
        SourceRetriever {
            timeout: Duration::from_secs(300),
        }
    }
}

/**
 * FUNCTIONS
 */

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptError::Retryable(e) => write!(f, "{}", e),
            AttemptError::Fatal(e) => write!(f, "{}", e),
        }
    }
}

pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://")
        || location.starts_with("https://")
        || location.starts_with("ftp://")
}

fn is_sequence_file(name: &str) -> bool {
    [".gz", ".fna", ".fa", ".fasta"]
        .iter()
        .any(|ext| name.ends_with(ext))
}

fn basename(location: &str) -> &str {
    location
        .trim_end()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(location)
}

/**
 * Local filename for a genome location. Remote genomes are named after the last path
 * component (the assembly name for NCBI directories) with a ".fa" extension, local genomes
 * keep their filename.
 */
pub fn destination_name(location: &str) -> String {
    let name = basename(location);

    if !is_remote(location) {
        return name.to_string();
    }

    let stem = name
        .trim_end_matches(".gz")
        .trim_end_matches(".fasta")
        .trim_end_matches(".fna")
        .trim_end_matches(".fa");

    format!("{}.fa", stem)
}

/**
 * URL of the genome FASTA. NCBI assembly directories contain the genome as
 * <dir>/<assembly>_genomic.fna.gz, URLs that already point at a sequence file are used as is.
 */
pub fn genome_url(location: &str) -> String {
    let location = files::ftp_to_http(location.trim_end());
    let name = basename(&location).to_string();

    if is_sequence_file(&name) {
        location
    } else {
        format!("{}/{}_genomic.fna.gz", location.trim_end_matches('/'), name)
    }
}

/**
 * Run op until it succeeds, fails with a fatal error, or max_attempts is reached. The attempt
 * number (starting at 1) is passed to op.
 *
 * returns
 *  the successful result or the number of attempts made and the last error
 */
pub fn with_retries<T, F>(max_attempts: usize, mut op: F) -> Result<T, (usize, AttemptError)>
where
    F: FnMut(usize) -> Result<T, AttemptError>,
{
    let mut attempt = 1;

    loop {
        match op(attempt) {
            Ok(v) => return Ok(v),
            Err(AttemptError::Retryable(e)) if attempt < max_attempts => {
                debug!("Attempt {}/{} failed: {}", attempt, max_attempts, e);
                attempt += 1;
            }
            Err(e) => return Err((attempt, e)),
        }
    }
}

/**
 * Retrieve a genome to the given destination, retrying up to max_attempts times.
 *
 * args
 *  retriever:    does the actual fetching
 *  location:     URL or filepath of the genome
 *  destination:  local filepath to write the genome to
 *  max_attempts: maximum number of attempts
 *
 * returns
 *  the destination path or an error naming the location and destination
 */
pub fn retrieve_genome<R: GenomeRetriever + ?Sized>(
    retriever: &R,
    location: &str,
    destination: &Path,
    max_attempts: usize,
) -> Result<PathBuf, RetrievalError> {
    with_retries(max_attempts, |attempt| {
        if attempt > 1 {
            warn!(
                "Retrying {} (attempt {}/{})",
                location, attempt, max_attempts
            );
        }

        retriever.fetch(location, destination)
    })
    .map(|_| destination.to_path_buf())
    .map_err(|(attempts, e)| RetrievalError {
        location: location.to_string(),
        destination: destination.to_path_buf(),
        attempts,
        reason: e.to_string(),
    })
}

fn http_error(url: &str, e: ureq::Error) -> AttemptError {
    match e {
        // Client errors won't go away by asking again, except for timeouts and rate limits
        ureq::Error::Status(code, _) if (400..500).contains(&code) && code != 408 && code != 429 => {
            AttemptError::Fatal(format!("HTTP {} for {}", code, url))
        }
        ureq::Error::Status(code, _) => {
            AttemptError::Retryable(format!("HTTP {} for {}", code, url))
        }
        ureq::Error::Transport(t) => AttemptError::Retryable(format!("{}: {}", url, t)),
    }
}

fn io_retryable(e: io::Error) -> AttemptError {
    AttemptError::Retryable(e.to_string())
}

/**
 * Validate a retrieved genome, anything that isn't parseable FASTA is removed.
 */
fn validate(path: &Path) -> Result<GenomeSummary, String> {
    GenomeSummary::from_fasta(path).map_err(|e| {
        fs::remove_file(path).ok();
        e
    })
}

impl SourceRetriever {
    fn download(&self, location: &str, destination: &Path) -> Result<(), AttemptError> {
        let url = genome_url(location);
        let response = ureq::get(&url)
            .timeout(self.timeout)
            .call()
            .map_err(|e| http_error(&url, e))?;

        // Download to a temp file first so a failed attempt never leaves a partial genome
        let tmp = destination.with_extension("tmp");
        let mut file = File::create(&tmp).map_err(io_retryable)?;
        let reader = response.into_reader();

        let copied = if url.ends_with(".gz") {
            io::copy(&mut MultiGzDecoder::new(reader), &mut file)
        } else {
            io::copy(&mut io::BufReader::new(reader), &mut file)
        };

        if let Err(e) = copied {
            fs::remove_file(&tmp).ok();
            return Err(io_retryable(e));
        }

        let summary = validate(&tmp)
            .map_err(|e| AttemptError::Retryable(format!("{} is not a valid genome: {}", url, e)))?;

        fs::rename(&tmp, destination).map_err(io_retryable)?;
        debug!("Downloaded {}", summary);

        Ok(())
    }

    fn copy(&self, location: &str, destination: &Path) -> Result<(), AttemptError> {
        let source = Path::new(location);

        if !source.exists() {
            return Err(AttemptError::Fatal(format!("{} does not exist", location)));
        }

        let same_file = match (source.canonicalize(), destination.canonicalize()) {
            (Ok(s), Ok(d)) => s == d,
            _ => false,
        };

        // Copying a file onto itself truncates it, and an invalid source must stay where it is
        let summary = if same_file {
            GenomeSummary::from_fasta(destination)
        } else {
            fs::copy(source, destination).map_err(io_retryable)?;
            validate(destination)
        }
        .map_err(|e| AttemptError::Fatal(format!("{} is not a valid genome: {}", location, e)))?;

        debug!("Copied {}", summary);

        Ok(())
    }
}

impl GenomeRetriever for SourceRetriever {
    fn fetch(&self, location: &str, destination: &Path) -> Result<(), AttemptError> {
        if is_remote(location) {
            self.download(location, destination)
        } else {
            self.copy(location, destination)
        }
    }
}

#[cfg(test)]
#[path = "tests/retrieve_tests.rs"]
mod retrieve_tests;
