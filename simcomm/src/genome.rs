/**
 * file: genome.rs
 * desc: Summarize retrieved genome FASTA files.
 */
use needletail::parse_fastx_file;
use std::path;

#[derive(Debug, Clone, PartialEq)]
pub struct GenomeSummary {
    // Genome (FASTA) filepath
    pub filepath: path::PathBuf,
    // Total genome size in bp
    pub size: usize,
    // Number of sequences (separate records) in this genome
    pub num_seqs: usize,
}

impl std::fmt::Display for GenomeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<Genome ({}) {} sequences, {}bp>",
            self.filepath.display(),
            self.num_seqs,
            self.size
        )
    }
}

impl GenomeSummary {
    /**
     * Parse the given FASTA file and summarize it. A file that can't be parsed or doesn't
     * contain any sequence isn't a usable genome.
     */
    pub fn from_fasta(filepath: &path::Path) -> Result<GenomeSummary, String> {
        let mut fasta_reader = match parse_fastx_file(filepath) {
            Ok(r) => r,
            Err(e) => return Err(format!("{}", e)),
        };
        let mut size = 0;
        let mut num_seqs = 0;

        while let Some(record_wrap) = fasta_reader.next() {
            // Fail on any parse errors even if all other records are fine
            let record = match record_wrap {
                Ok(r) => r,
                Err(e) => return Err(format!("{}", e)),
            };

            size += record.seq().len();
            num_seqs += 1;
        }

        if num_seqs == 0 || size == 0 {
            return Err(format!("{} doesn't contain any sequences", filepath.display()));
        }

        Ok(GenomeSummary {
            filepath: filepath.to_path_buf(),
            size,
            num_seqs,
        })
    }
}

#[cfg(test)]
#[path = "tests/genome_tests.rs"]
mod genome_tests;
