/**
 * file: cli.rs
 * desc: CLI parsing.
 */
use clap::Parser;

/**
 * HELP DESCRIPTIONS
 */

static PROFILE_HELP: &'static str = "
OTU abundance profile: a BIOM (1.0, JSON) table or a classic TSV OTU table.

TSV tables have an OTU ID column, one column per sample, and a final taxonomy
column containing ';' separated lineages, e.g.

    #OTU ID  S1  S2  taxonomy
    OTU_1    10  2   k__Bacteria; p__Proteobacteria; ...
";

static GENOME_LIST_HELP: &'static str = "
Tab separated list of reference genomes, one genome per line:

    taxid  name  location

<location> is an NCBI assembly directory URL (ftp:// URLs are fetched over
http://), a direct URL to a (gzipped) FASTA file, or a local FASTA filepath.
";

static CONFIG_HELP: &'static str = "
Community configuration (INI) to update. Assignment parameters are read from
the [Main] section:

    max_strains_per_otu  maximum number of strains per OTU (default 3)
    log_mu               mean of the log-normal strain split (default 1.0)
    log_sigma            sigma of the log-normal strain split (default 2.0)
    seed                 random seed, --seed takes precedence
";

static TAXONOMY_HELP: &'static str = "
Directory containing an NCBI taxdump (nodes.dmp, names.dmp, and optionally
merged.dmp)
";

/**
 * STRUCTS
 */

#[derive(Debug, Parser)]
#[clap(version, about, long_about = None)]
pub struct CliArgs {
    #[clap(long, value_parser, help = PROFILE_HELP)]
    pub profile: String,

    #[clap(long, value_parser, help = GENOME_LIST_HELP)]
    pub reference_genomes: String,

    #[clap(
        long,
        value_parser,
        help = "Additional reference genome list, same format as --reference-genomes"
    )]
    pub additional_references: Option<String>,

    #[clap(long, value_parser, help = CONFIG_HELP)]
    pub config: Option<String>,

    #[clap(long, value_parser, help = TAXONOMY_HELP)]
    pub taxonomy: String,

    #[clap(
        long,
        value_parser,
        help = "Output directory for the community tables, genomes, and updated config"
    )]
    pub output: String,

    #[clap(long, value_parser, help = "Random seed")]
    pub seed: Option<u64>,

    #[clap(
        long,
        value_parser = valid_sample_count,
        help = "Number of samples to use from the profile, defaults to all of them"
    )]
    pub samples: Option<usize>,

    #[clap(
        long,
        value_parser,
        help = "Assign each reference genome to at most one OTU"
    )]
    pub no_replace: bool,

    #[clap(
        long,
        value_parser,
        help = "Assign leftover genomes to OTUs that couldn't be mapped"
    )]
    pub fill_up: bool,

    #[clap(
        long,
        default_value_t = 4,
        value_parser,
        help = "Number of threads to use for genome retrieval"
    )]
    pub threads: usize,

    #[clap(
        long,
        value_parser,
        help = "Debug logging, also lists every assignment warning"
    )]
    pub debug: bool,
}

/**
 * FUNCTIONS
 */

/**
 * Ensure at least one sample is requested.
 */
fn valid_sample_count(s: &str) -> Result<usize, String> {
    let samples: usize = s
        .parse()
        .map_err(|_| format!("'{}' isn't a valid number of samples", s))?;

    if samples == 0 {
        Err("At least one sample is required".to_string())
    } else {
        Ok(samples)
    }
}

pub fn parse_cli_args() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_sample_count() {
        assert!(valid_sample_count("3") == Ok(3));
        assert!(valid_sample_count("0").is_err());
        assert!(valid_sample_count("-1").is_err());
        assert!(valid_sample_count("many").is_err());
    }

    #[test]
    fn test_parse_args() {
        let args = CliArgs::parse_from(vec![
            "simcomm",
            "--profile",
            "otus.biom",
            "--reference-genomes",
            "genomes.tsv",
            "--taxonomy",
            "taxdump",
            "--output",
            "out",
            "--no-replace",
            "--samples",
            "2",
        ]);

        assert!(args.profile == "otus.biom");
        assert!(args.no_replace);
        assert!(!args.fill_up);
        assert!(args.samples == Some(2));
        assert!(args.threads == 4);
        assert!(args.config.is_none());
    }
}
