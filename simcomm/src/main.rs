/**
 * file: main.rs
 * desc: it's the main
 */
mod assign;
mod catalog;
mod cli;
mod config;
mod error;
mod files;
mod fillup;
mod genome;
mod lineage;
mod log;
mod output;
mod profile;
mod retrieve;

#[cfg(test)]
#[path = "tests/fixtures.rs"]
mod fixtures;

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::catalog::RankIndex;
use crate::cli::CliArgs;
use crate::config::CommunityConfig;
use crate::error::Result;
use crate::retrieve::SourceRetriever;
use shared::taxonomy::TaxonomyDb;

fn run_main(args: &CliArgs) -> Result<PathBuf> {
    let out_dir = Path::new(&args.output);

    std::fs::create_dir_all(out_dir)?;

    let mut config = CommunityConfig::load(args.config.as_ref().map(Path::new))?;

    info!("Reading abundance profile {}", args.profile);

    let profile = profile::read_profile(Path::new(&args.profile), args.samples)?;

    info!(
        "Profile has {} OTUs across {} samples",
        profile.otus.len(),
        profile.samples.len()
    );

    info!("Reading reference genome lists");

    let genomes = files::read_genome_lists(
        Path::new(&args.reference_genomes),
        args.additional_references.as_ref().map(Path::new),
    )?;

    info!("Loading taxonomy from {}", args.taxonomy);

    let taxonomy = TaxonomyDb::load(Path::new(&args.taxonomy))?;
    let params = config.assignment_params(!args.no_replace);
    let mut index = RankIndex::build(&genomes, &taxonomy, params.max_rank);

    info!(
        "Indexed {} reference genomes into {} taxa",
        genomes.len(),
        index.num_buckets()
    );
    debug!("Indexed ranks: {:?}", index.ranks());

    if index.is_empty() {
        warn!("None of the reference genomes could be placed in the taxonomy");
    }

    // Seed from the command line takes precedence over the config
    let mut rng = match args.seed.or_else(|| config.seed()) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut assignment =
        assign::assign_genomes(&profile.otus, &mut index, &taxonomy, &params, &mut rng)?;

    assign::report_warnings(&assignment.warnings, args.debug);

    if args.fill_up {
        let filled = fillup::fill_up(&mut assignment, &mut index, &profile.otus);

        info!("Filled up {} unassigned OTUs", filled);
    }

    if assignment.records.is_empty() {
        warn!("No OTU could be mapped to a reference genome");
    }

    info!("Retrieving genomes using {} threads", args.threads);

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global()
    {
        warn!("Could not configure the thread pool: {}", e);
    }

    let community = output::write_community(
        &assignment.records,
        profile.samples.len(),
        out_dir,
        &SourceRetriever::default(),
    )?;

    info!(
        "{} strains written, genomes are in {}",
        community.num_genomes,
        community.genomes_dir.display()
    );

    config.set_num_samples(profile.samples.len());
    config.set_community_files(&community);

    config.write(out_dir)
}

fn main() {
    let args = cli::parse_cli_args();

    log::setup_logging(args.debug);

    match run_main(&args) {
        Ok(config_path) => {
            info!("Wrote community config to {}", config_path.display());
            println!("{}", config_path.display());
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
