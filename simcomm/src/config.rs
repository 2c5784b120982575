/**
 * file: config.rs
 * desc: Read and update the community configuration (INI) consumed by the read simulator.
 */
use ini::Ini;
use itertools::Itertools;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

use crate::assign::AssignmentParams;
use crate::error::Result;
use crate::output::CommunityFiles;

pub const MAIN: &str = "Main";
pub const COMMUNITY: &str = "community0";

pub const DEFAULT_MAX_STRAINS: u32 = 3;
pub const DEFAULT_LOG_MU: f64 = 1.0;
pub const DEFAULT_LOG_SIGMA: f64 = 2.0;

pub struct CommunityConfig {
    ini: Ini,
}

impl CommunityConfig {
    /**
     * Load the configuration from disk, or start from an empty one if no path is given.
     */
    pub fn load(path: Option<&Path>) -> Result<CommunityConfig> {
        let ini = match path {
            Some(p) => Ini::load_from_file(p)?,
            None => Ini::new(),
        };

        Ok(CommunityConfig { ini })
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.ini.get_from(Some(section), key)
    }

    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.ini.with_section(Some(section)).set(key, value.into());
    }

    /**
     * Parse a [Main] value, falling back to the default with a warning if it's missing or
     * can't be parsed.
     */
    fn main_or<T: FromStr + std::fmt::Display>(&self, key: &str, default: T) -> T {
        match self.get(MAIN, key).map(|v| v.trim().parse::<T>()) {
            Some(Ok(v)) => v,
            Some(Err(_)) => {
                warn!("{} is not valid, using default ({})", key, default);
                default
            }
            None => {
                warn!("{} not set, using default ({})", key, default);
                default
            }
        }
    }

    pub fn max_strains(&self) -> u32 {
        self.main_or("max_strains_per_otu", DEFAULT_MAX_STRAINS)
    }

    pub fn log_mu(&self) -> f64 {
        self.main_or("log_mu", DEFAULT_LOG_MU)
    }

    pub fn log_sigma(&self) -> f64 {
        self.main_or("log_sigma", DEFAULT_LOG_SIGMA)
    }

    /**
     * Seed from [Main], if there is a valid one.
     */
    pub fn seed(&self) -> Option<u64> {
        self.get(MAIN, "seed").and_then(|s| s.trim().parse().ok())
    }

    /**
     * Assignment parameters from the configuration.
     *
     * args
     *  replace: whether genomes may be assigned to more than one OTU
     */
    pub fn assignment_params(&self, replace: bool) -> AssignmentParams {
        AssignmentParams {
            max_strains: self.max_strains(),
            mu: self.log_mu(),
            sigma: self.log_sigma(),
            replace,
            ..AssignmentParams::default()
        }
    }

    pub fn set_num_samples(&mut self, num_samples: usize) {
        self.set(MAIN, "number_of_samples", num_samples.to_string());
    }

    /**
     * Point the configuration at the generated community files.
     */
    pub fn set_community_files(&mut self, files: &CommunityFiles) {
        let abundance_files = files
            .abundances
            .iter()
            .map(|p| p.to_string_lossy())
            .join(",");

        self.set(MAIN, "distribution_file_paths", abundance_files);
        self.set(
            COMMUNITY,
            "id_to_genome_file",
            files.genome_to_id.to_string_lossy(),
        );
        self.set(COMMUNITY, "metadata", files.metadata.to_string_lossy());
        self.set(COMMUNITY, "num_real_genomes", files.num_genomes.to_string());
        self.set(COMMUNITY, "genomes_total", files.num_genomes.to_string());
    }

    /**
     * Write the configuration to out_dir/config.ini.
     *
     * returns
     *  the path of the written configuration
     */
    pub fn write(&self, out_dir: &Path) -> Result<PathBuf> {
        let path = out_dir.join("config.ini");

        self.ini.write_to_file(&path)?;

        Ok(path)
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod config_tests;
