/**
 * file: assign.rs
 * desc: Assign concrete reference genomes (strains) to OTUs and split OTU abundances
 *       across the assigned strains.
 */
use rand::seq::index::sample as sample_indices;
use rand::Rng;
use rand_distr::{Distribution, Geometric, LogNormal};
use tracing::{debug, warn};

use crate::catalog::{GenomeRef, RankIndex};
use crate::error::{Error, Result};
use crate::lineage;
use crate::profile::OtuRecord;
use shared::taxonomy::{Rank, TaxId, Taxonomy};
use shared::util;

/**
 * STRUCTS
 */

/**
 * Parameters for the genome assignment.
 *
 * fields
 *  max_strains: upper bound for the strain count draw, see draw_strain_count
 *  mu:          mean of the log-normal strain weight distribution
 *  sigma:       standard deviation of the log-normal strain weight distribution
 *  max_rank:    coarsest rank at which OTUs are still matched to genomes
 *  replace:     if false, a genome drawn for one OTU can't be drawn again for another
 */
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentParams {
    pub max_strains: u32,
    pub mu: f64,
    pub sigma: f64,
    pub max_rank: Rank,
    pub replace: bool,
}

impl Default for AssignmentParams {
    fn default() -> Self {
        AssignmentParams {
            max_strains: 3,
            mu: 1.0,
            sigma: 2.0,
            max_rank: Rank::Family,
            replace: true,
        }
    }
}

/**
 * A single strain assigned to an OTU.
 *
 * fields
 *  strain_id:  "{otu_id}.{strain_index}"
 *  otu_id:     OTU the strain belongs to
 *  taxid:      taxid the OTU was matched on
 *  genome_id:  taxid of the assigned genome
 *  location:   where to retrieve the genome from
 *  abundances: this strain's share of the OTU abundance, per sample
 */
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentRecord {
    pub strain_id: String,
    pub otu_id: String,
    pub taxid: TaxId,
    pub genome_id: TaxId,
    pub location: String,
    pub abundances: Vec<f64>,
}

impl AssignmentRecord {
    pub fn genome(&self) -> GenomeRef {
        GenomeRef {
            location: self.location.clone(),
            genome_id: self.genome_id,
        }
    }
}

/**
 * Result of an assignment pass. Warnings describe OTUs that couldn't be (fully) mapped, they
 * never stop the assignment.
 */
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignment {
    pub records: Vec<AssignmentRecord>,
    pub warnings: Vec<String>,
}

/**
 * Distributions used while assigning genomes, built once per pass.
 */
struct Sampler {
    max_strains: u64,
    strain_count: Geometric,
    weights: LogNormal<f64>,
}

/**
 * FUNCTIONS
 */

pub fn strain_id(otu_id: &str, index: usize) -> String {
    format!("{}.{}", otu_id, index)
}

impl Sampler {
    fn new(params: &AssignmentParams) -> Result<Sampler> {
        if params.max_strains == 0 {
            return Err(Error::InvalidParameter(
                "max strains per OTU must be at least 1".to_string(),
            ));
        }

        if !params.mu.is_finite() || !params.sigma.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "mu and sigma must be finite (mu = {}, sigma = {})",
                params.mu, params.sigma
            )));
        }

        if params.sigma < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "sigma must not be negative (sigma = {})",
                params.sigma
            )));
        }

        // Success probability is 2 / max_strains, which is > 1 for a single strain
        let p = (2.0 / params.max_strains as f64).min(1.0);
        let strain_count = Geometric::new(p)
            .map_err(|e| Error::InvalidParameter(format!("strain count distribution: {}", e)))?;
        let weights = LogNormal::new(params.mu, params.sigma).map_err(|e| {
            Error::InvalidParameter(format!(
                "log-normal distribution (mu = {}, sigma = {}): {}",
                params.mu, params.sigma, e
            ))
        })?;

        Ok(Sampler {
            max_strains: params.max_strains as u64,
            strain_count,
            weights,
        })
    }

    /**
     * Draw the number of strains for an OTU. The geometric draw counts trials up to and
     * including the first success, is reduced modulo max_strains and floored at one, which
     * favours one or two strains.
     */
    fn draw_strain_count<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        // rand_distr counts failures before the first success
        let trials = self.strain_count.sample(rng).saturating_add(1);

        (trials % self.max_strains).max(1) as usize
    }

    /**
     * Draw log-normal weights for n strains and normalize them to sum to one. If the weights
     * degenerate (e.g. they all underflow to zero) the OTU is split evenly.
     */
    fn draw_weights<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<f64> {
        let raw: Vec<f64> = (0..n).map(|_| self.weights.sample(rng)).collect();

        util::normalize(&raw).unwrap_or_else(|| vec![1.0 / n as f64; n])
    }
}

/**
 * Draw strains for a single OTU from the genomes available at the matched taxon and split
 * the OTU abundances across them. Strains are selected uniformly without replacement.
 *
 * args
 *  otu:       the OTU
 *  taxid:     taxid the OTU was matched on
 *  available: genomes available at that taxid
 *  sampler:   strain count and weight distributions
 *  rng:       random number generator
 *
 * returns
 *  the assignment records for the OTU's strains
 */
fn draw_strains<R: Rng + ?Sized>(
    otu: &OtuRecord,
    taxid: TaxId,
    available: &[GenomeRef],
    sampler: &Sampler,
    rng: &mut R,
) -> Vec<AssignmentRecord> {
    let strains_to_draw = sampler.draw_strain_count(rng);

    // Not enough genomes, use all of them
    let used: Vec<&GenomeRef> = if available.len() >= strains_to_draw {
        sample_indices(rng, available.len(), strains_to_draw)
            .into_iter()
            .map(|i| &available[i])
            .collect()
    } else {
        available.iter().collect()
    };

    if used.is_empty() {
        return Vec::new();
    }

    let weights = sampler.draw_weights(used.len(), rng);

    used.into_iter()
        .zip(weights)
        .enumerate()
        .map(|(i, (genome, weight))| AssignmentRecord {
            strain_id: strain_id(&otu.id, i),
            otu_id: otu.id.clone(),
            taxid,
            genome_id: genome.genome_id,
            location: genome.location.clone(),
            abundances: otu.abundances.iter().map(|a| a * weight).collect(),
        })
        .collect()
}

/**
 * Map every OTU in the profile onto reference genomes. Each OTU's lineage is walked from the
 * most specific rank upwards, the first taxon with available genomes is used. OTUs are
 * processed in profile order; when sampling without replacement each drawn genome is removed
 * from the index before the next OTU is processed, so the result is reproducible for a
 * fixed seed.
 *
 * args
 *  otus:     OTUs from the abundance profile
 *  index:    genomes available per rank and taxid, consumed if params.replace is false
 *  taxonomy: taxonomy used to normalize OTU lineages
 *  params:   assignment parameters
 *  rng:      random number generator
 *
 * returns
 *  the strains assigned to each OTU and any warnings, or an error if params are invalid
 */
pub fn assign_genomes<T: Taxonomy + ?Sized, R: Rng + ?Sized>(
    otus: &[OtuRecord],
    index: &mut RankIndex,
    taxonomy: &T,
    params: &AssignmentParams,
    rng: &mut R,
) -> Result<Assignment> {
    let sampler = Sampler::new(params)?;
    let mut assignment = Assignment::default();

    for otu in otus {
        let lineage = lineage::normalize_lineage(&otu.lineage, taxonomy);

        if lineage.is_empty() {
            let name = otu
                .lineage
                .last()
                .map(|t| lineage::token_name(t))
                .unwrap_or("");

            assignment.warnings.push(format!(
                "No matching NCBI ID for otu {}, scientific name {}",
                otu.id, name
            ));
            continue;
        }

        let mut mapped = false;
        let mut too_high = false;

        for taxid in lineage.iter().copied() {
            // Normalized lineages only contain recognized ranks
            let rank = match taxonomy.recognized_rank(taxid) {
                Some(r) => r,
                None => continue,
            };

            if rank > params.max_rank {
                assignment.warnings.push(format!(
                    "Rank {} of OTU {} too high, no matching genomes found",
                    rank, otu.id
                ));
                assignment.warnings.push(format!(
                    "Full lineage was {:?}, mapped from profile lineage {:?}",
                    lineage.iter().map(|t| t.0).collect::<Vec<u32>>(),
                    otu.lineage
                ));
                too_high = true;
                break;
            }

            let available = match index.genomes(rank, taxid) {
                Some(gs) => gs,
                None => {
                    assignment.warnings.push(format!(
                        "For OTU {} no genomes have been found on rank {} with ID {}",
                        otu.id, rank, taxid
                    ));
                    continue;
                }
            };

            let strains = draw_strains(otu, taxid, available, &sampler, rng);

            debug!(
                "OTU {} matched on {} {} with {} strain(s)",
                otu.id,
                rank,
                taxid,
                strains.len()
            );

            debug_assert!(otu.abundances.iter().enumerate().all(|(i, a)| {
                util::approx_eq(strains.iter().map(|s| s.abundances[i]).sum::<f64>(), *a, 1e-9)
            }));

            if !params.replace {
                for s in strains.iter() {
                    index.consume(&s.genome());
                }
            }

            assignment.records.extend(strains);
            mapped = true;
            break;
        }

        if !mapped && !too_high {
            assignment
                .warnings
                .push(format!("OTU {} could not be mapped to any genome", otu.id));
        }
    }

    Ok(assignment)
}

/**
 * Report assignment warnings. A single summary is always logged, individual warnings only
 * when verbose.
 */
pub fn report_warnings(warnings: &[String], verbose: bool) {
    if warnings.is_empty() {
        return;
    }

    warn!("Some OTUs could not be mapped ({} warnings)", warnings.len());

    if verbose {
        warnings.iter().for_each(|w| warn!("{}", w));
    }
}

#[cfg(test)]
#[path = "tests/assign_tests.rs"]
mod assign_tests;
