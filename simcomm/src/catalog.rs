/**
 * file: catalog.rs
 * desc: Reference genome catalog and the rank index used to look up genomes available
 *       below a given taxon.
 */
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use shared::taxonomy::{Rank, TaxId, Taxonomy};

/**
 * STRUCTS
 */

/**
 * A reference genome from the genome lists.
 *
 * fields
 *  taxid:     taxonomy ID of the genome, also used as its genome ID
 *  name:      scientific name
 *  locations: URLs or filepaths in list order, only the first one is indexed
 */
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceGenome {
    pub taxid: TaxId,
    pub name: String,
    pub locations: Vec<String>,
}

pub type GenomeCatalog = BTreeMap<TaxId, ReferenceGenome>;

/**
 * A genome that can be drawn for an OTU: where to get it and which genome it is.
 */
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenomeRef {
    pub location: String,
    pub genome_id: TaxId,
}

/**
 * Genomes available at each rank, keyed by the taxid of the ancestor at that rank. Buckets
 * are never empty: consuming the last genome of a bucket removes the bucket.
 */
#[derive(Debug, Clone, Default)]
pub struct RankIndex {
    buckets: BTreeMap<Rank, BTreeMap<TaxId, Vec<GenomeRef>>>,
}

/**
 * FUNCTIONS
 */

impl RankIndex {
    /**
     * Build the rank index from the genome catalog. Every genome is added to the bucket of
     * each ancestor whose rank is at most max_rank. Genomes whose lineage can't be resolved
     * don't contribute anything.
     *
     * args
     *  catalog:  reference genomes
     *  taxonomy: taxonomy used to resolve genome lineages
     *  max_rank: coarsest rank to index
     *
     * returns
     *  the rank index
     */
    pub fn build<T: Taxonomy + ?Sized>(
        catalog: &GenomeCatalog,
        taxonomy: &T,
        max_rank: Rank,
    ) -> RankIndex {
        let mut buckets: BTreeMap<Rank, BTreeMap<TaxId, Vec<GenomeRef>>> = Rank::up_to(max_rank)
            .into_iter()
            .map(|r| (r, BTreeMap::new()))
            .collect();
        let mut unresolved = 0;

        for genome in catalog.values() {
            let location = match genome.locations.first() {
                Some(l) => l,
                None => continue,
            };
            let lineage = match taxonomy.lineage(genome.taxid) {
                Some(l) => l,
                None => {
                    debug!(
                        "No lineage for genome {} ({}), skipping",
                        genome.taxid, genome.name
                    );
                    unresolved += 1;
                    continue;
                }
            };

            for taxid in lineage {
                let rank = match taxonomy.recognized_rank(taxid) {
                    Some(r) => r,
                    None => continue,
                };

                if let Some(rank_map) = buckets.get_mut(&rank) {
                    rank_map.entry(taxid).or_default().push(GenomeRef {
                        location: location.clone(),
                        genome_id: genome.taxid,
                    });
                }
            }
        }

        if unresolved > 0 {
            debug!("{} genomes could not be placed in the taxonomy", unresolved);
        }

        RankIndex { buckets }
    }

    /**
     * Genomes available at the given rank for the given taxid.
     */
    pub fn genomes(&self, rank: Rank, taxid: TaxId) -> Option<&[GenomeRef]> {
        self.buckets
            .get(&rank)
            .and_then(|m| m.get(&taxid))
            .map(|v| v.as_slice())
    }

    /**
     * Ranks present in the index, most specific first.
     */
    pub fn ranks(&self) -> Vec<Rank> {
        self.buckets.keys().copied().collect()
    }

    /**
     * Remove a genome from every bucket containing it. Buckets left empty are removed.
     *
     * returns
     *  the number of buckets the genome was removed from
     */
    pub fn consume(&mut self, genome: &GenomeRef) -> usize {
        let mut removed = 0;

        for rank_map in self.buckets.values_mut() {
            rank_map.retain(|_, genomes| {
                let before = genomes.len();

                genomes.retain(|g| g != genome);
                removed += before - genomes.len();

                !genomes.is_empty()
            });
        }

        removed
    }

    /**
     * Distinct genomes still in the index, paired with the taxid of the first bucket they
     * were found in. Ordered by rank (most specific first), bucket taxid, and bucket order.
     */
    pub fn remaining(&self) -> Vec<(TaxId, GenomeRef)> {
        let mut seen = BTreeSet::new();
        let mut remaining = Vec::new();

        for rank_map in self.buckets.values() {
            for (taxid, genomes) in rank_map.iter() {
                for g in genomes {
                    if seen.insert(g.clone()) {
                        remaining.push((*taxid, g.clone()));
                    }
                }
            }
        }

        remaining
    }

    /**
     * Number of (rank, taxid) buckets in the index.
     */
    pub fn num_buckets(&self) -> usize {
        self.buckets.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.num_buckets() == 0
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod catalog_tests;
