/**
 * file: fillup.rs
 * desc: Hand out genomes that weren't used by the assignment to OTUs that didn't get any.
 */
use itertools::Itertools;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

use crate::assign::{strain_id, Assignment, AssignmentRecord};
use crate::catalog::{GenomeRef, RankIndex};
use crate::profile::OtuRecord;
use shared::util;

/**
 * Assign leftover genomes to unassigned OTUs, lowest mean abundance first (ties broken by
 * OTU ID). Each OTU gets a single genome carrying its full abundance. Stops once the pool
 * of unused genomes is empty.
 *
 * The pool holds every genome still in the rank index that no assignment record uses, in
 * the order given by RankIndex::remaining. Genomes handed out are consumed from the index.
 *
 * args
 *  assignment: assignment to extend
 *  index:      rank index after the assignment pass
 *  otus:       OTUs from the abundance profile
 *
 * returns
 *  the number of OTUs that received a genome
 */
pub fn fill_up(assignment: &mut Assignment, index: &mut RankIndex, otus: &[OtuRecord]) -> usize {
    let used: HashSet<GenomeRef> = assignment.records.iter().map(|r| r.genome()).collect();
    let assigned: HashSet<&str> = assignment
        .records
        .iter()
        .map(|r| r.otu_id.as_str())
        .collect();
    let mut pool: VecDeque<_> = index
        .remaining()
        .into_iter()
        .filter(|(_, g)| !used.contains(g))
        .collect();

    let unassigned = otus
        .iter()
        .filter(|otu| !assigned.contains(otu.id.as_str()))
        .map(|otu| (util::mean(&otu.abundances), otu))
        .sorted_by(|(a, x), (b, y)| a.total_cmp(b).then_with(|| x.id.cmp(&y.id)))
        .collect::<Vec<_>>();

    let mut filled = Vec::new();

    for (mean, otu) in unassigned {
        let (taxid, genome) = match pool.pop_front() {
            Some(g) => g,
            None => break,
        };

        debug!(
            "Filling up OTU {} (mean abundance {}) with genome {}",
            otu.id, mean, genome.genome_id
        );

        index.consume(&genome);
        filled.push(AssignmentRecord {
            strain_id: strain_id(&otu.id, 0),
            otu_id: otu.id.clone(),
            taxid,
            genome_id: genome.genome_id,
            location: genome.location,
            abundances: otu.abundances.clone(),
        });
    }

    let count = filled.len();

    assignment.records.extend(filled);

    count
}

#[cfg(test)]
#[path = "tests/fillup_tests.rs"]
mod fillup_tests;
