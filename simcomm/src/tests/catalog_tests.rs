/**
 * file: catalog_tests.rs
 * desc: Rank index tests.
 */
use crate::catalog::{GenomeRef, RankIndex};
use crate::fixtures;
use shared::taxonomy::{Rank, TaxId};

fn genome(taxid: u32, location: &str) -> GenomeRef {
    GenomeRef {
        location: location.to_string(),
        genome_id: TaxId(taxid),
    }
}

fn fixture_index() -> RankIndex {
    RankIndex::build(
        &fixtures::reference_catalog(),
        &fixtures::taxonomy(),
        Rank::Family,
    )
}

#[test]
fn test_build_buckets() {
    let index = fixture_index();

    assert!(index.ranks() == vec![Rank::Species, Rank::Genus, Rank::Family]);
    // 4 species, 4 genera, 2 families
    assert!(index.num_buckets() == 10);
    assert!(!index.is_empty());

    // The K-12 strain is indexed under its species
    assert!(
        index.genomes(Rank::Species, TaxId(562)).unwrap()
            == &[genome(562, "refs/ecoli"), genome(83333, "refs/ecoli_k12")]
    );
    assert!(index.genomes(Rank::Genus, TaxId(561)).unwrap().len() == 2);
    assert!(index.genomes(Rank::Family, TaxId(543)).unwrap().len() == 4);
    assert!(index.genomes(Rank::Family, TaxId(186817)).unwrap() == &[genome(1423, "refs/bsubtilis")]);
}

#[test]
fn test_build_stops_at_max_rank() {
    let index = fixture_index();

    assert!(index.genomes(Rank::Order, TaxId(91347)).is_none());
    assert!(index.genomes(Rank::Phylum, TaxId(1224)).is_none());
    assert!(index.genomes(Rank::Superkingdom, TaxId(2)).is_none());

    let genus_index = RankIndex::build(
        &fixtures::reference_catalog(),
        &fixtures::taxonomy(),
        Rank::Genus,
    );

    assert!(genus_index.ranks() == vec![Rank::Species, Rank::Genus]);
    assert!(genus_index.genomes(Rank::Family, TaxId(543)).is_none());
}

#[test]
fn test_build_skips_unknown_and_uses_first_location() {
    let mut catalog = fixtures::catalog(&[
        (999999, "Unknown organism", "refs/unknown"),
        (28901, "Salmonella enterica", "refs/senterica_1"),
    ]);

    catalog
        .get_mut(&TaxId(28901))
        .unwrap()
        .locations
        .push("refs/senterica_2".to_string());

    let index = RankIndex::build(&catalog, &fixtures::taxonomy(), Rank::Family);

    assert!(index.num_buckets() == 3);
    assert!(
        index.genomes(Rank::Species, TaxId(28901)).unwrap() == &[genome(28901, "refs/senterica_1")]
    );
}

#[test]
fn test_consume() {
    let mut index = fixture_index();

    // Species, genus, and family buckets
    assert!(index.consume(&genome(623, "refs/sflexneri")) == 3);
    assert!(index.genomes(Rank::Species, TaxId(623)).is_none());
    assert!(index.genomes(Rank::Genus, TaxId(620)).is_none());
    assert!(index.genomes(Rank::Family, TaxId(543)).unwrap().len() == 3);
    assert!(index.num_buckets() == 8);

    // Already gone
    assert!(index.consume(&genome(623, "refs/sflexneri")) == 0);

    // Same taxid but a different location is a different genome
    assert!(index.consume(&genome(562, "refs/elsewhere")) == 0);
}

#[test]
fn test_consume_everything() {
    let mut index = fixture_index();

    for (_, g) in index.remaining() {
        index.consume(&g);
    }

    assert!(index.is_empty());
    assert!(index.remaining().is_empty());
}

#[test]
fn test_remaining_order() {
    let index = fixture_index();
    let remaining = index.remaining();

    assert!(
        remaining
            == vec![
                (TaxId(562), genome(562, "refs/ecoli")),
                (TaxId(562), genome(83333, "refs/ecoli_k12")),
                (TaxId(623), genome(623, "refs/sflexneri")),
                (TaxId(1423), genome(1423, "refs/bsubtilis")),
                (TaxId(28901), genome(28901, "refs/senterica")),
            ]
    );
}
