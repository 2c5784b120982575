/**
 * file: lineage.rs
 * desc: Convert profile lineages (rank prefixed names) into taxonomy IDs.
 */
use shared::taxonomy::{TaxId, Taxonomy};

/**
 * The scientific name part of a lineage token. Tokens look like "g__Escherichia", the name
 * is everything after the last "__". Tokens without a prefix are used as is.
 */
pub fn token_name(token: &str) -> &str {
    token.rsplit("__").next().unwrap_or(token).trim()
}

/**
 * Resolve a scientific name to a taxid. If the full name isn't known, retry with the first
 * word only; profile names are sometimes mangled beyond the genus (e.g. "Escherichia coli_2").
 */
fn resolve_name<T: Taxonomy + ?Sized>(name: &str, taxonomy: &T) -> Option<TaxId> {
    taxonomy.name_to_id(name).or_else(|| {
        name.split_whitespace()
            .next()
            .filter(|first| *first != name)
            .and_then(|first| taxonomy.name_to_id(first))
    })
}

/**
 * Normalize a profile lineage into taxids at recognized ranks, most specific first.
 * Tokens with an empty name, names that can't be resolved, and taxa at unrecognized ranks
 * are silently dropped.
 *
 * args
 *  tokens:   lineage tokens, least specific first (profile order)
 *  taxonomy: taxonomy used for name lookups
 *
 * returns
 *  the normalized lineage, most specific first
 */
pub fn normalize_lineage<T: Taxonomy + ?Sized>(tokens: &[String], taxonomy: &T) -> Vec<TaxId> {
    let mut lineage: Vec<TaxId> = tokens
        .iter()
        .map(|t| token_name(t))
        .filter(|name| !name.is_empty())
        .filter_map(|name| resolve_name(name, taxonomy))
        .filter(|taxid| taxonomy.recognized_rank(*taxid).is_some())
        .collect();

    // Profiles list the least specific rank first
    lineage.reverse();

    lineage
}

#[cfg(test)]
#[path = "tests/lineage_tests.rs"]
mod lineage_tests;
