/**
 * file: taxonomy.rs
 * desc: Taxonomic ranks, taxonomy IDs, and lookups into an NCBI style taxonomy.
 */
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/**
 * STRUCTS
 */

/**
 * NCBI taxonomy ID.
 */
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaxId(pub u32);

/**
 * Ranks used for mapping OTUs onto genomes. The declaration order is significant: variants
 * are ordered from most specific (species) to least specific (superkingdom), so comparisons
 * like `rank > Rank::Family` mean "coarser than family".
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rank {
    Species,
    Genus,
    Family,
    Order,
    Class,
    Phylum,
    Superkingdom,
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TaxId {
    fn from(id: u32) -> Self {
        TaxId(id)
    }
}

impl FromStr for TaxId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(TaxId)
            .map_err(|_| format!("`{}` isn't a valid taxonomy ID", s))
    }
}

impl Rank {
    pub const ALL: [Rank; 7] = [
        Rank::Species,
        Rank::Genus,
        Rank::Family,
        Rank::Order,
        Rank::Class,
        Rank::Phylum,
        Rank::Superkingdom,
    ];

    /**
     * All ranks from species up to and including the given rank.
     */
    pub fn up_to(max_rank: Rank) -> Vec<Rank> {
        Rank::ALL
            .iter()
            .copied()
            .filter(|r| *r <= max_rank)
            .collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Species => "species",
            Rank::Genus => "genus",
            Rank::Family => "family",
            Rank::Order => "order",
            Rank::Class => "class",
            Rank::Phylum => "phylum",
            Rank::Superkingdom => "superkingdom",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Rank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "species" => Ok(Rank::Species),
            "genus" => Ok(Rank::Genus),
            "family" => Ok(Rank::Family),
            "order" => Ok(Rank::Order),
            "class" => Ok(Rank::Class),
            "phylum" => Ok(Rank::Phylum),
            // Newer taxdumps renamed superkingdom to domain
            "superkingdom" | "domain" => Ok(Rank::Superkingdom),
            x => Err(format!("`{}` isn't a recognized rank", x)),
        }
    }
}

/**
 * Lookups the community builder needs from a taxonomy. Implementations are passed
 * explicitly to whatever needs them so tests can use small fixture taxonomies.
 */
pub trait Taxonomy {
    // Ancestors of the given taxid, ordered from the root down to (and including) the taxid
    fn lineage(&self, taxid: TaxId) -> Option<Vec<TaxId>>;
    // Raw rank string of the taxid, e.g. "species" or "no rank"
    fn rank(&self, taxid: TaxId) -> Option<&str>;
    // Resolve a scientific name to a taxid
    fn name_to_id(&self, name: &str) -> Option<TaxId>;

    /**
     * Rank of the taxid if it's one of the recognized ranks.
     */
    fn recognized_rank(&self, taxid: TaxId) -> Option<Rank> {
        self.rank(taxid).and_then(|r| r.parse().ok())
    }
}

impl<T: ?Sized> Taxonomy for Box<T>
where
    T: Taxonomy,
{
    fn lineage(&self, taxid: TaxId) -> Option<Vec<TaxId>> {
        (**self).lineage(taxid)
    }

    fn rank(&self, taxid: TaxId) -> Option<&str> {
        (**self).rank(taxid)
    }

    fn name_to_id(&self, name: &str) -> Option<TaxId> {
        (**self).name_to_id(name)
    }
}

/**
 * In-memory taxonomy, either loaded from an NCBI taxdump or built node by node.
 *
 * fields
 *  nodes:    taxid -> (parent taxid, rank)
 *  names:    scientific name -> taxid
 *  synonyms: synonyms and equivalent names -> taxid, only used if no scientific name matches
 *  merged:   deprecated taxid -> current taxid
 */
#[derive(Debug, Clone, Default)]
pub struct TaxonomyDb {
    nodes: HashMap<TaxId, (TaxId, String)>,
    names: HashMap<String, TaxId>,
    synonyms: HashMap<String, TaxId>,
    merged: HashMap<TaxId, TaxId>,
}

/**
 * FUNCTIONS
 */

// The root of the NCBI taxonomy is its own parent
const ROOT: TaxId = TaxId(1);
// No real lineage is anywhere near this deep, anything longer means the tree has a cycle
const MAX_LINEAGE_DEPTH: usize = 256;

/**
 * Split a taxdump (.dmp) line into its fields. Fields are separated by "\t|\t" and the line
 * is terminated by "\t|".
 */
fn dmp_fields(line: &str) -> Vec<&str> {
    line.trim_end_matches("\t|")
        .split("\t|\t")
        .map(|f| f.trim())
        .collect()
}

fn open_dmp(path: &Path) -> io::Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))
}

impl TaxonomyDb {
    pub fn new() -> Self {
        Self::default()
    }

    /**
     * Add a node to the taxonomy. The first node registered under a scientific name wins.
     *
     * args
     *  taxid:  ID of the new node
     *  parent: parent ID, the root should be its own parent
     *  rank:   NCBI rank string
     *  name:   scientific name
     */
    pub fn add_node(&mut self, taxid: u32, parent: u32, rank: &str, name: &str) {
        self.nodes
            .insert(TaxId(taxid), (TaxId(parent), rank.to_string()));
        self.names.entry(name.to_string()).or_insert(TaxId(taxid));
    }

    /**
     * Register a synonym for an existing node.
     */
    pub fn add_synonym(&mut self, taxid: u32, name: &str) {
        self.synonyms.entry(name.to_string()).or_insert(TaxId(taxid));
    }

    /**
     * Register a deprecated taxid that was merged into another one.
     */
    pub fn add_merged(&mut self, old: u32, new: u32) {
        self.merged.insert(TaxId(old), TaxId(new));
    }

    /**
     * Load the taxonomy from an NCBI taxdump directory. names.dmp and nodes.dmp are
     * required, merged.dmp is used if present.
     *
     * args
     *  taxdump_dir: directory containing the extracted taxdump
     *
     * returns
     *  the loaded taxonomy or an IO error if required files are missing or unreadable
     */
    pub fn load(taxdump_dir: &Path) -> io::Result<TaxonomyDb> {
        let mut db = TaxonomyDb::new();

        // Format: tax_id | parent_tax_id | rank | ...
        for line in open_dmp(&taxdump_dir.join("nodes.dmp"))?.lines() {
            let line = line?;
            let fields = dmp_fields(&line);

            if fields.len() < 3 {
                continue;
            }

            let (taxid, parent) = match (fields[0].parse::<u32>(), fields[1].parse::<u32>()) {
                (Ok(t), Ok(p)) => (t, p),
                _ => continue,
            };

            db.nodes
                .insert(TaxId(taxid), (TaxId(parent), fields[2].to_string()));
        }

        // Format: tax_id | name_txt | unique name | name class |
        for line in open_dmp(&taxdump_dir.join("names.dmp"))?.lines() {
            let line = line?;
            let fields = dmp_fields(&line);

            if fields.len() < 4 {
                continue;
            }

            let taxid = match fields[0].parse::<u32>() {
                Ok(t) => t,
                Err(_) => continue,
            };

            match fields[3] {
                "scientific name" => {
                    db.names.entry(fields[1].to_string()).or_insert(TaxId(taxid));
                }
                "synonym" | "equivalent name" | "genbank synonym" => {
                    db.add_synonym(taxid, fields[1]);
                }
                _ => (),
            }
        }

        // Format: old_tax_id | new_tax_id |
        let merged_path = taxdump_dir.join("merged.dmp");

        if merged_path.exists() {
            for line in open_dmp(&merged_path)?.lines() {
                let line = line?;
                let fields = dmp_fields(&line);

                if fields.len() < 2 {
                    continue;
                }

                if let (Ok(old), Ok(new)) = (fields[0].parse::<u32>(), fields[1].parse::<u32>()) {
                    db.add_merged(old, new);
                }
            }
        }

        info!(
            "Loaded taxonomy with {} nodes and {} names",
            db.nodes.len(),
            db.names.len()
        );

        Ok(db)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn current_id(&self, taxid: TaxId) -> TaxId {
        *self.merged.get(&taxid).unwrap_or(&taxid)
    }
}

impl Taxonomy for TaxonomyDb {
    fn lineage(&self, taxid: TaxId) -> Option<Vec<TaxId>> {
        let mut current = self.current_id(taxid);
        let mut lineage = Vec::new();

        loop {
            let (parent, _) = self.nodes.get(&current)?;

            lineage.push(current);

            if current == ROOT || *parent == current || lineage.len() > MAX_LINEAGE_DEPTH {
                break;
            }

            current = *parent;
        }

        lineage.reverse();

        Some(lineage)
    }

    fn rank(&self, taxid: TaxId) -> Option<&str> {
        self.nodes
            .get(&self.current_id(taxid))
            .map(|(_, rank)| rank.as_str())
    }

    fn name_to_id(&self, name: &str) -> Option<TaxId> {
        self.names
            .get(name)
            .or_else(|| self.synonyms.get(name))
            .copied()
    }
}
