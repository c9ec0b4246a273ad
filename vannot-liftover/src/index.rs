use fxhash::FxHashMap as HashMap;

use vannot_core::models::normalize_contig;

use crate::chain::AlignedBlock;

///
/// Sorted blocks of a single source contig.
///
/// Blocks are ordered by start, and `max_ends[i]` holds the largest end seen in
/// `0..=i`. A point query binary-searches for the last block starting at or
/// before the position and walks left until `max_ends` proves no earlier block
/// can still cover it (the single-level scan of an augmented interval list).
///
#[derive(Debug, Clone, Default)]
struct ContigBlocks {
    starts: Vec<u32>,
    ends: Vec<u32>,
    max_ends: Vec<u32>,
    block_ids: Vec<usize>,
}

impl ContigBlocks {
    fn build(mut entries: Vec<(u32, u32, usize)>) -> Self {
        entries.sort_unstable();

        let mut index = ContigBlocks {
            starts: Vec::with_capacity(entries.len()),
            ends: Vec::with_capacity(entries.len()),
            max_ends: Vec::with_capacity(entries.len()),
            block_ids: Vec::with_capacity(entries.len()),
        };

        let mut max_end = 0;
        for (start, end, id) in entries {
            max_end = max_end.max(end);
            index.starts.push(start);
            index.ends.push(end);
            index.max_ends.push(max_end);
            index.block_ids.push(id);
        }

        index
    }

    fn find(&self, pos: u32) -> Vec<usize> {
        let mut hits = Vec::new();
        let mut i = self.starts.partition_point(|&start| start <= pos);

        while i > 0 {
            i -= 1;
            // start inclusive, end exclusive
            if pos < self.ends[i] {
                hits.push(self.block_ids[i]);
            } else if pos >= self.max_ends[i] {
                break;
            }
        }

        hits
    }
}

///
/// Per-contig point lookup over the blocks of a [`ChainMap`](crate::ChainMap).
///
/// Contigs are keyed by their normalized name, so a `1`-style query finds a
/// `chr1`-style chain and vice versa.
///
#[derive(Debug, Clone, Default)]
pub struct ChainIndex {
    contigs: HashMap<String, ContigBlocks>,
}

impl ChainIndex {
    ///
    /// Index a slice of blocks. The returned ids are positions in that slice.
    ///
    pub fn build(blocks: &[AlignedBlock]) -> Self {
        let mut by_contig: HashMap<String, Vec<(u32, u32, usize)>> = HashMap::default();

        for (id, block) in blocks.iter().enumerate() {
            by_contig
                .entry(normalize_contig(&block.source_contig).to_string())
                .or_default()
                .push((block.source_start, block.source_end(), id));
        }

        let contigs = by_contig
            .into_iter()
            .map(|(contig, entries)| (contig, ContigBlocks::build(entries)))
            .collect();

        ChainIndex { contigs }
    }

    ///
    /// Ids of every block covering a 0-based position.
    ///
    pub fn find(&self, contig: &str, pos: u32) -> Vec<usize> {
        self.contigs
            .get(normalize_contig(contig))
            .map(|blocks| blocks.find(pos))
            .unwrap_or_default()
    }

    pub fn contig_count(&self) -> usize {
        self.contigs.len()
    }
}
