//! UCSC chain file parser.
//!
//! Each chain starts with a header line
//!
//! ```text
//! chain score tName tSize tStrand tStart tEnd qName qSize qStrand qStart qEnd id
//! ```
//!
//! followed by `size dt dq` lines (the last line of a chain holds only `size`).
//! The `t*` side is the source build and the `q*` side the target build. Query
//! coordinates on a `-` strand chain count from the end of the query contig;
//! they are converted to forward coordinates here so nothing downstream needs
//! to know about strand arithmetic beyond [`AlignedBlock::map`].

use std::io::BufRead;
use std::path::Path;

use tracing::debug;

use vannot_core::GenomeBuild;
use vannot_core::utils::{get_dynamic_reader, numbered_lines};

use crate::errors::{ChainError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    fn parse(field: &str, line: usize) -> Result<Self> {
        match field {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            other => Err(ChainError::Parse {
                line,
                msg: format!("invalid strand '{other}'"),
            }),
        }
    }
}

///
/// A gap-free stretch of alignment between source and target.
///
/// All coordinates are 0-based, forward strand. A position `source_start + k`
/// maps to `target_start + k` on a forward block and to
/// `target_start + length - 1 - k` on a reverse block.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedBlock {
    pub chain_id: u64,
    pub score: u64,
    pub source_contig: String,
    pub source_start: u32,
    pub target_contig: String,
    pub target_start: u32,
    pub length: u32,
    pub strand: Strand,
}

impl AlignedBlock {
    pub fn source_end(&self) -> u32 {
        self.source_start + self.length
    }

    pub fn contains(&self, pos: u32) -> bool {
        pos >= self.source_start && pos < self.source_end()
    }

    /// Map a 0-based source position, `None` when it falls outside the block.
    pub fn map(&self, pos: u32) -> Option<u32> {
        if !self.contains(pos) {
            return None;
        }
        let offset = pos - self.source_start;
        Some(match self.strand {
            Strand::Forward => self.target_start + offset,
            Strand::Reverse => self.target_start + self.length - 1 - offset,
        })
    }

    /// The same alignment read in the other direction.
    pub fn invert(&self) -> AlignedBlock {
        AlignedBlock {
            chain_id: self.chain_id,
            score: self.score,
            source_contig: self.target_contig.clone(),
            source_start: self.target_start,
            target_contig: self.source_contig.clone(),
            target_start: self.source_start,
            length: self.length,
            strand: self.strand,
        }
    }
}

/// Header fields of the chain currently being read.
#[derive(Debug)]
struct OpenChain {
    id: u64,
    score: u64,
    source_contig: String,
    source_pos: u64,
    source_end: u64,
    target_contig: String,
    target_size: u64,
    target_pos: u64,
    target_end: u64,
    strand: Strand,
    header_line: usize,
    finished: bool,
}

///
/// All alignment blocks of a chain file, for one `(source, target)` build pair.
///
#[derive(Debug, Clone)]
pub struct ChainMap {
    source_build: GenomeBuild,
    target_build: GenomeBuild,
    chain_count: usize,
    blocks: Vec<AlignedBlock>,
}

fn parse_u64(field: Option<&str>, name: &str, line: usize) -> Result<u64> {
    let field = field.ok_or_else(|| ChainError::Parse {
        line,
        msg: format!("missing {name}"),
    })?;
    field.parse::<u64>().map_err(|_| ChainError::Parse {
        line,
        msg: format!("invalid {name} '{field}'"),
    })
}

fn to_u32(value: u64, name: &str, line: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| ChainError::Parse {
        line,
        msg: format!("{name} {value} does not fit a 32-bit coordinate"),
    })
}

impl ChainMap {
    ///
    /// Load a chain file from disk (`.chain` or `.chain.gz`).
    ///
    /// # Arguments
    /// - path: location of the chain file
    /// - source_build: build of the `t*` (reference) side
    /// - target_build: build of the `q*` (query) side
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        source_build: GenomeBuild,
        target_build: GenomeBuild,
    ) -> Result<Self> {
        let reader = get_dynamic_reader(path.as_ref())?;
        Self::parse(reader, source_build, target_build)
    }

    /// Parse chain records from any buffered reader.
    pub fn parse<R: BufRead>(
        reader: R,
        source_build: GenomeBuild,
        target_build: GenomeBuild,
    ) -> Result<Self> {
        if source_build == target_build {
            return Err(ChainError::SameBuild(source_build));
        }

        let mut blocks = Vec::new();
        let mut chain_count = 0;
        let mut current: Option<OpenChain> = None;

        for (line_num, line) in numbered_lines(reader) {
            let line = line?;
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }

            if line.starts_with("chain") {
                if let Some(chain) = current.take() {
                    Self::close_chain(&chain)?;
                }
                current = Some(Self::parse_header(line, line_num)?);
                chain_count += 1;
                continue;
            }

            let chain = current.as_mut().ok_or_else(|| ChainError::Parse {
                line: line_num,
                msg: "alignment block before any chain header".to_string(),
            })?;
            blocks.push(Self::parse_block(chain, line, line_num)?);
        }

        if let Some(chain) = current.take() {
            Self::close_chain(&chain)?;
        }

        if blocks.is_empty() {
            return Err(ChainError::Empty);
        }

        debug!(
            "Parsed {} chains ({} blocks) for {} -> {}",
            chain_count,
            blocks.len(),
            source_build,
            target_build
        );

        Ok(ChainMap {
            source_build,
            target_build,
            chain_count,
            blocks,
        })
    }

    fn parse_header(line: &str, line_num: usize) -> Result<OpenChain> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 12 {
            return Err(ChainError::Parse {
                line: line_num,
                msg: format!("expected 12+ header fields, got {}", parts.len()),
            });
        }

        let score = parse_u64(parts.get(1).copied(), "score", line_num)?;
        let source_size = parse_u64(parts.get(3).copied(), "tSize", line_num)?;
        if Strand::parse(parts[4], line_num)? != Strand::Forward {
            return Err(ChainError::Parse {
                line: line_num,
                msg: "reference strand must be '+'".to_string(),
            });
        }
        let source_start = parse_u64(parts.get(5).copied(), "tStart", line_num)?;
        let source_end = parse_u64(parts.get(6).copied(), "tEnd", line_num)?;
        let target_size = parse_u64(parts.get(8).copied(), "qSize", line_num)?;
        let strand = Strand::parse(parts[9], line_num)?;
        let target_start = parse_u64(parts.get(10).copied(), "qStart", line_num)?;
        let target_end = parse_u64(parts.get(11).copied(), "qEnd", line_num)?;
        let id = match parts.get(12) {
            Some(field) => parse_u64(Some(field), "id", line_num)?,
            None => 0,
        };

        if source_start > source_end || source_end > source_size {
            return Err(ChainError::Parse {
                line: line_num,
                msg: format!("reference range {source_start}-{source_end} outside contig of size {source_size}"),
            });
        }
        if target_start > target_end || target_end > target_size {
            return Err(ChainError::Parse {
                line: line_num,
                msg: format!("query range {target_start}-{target_end} outside contig of size {target_size}"),
            });
        }

        Ok(OpenChain {
            id,
            score,
            source_contig: parts[2].to_string(),
            source_pos: source_start,
            source_end,
            target_contig: parts[7].to_string(),
            target_size,
            target_pos: target_start,
            target_end,
            strand,
            header_line: line_num,
            finished: false,
        })
    }

    fn parse_block(chain: &mut OpenChain, line: &str, line_num: usize) -> Result<AlignedBlock> {
        if chain.finished {
            return Err(ChainError::Parse {
                line: line_num,
                msg: "alignment block after the final block of a chain".to_string(),
            });
        }

        let mut fields = line.split_whitespace();
        let size = parse_u64(fields.next(), "block size", line_num)?;
        let (source_gap, target_gap) = match (fields.next(), fields.next()) {
            (Some(dt), Some(dq)) => (
                parse_u64(Some(dt), "dt", line_num)?,
                parse_u64(Some(dq), "dq", line_num)?,
            ),
            (None, None) => {
                chain.finished = true;
                (0, 0)
            }
            _ => {
                return Err(ChainError::Parse {
                    line: line_num,
                    msg: "expected 'size dt dq' or a lone final 'size'".to_string(),
                });
            }
        };

        if chain.source_pos + size > chain.source_end || chain.target_pos + size > chain.target_end {
            return Err(ChainError::Parse {
                line: line_num,
                msg: "block runs past the end of its chain".to_string(),
            });
        }

        let target_start = match chain.strand {
            Strand::Forward => chain.target_pos,
            Strand::Reverse => chain.target_size - chain.target_pos - size,
        };

        let block = AlignedBlock {
            chain_id: chain.id,
            score: chain.score,
            source_contig: chain.source_contig.clone(),
            source_start: to_u32(chain.source_pos, "block start", line_num)?,
            target_contig: chain.target_contig.clone(),
            target_start: to_u32(target_start, "block target start", line_num)?,
            length: to_u32(size, "block size", line_num)?,
            strand: chain.strand,
        };

        chain.source_pos += size + source_gap;
        chain.target_pos += size + target_gap;

        Ok(block)
    }

    fn close_chain(chain: &OpenChain) -> Result<()> {
        if chain.source_pos != chain.source_end || chain.target_pos != chain.target_end {
            return Err(ChainError::Parse {
                line: chain.header_line,
                msg: format!(
                    "blocks of chain {} do not span the header range",
                    chain.id
                ),
            });
        }
        Ok(())
    }

    /// The same alignment, mapping from target back to source.
    pub fn invert(&self) -> ChainMap {
        ChainMap {
            source_build: self.target_build,
            target_build: self.source_build,
            chain_count: self.chain_count,
            blocks: self.blocks.iter().map(AlignedBlock::invert).collect(),
        }
    }

    pub fn source_build(&self) -> GenomeBuild {
        self.source_build
    }

    pub fn target_build(&self) -> GenomeBuild {
        self.target_build
    }

    pub fn chain_count(&self) -> usize {
        self.chain_count
    }

    pub fn blocks(&self) -> &[AlignedBlock] {
        &self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn simple_chain_data() -> &'static str {
        "chain 1000 chr1 1000 + 0 1000 chr1 1100 + 0 1010 1\n\
         100\t10\t20\n\
         200\t5\t5\n\
         685\n\
         \n"
    }

    fn parse(data: &str) -> Result<ChainMap> {
        ChainMap::parse(data.as_bytes(), GenomeBuild::GRCh37, GenomeBuild::GRCh38)
    }

    #[rstest]
    fn test_parse_chain_blocks(simple_chain_data: &str) {
        let chain = parse(simple_chain_data).unwrap();
        assert_eq!(chain.chain_count(), 1);

        let starts: Vec<(u32, u32, u32)> = chain
            .blocks()
            .iter()
            .map(|b| (b.source_start, b.target_start, b.length))
            .collect();
        // target: 0-99 | gap 100-109 | 110-309 | gap 310-314 | 315-999
        // query:  0-99 | gap 100-119 | 120-319 | gap 320-324 | 325-1009
        assert_eq!(starts, vec![(0, 0, 100), (110, 120, 200), (315, 325, 685)]);
    }

    #[rstest]
    fn test_block_mapping(simple_chain_data: &str) {
        let chain = parse(simple_chain_data).unwrap();
        let blocks = chain.blocks();

        assert_eq!(blocks[0].map(50), Some(50));
        assert_eq!(blocks[0].map(105), None);
        assert_eq!(blocks[1].map(110), Some(120));
        assert_eq!(blocks[2].map(999), Some(1009));
    }

    #[rstest]
    fn test_reverse_strand_block() {
        // 10 bases of the reference align to the last 10 bases of a 50 base
        // query contig, reverse complemented.
        let data = "chain 50 chr2 100 + 0 10 chr2 50 - 0 10 7\n10\n";
        let chain = parse(data).unwrap();
        let block = &chain.blocks()[0];

        assert_eq!(block.strand, Strand::Reverse);
        assert_eq!(block.target_start, 40);
        assert_eq!(block.map(0), Some(49));
        assert_eq!(block.map(9), Some(40));
    }

    #[rstest]
    fn test_invert_block_round_trip() {
        let data = "chain 50 chr2 100 + 0 10 chr2 50 - 0 10 7\n10\n";
        let chain = parse(data).unwrap();
        let inverted = chain.invert();

        assert_eq!(inverted.source_build(), GenomeBuild::GRCh38);
        assert_eq!(inverted.target_build(), GenomeBuild::GRCh37);

        let forward = &chain.blocks()[0];
        let backward = &inverted.blocks()[0];
        for pos in 0..10 {
            let lifted = forward.map(pos).unwrap();
            assert_eq!(backward.map(lifted), Some(pos));
        }
    }

    #[rstest]
    fn test_multiple_chains_and_comments() {
        let data = "#comment\n\
                    chain 10 chr1 1000 + 0 100 chr1 1000 + 0 100 1\n100\n\n\
                    chain 20 chr2 1000 + 500 600 chr3 1000 + 0 100 2\n100\n";
        let chain = parse(data).unwrap();

        assert_eq!(chain.chain_count(), 2);
        assert_eq!(chain.blocks().len(), 2);
        assert_eq!(chain.blocks()[1].source_contig, "chr2");
        assert_eq!(chain.blocks()[1].target_contig, "chr3");
        assert_eq!(chain.blocks()[1].score, 20);
    }

    #[rstest]
    #[case("chain 10 chr1 1000 + 0 100 chr1\n100\n")]
    #[case("chain 10 chr1 1000 + 0 100 chr1 1000 + 0 100 1\n50\n")]
    #[case("chain 10 chr1 1000 + 0 100 chr1 1000 * 0 100 1\n100\n")]
    #[case("chain 10 chr1 1000 - 0 100 chr1 1000 + 0 100 1\n100\n")]
    #[case("chain 10 chr1 1000 + 0 100 chr1 1000 + 0 100 1\n50 x 0\n50\n")]
    #[case("100\n")]
    fn test_malformed_chains(#[case] data: &str) {
        assert!(matches!(parse(data), Err(ChainError::Parse { .. })));
    }

    #[rstest]
    fn test_empty_chain_file() {
        assert!(matches!(parse("# nothing here\n"), Err(ChainError::Empty)));
    }

    #[rstest]
    fn test_same_build_rejected(simple_chain_data: &str) {
        let result = ChainMap::parse(
            simple_chain_data.as_bytes(),
            GenomeBuild::GRCh38,
            GenomeBuild::GRCh38,
        );
        assert!(matches!(result, Err(ChainError::SameBuild(_))));
    }
}
