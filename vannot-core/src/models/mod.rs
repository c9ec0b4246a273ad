pub mod locus;
pub mod record;
pub mod variant;

// re-export for cleaner imports
pub use self::locus::{GenomeBuild, Locus, normalize_contig};
pub use self::record::{FrequencyEntry, RawLocus, RawRecord, SourceRecord};
pub use self::variant::{Variant, VariantKey};
