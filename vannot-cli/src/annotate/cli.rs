use clap::{Arg, ArgAction, Command, arg, value_parser};

pub const ANNOTATE_CMD: &str = "annotate";

pub fn create_annotate_cli() -> Command {
    Command::new(ANNOTATE_CMD)
        .author("Databio")
        .about("Filter a variant catalog, derive MAF, lift it over and join external scores.")
        .arg(arg!(-c --config <config> "Run configuration (toml or yaml); flags below override it"))
        .arg(arg!(--source <source> "JSON-lines variant source (optionally gzipped)"))
        .arg(arg!(--globals <globals> "Dataset metadata JSON holding freq_index_dict"))
        .arg(arg!(--chain <chain> "UCSC chain file from the source to the target build"))
        .arg(arg!(--scores <scores> "Tab-delimited external score table (CADD layout)"))
        .arg(arg!(--output <output> "Output directory for the Parquet partitions"))
        .arg(Arg::new("site-list").long("site-list").help("Gzipped site list path"))
        .arg(
            Arg::new("maf-threshold")
                .long("maf-threshold")
                .help("Minimum MAF in at least one population of interest")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("populations")
                .long("populations")
                .help("Comma-separated populations of interest, e.g. afr,nfe")
                .value_delimiter(','),
        )
        .arg(arg!(--"source-build" <build> "Build of the source coordinates"))
        .arg(arg!(--"target-build" <build> "Build to lift over into"))
        .arg(
            arg!(--partitions <partitions> "Maximum number of Parquet partitions")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(--limit <limit> "Only read the first N source rows")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(--overwrite "Replace existing output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--progress "Show a progress spinner")
                .action(ArgAction::SetTrue),
        )
}
