use clap::{Command, arg, value_parser};

pub const HEAD_CMD: &str = "head";
pub const DEFAULT_HEAD_ROWS: usize = 5;

pub fn create_head_cli() -> Command {
    Command::new(HEAD_CMD)
        .author("Databio")
        .about("Print the dataset metadata and the first rows of a variant source, as stored.")
        .arg_required_else_help(true)
        .arg(arg!(--source <source> "JSON-lines variant source (optionally gzipped)").required(true))
        .arg(arg!(--globals <globals> "Dataset metadata JSON").required(true))
        .arg(
            arg!(-n --rows <rows> "Number of rows to print")
                .value_parser(value_parser!(usize)),
        )
}
