use clap::{Command, arg};

pub const POPULATIONS_CMD: &str = "populations";

pub fn create_populations_cli() -> Command {
    Command::new(POPULATIONS_CMD)
        .author("Databio")
        .about("List the population keys of a dataset that can be used as populations of interest.")
        .arg_required_else_help(true)
        .arg(arg!(--globals <globals> "Dataset metadata JSON holding freq_index_dict").required(true))
}
