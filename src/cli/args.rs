//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueHint};

/// Migrate ATS input decks from the 1.4 to the 1.5 state schema
#[derive(Parser, Debug)]
#[command(name = "atsup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input deck (ParameterList XML)
    #[arg(value_hint = ValueHint::FilePath)]
    pub infile: Option<PathBuf>,

    /// Surface soil resistance model: sakagucki-zeng or sellers
    #[arg(long, value_name = "MODEL", default_value = "sakagucki-zeng")]
    pub soil_resistance: String,

    /// Desiccated zone thickness [m]: one value for all soil types, one
    /// value per soil type in deck order, or name=value pairs
    #[arg(long, value_name = "VALUE", num_args = 1.., default_value = "0.1")]
    pub desiccated_zone: Vec<String>,

    /// Arctic run: use the frozen rel perm evaluator and derive
    /// Brooks-Corey parameters per soil type
    #[arg(long)]
    pub arctic: bool,

    /// Overwrite the input deck
    #[arg(short, long, group = "destination")]
    pub inplace: bool,

    /// Write the migrated deck to this file
    #[arg(short, long, value_name = "FILE", group = "destination", value_hint = ValueHint::FilePath)]
    pub outfile: Option<PathBuf>,

    /// Turn debugging information on (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    pub debug: u8,

    /// Generate shell completions
    #[arg(long, value_enum, value_name = "SHELL")]
    pub generate: Option<clap_complete::Shell>,
}
