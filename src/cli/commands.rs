//! Command execution: resolve options, load the deck, migrate, write it back

use std::path::Path;

use tracing::instrument;

use crate::application::{update, DesiccatedZone, MigrationOptions, SoilResistanceModel};
use crate::cli::args::Cli;
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::infrastructure::xml;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let infile = cli
        .infile
        .as_deref()
        .ok_or_else(|| CliError::Usage("missing input deck".to_string()))?;
    // clap already rejects --inplace together with --outfile
    let outfile = match (&cli.outfile, cli.inplace) {
        (Some(path), _) => path.clone(),
        (None, true) => infile.to_path_buf(),
        (None, false) => {
            return Err(CliError::Usage(
                "choose a destination: --inplace or --outfile <FILE>".to_string(),
            ))
        }
    };
    let options = resolve_options(cli)?;
    convert(infile, &outfile, &options)
}

fn resolve_options(cli: &Cli) -> CliResult<MigrationOptions> {
    let soil_resistance: SoilResistanceModel = cli.soil_resistance.parse()?;
    let desiccated_zone = DesiccatedZone::parse_args(&cli.desiccated_zone)?;
    Ok(MigrationOptions {
        soil_resistance,
        desiccated_zone,
        arctic: cli.arctic,
    })
}

#[instrument(level = "debug", skip(options))]
fn convert(infile: &Path, outfile: &Path, options: &MigrationOptions) -> CliResult<()> {
    output::action("Converting", &infile.display());
    let mut tree = xml::load(infile)?;
    update(&mut tree, options)?;
    xml::save(&tree, outfile)?;
    output::success(&format!("wrote {}", outfile.display()));
    Ok(())
}
