//! Fixed-order migration pipeline.

use tracing::{debug, instrument};

use crate::application::error::ApplicationResult;
use crate::application::options::{MigrationOptions, RelPermModel};
use crate::application::steps;
use crate::domain::ParamTree;

/// Apply the full schema migration to a deck in place.
///
/// Step order matters: the state model parameters container and the WRM
/// relocation must be in place before the desiccated zone and freezing
/// rel perm steps run.
#[instrument(level = "debug", skip(tree, options))]
pub fn update(tree: &mut ParamTree, options: &MigrationOptions) -> ApplicationResult<()> {
    debug!(?options, "running migration");

    steps::add_soil_resistance(tree, options.soil_resistance)?;
    steps::add_state_model_parameters(tree)?;
    steps::add_wrm_to_model_parameters(tree)?;
    steps::add_dessicated_zone_to_wrm(tree, &options.desiccated_zone)?;
    steps::del_lc_params(tree)?;
    if options.arctic {
        steps::add_rel_perm(tree, RelPermModel::BrooksCoreyFrozen)?;
        steps::add_frz_relp_to_model_parameters(tree)?;
    } else {
        steps::add_rel_perm(tree, RelPermModel::WrmRelPerm)?;
    }
    Ok(())
}
