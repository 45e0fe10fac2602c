//! The individual schema migration steps.
//!
//! Each step is one tree mutation, idempotent on its own: targets that
//! already exist are left alone, so re-running a migrated deck is a no-op.
//! Steps fail fast when a path the old schema guarantees is absent.

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::options::{DesiccatedZone, RelPermModel, SoilResistanceModel};
use crate::application::vg2bc;
use crate::domain::{ParamTree, ParamValue};

pub const EVALUATOR_TYPE: &str = "evaluator type";
pub const MODEL_PARAMETERS: &str = "model parameters";
pub const WRM_PARAMETERS: &str = "WRM parameters";
pub const FREEZING_REL_PERM_PARAMETERS: &str = "freezing rel perm parameters";
pub const SOIL_RESISTANCE_EVALUATOR: &str = "surface-soil_resistance";
pub const RELATIVE_PERMEABILITY_EVALUATOR: &str = "relative_permeability";
pub const DESSICATED_ZONE_THICKNESS: &str = "dessicated zone thickness [m]";
pub const CLAPP_HORNBERGER_B: &str = "Clapp and Hornberger b [-]";
pub const RESIDUAL_SATURATION: &str = "residual saturation [-]";
pub const SMOOTHING_INTERVAL: &str = "smoothing interval width [saturation]";
pub const VG_ALPHA: &str = "van Genuchten alpha [Pa^-1]";
pub const VG_N: &str = "van Genuchten n [-]";
pub const VG_M: &str = "van Genuchten m [-]";
pub const BC_SATURATED_SUCTION: &str = "Brooks Corey saturated matric suction [Pa]";
pub const BC_LAMBDA: &str = "Brooks Corey lambda [-]";

const STATE_EVALUATORS: [&str; 2] = ["state", "evaluators"];
const LAND_COVER_TYPES: [&str; 3] = ["state", "initial conditions", "land cover types"];
const WATER_RETENTION_EVALUATOR: [&str; 3] = ["PKs", "subsurface flow", "water retention evaluator"];

/// Wire the surface soil resistance evaluator into `state/evaluators`.
///
/// An existing `surface-soil_resistance` list is left untouched, whatever
/// model it names.
#[instrument(level = "debug", skip(tree))]
pub fn add_soil_resistance(
    tree: &mut ParamTree,
    model: SoilResistanceModel,
) -> ApplicationResult<()> {
    let evaluators = tree.find_path(&STATE_EVALUATORS)?;
    if tree.try_child(evaluators, SOIL_RESISTANCE_EVALUATOR).is_some() {
        debug!("surface-soil_resistance already present, skipping");
        return Ok(());
    }
    let rs = tree.append_list(evaluators, SOIL_RESISTANCE_EVALUATOR)?;
    tree.append_leaf(
        rs,
        EVALUATOR_TYPE,
        ParamValue::Str(model.evaluator_type().to_string()),
    )?;
    tree.append_leaf(
        rs,
        MODEL_PARAMETERS,
        ParamValue::Str(WRM_PARAMETERS.to_string()),
    )?;
    Ok(())
}

/// Wire the relative permeability evaluator into `state/evaluators`.
///
/// The frozen variant references the freezing rel perm parameter set and
/// carries the omega exponent; the plain variant references the WRM
/// parameters directly.
#[instrument(level = "debug", skip(tree))]
pub fn add_rel_perm(tree: &mut ParamTree, model: RelPermModel) -> ApplicationResult<()> {
    let evaluators = tree.find_path(&STATE_EVALUATORS)?;
    if tree
        .try_child(evaluators, RELATIVE_PERMEABILITY_EVALUATOR)
        .is_some()
    {
        debug!("relative_permeability already present, skipping");
        return Ok(());
    }
    let relp = tree.append_list(evaluators, RELATIVE_PERMEABILITY_EVALUATOR)?;
    tree.append_leaf(
        relp,
        EVALUATOR_TYPE,
        ParamValue::Str(model.evaluator_type().to_string()),
    )?;
    match model {
        RelPermModel::WrmRelPerm => {
            tree.append_leaf(
                relp,
                MODEL_PARAMETERS,
                ParamValue::Str(WRM_PARAMETERS.to_string()),
            )?;
        }
        RelPermModel::BrooksCoreyFrozen => {
            tree.append_leaf(
                relp,
                MODEL_PARAMETERS,
                ParamValue::Str(FREEZING_REL_PERM_PARAMETERS.to_string()),
            )?;
            tree.append_leaf(relp, "omega [-]", ParamValue::Double(2.0))?;
        }
    }
    Ok(())
}

/// Ensure the `model parameters` container exists directly under `state`.
#[instrument(level = "debug", skip(tree))]
pub fn add_state_model_parameters(tree: &mut ParamTree) -> ApplicationResult<()> {
    let state = tree.find_path(&["state"])?;
    tree.sublist(state, MODEL_PARAMETERS)?;
    Ok(())
}

/// Drop per-land-cover soil parameters that moved into the WRM set.
///
/// The `land cover types` list itself is required; within each cover the
/// two legacy leaves are removed independently and may be absent.
#[instrument(level = "debug", skip(tree))]
pub fn del_lc_params(tree: &mut ParamTree) -> ApplicationResult<()> {
    let lc = tree.find_path(&LAND_COVER_TYPES)?;
    for cover in tree.child_lists(lc) {
        for name in [DESSICATED_ZONE_THICKNESS, CLAPP_HORNBERGER_B] {
            if tree.remove_child(cover, name)? {
                debug!(cover = %tree.node(cover).name, name, "removed legacy land cover entry");
            }
        }
    }
    Ok(())
}

/// Point the water retention evaluator at the shared WRM parameter set and
/// relocate that set under `state/model parameters`.
///
/// The evaluator's `model parameters` leaf is created or overwritten. The
/// `WRM parameters` list is moved, not copied: afterwards exactly one copy
/// exists, under state.
#[instrument(level = "debug", skip(tree))]
pub fn add_wrm_to_model_parameters(tree: &mut ParamTree) -> ApplicationResult<()> {
    let wrm_eval = tree.find_path(&WATER_RETENTION_EVALUATOR)?;
    tree.set_leaf(
        wrm_eval,
        MODEL_PARAMETERS,
        ParamValue::Str(WRM_PARAMETERS.to_string()),
    )?;

    let model_params = tree.find_path(&["state", MODEL_PARAMETERS])?;
    if tree.try_child(model_params, WRM_PARAMETERS).is_none() {
        let mut from = WATER_RETENTION_EVALUATOR.to_vec();
        from.push(WRM_PARAMETERS);
        tree.move_subtree(&from, &["state", MODEL_PARAMETERS])?;
        debug!("relocated WRM parameters under state");
    }
    Ok(())
}

/// Give every soil type in the WRM parameter set a desiccated zone thickness.
///
/// A uniform setting fills gaps only; positional and per-name settings
/// overwrite differing values in place. Positional settings must match the
/// soil type count, per-name settings must cover the soil types exactly.
#[instrument(level = "debug", skip(tree, setting))]
pub fn add_dessicated_zone_to_wrm(
    tree: &mut ParamTree,
    setting: &DesiccatedZone,
) -> ApplicationResult<()> {
    let wrm = tree.find_path(&["state", MODEL_PARAMETERS, WRM_PARAMETERS])?;
    let soils = tree.child_lists(wrm);

    match setting {
        DesiccatedZone::Uniform(thickness) => {
            for &soil in &soils {
                if tree.try_child(soil, DESSICATED_ZONE_THICKNESS).is_none() {
                    tree.append_leaf(
                        soil,
                        DESSICATED_ZONE_THICKNESS,
                        ParamValue::Double(*thickness),
                    )?;
                }
            }
        }
        DesiccatedZone::PerIndex(values) => {
            if values.len() != soils.len() {
                return Err(ApplicationError::LengthMismatch {
                    expected: soils.len(),
                    actual: values.len(),
                });
            }
            for (&soil, &thickness) in soils.iter().zip(values) {
                tree.set_leaf(soil, DESSICATED_ZONE_THICKNESS, ParamValue::Double(thickness))?;
            }
        }
        DesiccatedZone::PerName(by_name) => {
            let names: Vec<String> = soils
                .iter()
                .map(|&soil| tree.node(soil).name.clone())
                .collect();
            for given in by_name.keys() {
                if !names.iter().any(|n| n == given) {
                    return Err(ApplicationError::UnknownSoilType {
                        soil_type: given.clone(),
                    });
                }
            }
            for (&soil, name) in soils.iter().zip(&names) {
                let thickness =
                    *by_name
                        .get(name)
                        .ok_or_else(|| ApplicationError::MissingThickness {
                            soil_type: name.clone(),
                        })?;
                tree.set_leaf(soil, DESSICATED_ZONE_THICKNESS, ParamValue::Double(thickness))?;
            }
        }
    }
    Ok(())
}

/// Build the freezing rel perm parameter set for arctic runs.
///
/// For every soil type in the WRM set, creates a matching sublist carrying
/// the region, residual saturation and smoothing width, tagged as
/// Brooks-Corey with suction and lambda derived from the van Genuchten
/// parameters. Soil types already present in the set are skipped.
#[instrument(level = "debug", skip(tree))]
pub fn add_frz_relp_to_model_parameters(tree: &mut ParamTree) -> ApplicationResult<()> {
    let model_params = tree.find_path(&["state", MODEL_PARAMETERS])?;
    let frz = tree.sublist(model_params, FREEZING_REL_PERM_PARAMETERS)?;

    // The WRM set normally sits under state already; fall back to reading
    // it from the water retention evaluator when the relocation step has
    // not run on this deck.
    let source = match tree.try_find_path(&["state", MODEL_PARAMETERS, WRM_PARAMETERS]) {
        Some(idx) => idx,
        None => {
            let mut path = WATER_RETENTION_EVALUATOR.to_vec();
            path.push(WRM_PARAMETERS);
            tree.find_path(&path)?
        }
    };

    for soil in tree.child_lists(source) {
        let soil_name = tree.node(soil).name.clone();
        if tree.try_child(frz, &soil_name).is_some() {
            debug!(soil = %soil_name, "freezing rel perm entry already present, skipping");
            continue;
        }
        build_frz_entry(tree, frz, soil, &soil_name).map_err(|source| {
            ApplicationError::SoilType {
                soil_type: soil_name.clone(),
                source: Box::new(source),
            }
        })?;
    }
    Ok(())
}

fn build_frz_entry(
    tree: &mut ParamTree,
    frz: Index,
    soil: Index,
    name: &str,
) -> ApplicationResult<()> {
    // Read everything first so a failing soil type leaves no partial entry
    let region = tree.str_at(soil, "region")?.to_string();
    let residual = tree.double_at(soil, RESIDUAL_SATURATION)?;
    let smoothing = tree.double_at(soil, SMOOTHING_INTERVAL)?;
    let alpha = tree.double_at(soil, VG_ALPHA)?;
    let n = match tree.try_double_at(soil, VG_N)? {
        Some(n) => n,
        None => vg2bc::n_from_m(tree.double_at(soil, VG_M)?)?,
    };
    let bc = vg2bc::vg_to_bc(alpha, n)?;

    let entry = tree.append_list(frz, name)?;
    tree.append_leaf(entry, "region", ParamValue::Str(region))?;
    tree.append_leaf(entry, RESIDUAL_SATURATION, ParamValue::Double(residual))?;
    tree.append_leaf(entry, SMOOTHING_INTERVAL, ParamValue::Double(smoothing))?;
    tree.append_leaf(entry, "WRM Type", ParamValue::Str("Brooks-Corey".to_string()))?;
    tree.append_leaf(
        entry,
        BC_SATURATED_SUCTION,
        ParamValue::Double(bc.saturated_suction),
    )?;
    tree.append_leaf(entry, BC_LAMBDA, ParamValue::Double(bc.lambda))?;
    Ok(())
}
