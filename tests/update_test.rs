//! End-to-end migration scenarios driven through the public API.

use std::collections::BTreeMap;

use rstest::rstest;

use atsup::application::{
    steps, update, ApplicationError, ApplicationResult, DesiccatedZone, MigrationOptions,
    RelPermModel, SoilResistanceModel,
};
use atsup::domain::{ParamTree, ParamValue};
use atsup::infrastructure::xml;

/// A minimal pre-migration deck: empty evaluator section, one land cover
/// type carrying legacy soil parameters, and the water retention model
/// still living under the flow PK.
fn deck() -> ParamTree {
    let mut tree = ParamTree::new("Main");

    let state = tree.append_list(tree.root(), "state").unwrap();
    tree.append_list(state, "evaluators").unwrap();
    let ic = tree.append_list(state, "initial conditions").unwrap();
    let lc = tree.append_list(ic, "land cover types").unwrap();
    let tundra = tree.append_list(lc, "tundra").unwrap();
    tree.append_leaf(
        tundra,
        "dessicated zone thickness [m]",
        ParamValue::Double(0.2),
    )
    .unwrap();
    tree.append_leaf(tundra, "Clapp and Hornberger b [-]", ParamValue::Double(4.0))
        .unwrap();
    tree.append_leaf(tundra, "albedo [-]", ParamValue::Double(0.15))
        .unwrap();

    let pks = tree.append_list(tree.root(), "PKs").unwrap();
    let flow = tree.append_list(pks, "subsurface flow").unwrap();
    let wre = tree.append_list(flow, "water retention evaluator").unwrap();
    tree.append_leaf(
        wre,
        "evaluator type",
        ParamValue::Str("water retention model".to_string()),
    )
    .unwrap();
    let wrm = tree.append_list(wre, "WRM parameters").unwrap();
    add_soil(&mut tree, wrm, "soil1", 1e-4, 1.5, 0.1, 0.01);
    tree
}

fn add_soil(
    tree: &mut ParamTree,
    wrm: generational_arena::Index,
    name: &str,
    alpha: f64,
    n: f64,
    residual: f64,
    smoothing: f64,
) {
    let soil = tree.append_list(wrm, name).unwrap();
    tree.append_leaf(soil, "region", ParamValue::Str(name.to_string()))
        .unwrap();
    tree.append_leaf(soil, "van Genuchten alpha [Pa^-1]", ParamValue::Double(alpha))
        .unwrap();
    tree.append_leaf(soil, "van Genuchten n [-]", ParamValue::Double(n))
        .unwrap();
    tree.append_leaf(soil, "residual saturation [-]", ParamValue::Double(residual))
        .unwrap();
    tree.append_leaf(
        soil,
        "smoothing interval width [saturation]",
        ParamValue::Double(smoothing),
    )
    .unwrap();
}

fn two_soil_deck() -> ParamTree {
    let mut tree = deck();
    let wrm = tree
        .find_path(&[
            "PKs",
            "subsurface flow",
            "water retention evaluator",
            "WRM parameters",
        ])
        .unwrap();
    add_soil(&mut tree, wrm, "soil2", 2e-4, 2.0, 0.05, 0.02);
    tree
}

// Preconditions for steps that run mid-pipeline.

fn no_prep(_: &mut ParamTree) -> ApplicationResult<()> {
    Ok(())
}

fn with_model_parameters(tree: &mut ParamTree) -> ApplicationResult<()> {
    steps::add_state_model_parameters(tree)
}

fn with_relocated_wrm(tree: &mut ParamTree) -> ApplicationResult<()> {
    steps::add_state_model_parameters(tree)?;
    steps::add_wrm_to_model_parameters(tree)
}

#[test]
fn given_legacy_deck_when_updated_then_soil_resistance_wired() {
    let mut tree = deck();
    update(&mut tree, &MigrationOptions::default()).unwrap();

    let rs = tree
        .find_path(&["state", "evaluators", "surface-soil_resistance"])
        .unwrap();
    assert_eq!(
        tree.str_at(rs, "evaluator type").unwrap(),
        "sakagucki-zeng soil resistance"
    );
    assert_eq!(tree.str_at(rs, "model parameters").unwrap(), "WRM parameters");
}

#[test]
fn given_sellers_option_when_updated_then_sellers_evaluator() {
    let mut tree = deck();
    let options = MigrationOptions {
        soil_resistance: SoilResistanceModel::Sellers,
        ..MigrationOptions::default()
    };
    update(&mut tree, &options).unwrap();

    let rs = tree
        .find_path(&["state", "evaluators", "surface-soil_resistance"])
        .unwrap();
    assert_eq!(
        tree.str_at(rs, "evaluator type").unwrap(),
        "sellers soil resistance"
    );
}

#[test]
fn given_legacy_deck_when_updated_then_wrm_relocated_exactly_once() {
    let mut tree = deck();
    update(&mut tree, &MigrationOptions::default()).unwrap();

    assert!(tree
        .try_find_path(&["state", "model parameters", "WRM parameters", "soil1"])
        .is_some());
    assert!(tree
        .try_find_path(&[
            "PKs",
            "subsurface flow",
            "water retention evaluator",
            "WRM parameters",
        ])
        .is_none());
    let copies = tree
        .iter()
        .filter(|(_, node)| node.name == "WRM parameters")
        .count();
    assert_eq!(copies, 1);

    let wre = tree
        .find_path(&["PKs", "subsurface flow", "water retention evaluator"])
        .unwrap();
    assert_eq!(tree.str_at(wre, "model parameters").unwrap(), "WRM parameters");
}

#[test]
fn given_legacy_deck_when_updated_then_default_thickness_applied() {
    let mut tree = deck();
    update(&mut tree, &MigrationOptions::default()).unwrap();

    let soil = tree
        .find_path(&["state", "model parameters", "WRM parameters", "soil1"])
        .unwrap();
    assert_eq!(
        tree.double_at(soil, "dessicated zone thickness [m]").unwrap(),
        0.1
    );
}

#[test]
fn given_legacy_deck_when_updated_then_rel_perm_wired() {
    let mut tree = deck();
    update(&mut tree, &MigrationOptions::default()).unwrap();

    let relp = tree
        .find_path(&["state", "evaluators", "relative_permeability"])
        .unwrap();
    assert_eq!(tree.str_at(relp, "evaluator type").unwrap(), "WRM rel perm");
    assert_eq!(tree.str_at(relp, "model parameters").unwrap(), "WRM parameters");
}

#[test]
fn given_legacy_deck_when_updated_then_land_cover_params_dropped() {
    let mut tree = deck();
    update(&mut tree, &MigrationOptions::default()).unwrap();

    let tundra = tree
        .find_path(&["state", "initial conditions", "land cover types", "tundra"])
        .unwrap();
    assert!(tree.try_child(tundra, "dessicated zone thickness [m]").is_none());
    assert!(tree.try_child(tundra, "Clapp and Hornberger b [-]").is_none());
    assert_eq!(tree.double_at(tundra, "albedo [-]").unwrap(), 0.15);
}

#[test]
fn given_arctic_option_when_updated_then_frozen_rel_perm_wired() {
    let mut tree = deck();
    let options = MigrationOptions {
        arctic: true,
        ..MigrationOptions::default()
    };
    update(&mut tree, &options).unwrap();

    let relp = tree
        .find_path(&["state", "evaluators", "relative_permeability"])
        .unwrap();
    assert_eq!(
        tree.str_at(relp, "evaluator type").unwrap(),
        "Brooks-Corey based high frozen rel perm"
    );
    assert_eq!(
        tree.str_at(relp, "model parameters").unwrap(),
        "freezing rel perm parameters"
    );
    assert_eq!(tree.double_at(relp, "omega [-]").unwrap(), 2.0);
}

#[test]
fn given_arctic_option_when_updated_then_brooks_corey_entry_derived() {
    let mut tree = deck();
    let options = MigrationOptions {
        arctic: true,
        ..MigrationOptions::default()
    };
    update(&mut tree, &options).unwrap();

    let entry = tree
        .find_path(&[
            "state",
            "model parameters",
            "freezing rel perm parameters",
            "soil1",
        ])
        .unwrap();
    let names: Vec<&str> = tree
        .node(entry)
        .children()
        .iter()
        .map(|&c| tree.node(c).name.as_str())
        .collect();
    assert_eq!(
        names,
        [
            "region",
            "residual saturation [-]",
            "smoothing interval width [saturation]",
            "WRM Type",
            "Brooks Corey saturated matric suction [Pa]",
            "Brooks Corey lambda [-]",
        ]
    );

    assert_eq!(tree.str_at(entry, "region").unwrap(), "soil1");
    assert_eq!(tree.str_at(entry, "WRM Type").unwrap(), "Brooks-Corey");
    assert_eq!(tree.double_at(entry, "residual saturation [-]").unwrap(), 0.1);
    assert_eq!(
        tree.double_at(entry, "smoothing interval width [saturation]")
            .unwrap(),
        0.01
    );

    // alpha = 1e-4, n = 1.5
    let lambda = tree.double_at(entry, "Brooks Corey lambda [-]").unwrap();
    assert!((lambda - 0.4375).abs() < 1e-12, "lambda = {lambda}");
    let suction = tree
        .double_at(entry, "Brooks Corey saturated matric suction [Pa]")
        .unwrap();
    assert!(suction.is_finite() && suction > 0.0);
    assert!((suction - 6686.0).abs() < 2.0, "suction = {suction}");
}

#[test]
fn given_soil_with_vg_m_when_arctic_updated_then_n_derived_from_m() {
    let mut tree = deck();
    let soil = tree
        .find_path(&[
            "PKs",
            "subsurface flow",
            "water retention evaluator",
            "WRM parameters",
            "soil1",
        ])
        .unwrap();
    tree.remove_child(soil, "van Genuchten n [-]").unwrap();
    tree.append_leaf(soil, "van Genuchten m [-]", ParamValue::Double(1.0 / 3.0))
        .unwrap();

    let options = MigrationOptions {
        arctic: true,
        ..MigrationOptions::default()
    };
    update(&mut tree, &options).unwrap();

    // m = 1/3 is the same curve as n = 1.5
    let entry = tree
        .find_path(&[
            "state",
            "model parameters",
            "freezing rel perm parameters",
            "soil1",
        ])
        .unwrap();
    let lambda = tree.double_at(entry, "Brooks Corey lambda [-]").unwrap();
    assert!((lambda - 0.4375).abs() < 1e-9, "lambda = {lambda}");
}

#[rstest]
#[case::plain(false)]
#[case::arctic(true)]
fn given_migrated_deck_when_updated_again_then_unchanged(#[case] arctic: bool) {
    let options = MigrationOptions {
        arctic,
        ..MigrationOptions::default()
    };

    let mut once = two_soil_deck();
    update(&mut once, &options).unwrap();

    let mut twice = two_soil_deck();
    update(&mut twice, &options).unwrap();
    update(&mut twice, &options).unwrap();

    assert_eq!(once, twice);
}

#[test]
fn given_existing_soil_resistance_when_updated_then_left_untouched() {
    let mut tree = deck();
    let evals = tree.find_path(&["state", "evaluators"]).unwrap();
    let rs = tree.append_list(evals, "surface-soil_resistance").unwrap();
    tree.append_leaf(
        rs,
        "evaluator type",
        ParamValue::Str("sellers soil resistance".to_string()),
    )
    .unwrap();

    update(&mut tree, &MigrationOptions::default()).unwrap();

    let rs = tree
        .find_path(&["state", "evaluators", "surface-soil_resistance"])
        .unwrap();
    assert_eq!(
        tree.str_at(rs, "evaluator type").unwrap(),
        "sellers soil resistance"
    );
    assert!(tree.try_child(rs, "model parameters").is_none());
}

#[test]
fn given_existing_frozen_entry_when_arctic_updated_then_not_rebuilt() {
    let mut tree = deck();
    let state = tree.find_path(&["state"]).unwrap();
    let mp = tree.append_list(state, "model parameters").unwrap();
    let frz = tree.append_list(mp, "freezing rel perm parameters").unwrap();
    tree.append_list(frz, "soil1").unwrap();

    let options = MigrationOptions {
        arctic: true,
        ..MigrationOptions::default()
    };
    update(&mut tree, &options).unwrap();

    let entry = tree
        .find_path(&[
            "state",
            "model parameters",
            "freezing rel perm parameters",
            "soil1",
        ])
        .unwrap();
    assert!(tree.node(entry).children().is_empty());
}

#[test]
fn given_existing_thickness_when_uniform_setting_then_gaps_filled_only() {
    let mut tree = two_soil_deck();
    let soil1 = tree
        .find_path(&[
            "PKs",
            "subsurface flow",
            "water retention evaluator",
            "WRM parameters",
            "soil1",
        ])
        .unwrap();
    tree.append_leaf(soil1, "dessicated zone thickness [m]", ParamValue::Double(0.2))
        .unwrap();

    update(&mut tree, &MigrationOptions::default()).unwrap();

    let wrm = tree
        .find_path(&["state", "model parameters", "WRM parameters"])
        .unwrap();
    let soil1 = tree.child_by_name(wrm, "soil1").unwrap();
    let soil2 = tree.child_by_name(wrm, "soil2").unwrap();
    assert_eq!(
        tree.double_at(soil1, "dessicated zone thickness [m]").unwrap(),
        0.2
    );
    assert_eq!(
        tree.double_at(soil2, "dessicated zone thickness [m]").unwrap(),
        0.1
    );
}

#[test]
fn given_positional_setting_when_updated_then_values_overwrite_in_deck_order() {
    let mut tree = two_soil_deck();
    let soil1 = tree
        .find_path(&[
            "PKs",
            "subsurface flow",
            "water retention evaluator",
            "WRM parameters",
            "soil1",
        ])
        .unwrap();
    tree.append_leaf(soil1, "dessicated zone thickness [m]", ParamValue::Double(0.2))
        .unwrap();

    let options = MigrationOptions {
        desiccated_zone: DesiccatedZone::PerIndex(vec![0.3, 0.4]),
        ..MigrationOptions::default()
    };
    update(&mut tree, &options).unwrap();

    let wrm = tree
        .find_path(&["state", "model parameters", "WRM parameters"])
        .unwrap();
    let soil1 = tree.child_by_name(wrm, "soil1").unwrap();
    let soil2 = tree.child_by_name(wrm, "soil2").unwrap();
    assert_eq!(
        tree.double_at(soil1, "dessicated zone thickness [m]").unwrap(),
        0.3
    );
    assert_eq!(
        tree.double_at(soil2, "dessicated zone thickness [m]").unwrap(),
        0.4
    );
}

#[test]
fn given_positional_setting_of_wrong_length_when_updated_then_error() {
    let mut tree = two_soil_deck();
    let options = MigrationOptions {
        desiccated_zone: DesiccatedZone::PerIndex(vec![0.3]),
        ..MigrationOptions::default()
    };
    let err = update(&mut tree, &options).unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::LengthMismatch {
            expected: 2,
            actual: 1
        }
    ));
}

#[test]
fn given_named_setting_with_unknown_soil_when_updated_then_error() {
    let mut tree = deck();
    let by_name = BTreeMap::from([("soil1".to_string(), 0.1), ("bogus".to_string(), 0.2)]);
    let options = MigrationOptions {
        desiccated_zone: DesiccatedZone::PerName(by_name),
        ..MigrationOptions::default()
    };
    let err = update(&mut tree, &options).unwrap_err();
    assert!(
        matches!(err, ApplicationError::UnknownSoilType { ref soil_type } if soil_type == "bogus")
    );
}

#[test]
fn given_named_setting_missing_a_soil_when_updated_then_error() {
    let mut tree = two_soil_deck();
    let by_name = BTreeMap::from([("soil1".to_string(), 0.1)]);
    let options = MigrationOptions {
        desiccated_zone: DesiccatedZone::PerName(by_name),
        ..MigrationOptions::default()
    };
    let err = update(&mut tree, &options).unwrap_err();
    assert!(
        matches!(err, ApplicationError::MissingThickness { ref soil_type } if soil_type == "soil2")
    );
}

#[test]
fn given_named_setting_when_updated_then_each_soil_matched_by_name() {
    let mut tree = two_soil_deck();
    let by_name = BTreeMap::from([("soil1".to_string(), 0.5), ("soil2".to_string(), 0.6)]);
    let options = MigrationOptions {
        desiccated_zone: DesiccatedZone::PerName(by_name),
        ..MigrationOptions::default()
    };
    update(&mut tree, &options).unwrap();

    let wrm = tree
        .find_path(&["state", "model parameters", "WRM parameters"])
        .unwrap();
    let soil1 = tree.child_by_name(wrm, "soil1").unwrap();
    let soil2 = tree.child_by_name(wrm, "soil2").unwrap();
    assert_eq!(
        tree.double_at(soil1, "dessicated zone thickness [m]").unwrap(),
        0.5
    );
    assert_eq!(
        tree.double_at(soil2, "dessicated zone thickness [m]").unwrap(),
        0.6
    );
}

#[test]
fn given_deck_without_land_cover_types_when_updated_then_fatal() {
    let mut tree = deck();
    tree.remove_at(&["state", "initial conditions", "land cover types"], true)
        .unwrap();
    let err = update(&mut tree, &MigrationOptions::default()).unwrap_err();
    assert!(err.to_string().contains("land cover types"), "{err}");
}

#[test]
fn given_deck_without_evaluator_section_when_updated_then_fatal() {
    let mut tree = deck();
    tree.remove_at(&["state", "evaluators"], true).unwrap();
    let err = update(&mut tree, &MigrationOptions::default()).unwrap_err();
    assert!(err.to_string().contains("state/evaluators"), "{err}");
}

#[test]
fn given_soil_without_retention_parameters_when_arctic_updated_then_soil_named() {
    let mut tree = deck();
    let wrm = tree
        .find_path(&[
            "PKs",
            "subsurface flow",
            "water retention evaluator",
            "WRM parameters",
        ])
        .unwrap();
    let bare = tree.append_list(wrm, "bedrock").unwrap();
    tree.append_leaf(bare, "region", ParamValue::Str("bedrock".to_string()))
        .unwrap();

    let options = MigrationOptions {
        arctic: true,
        ..MigrationOptions::default()
    };
    let err = update(&mut tree, &options).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("bedrock"), "{message}");
}

#[rstest]
#[case::soil_resistance(no_prep, |t: &mut ParamTree| {
    steps::add_soil_resistance(t, SoilResistanceModel::SakaguckiZeng)
})]
#[case::rel_perm(no_prep, |t: &mut ParamTree| steps::add_rel_perm(t, RelPermModel::WrmRelPerm))]
#[case::frozen_rel_perm(no_prep, |t: &mut ParamTree| {
    steps::add_rel_perm(t, RelPermModel::BrooksCoreyFrozen)
})]
#[case::state_model_parameters(no_prep, steps::add_state_model_parameters)]
#[case::land_cover_cleanup(no_prep, steps::del_lc_params)]
#[case::wrm_relocation(with_model_parameters, steps::add_wrm_to_model_parameters)]
#[case::dessicated_zone(with_relocated_wrm, |t: &mut ParamTree| {
    steps::add_dessicated_zone_to_wrm(t, &DesiccatedZone::Uniform(0.1))
})]
#[case::freezing_parameters(with_model_parameters, steps::add_frz_relp_to_model_parameters)]
fn given_single_step_when_run_twice_then_tree_unchanged(
    #[case] prep: fn(&mut ParamTree) -> ApplicationResult<()>,
    #[case] step: fn(&mut ParamTree) -> ApplicationResult<()>,
) {
    let mut once = two_soil_deck();
    prep(&mut once).unwrap();
    step(&mut once).unwrap();

    let mut twice = two_soil_deck();
    prep(&mut twice).unwrap();
    step(&mut twice).unwrap();
    step(&mut twice).unwrap();

    assert_eq!(once, twice);
}

#[test]
fn given_serialized_deck_when_updated_then_output_carries_new_schema() {
    let input = r#"<?xml version="1.0" encoding="utf-8"?>
<ParameterList name="Main" type="ParameterList">
  <ParameterList name="state" type="ParameterList">
    <ParameterList name="evaluators" type="ParameterList"/>
    <ParameterList name="initial conditions" type="ParameterList">
      <ParameterList name="land cover types" type="ParameterList"/>
    </ParameterList>
  </ParameterList>
  <ParameterList name="PKs" type="ParameterList">
    <ParameterList name="subsurface flow" type="ParameterList">
      <ParameterList name="water retention evaluator" type="ParameterList">
        <ParameterList name="WRM parameters" type="ParameterList">
          <ParameterList name="soil1" type="ParameterList">
            <Parameter name="region" type="string" value="soil1"/>
            <Parameter name="van Genuchten alpha [Pa^-1]" type="double" value="1.e-4"/>
            <Parameter name="van Genuchten n [-]" type="double" value="1.5"/>
            <Parameter name="residual saturation [-]" type="double" value="0.1"/>
            <Parameter name="smoothing interval width [saturation]" type="double" value="0.01"/>
          </ParameterList>
        </ParameterList>
      </ParameterList>
    </ParameterList>
  </ParameterList>
</ParameterList>
"#;
    let mut tree = xml::parse_str(input).unwrap();
    update(&mut tree, &MigrationOptions::default()).unwrap();
    let rendered = xml::to_xml(&tree);

    assert!(rendered.contains(
        r#"<Parameter name="evaluator type" type="string" value="sakagucki-zeng soil resistance"/>"#
    ));
    assert!(rendered
        .contains(r#"<Parameter name="dessicated zone thickness [m]" type="double" value="0.1"/>"#));
    assert!(rendered.contains(r#"<Parameter name="evaluator type" type="string" value="WRM rel perm"/>"#));
}
