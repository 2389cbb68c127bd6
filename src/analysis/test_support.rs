//! Small hand-built control map for unit tests.
//!
//! Coefficients are chosen so results can be worked out by hand: basal area
//! halves at each class boundary, the middle classes sit at their midpoints,
//! and each volume step keeps a fixed share of the one before it.

use std::collections::HashMap;

use crate::models::{
    BecDefinition, BecLookup, Coefficients, ControlMap, GenusDefinition, GenusDefinitionMap,
    GroupCoefficients, MatrixMap2, Modifiers, Region, UtilComponentCoefficients, DEFAULT_BEC,
};

pub const GENERA: [&str; 2] = ["C", "H"];
pub const GROUPS: [i32; 2] = [1, 2];

pub fn coastal() -> BecDefinition {
    BecDefinition::new("CWH", Region::Coastal, "Coastal Western Hemlock")
}

fn genera() -> GenusDefinitionMap {
    GenusDefinitionMap::new(
        GENERA
            .iter()
            .enumerate()
            .map(|(i, alias)| GenusDefinition {
                alias: alias.to_string(),
                index: i + 1,
                name: alias.to_string(),
            })
            .collect(),
    )
}

fn becs() -> BecLookup {
    BecLookup::new(vec![
        coastal(),
        BecDefinition::new("ESSF", Region::Interior, "Englemann Sitka Spruce"),
        BecDefinition::new("BG", Region::Interior, "Bunchgrass").with_substitutes(DEFAULT_BEC),
    ])
}

fn group_table(values: &[f32], origin: i32) -> GroupCoefficients {
    GroupCoefficients::with_default(1..=4, GROUPS, |_, _| Coefficients::new(values, origin))
}

pub fn control_map() -> ControlMap {
    let genera = genera();
    let becs = becs();
    let species = || GENERA.iter().map(|g| g.to_string());
    let zones = || becs.aliases().map(str::to_string).collect::<Vec<_>>();
    // every zone maps C to group 1 and H to group 2
    let by_species = |genus: &String, _: &String| if genus == "C" { 1 } else { 2 };

    let basal_area_util_components =
        UtilComponentCoefficients::with_default(1..=3, species(), zones(), |_, genus, _| {
            // C splits evenly at each boundary, H keeps most basal area in the largest class
            let a0 = if genus == "C" { 0.0 } else { 2.0 };
            Coefficients::new(vec![a0, 0.0], 1)
        });
    let quad_mean_diameter_util_components =
        UtilComponentCoefficients::with_default(1..=4, species(), zones(), |uc, _, _| {
            let values = match *uc {
                1 => vec![5.0, -1.0, 1.0, 0.0],
                4 => vec![10.0, 0.0, 0.0, 1.0],
                _ => vec![0.0, 0.0, 1.0, 0.0],
            };
            Coefficients::new(values, 1)
        });

    let mut total_stand_whole_stem = HashMap::new();
    let mut net_breakage = HashMap::new();
    for group in GROUPS {
        total_stand_whole_stem.insert(
            group,
            Coefficients::new(vec![-10.0, 2.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], 0),
        );
        net_breakage.insert(group, Coefficients::new(vec![10.0, 0.0, 0.0, 100.0], 1));
    }
    let net_decay_waste = species()
        .map(|g| (g, Coefficients::new(vec![0.0, 0.0, -1.0, 0.0, 0.0, 0.0], 0)))
        .collect();

    ControlMap {
        volume_groups: MatrixMap2::with_default(species(), zones(), by_species),
        decay_groups: MatrixMap2::with_default(species(), zones(), by_species),
        breakage_groups: MatrixMap2::with_default(species(), zones(), by_species),
        basal_area_util_components,
        quad_mean_diameter_util_components,
        whole_stem_util_components: group_table(&[-2.0, 1.0, 0.0, 0.0], 0),
        close_utilization: group_table(&[0.0, 0.0, 0.0], 1),
        net_decay: group_table(&[0.0, 0.0, 0.0], 1),
        net_decay_waste,
        net_breakage,
        total_stand_whole_stem,
        modifiers: Modifiers::neutral(&genera),
        genera,
        becs,
    }
}
