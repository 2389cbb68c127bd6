//! A small set of control files written in their fixed-width layouts.
//!
//! Two genera (C and H) and three zones. C maps to equation group 1 and H to
//! group 2 everywhere. Basal area of C splits evenly at each class boundary
//! while H keeps most of it in the largest class.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const GENERA: [&str; 2] = ["C", "H"];
const ZONES: [&str; 3] = ["CWH", "ESSF", "BG"];

fn group_of(genus: &str) -> i32 {
    if genus == "C" {
        1
    } else {
        2
    }
}

fn values(values: &[f32], width: usize) -> String {
    values
        .iter()
        .map(|v| format!("{v:>width$.4}"))
        .collect()
}

fn genus_line(alias: &str, name: &str, preference: usize) -> String {
    format!("{alias:<2} {name:<32} {preference:>2}\n")
}

fn group_lines(zones: &[&str]) -> String {
    let mut out = String::new();
    for genus in GENERA {
        for zone in zones {
            out.push_str(&format!("{genus:<2} {zone:<4} {:>3}\n", group_of(genus)));
        }
    }
    out
}

fn uc_group_lines(coefficients: &[f32]) -> String {
    let mut out = String::new();
    for uc in 1..=4 {
        for group in [1, 2] {
            out.push_str(&format!("{uc:>2} {group:>3}{}\n", values(coefficients, 10)));
        }
    }
    out
}

/// Every control file with the name it is written under.
pub fn control_files() -> Vec<(&'static str, String)> {
    let becs = "CWH  C Coastal Western Hemlock\n\
                ESSF I Engelmann Spruce -- Subalpine Fir\n\
                BG   I Bunchgrass\n"
        .to_string();
    let genera = genus_line("C", "Cedar", 1) + &genus_line("H", "Hemlock", 2);

    let mut ba_util = String::new();
    for code in ["BA12", "BA17", "BA22"] {
        for genus in GENERA {
            let a0 = if genus == "C" { 0.0 } else { 2.0 };
            ba_util.push_str(&format!("{code} {genus:<2}     {}\n", values(&[a0, 0.0], 10)));
        }
    }

    let mut dq_util = String::new();
    for (code, coefficients) in [
        ("DQ07", [5.0, -1.0, 1.0, 0.0]),
        ("DQ12", [0.0, 0.0, 1.0, 0.0]),
        ("DQ17", [0.0, 0.0, 1.0, 0.0]),
        ("DQ22", [10.0, 0.0, 0.0, 1.0]),
    ] {
        for genus in GENERA {
            dq_util.push_str(&format!("{code} {genus:<2}     {}\n", values(&coefficients, 10)));
        }
    }

    let net_decay_waste: String = GENERA
        .iter()
        .map(|g| format!("{g:<2}{}\n", values(&[0.0, 0.0, -1.0, 0.0, 0.0, 0.0], 9)))
        .collect();
    let net_breakage: String = [1, 2]
        .iter()
        .map(|g| format!("{g:>3}{}\n", values(&[10.0, 0.0, 0.0, 100.0], 9)))
        .collect();
    let total_stand: String = [1, 2]
        .iter()
        .map(|g| {
            format!(
                "{g:>3}{}\n",
                values(&[-10.0, 2.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], 10)
            )
        })
        .collect();

    vec![
        ("Becdef.dat", becs),
        ("SP0DEF_v0.dat", genera),
        ("VGRPDEF1.DAT", group_lines(&ZONES[..2])),
        ("DGRP.DAT", group_lines(&ZONES)),
        ("BGRP.DAT", group_lines(&ZONES)),
        ("REGBAC.DAT", ba_util),
        ("REGDQC.DAT", dq_util),
        ("REGVU.COE", uc_group_lines(&[-2.0, 1.0, 0.0, 0.0])),
        ("REGVCU.COE", uc_group_lines(&[0.0, 0.0, 0.0])),
        ("REGVDU.COE", uc_group_lines(&[0.0, 0.0, 0.0])),
        ("REGVWU.COE", net_decay_waste),
        ("REGBREAK.COE", net_breakage),
        ("VTOTREG4.COE", total_stand),
    ]
}

/// Write the control files and a `yield.toml` naming them into `dir`.
pub fn write_control_dir(dir: &Path, extra_processing: &str) -> PathBuf {
    let mut toml = String::from("[control]\n");
    for (key, (name, content)) in CONFIG_KEYS.iter().zip(control_files()) {
        fs::write(dir.join(name), content).unwrap();
        toml.push_str(&format!("{key} = \"{name}\"\n"));
    }
    toml.push_str(&format!("\n[processing]\nspecies_count = 2\n{extra_processing}"));

    let config = dir.join("yield.toml");
    fs::write(&config, toml).unwrap();
    config
}

const CONFIG_KEYS: [&str; 13] = [
    "bec_definitions",
    "genus_definitions",
    "volume_groups",
    "decay_groups",
    "breakage_groups",
    "ba_util_components",
    "dq_util_components",
    "whole_stem_util",
    "close_utilization",
    "net_decay",
    "net_decay_waste",
    "net_breakage",
    "total_stand_whole_stem",
];

pub fn control_dir(extra_processing: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let config = write_control_dir(dir.path(), extra_processing);
    (dir, config)
}

/// Stand JSON for one hemlock-leading polygon.
pub const STAND_JSON: &str = r#"{
    "polygon_id": "01002 S000001 00",
    "bec": "CWH",
    "age_breast_height": 60.0,
    "species": [
        {"genus": "H", "basal_area": 20.0, "trees_per_hectare": 600.0,
         "quad_mean_diameter": 20.601, "lorey_height": 20.0},
        {"genus": "C", "basal_area": 5.0, "trees_per_hectare": 150.0,
         "quad_mean_diameter": 20.601, "lorey_height": 20.0}
    ]
}"#;

/// Reconciliation input that settles in the second mode.
pub const COMPONENTS_JSON: &str = r#"{
    "basal_area": [0.0, 0.397305071, 0.00485289097, 0.0131751001, 0.0221586525, 0.357118428],
    "trees_per_hectare": [0.0, 5.04602766, 0.61060524, 0.748872101, 0.709191978, 2.13305807],
    "quad_mean_diameter": [0.0, 31.6622887, 10.0594692, 14.966774, 19.9454956, 46.1699982]
}"#;
