use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, ContentArrangement, Table};

use crate::models::{ComponentVectors, StandResult, TableSummary, UtilizationClass, UtilizationSet};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn heading(title: &str, width: usize) -> String {
    format!("\n{}\n{}\n", title.bold().green(), "=".repeat(width))
}

/// Format one species' (or the layer's) values by utilization class.
pub fn format_utilization_table(title: &str, set: &UtilizationSet) -> String {
    let mut output = heading(title, 70);

    let mut table = new_table(vec![
        "Class", "BA (m²/ha)", "TPH", "DQ (cm)", "WS (m³)", "CU (m³)", "CU-D", "CU-DW", "CU-DWB",
    ]);
    for uc in UtilizationClass::ALL_CLASSES {
        let [ba, tph, dq, ws, cu, nd, ndw, ndwb] = set.row(uc);
        table.add_row(vec![
            Cell::new(uc.class_name()),
            Cell::new(format!("{ba:.4}")),
            Cell::new(format!("{tph:.2}")),
            Cell::new(format!("{dq:.2}")),
            Cell::new(format!("{ws:.2}")),
            Cell::new(format!("{cu:.2}")),
            Cell::new(format!("{nd:.2}")),
            Cell::new(format!("{ndw:.2}")),
            Cell::new(format!("{ndwb:.2}")),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

/// Print values by utilization class.
pub fn print_utilization_table(title: &str, set: &UtilizationSet) {
    print!("{}", format_utilization_table(title, set));
}

/// Format a basal area, trees per hectare and diameter triple by class.
pub fn format_component_table(vectors: &ComponentVectors) -> String {
    let mut output = heading("Reconciled Components", 50);

    let mut table = new_table(vec!["Class", "BA (m²/ha)", "TPH", "DQ (cm)"]);
    for uc in UtilizationClass::ALL_CLASSES {
        table.add_row(vec![
            Cell::new(uc.class_name()),
            Cell::new(format!("{:.6}", vectors.basal_area.get(uc))),
            Cell::new(format!("{:.4}", vectors.trees_per_hectare.get(uc))),
            Cell::new(format!("{:.4}", vectors.quad_mean_diameter.get(uc))),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

/// Print a component triple by class.
pub fn print_component_table(vectors: &ComponentVectors) {
    print!("{}", format_component_table(vectors));
}

/// Format a stand's species composition and layer totals.
pub fn format_stand_summary(result: &StandResult) -> String {
    let mut output = heading(&format!("Polygon {} ({})", result.polygon_id, result.bec), 70);

    let mut table = new_table(vec![
        "Species", "Groups (V/D/B)", "% BA", "BA (m²/ha)", "TPH", "DQ (cm)", "HL (m)", "WS (m³)",
        "CU-DWB (m³)",
    ]);
    for spec in &result.species {
        let set = &spec.utilization;
        table.add_row(vec![
            Cell::new(&spec.genus),
            Cell::new(format!(
                "{}/{}/{}",
                spec.volume_group, spec.decay_group, spec.breakage_group
            )),
            Cell::new(format!("{:.1}%", spec.percent_of_layer)),
            Cell::new(format!("{:.4}", set.basal_area.all())),
            Cell::new(format!("{:.2}", set.trees_per_hectare.all())),
            Cell::new(format!("{:.2}", set.quad_mean_diameter.all())),
            Cell::new(format!("{:.2}", set.lorey_height.all())),
            Cell::new(format!("{:.2}", set.whole_stem_volume.all())),
            Cell::new(format!(
                "{:.2}",
                set.close_utilization_net_decay_waste_breakage_volume.all()
            )),
        ]);
    }
    let layer = &result.layer;
    table.add_row(vec![
        Cell::new("Layer".bold()),
        Cell::new(""),
        Cell::new("100.0%"),
        Cell::new(format!("{:.4}", layer.basal_area.all())),
        Cell::new(format!("{:.2}", layer.trees_per_hectare.all())),
        Cell::new(format!("{:.2}", layer.quad_mean_diameter.all())),
        Cell::new(format!("{:.2}", layer.lorey_height.all())),
        Cell::new(format!("{:.2}", layer.whole_stem_volume.all())),
        Cell::new(format!(
            "{:.2}",
            layer.close_utilization_net_decay_waste_breakage_volume.all()
        )),
    ]);

    output.push_str(&format!("{table}"));
    output
}

/// Print a stand summary.
pub fn print_stand_summary(result: &StandResult) {
    print!("{}", format_stand_summary(result));
}

/// Format per-table entry counts of a loaded control map.
pub fn format_control_summary(tables: &[TableSummary]) -> String {
    let mut output = heading("Control Map", 50);

    let mut table = new_table(vec!["Table", "Entries", "Slots", "Complete"]);
    for t in tables {
        let complete = if t.is_full() {
            "yes".green()
        } else {
            "partial".yellow()
        };
        table.add_row(vec![
            Cell::new(t.name),
            Cell::new(t.populated),
            Cell::new(t.size),
            Cell::new(complete),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

/// Print per-table entry counts.
pub fn print_control_summary(tables: &[TableSummary]) {
    print!("{}", format_control_summary(tables));
}
