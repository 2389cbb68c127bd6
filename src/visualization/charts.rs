use colored::Colorize;

use crate::models::{UtilizationClass, UtilizationSet};

/// Format a text bar chart of basal area and trees per hectare across the
/// four real utilization classes.
pub fn format_class_histogram(title: &str, set: &UtilizationSet) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", title.bold().green()));
    output.push_str(&format!("{}\n", "=".repeat(60)));

    let max_ba = UtilizationClass::UTIL_CLASSES
        .iter()
        .map(|&uc| set.basal_area.get(uc))
        .fold(0.0f32, f32::max);

    if max_ba <= 0.0 {
        output.push_str("  No basal area in any class.\n");
        return output;
    }

    let bar_width = 40;

    output.push_str(&format!(
        "  {:>14}  {:>8}  {:>8}  Basal area\n",
        "Class", "BA", "TPH"
    ));
    output.push_str(&format!("  {}\n", "-".repeat(70)));

    for uc in UtilizationClass::UTIL_CLASSES {
        let ba = set.basal_area.get(uc);
        let bar_len = ((ba / max_ba) * bar_width as f32).round() as usize;
        let bar = "\u{2588}".repeat(bar_len);

        output.push_str(&format!(
            "  {:>14}  {:>8.3}  {:>8.1}  {}\n",
            uc.class_name(),
            ba,
            set.trees_per_hectare.get(uc),
            bar.green()
        ));
    }

    output.push('\n');
    output
}

/// Print a bar chart of basal area by utilization class.
pub fn print_class_histogram(title: &str, set: &UtilizationSet) {
    print!("{}", format_class_histogram(title, set));
}
