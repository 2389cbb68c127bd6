mod charts;
mod tables;

pub use charts::{format_class_histogram, print_class_histogram};
pub use tables::{
    format_component_table, format_control_summary, format_stand_summary,
    format_utilization_table, print_component_table, print_control_summary, print_stand_summary,
    print_utilization_table,
};
