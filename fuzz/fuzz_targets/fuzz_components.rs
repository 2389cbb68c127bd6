#![no_main]

use libfuzzer_sys::fuzz_target;

use forest_yield_engine::{io::read_component_vectors_from_bytes, reconcile_components};

fuzz_target!(|data: &[u8]| {
    if let Ok(mut vectors) = read_component_vectors_from_bytes(data) {
        let _ = reconcile_components(
            &mut vectors.basal_area,
            &mut vectors.trees_per_hectare,
            &mut vectors.quad_mean_diameter,
        );
    }
});
