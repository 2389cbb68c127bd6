#![no_main]

use libfuzzer_sys::fuzz_target;

use forest_yield_engine::io::{
    coefficient_files::{read_net_breakage, read_whole_stem_util},
    definitions::read_bec_definitions,
};

// Fixed-width readers must reject malformed lines with an error, never panic.
fuzz_target!(|data: &[u8]| {
    let _ = read_bec_definitions(data);
    let _ = read_whole_stem_util(data);
    let _ = read_net_breakage(data);
});
