#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = forest_yield_engine::io::read_stands_from_bytes(data);
});
