#![no_main]

use std::path::Path;

use dotmetrics::loader::{ImageReader, ModuleReader};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = ImageReader::new().read(Path::new("fuzz.json"), data);
});
