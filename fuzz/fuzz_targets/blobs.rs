#![no_main]

use libfuzzer_sys::fuzz_target;
use symscope::debuginfo::{
    customdebuginformation::parse_custom_debug_info, document::DocumentTable,
    importscope::parse_import_chain, lambdamap::parse_lambda_map, scope::parse_scopes,
    sequencepoints::parse_sequence_points, slotmap::parse_slot_map,
};

fuzz_target!(|data: &[u8]| {
    let _ = parse_sequence_points(data);
    let _ = parse_scopes(data);
    let _ = parse_import_chain(data);
    let _ = parse_lambda_map(data);
    let _ = parse_slot_map(data);
    let _ = parse_custom_debug_info(data);
    let _ = DocumentTable::parse(data);
});
