#![no_main]
use libfuzzer_sys::fuzz_target;
use zenfloor::MappingTable;

fuzz_target!(|data: &[u8]| {
    // Parse must never panic; whatever parses must survive a save/load cycle
    if let Ok(table) = MappingTable::parse(data) {
        let reparsed = MappingTable::parse(table.to_text().as_bytes()).unwrap();
        assert_eq!(reparsed, table);
    }
});
