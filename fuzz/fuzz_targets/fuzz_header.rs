#![no_main]
use libfuzzer_sys::fuzz_target;
use zenfloor::volume::MemVolume;
use zenfloor::{Limits, Storage};

fuzz_target!(|data: &[u8]| {
    // Header parsing must never panic
    let Ok(header) = zenfloor::bmp::BmpHeader::parse(data) else {
        return;
    };
    let _ = header.row_offset(header.height.saturating_sub(1));

    // Neither may encoding whatever rows follow it
    let vol = MemVolume::new();
    vol.insert("f.bmp", data.to_vec());
    let mut storage = Storage::new(vol.clone()).with_limits(Limits {
        max_pixels: Some(1 << 20),
        ..Default::default()
    });
    if storage.bitmap("f.bmp").is_ok() {
        let companion = vol.contents("enc/f.cbm").unwrap_or_default();
        let records = zenfloor::RunRecord::parse_all(&companion).unwrap();
        zenfloor::compressed::expand_runs(&records, header.width, header.height).unwrap();
    }
});
