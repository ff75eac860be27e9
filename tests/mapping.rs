use zenfloor::mapping::{FLOOR_COUNT, MAX_TEXT_LEN};
use zenfloor::volume::MemVolume;
use zenfloor::*;

const FLOORS: &str = "floors.txt";

#[test]
fn initialise_then_load() {
    let vol = MemVolume::new();
    let mut storage = Storage::new(vol.clone());
    storage.init_mapping(FLOORS).unwrap();

    let text = String::from_utf8(vol.contents(FLOORS).unwrap()).unwrap();
    assert_eq!(text.lines().count(), FLOOR_COUNT + 1);
    assert!(text.ends_with("32,,\n$\n"));

    let table = storage.load_mapping(FLOORS).unwrap();
    assert_eq!(table.entries().len(), FLOOR_COUNT);
    for (i, entry) in table.entries().iter().enumerate() {
        assert_eq!(entry.floor_no(), (i + 1).to_string());
        assert!(!entry.is_mapped());
    }
    assert_eq!(table.mapped_floor_count(), 0);
}

#[test]
fn set_commit_load() {
    let vol = MemVolume::new();
    let mut storage = Storage::new(vol.clone());
    storage.init_mapping(FLOORS).unwrap();
    storage.load_mapping(FLOORS).unwrap();

    storage
        .mapping_mut()
        .set_mapping("05", "icon_a", "icon_b")
        .unwrap();
    storage.commit_mapping(FLOORS).unwrap();

    let mut fresh = Storage::new(vol.clone());
    let table = fresh.load_mapping(FLOORS).unwrap();
    assert_eq!(table.get_mapping("05").unwrap(), ("icon_a", "icon_b"));
    assert_eq!(table.mapped_floor_count(), 1);
    assert_eq!(
        table.find_by_bitmap_name("icon_a", "icon_b").unwrap().floor_no(),
        "5"
    );

    let text = String::from_utf8(vol.contents(FLOORS).unwrap()).unwrap();
    assert_eq!(text.lines().nth(4), Some("5,icon_a,icon_b"));
}

#[test]
fn unknown_floor_leaves_table_unchanged() {
    let mut storage = Storage::new(MemVolume::new());
    storage.init_mapping(FLOORS).unwrap();
    storage.mapping_mut().set_mapping("2", "stairs", "").unwrap();
    let before = storage.mapping().clone();

    assert!(matches!(
        storage.mapping_mut().set_mapping("99", "x", "y"),
        Err(StoreError::FloorNotFound(f)) if f == "99"
    ));
    assert!(matches!(
        storage.mapping_mut().clear_mapping("99"),
        Err(StoreError::FloorNotFound(_))
    ));
    assert!(storage.mapping().get_mapping("99").is_err());
    assert_eq!(storage.mapping(), &before);
}

#[test]
fn commit_overwrites_previous_file() {
    let vol = MemVolume::new();
    vol.insert(FLOORS, "stale contents that are much longer than one table\n".repeat(40));
    let mut storage = Storage::new(vol.clone());
    storage.init_mapping(FLOORS).unwrap();
    storage.mapping_mut().set_mapping("1", "lobby", "").unwrap();
    storage.commit_mapping(FLOORS).unwrap();

    let data = vol.contents(FLOORS).unwrap();
    assert!(data.starts_with(b"1,lobby,\n2,,\n"));
    assert!(data.ends_with(b"$\n"));
    assert_eq!(MappingTable::parse(&data).unwrap(), *storage.mapping());
}

#[test]
fn hand_written_file_with_crlf_and_short_table() {
    let vol = MemVolume::new();
    vol.insert(FLOORS, "B1,garage,\r\nG,lobby,lobby_night\r\n1,,\r\n$\r\n");
    let mut storage = Storage::new(vol);
    let table = storage.load_mapping(FLOORS).unwrap();
    assert_eq!(table.get_mapping("B1").unwrap(), ("garage", ""));
    assert_eq!(table.get_mapping("G").unwrap(), ("lobby", "lobby_night"));
    assert_eq!(table.mapped_floor_count(), 2);
    assert!(matches!(
        table.get_mapping("2"),
        Err(StoreError::FloorNotFound(_))
    ));
}

#[test]
fn malformed_file_is_rejected() {
    let vol = MemVolume::new();
    vol.insert(FLOORS, "1,this_name_is_far_too_long_to_fit,\n$\n");
    let mut storage = Storage::new(vol);
    assert!(matches!(
        storage.load_mapping(FLOORS),
        Err(StoreError::InvalidRecord { line: 1, .. })
    ));
    assert!(storage.mapping().get_mapping("1").is_err());
}

#[test]
fn load_reads_only_the_table() {
    let vol = MemVolume::new();
    let mut text = MappingTable::blank().to_text().replace("$\n", "");
    text.push_str(&"9,trailing,garbage\n".repeat(10_000));
    vol.insert(FLOORS, text);
    let mut storage = Storage::new(vol);
    assert_eq!(*storage.load_mapping(FLOORS).unwrap(), MappingTable::blank());
    let read = storage.session_mut().position().unwrap();
    assert_eq!(read, MAX_TEXT_LEN as u64);
}
