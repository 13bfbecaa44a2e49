#![no_main]

use libfuzzer_sys::fuzz_target;
use tempfile::TempDir;

use captioner::contracts::SequenceCounter;
use captioner::counter::{load, FileSequenceCounter};

fuzz_target!(|data: &[u8]| {
    // Arbitrary store contents must load as a positive value and the
    // counter must keep working from there
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("numbering_state.txt");
    std::fs::write(&path, data).unwrap();

    let loaded = load(&path);
    assert!(loaded >= 1);

    let counter = FileSequenceCounter::with_persistence(&path);
    if let Ok(first) = counter.next() {
        assert_eq!(first, loaded);
        assert_eq!(load(&path), loaded + 1);
    }
});
