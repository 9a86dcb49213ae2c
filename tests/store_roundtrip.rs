// Store persistence and view laws across the public API.

use panmap::coverage::Coverage;
use panmap::error::Error;
use panmap::serialize::{load_store, load_store_file, save_store, save_store_file};
use panmap::store::{RcmsStore, StoreRead};
use panmap::variant::Variant;

fn build_store() -> RcmsStore {
    let mut store = RcmsStore::new(*b"ACGTACGTACGTACGTACGT", 7);
    store
        .add(Variant::snv(2, b'T'), Coverage::of(7, &[0, 3, 6]))
        .unwrap();
    store
        .add(Variant::insertion(5, *b"GATT"), Coverage::of(7, &[1]))
        .unwrap();
    store
        .add(Variant::deletion(8, 13), Coverage::of(7, &[2, 5]))
        .unwrap();
    store
        .add(Variant::new(14, 17, *b"CCC"), Coverage::of(7, &[4]))
        .unwrap();
    store
        .add(Variant::insertion(20, *b"A"), Coverage::of(7, &[0, 1, 2]))
        .unwrap();
    store
}

#[test]
fn file_round_trip_preserves_the_store() {
    let store = build_store();
    let path = std::env::temp_dir().join("panmap_store_roundtrip.jst");
    save_store_file(&store, &path).unwrap();
    let loaded = load_store_file(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(loaded, store);
}

#[test]
fn haplotypes_survive_the_round_trip() {
    let store = build_store();
    let mut bytes = Vec::new();
    save_store(&store, &mut bytes).unwrap();
    let loaded = load_store(bytes.as_slice()).unwrap();
    for h in 0..store.haplotypes() {
        assert_eq!(loaded.haplotype_sequence(h), store.haplotype_sequence(h));
    }
}

#[test]
fn reversing_twice_is_the_identity() {
    let store = build_store();
    let rev = store.reversed();
    let len = store.source().len() as u32;
    // mirror every reversed row back and compare against the original
    for i in 0..rev.variant_count() {
        let rv = rev.variant(i);
        let mut alt = rv.alt.clone();
        alt.reverse();
        let back = Variant::new(len - rv.hi(), len - rv.lo(), alt);
        let original = &store.rows()[rev.forward_index(i)];
        assert_eq!(back, original.variant);
        assert_eq!(rev.coverage(i), &original.coverage);
    }
    // and the mirrored source reads backwards
    let mut mirrored = Vec::new();
    rev.push_source(0..store.source().len(), &mut mirrored);
    mirrored.reverse();
    assert_eq!(mirrored, store.source());
}

#[test]
fn truncated_stores_fail_loading_everywhere() {
    let store = build_store();
    let mut bytes = Vec::new();
    save_store(&store, &mut bytes).unwrap();
    for cut in [0, 4, 9, bytes.len() / 2, bytes.len() - 1] {
        let result = load_store(&bytes[..cut]);
        assert!(
            matches!(result, Err(Error::StoreCorrupt(_))),
            "cut at {} did not report corruption",
            cut
        );
    }
}
