//! Dedup index semantics.

use std::sync::Arc;

use reelgate_storage::DedupIndex;

#[test]
fn re_adding_a_pair_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let index = DedupIndex::open(dir.path().join("indexes/scripts_hash_index.json"));
    let h = DedupIndex::compute_hash("Era uma vez um gato.");

    assert!(index.add(&h, "script_001").unwrap());
    assert_eq!(index.pair_count(), 1);
    assert!(!index.add(&h, "script_001").unwrap());
    assert_eq!(index.pair_count(), 1);
    assert_eq!(index.len(), 1);
}

#[test]
fn two_ids_under_one_hash_are_both_returned() {
    let dir = tempfile::tempdir().unwrap();
    let index = DedupIndex::open(dir.path().join("index.json"));
    let h = DedupIndex::compute_hash("mesmo texto");
    index.add(&h, "script_001").unwrap();
    index.add(&h, "script_002").unwrap();
    assert_eq!(index.find(&h).unwrap(), vec!["script_001", "script_002"]);
    assert!(index.find("unknown").unwrap().is_empty());
}

#[test]
fn find_sees_writes_from_other_handles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.json");
    let reader = DedupIndex::open(&path);
    let writer = DedupIndex::open(&path);
    let h = DedupIndex::compute_hash("conteúdo");

    assert!(reader.find(&h).unwrap().is_empty());
    writer.add(&h, "script_009").unwrap();
    assert_eq!(reader.find(&h).unwrap(), vec!["script_009"]);
}

#[test]
fn hash_is_stable_and_content_sensitive() {
    let a = DedupIndex::compute_hash("abc");
    assert_eq!(a, DedupIndex::compute_hash("abc"));
    assert_ne!(a, DedupIndex::compute_hash("abd"));
    assert_eq!(a.len(), 64);
}

#[test]
fn corrupt_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.json");
    std::fs::write(&path, "[[[").unwrap();
    let index = DedupIndex::open(&path);
    assert!(index.is_empty());
    assert!(index.add("h", "id").unwrap());
    assert_eq!(index.find("h").unwrap(), vec!["id"]);
}

#[test]
fn concurrent_adds_are_all_kept() {
    use rayon::prelude::*;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.json");
    let shared = Arc::new(DedupIndex::open(&path));

    (0..64).into_par_iter().for_each(|i| {
        let h = format!("hash_{}", i % 8);
        if i % 3 == 0 {
            DedupIndex::open(&path).add(&h, &format!("id_{i}")).unwrap();
        } else {
            shared.add(&h, &format!("id_{i}")).unwrap();
        }
    });

    let fresh = DedupIndex::open(&path);
    let total: usize = (0..8)
        .map(|k| fresh.find(&format!("hash_{k}")).unwrap().len())
        .sum();
    assert_eq!(total, 64);
}

#[test]
fn register_returns_earlier_ids_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let index = DedupIndex::open(dir.path().join("index.json"));
    let h = DedupIndex::compute_hash("texto repetido");

    assert!(index.register(&h, "script_001").unwrap().is_empty());
    assert_eq!(index.register(&h, "script_002").unwrap(), vec!["script_001"]);
    assert_eq!(index.register(&h, "script_001").unwrap(), vec!["script_002"]);
    assert_eq!(index.pair_count(), 2);
}
