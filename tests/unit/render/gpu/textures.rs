use super::*;

#[test]
fn slot_table_reuses_and_fills() {
    let mut t = SlotTable::new(2);
    assert_eq!(t.bind(TextureId(7)), 0);
    assert_eq!(t.lookup(TextureId(7)), Some(0));
    assert_eq!(t.lookup(TextureId(8)), None);
    assert!(!t.is_full());
    assert_eq!(t.bind(TextureId(8)), 1);
    assert!(t.is_full());
    assert_eq!(t.bound(), &[TextureId(7), TextureId(8)]);

    t.clear();
    assert!(t.bound().is_empty());
    assert_eq!(t.lookup(TextureId(7)), None);
}

#[test]
fn cache_pool_evicts_only_untouched_entries() {
    let mut p = CachePool::default();
    p.insert(1, TextureId(10));
    p.insert(2, TextureId(20));

    // Both used during the inserting pass.
    assert!(p.evict_unused().is_empty());

    assert!(p.touch(1).is_some());
    assert_eq!(p.evict_unused(), vec![TextureId(20)]);
    assert!(p.contains(1));
    assert!(!p.contains(2));

    // Flag was reset by the previous pass.
    assert_eq!(p.evict_unused(), vec![TextureId(10)]);
    assert_eq!(p.len(), 0);
    assert!(p.touch(1).is_none());
}
