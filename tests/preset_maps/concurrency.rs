use std::sync::{Arc, Mutex};
use std::thread;

use presetmap_store::{
    FieldMap, InMemoryStore, KeyValueStore, KvPresetMapRepository, PresetMap, PresetMapError,
    PresetMapRepository, StoreError, PRESETS_SET_KEY,
};

use crate::support::{mapping, names, ContendedStore, InterleavedStore};

fn rival_fields() -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert("presetmap_name".into(), "web".into());
    fields.insert("pmapping_rival".into(), "99".into());
    fields
}

#[test]
fn concurrent_write_aborts_update_with_conflict() {
    let inner = InMemoryStore::new();
    let store = ContendedStore::new(inner.clone(), rival_fields());
    let repo = KvPresetMapRepository::new(store.clone());
    repo.create(&PresetMap::new("web").with_provider("a", "1")).unwrap();

    store.arm();
    let err = repo
        .update(&PresetMap::new("web").with_provider("b", "2"))
        .unwrap_err();

    assert_eq!(
        err,
        PresetMapError::Store(StoreError::Conflict {
            keys: vec!["preset:web".into()]
        })
    );
    // The rival's write stands; nothing from the aborted batch was applied.
    let loaded = repo.get("web").unwrap();
    assert_eq!(loaded.provider_mapping, mapping(&[("a", "1"), ("rival", "99")]));
}

#[test]
fn conflict_on_create_leaves_index_unchanged() {
    let inner = InMemoryStore::new();
    let store = ContendedStore::new(inner.clone(), rival_fields());
    let repo = KvPresetMapRepository::new(store.clone());

    store.arm();
    let err = repo.create(&PresetMap::new("web")).unwrap_err();

    assert!(matches!(err, PresetMapError::Store(ref e) if e.is_conflict()));
    assert!(inner.set_members(PRESETS_SET_KEY).unwrap().is_empty());
}

#[test]
fn racing_creates_of_a_new_name_both_succeed_and_last_write_wins() {
    let inner = InMemoryStore::new();
    let store = InterleavedStore::new(inner.clone());
    let rival = KvPresetMapRepository::new(inner.clone());
    let rival_result = Arc::new(Mutex::new(None));

    // The rival creates "web" after our existence check saw nothing.
    let slot = Arc::clone(&rival_result);
    store.after_next_read(move || {
        let preset = PresetMap::new("web").with_provider("rival", "1");
        *slot.lock().unwrap() = Some(rival.create(&preset));
    });

    let repo = KvPresetMapRepository::new(store);
    let mine = PresetMap::new("web").with_provider("mine", "2");
    assert_eq!(repo.create(&mine), Ok(()));
    assert_eq!(rival_result.lock().unwrap().take(), Some(Ok(())));

    assert_eq!(repo.get("web").unwrap(), mine);
    assert_eq!(inner.set_members(PRESETS_SET_KEY).unwrap(), vec!["web"]);
}

#[test]
fn retry_after_conflict_succeeds() {
    let store = ContendedStore::new(InMemoryStore::new(), rival_fields());
    let repo = KvPresetMapRepository::new(store.clone());
    repo.create(&PresetMap::new("web")).unwrap();

    store.arm();
    let update = PresetMap::new("web").with_provider("b", "2");
    assert!(repo.update(&update).is_err());
    repo.update(&update).unwrap();

    assert_eq!(repo.get("web").unwrap(), update);
}

#[test]
fn parallel_creates_of_distinct_names_are_all_indexed() {
    let repo = Arc::new(KvPresetMapRepository::new(InMemoryStore::new()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let repo = Arc::clone(&repo);
            thread::spawn(move || {
                let preset = PresetMap::new(format!("preset-{}", i))
                    .with_provider("provider", i.to_string());
                repo.create(&preset).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let listed = repo.list().unwrap();
    assert_eq!(listed.len(), 8);
    let mut expected: Vec<String> = (0..8).map(|i| format!("preset-{}", i)).collect();
    expected.sort();
    assert_eq!(names(&listed), expected);
}

#[test]
fn parallel_updates_of_one_name_end_in_one_written_state() {
    let repo = KvPresetMapRepository::new(InMemoryStore::new());
    repo.create(&PresetMap::new("hot")).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let repo = repo.clone();
            thread::spawn(move || {
                let preset = PresetMap::new("hot").with_provider("writer", i.to_string());
                repo.update(&preset)
            })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(()) => succeeded += 1,
            Err(PresetMapError::Store(err)) => assert!(err.is_conflict()),
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
    assert!(succeeded >= 1);

    let loaded = repo.get("hot").unwrap();
    assert_eq!(loaded.provider_mapping.len(), 1);
    let writer: u32 = loaded.preset_for("writer").unwrap().parse().unwrap();
    assert!(writer < 8);
    assert_eq!(names(&repo.list().unwrap()), vec!["hot"]);
}
