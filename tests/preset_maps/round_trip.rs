use std::collections::HashMap;

use presetmap_store::{InMemoryStore, KvPresetMapRepository, PresetMap, PresetMapRepository};
use proptest::prelude::*;

fn provider_mappings() -> impl Strategy<Value = HashMap<String, String>> {
    prop::collection::hash_map("[a-z_.]{1,12}", "[A-Za-z0-9_-]{0,16}", 0..6)
}

proptest! {
    #[test]
    fn create_then_get_round_trips(
        name in "[a-zA-Z0-9:_.-]{1,24}",
        provider_mapping in provider_mappings(),
    ) {
        let repo = KvPresetMapRepository::new(InMemoryStore::new());
        let preset = PresetMap { name: name.clone(), provider_mapping };

        repo.create(&preset).unwrap();

        prop_assert_eq!(repo.get(&name).unwrap(), preset);
    }

    #[test]
    fn update_leaves_exactly_the_new_mapping(
        before in prop::collection::hash_map("[a-z]{1,6}", "[0-9]{1,4}", 0..6),
        after in prop::collection::hash_map("[a-z]{1,6}", "[0-9]{1,4}", 0..6),
    ) {
        let repo = KvPresetMapRepository::new(InMemoryStore::new());
        repo.create(&PresetMap { name: "p".into(), provider_mapping: before }).unwrap();

        repo.update(&PresetMap { name: "p".into(), provider_mapping: after.clone() }).unwrap();

        let loaded: HashMap<String, String> = repo.get("p").unwrap().provider_mapping;
        prop_assert_eq!(loaded, after);
    }
}
