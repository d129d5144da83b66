//! Interning races across threads must never hand out two codes for one string.

use std::sync::Arc;
use std::thread;

use fragstore_dict::DictionaryRegistry;
use fragstore_test_utils::init_tracing_for_tests;

#[test]
fn racing_threads_agree_on_codes() {
    init_tracing_for_tests();

    let registry = Arc::new(DictionaryRegistry::new());
    let dict_id = registry.create_dictionary().unwrap();
    let values: Vec<String> = (0..500).map(|i| format!("v{i}")).collect();

    let per_thread: Vec<Vec<i32>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let registry = Arc::clone(&registry);
                let values = &values;
                scope.spawn(move || {
                    // Alternate direction so threads collide on unseen strings.
                    let mut codes = vec![0; values.len()];
                    let order: Vec<usize> = if t % 2 == 0 {
                        (0..values.len()).collect()
                    } else {
                        (0..values.len()).rev().collect()
                    };
                    for idx in order {
                        codes[idx] = registry.get_or_create(dict_id, &values[idx]).unwrap();
                    }
                    codes
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for codes in &per_thread[1..] {
        assert_eq!(codes, &per_thread[0]);
    }

    let desc = registry.get_dict_metadata(dict_id, true).unwrap().unwrap();
    assert_eq!(desc.size, values.len());

    let mut seen = per_thread[0].clone();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen, (0..values.len() as i32).collect::<Vec<_>>());

    let dict = desc.dictionary.unwrap();
    for (idx, value) in values.iter().enumerate() {
        assert_eq!(dict.get_string(per_thread[0][idx]).as_deref(), Some(value.as_str()));
    }
}

#[test]
fn independent_dictionaries_do_not_share_codes() {
    let registry = DictionaryRegistry::new();
    let a = registry.create_dictionary().unwrap();
    let b = registry.create_dictionary().unwrap();

    assert_eq!(registry.get_or_create(a, "left").unwrap(), 0);
    assert_eq!(registry.get_or_create(b, "right").unwrap(), 0);
    assert_eq!(registry.get_or_create(b, "left").unwrap(), 1);
    assert_eq!(registry.get_or_create(a, "left").unwrap(), 0);
}
