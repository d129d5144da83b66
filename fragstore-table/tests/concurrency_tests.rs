use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use arrow::array::{ArrayRef, Int64Array, StringArray};
use fragstore_table::TableStore;
use fragstore_test_utils::{batch, init_tracing_for_tests, le_i32s, le_i64s};
use fragstore_types::{ChunkKey, ColumnDescription, ColumnEncoding, ColumnType, TableOptions};

const DB: i32 = 3;

fn longs(range: std::ops::Range<i64>) -> ArrayRef {
    Arc::new(Int64Array::from_iter_values(range))
}

#[test]
fn parallel_appends_to_separate_tables() {
    init_tracing_for_tests();
    let store = TableStore::new(DB);
    let columns = [ColumnDescription::new("v", ColumnType::BigInt)];
    let ids: Vec<i32> = (0..4)
        .map(|i| {
            store
                .create_table(&format!("t{i}"), &columns, TableOptions::new(16))
                .unwrap()
                .table_id
        })
        .collect();

    thread::scope(|s| {
        for &table_id in &ids {
            let store = &store;
            s.spawn(move || {
                for round in 0..50i64 {
                    store
                        .append_arrow_table(
                            batch(vec![("v", longs(round * 10..round * 10 + 10))]),
                            table_id,
                        )
                        .unwrap();
                }
            });
        }
    });

    for &table_id in &ids {
        let meta = store.get_table_metadata(DB, table_id).unwrap();
        assert_eq!(meta.row_count, 500);
        assert_eq!(meta.num_fragments(), 50);
        let last = store
            .fetch_to_vec(&ChunkKey::new(DB, table_id, 1, 49))
            .unwrap();
        assert_eq!(le_i64s(&last), (490..500).collect::<Vec<_>>());
    }
}

#[test]
fn readers_see_consistent_metadata_during_appends() {
    let store = TableStore::new(DB);
    let table_id = store
        .create_table(
            "live",
            &[ColumnDescription::new("v", ColumnType::BigInt)],
            TableOptions::new(7),
        )
        .unwrap()
        .table_id;
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        s.spawn(|| {
            for round in 0..200i64 {
                store
                    .append_arrow_table(batch(vec![("v", longs(round * 9..round * 9 + 9))]), "live")
                    .unwrap();
            }
            done.store(true, Ordering::Release);
        });

        for _ in 0..2 {
            s.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    let meta = store.get_table_metadata(DB, table_id).unwrap();
                    let mut expected_offset = 0;
                    for frag in &meta.fragments {
                        assert_eq!(frag.offset, expected_offset);
                        expected_offset += frag.row_count;
                        let bytes = store
                            .fetch_to_vec(&ChunkKey::new(DB, table_id, 1, frag.fragment_id))
                            .unwrap();
                        let values = le_i64s(&bytes);
                        assert_eq!(values.len(), frag.row_count);
                        assert_eq!(values[0], frag.offset as i64);
                    }
                    assert_eq!(expected_offset, meta.row_count);
                }
            });
        }
    });

    assert_eq!(store.table_row_count(table_id).unwrap(), 1800);
}

#[test]
fn shared_dictionary_interning_across_threads() {
    let store = TableStore::new(DB);
    let first = store
        .create_table("a", &[ColumnDescription::dict_text("s")], TableOptions::new(64))
        .unwrap();
    let dict_id = first.columns[0].dict_id.unwrap();
    let shared = ColumnDescription::new("s", ColumnType::Text)
        .with_encoding(ColumnEncoding::SharedDictionary(dict_id));
    store
        .create_table("b", &[shared], TableOptions::new(64))
        .unwrap();

    let words: Vec<String> = (0..40).map(|i| format!("w{i}")).collect();
    thread::scope(|s| {
        for (table, reversed) in [("a", false), ("b", true)] {
            let store = &store;
            let words = &words;
            s.spawn(move || {
                let mut order: Vec<&str> = words.iter().map(String::as_str).collect();
                if reversed {
                    order.reverse();
                }
                for chunk in order.chunks(5) {
                    let strings: ArrayRef = Arc::new(StringArray::from(chunk.to_vec()));
                    store
                        .append_arrow_table(batch(vec![("s", strings)]), table)
                        .unwrap();
                }
            });
        }
    });

    let desc = store.get_dict_metadata(dict_id, true).unwrap().unwrap();
    assert_eq!(desc.size, words.len());
    assert_eq!(desc.ref_count, 2);
    let dict = desc.dictionary.unwrap();

    for name in ["a", "b"] {
        let info = store.table_info_by_name(name).unwrap();
        let meta = store.get_table_metadata(DB, info.table_id).unwrap();
        let mut decoded = Vec::new();
        for frag in &meta.fragments {
            let codes = store
                .fetch_to_vec(&ChunkKey::new(DB, info.table_id, 1, frag.fragment_id))
                .unwrap();
            decoded.extend(
                le_i32s(&codes)
                    .into_iter()
                    .map(|code| dict.get_string(code).unwrap().to_string()),
            );
        }
        decoded.sort();
        let mut expected = words.clone();
        expected.sort();
        assert_eq!(decoded, expected);
    }
}
