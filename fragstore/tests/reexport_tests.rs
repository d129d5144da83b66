use fragstore::formats::CsvParseOptions;
use fragstore::{ChunkKey, Error, StatValue, SubBuffer, TableOptions, TableStore};
use fragstore_test_utils::{init_tracing_for_tests, le_u32s};

#[test]
fn csv_round_trip_through_the_facade() {
    init_tracing_for_tests();
    let store = TableStore::new(9);
    let info = store
        .import_csv_data(
            b"n,word\n3,aa\n1,b\n2,\n",
            "words",
            None,
            TableOptions::new(8),
            &CsvParseOptions::default(),
        )
        .unwrap();

    let meta = store.get_table_metadata(9, info.table_id).unwrap();
    let stats = &meta.fragments[0].chunk(1).unwrap().stats;
    assert_eq!(stats.min, Some(StatValue::Int(1)));
    assert_eq!(stats.max, Some(StatValue::Int(3)));

    // Dictionary text fetches as codes; its offsets sub-buffer does not exist.
    let offsets = ChunkKey::new(9, info.table_id, 2, 0).with_sub_buffer(SubBuffer::Offsets);
    assert!(matches!(
        store.fetch_to_vec(&offsets),
        Err(Error::InvalidArgument(_))
    ));
    assert_eq!(
        store
            .fetch_to_vec(&ChunkKey::new(9, info.table_id, 2, 0))
            .unwrap()
            .len(),
        12
    );
}

#[test]
fn plain_text_offsets_through_the_facade() {
    use fragstore::{ColumnDescription, ColumnType};

    let store = TableStore::new(9);
    let columns = [
        ColumnDescription::new("n", ColumnType::Int),
        ColumnDescription::new("word", ColumnType::Text),
    ];
    let info = store
        .import_csv_data(
            b"n,word\n1,ab\n2,\n3,cde\n",
            "plain",
            Some(&columns),
            TableOptions::new(8),
            &CsvParseOptions::default(),
        )
        .unwrap();
    let key = ChunkKey::new(9, info.table_id, 2, 0).with_sub_buffer(SubBuffer::Offsets);
    assert_eq!(le_u32s(&store.fetch_to_vec(&key).unwrap()), vec![0, 2, 2, 5]);
}
