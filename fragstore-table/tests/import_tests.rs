use std::fs::File;
use std::sync::Arc;

use arrow::array::{ArrayRef, Int32Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use fragstore_csv::CsvParseOptions;
use fragstore_json::JsonParseOptions;
use fragstore_result::Error;
use fragstore_table::TableStore;
use fragstore_test_utils::{batch, init_tracing_for_tests, le_i32s, le_i64s, temp_file_with};
use fragstore_types::{ChunkKey, ColumnDescription, ColumnEncoding, ColumnType, TableOptions};
use parquet::arrow::ArrowWriter;
use tempfile::NamedTempFile;

const DB: i32 = 7;

fn opts(fragment_size: usize) -> TableOptions {
    TableOptions::default().with_fragment_size(fragment_size)
}

fn fetch(store: &TableStore, table_id: i32, column_id: i32, fragment_id: usize) -> Vec<u8> {
    store
        .fetch_to_vec(&ChunkKey::new(DB, table_id, column_id, fragment_id))
        .unwrap()
}

#[test]
fn csv_import_infers_columns_and_appends_with_table_types() {
    init_tracing_for_tests();
    let store = TableStore::new(DB);
    let csv = CsvParseOptions::default();
    let info = store
        .import_csv_data(b"id,name\n1,ann\n2,bob\n3,ann\n", "people", None, opts(2), &csv)
        .unwrap();

    assert_eq!(info.columns[0].column_type, ColumnType::BigInt);
    assert_eq!(info.columns[1].column_type, ColumnType::Text);
    assert_eq!(info.columns[1].encoding, ColumnEncoding::Dictionary);
    assert_eq!(le_i64s(&fetch(&store, info.table_id, 1, 0)), vec![1, 2]);
    assert_eq!(le_i32s(&fetch(&store, info.table_id, 2, 0)), vec![0, 1]);
    assert_eq!(le_i32s(&fetch(&store, info.table_id, 2, 1)), vec![0]);

    store
        .append_csv_data(b"id,name\n4,cy\n", "people", &csv)
        .unwrap();
    let meta = store.get_table_metadata(DB, info.table_id).unwrap();
    assert_eq!(meta.row_count, 4);
    let last = meta.fragments.last().unwrap();
    assert_eq!((last.offset, last.row_count), (3, 1));
    assert_eq!(
        le_i32s(&fetch(&store, info.table_id, 2, last.fragment_id)),
        vec![2]
    );
}

#[test]
fn csv_file_import_with_declared_columns() {
    let store = TableStore::new(DB);
    let file = temp_file_with("# exported\nqty|label\n5|a\nNA|b\n");
    let columns = [
        ColumnDescription::new("qty", ColumnType::Int),
        ColumnDescription::new("label", ColumnType::Text),
    ];
    let csv = CsvParseOptions::default()
        .with_delimiter(b'|')
        .with_skip_rows(1)
        .with_null_token("NA");
    let info = store
        .import_csv_file(file.path(), "stock", Some(&columns), opts(8), &csv)
        .unwrap();

    assert_eq!(
        le_i32s(&fetch(&store, info.table_id, 1, 0)),
        vec![5, i32::MIN]
    );
    assert_eq!(fetch(&store, info.table_id, 2, 0), b"ab".to_vec());
    let meta = store.get_table_metadata(DB, info.table_id).unwrap();
    assert_eq!(meta.fragments[0].chunk(1).unwrap().stats.null_count, 1);

    store
        .append_csv_file(file.path(), info.table_id, &csv)
        .unwrap();
    assert_eq!(store.table_row_count("stock").unwrap(), 4);
}

#[test]
fn failed_import_leaves_no_table() {
    let store = TableStore::new(DB);
    let columns = [ColumnDescription::new("n", ColumnType::Int)];
    let err = store
        .import_csv_data(
            b"n\n1\nseven\n",
            "bad",
            Some(&columns),
            opts(4),
            &CsvParseOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::ParseFailure(_)));
    assert!(store.list_tables().unwrap().is_empty());

    let wide: ArrayRef = Arc::new(Int64Array::from(vec![1, 2]));
    let err = store
        .import_arrow_table(batch(vec![("n", wide)]), "bad", Some(&columns), opts(4))
        .unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch(_)));
    assert!(store.list_tables().unwrap().is_empty());
    assert!(store.dictionaries().is_empty());

    assert!(matches!(
        store.import_csv_file(
            "/definitely/not/here.csv",
            "bad",
            None,
            opts(4),
            &CsvParseOptions::default()
        ),
        Err(Error::Io(_))
    ));
}

#[test]
fn arrow_import_infers_dictionary_text() {
    let store = TableStore::new(DB);
    let ids: ArrayRef = Arc::new(Int32Array::from(vec![10, 20, 30]));
    let tags: ArrayRef = Arc::new(StringArray::from(vec![Some("b"), None, Some("b")]));
    let info = store
        .import_arrow_table(batch(vec![("id", ids), ("tag", tags)]), "tags", None, opts(2))
        .unwrap();

    let dict_id = info.columns[1].dict_id.expect("inferred text is dictionary-encoded");
    let desc = store.get_dict_metadata(dict_id, false).unwrap().unwrap();
    assert_eq!(desc.size, 1);
    assert!(desc.dictionary.is_none());
    assert_eq!(
        le_i32s(&fetch(&store, info.table_id, 2, 0)),
        vec![0, i32::MIN]
    );
}

#[test]
fn json_import_and_append() {
    let store = TableStore::new(DB);
    let json = JsonParseOptions::default();
    let data = br#"{"k": 1, "city": "oslo"}
{"k": 2, "city": "rome"}
{"k": 3}
"#;
    let info = store
        .import_json_data(data, "cities", None, opts(2), &json)
        .unwrap();
    assert_eq!(info.columns[0].column_type, ColumnType::BigInt);
    assert!(info.columns[1].encoding.is_dictionary());
    assert_eq!(le_i64s(&fetch(&store, info.table_id, 1, 1)), vec![3]);
    assert_eq!(
        le_i32s(&fetch(&store, info.table_id, 2, 1)),
        vec![i32::MIN]
    );

    store
        .append_json_data(br#"{"city": "oslo", "k": 4}"#, "cities", &json)
        .unwrap();
    let meta = store.get_table_metadata(DB, info.table_id).unwrap();
    assert_eq!(meta.row_count, 4);
    assert_eq!(meta.num_fragments(), 3);
    assert_eq!(le_i32s(&fetch(&store, info.table_id, 2, 2)), vec![0]);

    assert!(matches!(
        store.append_json_data(b"{\"k\": \"x\"}", "cities", &json),
        Err(Error::ParseFailure(_))
    ));
    assert_eq!(store.table_row_count("cities").unwrap(), 4);
}

#[test]
fn json_import_keeps_document_key_order() {
    let store = TableStore::new(DB);
    let info = store
        .import_json_data(
            b"{\"zeta\": 1, \"alpha\": \"x\"}\n",
            "j",
            None,
            opts(4),
            &JsonParseOptions::default(),
        )
        .unwrap();
    let names: Vec<&str> = info.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["zeta", "alpha"]);
    assert_eq!(store.column_info_by_name(info.table_id, "zeta").unwrap().column_id, 1);
    assert_eq!(le_i64s(&fetch(&store, info.table_id, 1, 0)), vec![1]);
}

#[test]
fn binary_tables_reject_text_formats() {
    let store = TableStore::new(DB);
    let info = store
        .create_table(
            "blobs",
            &[ColumnDescription::new("x", ColumnType::Binary)],
            opts(4),
        )
        .unwrap();
    assert!(matches!(
        store.append_csv_data(b"x\nabc\n", "blobs", &CsvParseOptions::default()),
        Err(Error::UnsupportedType(_))
    ));
    assert!(matches!(
        store.append_json_data(br#"{"x":"abc"}"#, "blobs", &JsonParseOptions::default()),
        Err(Error::UnsupportedType(_))
    ));
    assert_eq!(store.table_row_count(info.table_id).unwrap(), 0);
}

fn write_parquet(rows: std::ops::Range<i32>) -> NamedTempFile {
    let schema = Arc::new(Schema::new(vec![
        Field::new("v", DataType::Int32, false),
        Field::new("s", DataType::Utf8, true),
    ]));
    let values: ArrayRef = Arc::new(Int32Array::from_iter_values(rows.clone()));
    let labels: ArrayRef = Arc::new(StringArray::from_iter_values(
        rows.map(|i| if i % 2 == 0 { "even" } else { "odd" }),
    ));
    let rb = RecordBatch::try_new(Arc::clone(&schema), vec![values, labels]).unwrap();

    let tmp = NamedTempFile::new().unwrap();
    let file = File::create(tmp.path()).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&rb).unwrap();
    writer.close().unwrap();
    tmp
}

#[test]
fn parquet_import_and_append() {
    let store = TableStore::new(DB);
    let first = write_parquet(0..4);
    let info = store
        .import_parquet_file(first.path(), "pq", opts(3))
        .unwrap();
    assert_eq!(info.columns[0].column_type, ColumnType::Int);
    assert!(info.columns[1].encoding.is_dictionary());

    let second = write_parquet(4..6);
    store.append_parquet_file(second.path(), "pq").unwrap();

    let meta = store.get_table_metadata(DB, info.table_id).unwrap();
    let shape: Vec<_> = meta
        .fragments
        .iter()
        .map(|f| (f.offset, f.row_count))
        .collect();
    assert_eq!(shape, vec![(0, 3), (3, 1), (4, 2)]);
    assert_eq!(le_i32s(&fetch(&store, info.table_id, 1, 2)), vec![4, 5]);
    assert_eq!(le_i32s(&fetch(&store, info.table_id, 2, 2)), vec![0, 1]);

    assert!(matches!(
        store.append_parquet_file("/definitely/not/here.parquet", "pq"),
        Err(Error::Io(_))
    ));
}
