use arrow::array::{Array, BooleanArray, Decimal128Array, Float64Array, Int32Array, Int64Array, StringArray, TimestampMillisecondArray};
use arrow::datatypes::DataType;
use fragstore_csv::{CsvParseOptions, parse_csv_data, parse_csv_file};
use fragstore_result::Error;
use fragstore_test_utils::{init_tracing_for_tests, temp_file_with};
use fragstore_types::{ColumnDescription, ColumnType, TimeUnit};

fn typed_columns() -> Vec<ColumnDescription> {
    vec![
        ColumnDescription::new("id", ColumnType::Int),
        ColumnDescription::dict_text("name"),
        ColumnDescription::new("active", ColumnType::Bool),
    ]
}

#[test]
fn parses_with_declared_columns() {
    init_tracing_for_tests();
    let data = b"id,name,active\n1,alpha,true\n2,beta,false\n3,,true\n";
    let columns = typed_columns();
    let batch = parse_csv_data(data, &CsvParseOptions::default(), Some(&columns)).unwrap();

    assert_eq!(batch.num_rows(), 3);
    assert_eq!(batch.num_columns(), 3);
    let rb = &batch.batches()[0];
    let ids = rb.column(0).as_any().downcast_ref::<Int32Array>().unwrap();
    assert_eq!(ids.values(), &[1, 2, 3]);
    let names = rb.column(1).as_any().downcast_ref::<StringArray>().unwrap();
    assert_eq!(names.value(1), "beta");
    assert!(names.is_null(2));
    let active = rb.column(2).as_any().downcast_ref::<BooleanArray>().unwrap();
    assert!(!active.value(1));
}

#[test]
fn parses_files_from_disk() {
    let tmp = temp_file_with("id,name,active\n7,x,true\n");
    let columns = typed_columns();
    let batch = parse_csv_file(tmp.path(), &CsvParseOptions::default(), Some(&columns)).unwrap();
    assert_eq!(batch.num_rows(), 1);
}

#[test]
fn missing_file_is_an_io_error() {
    let err = parse_csv_file(
        "/definitely/not/here.csv",
        &CsvParseOptions::default(),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn headerless_input_keeps_declared_names() {
    let columns = typed_columns();
    let options = CsvParseOptions::default().with_header(false);
    let batch = parse_csv_data(b"1,a,true\n2,b,false\n", &options, Some(&columns)).unwrap();
    assert_eq!(batch.num_rows(), 2);
    assert_eq!(batch.schema().field(1).name(), "name");
}

#[test]
fn custom_delimiter_and_skipped_preamble() {
    let columns = typed_columns();
    let options = CsvParseOptions::default()
        .with_delimiter(b'|')
        .with_skip_rows(2);
    let data = b"# exported nightly\n# do not edit\nid|name|active\n10|ten|false\n";
    let batch = parse_csv_data(data, &options, Some(&columns)).unwrap();
    assert_eq!(batch.num_rows(), 1);
    let ids = batch.batches()[0]
        .column(0)
        .as_any()
        .downcast_ref::<Int32Array>()
        .unwrap();
    assert_eq!(ids.value(0), 10);
}

#[test]
fn null_token_is_case_insensitive() {
    let columns = vec![ColumnDescription::new("v", ColumnType::BigInt)];
    let options = CsvParseOptions::default().with_null_token("NA");
    let batch = parse_csv_data(b"v\n1\nNA\nna\n\n4\n", &options, Some(&columns)).unwrap();
    let values = batch.batches()[0]
        .column(0)
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert_eq!(values.len(), 4);
    assert_eq!(values.null_count(), 2);
    assert_eq!(values.value(3), 4);
}

#[test]
fn inference_uses_header_names() {
    let batch = parse_csv_data(
        b"a,b,c\n1,1.5,x\n2,2.5,y\n",
        &CsvParseOptions::default(),
        None,
    )
    .unwrap();
    let schema = batch.schema();
    assert_eq!(schema.field(0).name(), "a");
    assert_eq!(schema.field(0).data_type(), &DataType::Int64);
    assert_eq!(schema.field(1).data_type(), &DataType::Float64);
    assert_eq!(schema.field(2).data_type(), &DataType::Utf8);

    let b = batch.batches()[0]
        .column(1)
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert_eq!(b.value(1), 2.5);
}

#[test]
fn inference_after_skipped_rows_rewinds_correctly() {
    let options = CsvParseOptions::default().with_skip_rows(1);
    let batch = parse_csv_data(b"garbage line\nk\n5\n6\n", &options, None).unwrap();
    assert_eq!(batch.num_rows(), 2);
    assert_eq!(batch.schema().field(0).name(), "k");
}

#[test]
fn unparseable_cell_is_a_parse_failure() {
    let columns = vec![ColumnDescription::new("n", ColumnType::Int)];
    let err = parse_csv_data(b"n\n1\nnot-a-number\n", &CsvParseOptions::default(), Some(&columns))
        .unwrap_err();
    assert!(matches!(err, Error::ParseFailure(_)), "{err:?}");
}

#[test]
fn ragged_rows_are_a_parse_failure() {
    let columns = typed_columns();
    let err = parse_csv_data(b"id,name,active\n1,a\n", &CsvParseOptions::default(), Some(&columns))
        .unwrap_err();
    assert!(matches!(err, Error::ParseFailure(_)), "{err:?}");
}

#[test]
fn decimals_and_timestamps() {
    let columns = vec![
        ColumnDescription::new(
            "price",
            ColumnType::Decimal {
                precision: 10,
                scale: 2,
            },
        ),
        ColumnDescription::new("at", ColumnType::Timestamp(TimeUnit::Millisecond)),
    ];
    let data = b"price,at\n12.34,2024-03-01T00:00:00\n-0.50,1970-01-01T00:00:01\n";
    let batch = parse_csv_data(data, &CsvParseOptions::default(), Some(&columns)).unwrap();
    let rb = &batch.batches()[0];
    let price = rb
        .column(0)
        .as_any()
        .downcast_ref::<Decimal128Array>()
        .unwrap();
    assert_eq!(price.value(0), 1234);
    assert_eq!(price.value(1), -50);
    let at = rb
        .column(1)
        .as_any()
        .downcast_ref::<TimestampMillisecondArray>()
        .unwrap();
    assert_eq!(at.value(1), 1000);
}

#[test]
fn small_batch_size_splits_output() {
    let columns = vec![ColumnDescription::new("v", ColumnType::Int)];
    let options = CsvParseOptions::default().with_batch_size(2);
    let batch = parse_csv_data(b"v\n1\n2\n3\n4\n5\n", &options, Some(&columns)).unwrap();
    assert_eq!(batch.num_rows(), 5);
    assert_eq!(batch.batches().len(), 3);
}

#[test]
fn array_columns_are_rejected() {
    let columns = vec![ColumnDescription::new(
        "xs",
        ColumnType::Array(Box::new(ColumnType::Int)),
    )];
    let err = parse_csv_data(b"xs\n1\n", &CsvParseOptions::default(), Some(&columns)).unwrap_err();
    assert!(matches!(err, Error::UnsupportedType(ref msg) if msg.contains("'xs'")));
}

#[test]
fn binary_columns_are_rejected() {
    let columns = vec![ColumnDescription::new("blob", ColumnType::Binary)];
    let err = parse_csv_data(b"blob\nabc\n", &CsvParseOptions::default(), Some(&columns))
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedType(ref msg) if msg.contains("'blob'")));
}
