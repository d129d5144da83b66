//! The table store: ingestion, catalog lookups and buffer fetch.

use std::path::Path;
use std::sync::{Arc, RwLock};

use arrow::array::ArrayRef;
use fragstore_csv::{CsvParseOptions, parse_csv_data, parse_csv_file};
use fragstore_dict::{DictDescriptor, DictionaryRegistry, StringDictionary};
use fragstore_json::{JsonParseOptions, parse_json_data};
use fragstore_parquet::parse_parquet_file;
use fragstore_result::{Error, Result};
use fragstore_types::{
    ChunkKey, ChunkLayout, ColumnBatch, ColumnDescription, ColumnEncoding, ColumnId, DatabaseId,
    DictId, SubBuffer, TableId, TableOptions, TableRef,
};

use crate::catalog::{ColumnInfo, TableDirectory, TableEntry, TableInfo};
use crate::fetch::{
    ZeroCopyToken, copy_sub_buffer, resolve_sub_buffer, sub_buffer_size, zero_copy,
};
use crate::metadata::TableFragmentsInfo;
use crate::schema::{compare_schemas, infer_columns, validate_columns};
use crate::table::{StoredColumn, TableData};

type DictBinding = Option<(DictId, Arc<StringDictionary>)>;

/// In-memory store of fragmented tables for one database.
///
/// All methods take `&self`; share the store across threads behind an `Arc`.
///
/// # Locking
///
/// Every table has its own `RwLock`. Appends and drops hold it exclusively, fetches and
/// metadata reads hold it shared. The directory lock is held only while resolving or
/// registering a name, never while parsing or fragmenting.
pub struct TableStore {
    db_id: DatabaseId,
    directory: TableDirectory,
    dictionaries: DictionaryRegistry,
}

impl TableStore {
    pub fn new(db_id: DatabaseId) -> Self {
        Self {
            db_id,
            directory: TableDirectory::new(),
            dictionaries: DictionaryRegistry::new(),
        }
    }

    pub fn db_id(&self) -> DatabaseId {
        self.db_id
    }

    /// Registry backing every dictionary-encoded column of this store.
    pub fn dictionaries(&self) -> &DictionaryRegistry {
        &self.dictionaries
    }

    // ---------------------------------------------------------------------
    // Creation and import
    // ---------------------------------------------------------------------

    /// Create an empty table.
    ///
    /// Dictionary-encoded columns get a fresh dictionary unless they name an existing
    /// one through [`ColumnEncoding::SharedDictionary`].
    pub fn create_table(
        &self,
        name: &str,
        columns: &[ColumnDescription],
        options: TableOptions,
    ) -> Result<TableInfo> {
        let entry = self.create_entry(name, columns, options)?;
        tracing::info!(
            table = name,
            table_id = entry.info.table_id,
            columns = columns.len(),
            fragment_size = options.fragment_size,
            "created table"
        );
        Ok(entry.info.clone())
    }

    /// Create a table from in-memory record batches.
    ///
    /// Without `columns`, definitions are inferred from the batch schema and string
    /// columns become dictionary-encoded text.
    pub fn import_arrow_table(
        &self,
        batch: impl Into<ColumnBatch>,
        name: &str,
        columns: Option<&[ColumnDescription]>,
        options: TableOptions,
    ) -> Result<TableInfo> {
        self.import_batch(&batch.into(), name, columns, options, "arrow")
    }

    pub fn import_csv_file(
        &self,
        path: impl AsRef<Path>,
        name: &str,
        columns: Option<&[ColumnDescription]>,
        options: TableOptions,
        csv: &CsvParseOptions,
    ) -> Result<TableInfo> {
        let batch = parse_csv_file(path, csv, columns)?;
        self.import_batch(&batch, name, columns, options, "csv")
    }

    pub fn import_csv_data(
        &self,
        data: &[u8],
        name: &str,
        columns: Option<&[ColumnDescription]>,
        options: TableOptions,
        csv: &CsvParseOptions,
    ) -> Result<TableInfo> {
        let batch = parse_csv_data(data, csv, columns)?;
        self.import_batch(&batch, name, columns, options, "csv")
    }

    pub fn import_json_data(
        &self,
        data: &[u8],
        name: &str,
        columns: Option<&[ColumnDescription]>,
        options: TableOptions,
        json: &JsonParseOptions,
    ) -> Result<TableInfo> {
        let batch = parse_json_data(data, json, columns)?;
        self.import_batch(&batch, name, columns, options, "json")
    }

    /// Create a table from a Parquet file; column definitions always come from the file.
    pub fn import_parquet_file(
        &self,
        path: impl AsRef<Path>,
        name: &str,
        options: TableOptions,
    ) -> Result<TableInfo> {
        let batch = parse_parquet_file(path)?;
        self.import_batch(&batch, name, None, options, "parquet")
    }

    // ---------------------------------------------------------------------
    // Append
    // ---------------------------------------------------------------------

    pub fn append_arrow_table(
        &self,
        batch: impl Into<ColumnBatch>,
        table: impl Into<TableRef>,
    ) -> Result<()> {
        let entry = self.directory.resolve(&table.into())?;
        self.append_to(&entry, &batch.into(), "arrow")
    }

    /// Append a CSV file. Cells are decoded into the table's column types.
    pub fn append_csv_file(
        &self,
        path: impl AsRef<Path>,
        table: impl Into<TableRef>,
        csv: &CsvParseOptions,
    ) -> Result<()> {
        let entry = self.directory.resolve(&table.into())?;
        let batch = parse_csv_file(path, csv, Some(&descriptions(&entry.info)))?;
        self.append_to(&entry, &batch, "csv")
    }

    pub fn append_csv_data(
        &self,
        data: &[u8],
        table: impl Into<TableRef>,
        csv: &CsvParseOptions,
    ) -> Result<()> {
        let entry = self.directory.resolve(&table.into())?;
        let batch = parse_csv_data(data, csv, Some(&descriptions(&entry.info)))?;
        self.append_to(&entry, &batch, "csv")
    }

    pub fn append_json_data(
        &self,
        data: &[u8],
        table: impl Into<TableRef>,
        json: &JsonParseOptions,
    ) -> Result<()> {
        let entry = self.directory.resolve(&table.into())?;
        let batch = parse_json_data(data, json, Some(&descriptions(&entry.info)))?;
        self.append_to(&entry, &batch, "json")
    }

    pub fn append_parquet_file(
        &self,
        path: impl AsRef<Path>,
        table: impl Into<TableRef>,
    ) -> Result<()> {
        let entry = self.directory.resolve(&table.into())?;
        let batch = parse_parquet_file(path)?;
        self.append_to(&entry, &batch, "parquet")
    }

    // ---------------------------------------------------------------------
    // Drop
    // ---------------------------------------------------------------------

    /// Remove a table and release its dictionaries.
    ///
    /// A missing table is an error only when `throw_if_not_exist` is set. Outstanding
    /// zero-copy tokens stay valid.
    pub fn drop_table(&self, table: impl Into<TableRef>, throw_if_not_exist: bool) -> Result<()> {
        let table = table.into();
        let Some(entry) = self.directory.remove(&table)? else {
            if throw_if_not_exist {
                return Err(Error::table_not_found(&table));
            }
            tracing::warn!(table = %table, "drop of missing table ignored");
            return Ok(());
        };
        self.discard(&entry)?;
        tracing::info!(
            table = %entry.info.name,
            table_id = entry.info.table_id,
            "dropped table"
        );
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Catalog lookups
    // ---------------------------------------------------------------------

    pub fn table_info(&self, table_id: TableId) -> Result<TableInfo> {
        Ok(self.directory.resolve(&TableRef::Id(table_id))?.info.clone())
    }

    pub fn table_info_by_name(&self, name: &str) -> Result<TableInfo> {
        Ok(self.directory.resolve(&TableRef::from(name))?.info.clone())
    }

    pub fn column_info(&self, table_id: TableId, column_id: ColumnId) -> Result<ColumnInfo> {
        let info = self.table_info(table_id)?;
        info.column(column_id).cloned().ok_or_else(|| {
            Error::InvalidArgument(format!("table #{table_id} has no column id {column_id}"))
        })
    }

    pub fn column_info_by_name(&self, table_id: TableId, name: &str) -> Result<ColumnInfo> {
        let info = self.table_info(table_id)?;
        info.column_by_name(name).cloned().ok_or_else(|| {
            Error::InvalidArgument(format!("table #{table_id} has no column '{name}'"))
        })
    }

    /// Every table in the store, ordered by id.
    pub fn list_tables(&self) -> Result<Vec<TableInfo>> {
        self.directory.list()
    }

    pub fn table_row_count(&self, table: impl Into<TableRef>) -> Result<usize> {
        let entry = self.directory.resolve(&table.into())?;
        let rows = entry.read()?.row_count;
        Ok(rows)
    }

    // ---------------------------------------------------------------------
    // Fetch
    // ---------------------------------------------------------------------

    /// Fragment list and per-chunk metadata of a table.
    ///
    /// An empty table yields zero fragments; an unknown table is
    /// [`Error::TableNotFound`].
    pub fn get_table_metadata(
        &self,
        db_id: DatabaseId,
        table_id: TableId,
    ) -> Result<TableFragmentsInfo> {
        let entry = self.entry_in(db_id, table_id)?;
        let data = entry.read()?;
        Ok(TableFragmentsInfo {
            db_id,
            table_id,
            row_count: data.row_count,
            fragments: data.fragments.clone(),
        })
    }

    /// Byte size of the buffer `key` addresses.
    pub fn chunk_size(&self, key: &ChunkKey) -> Result<usize> {
        let (layout, sub, pieces) = self.locate(key)?;
        sub_buffer_size(&pieces, layout, sub)
    }

    /// Copy the buffer `key` addresses into `dest` and return the bytes written.
    ///
    /// `num_bytes`, when non-zero, is the capacity the caller is prepared to receive;
    /// otherwise the capacity is `dest.len()`. A capacity below the buffer size fails with
    /// [`Error::BufferTooSmall`] before anything is written.
    pub fn fetch_buffer(&self, key: &ChunkKey, dest: &mut [u8], num_bytes: usize) -> Result<usize> {
        if num_bytes > dest.len() {
            return Err(Error::InvalidArgument(format!(
                "byte hint {num_bytes} exceeds the {} byte destination",
                dest.len()
            )));
        }
        let (layout, sub, pieces) = self.locate(key)?;
        let required = sub_buffer_size(&pieces, layout, sub)?;
        let available = if num_bytes == 0 { dest.len() } else { num_bytes };
        if available < required {
            return Err(Error::BufferTooSmall {
                required,
                available,
            });
        }
        copy_sub_buffer(&pieces, layout, sub, &mut dest[..required])
    }

    /// Fetch the buffer `key` addresses into a new vector.
    pub fn fetch_to_vec(&self, key: &ChunkKey) -> Result<Vec<u8>> {
        let (layout, sub, pieces) = self.locate(key)?;
        let mut out = vec![0u8; sub_buffer_size(&pieces, layout, sub)?];
        copy_sub_buffer(&pieces, layout, sub, &mut out)?;
        Ok(out)
    }

    /// Expose the data buffer `key` addresses without copying.
    ///
    /// Returns `Ok(None)` for offset buffers and for fragments whose rows span more than
    /// one stored chunk; callers then fall back to [`fetch_buffer`](Self::fetch_buffer).
    pub fn get_zero_copy_buffer_memory(
        &self,
        key: &ChunkKey,
        num_bytes: usize,
    ) -> Result<Option<ZeroCopyToken>> {
        let (layout, sub, pieces) = self.locate(key)?;
        zero_copy(&pieces, layout, sub, num_bytes)
    }

    pub fn get_dict_metadata(&self, dict_id: DictId, load: bool) -> Result<Option<DictDescriptor>> {
        self.dictionaries.get_dict_metadata(dict_id, load)
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn create_entry(
        &self,
        name: &str,
        columns: &[ColumnDescription],
        options: TableOptions,
    ) -> Result<Arc<TableEntry>> {
        if name.is_empty() {
            return Err(Error::InvalidSchema("table name must not be empty".into()));
        }
        if options.fragment_size == 0 {
            return Err(Error::InvalidArgument(
                "fragment_size must be greater than zero".into(),
            ));
        }
        validate_columns(columns)?;

        let bindings = self.bind_dictionaries(columns)?;
        let registered = self.directory.register(name, |table_id| {
            self.build_entry(table_id, name, columns, &bindings, options)
        });
        registered.inspect_err(|_| {
            self.release_dictionaries(bindings.iter().flatten().map(|(id, _)| *id));
        })
    }

    fn build_entry(
        &self,
        table_id: TableId,
        name: &str,
        columns: &[ColumnDescription],
        bindings: &[DictBinding],
        options: TableOptions,
    ) -> TableEntry {
        let mut infos = Vec::with_capacity(columns.len());
        let mut stored = Vec::with_capacity(columns.len());
        for ((desc, binding), column_id) in columns.iter().zip(bindings).zip(1..) {
            infos.push(ColumnInfo {
                column_id,
                name: desc.name.clone(),
                column_type: desc.column_type.clone(),
                encoding: desc.encoding,
                dict_id: binding.as_ref().map(|(id, _)| *id),
            });
            stored.push(StoredColumn::new(
                desc.clone(),
                binding.as_ref().map(|(_, dict)| Arc::clone(dict)),
            ));
        }
        TableEntry {
            info: TableInfo {
                db_id: self.db_id,
                table_id,
                name: name.to_string(),
                fragment_size: options.fragment_size,
                columns: infos,
            },
            data: RwLock::new(TableData::new(options.fragment_size, stored)),
        }
    }

    /// Create or retain the dictionary of every dictionary-encoded column.
    fn bind_dictionaries(&self, columns: &[ColumnDescription]) -> Result<Vec<DictBinding>> {
        let mut bindings: Vec<DictBinding> = Vec::with_capacity(columns.len());
        for column in columns {
            let binding = match column.encoding {
                ColumnEncoding::None => Ok(None),
                ColumnEncoding::Dictionary => self.dictionaries.create_dictionary().and_then(|id| {
                    Ok(Some((id, self.dictionaries.dictionary(id)?)))
                }),
                ColumnEncoding::SharedDictionary(id) => match self.dictionaries.retain(id) {
                    Ok(()) => self
                        .dictionaries
                        .dictionary(id)
                        .map(|dict| Some((id, dict))),
                    Err(Error::DictionaryNotFound(_)) => Err(Error::InvalidSchema(format!(
                        "column '{}' shares unknown dictionary {id}",
                        column.name
                    ))),
                    Err(err) => Err(err),
                },
            };
            match binding {
                Ok(binding) => bindings.push(binding),
                Err(err) => {
                    self.release_dictionaries(bindings.iter().flatten().map(|(id, _)| *id));
                    return Err(err);
                }
            }
        }
        Ok(bindings)
    }

    fn release_dictionaries(&self, dict_ids: impl IntoIterator<Item = DictId>) {
        for dict_id in dict_ids {
            if let Err(err) = self.dictionaries.release(dict_id) {
                tracing::warn!(dict_id, error = %err, "failed to release dictionary");
            }
        }
    }

    fn import_batch(
        &self,
        batch: &ColumnBatch,
        name: &str,
        columns: Option<&[ColumnDescription]>,
        options: TableOptions,
        source: &'static str,
    ) -> Result<TableInfo> {
        let columns = match columns {
            Some(columns) => columns.to_vec(),
            None => infer_columns(&batch.schema())?,
        };
        validate_columns(&columns)?;
        compare_schemas(&columns, &batch.schema())?;

        let entry = self.create_entry(name, &columns, options)?;
        let appended = entry.write().and_then(|mut data| data.append(batch));
        let fragments = match appended {
            Ok(fragments) => fragments,
            Err(err) => {
                self.abandon(&entry);
                return Err(err);
            }
        };
        tracing::info!(
            table = name,
            table_id = entry.info.table_id,
            rows = batch.num_rows(),
            fragments,
            source,
            "imported table"
        );
        Ok(entry.info.clone())
    }

    fn append_to(&self, entry: &TableEntry, batch: &ColumnBatch, source: &'static str) -> Result<()> {
        let fragments = entry.write()?.append(batch)?;
        tracing::debug!(
            table_id = entry.info.table_id,
            rows = batch.num_rows(),
            fragments,
            source,
            "appended rows"
        );
        Ok(())
    }

    /// Unregister and discard a table whose first append failed. Cleanup errors are
    /// logged so the caller sees the append error.
    fn abandon(&self, entry: &TableEntry) {
        let table_id = entry.info.table_id;
        if let Err(err) = self.directory.remove(&TableRef::Id(table_id)) {
            tracing::warn!(table_id, error = %err, "failed to unregister abandoned table");
        }
        if let Err(err) = self.discard(entry) {
            tracing::warn!(table_id, error = %err, "failed to discard abandoned table");
        }
    }

    /// Free an unregistered table's storage and dictionary bindings.
    fn discard(&self, entry: &TableEntry) -> Result<()> {
        entry.write()?.mark_dropped();
        self.release_dictionaries(entry.info.columns.iter().filter_map(|c| c.dict_id));
        Ok(())
    }

    fn entry_in(&self, db_id: DatabaseId, table_id: TableId) -> Result<Arc<TableEntry>> {
        if db_id != self.db_id {
            return Err(Error::table_not_found(format!(
                "#{table_id} in database {db_id}"
            )));
        }
        self.directory.resolve(&TableRef::Id(table_id))
    }

    /// Resolve a chunk address to its layout, sub-buffer and stored pieces.
    ///
    /// The pieces share ownership of immutable chunks, so the table lock is released
    /// before any bytes are copied.
    fn locate(&self, key: &ChunkKey) -> Result<(ChunkLayout, SubBuffer, Vec<ArrayRef>)> {
        let entry = self.entry_in(key.db_id, key.table_id)?;
        let data = entry.read()?;
        let (layout, pieces) = data.fragment_pieces(key.column_id, key.fragment_id)?;
        let sub = resolve_sub_buffer(layout, key.sub_buffer)?;
        Ok((layout, sub, pieces))
    }
}

fn descriptions(info: &TableInfo) -> Vec<ColumnDescription> {
    info.columns.iter().map(ColumnInfo::description).collect()
}
