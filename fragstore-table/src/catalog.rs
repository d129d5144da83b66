//! Table directory: id allocation, name registration and lookup.
//!
//! The directory lock only covers the id/name maps. Table contents live behind each
//! entry's own lock, so operations on different tables never contend here for longer
//! than a map lookup.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use fragstore_result::{Error, Result};
use fragstore_types::{
    ColumnDescription, ColumnEncoding, ColumnId, ColumnType, DatabaseId, DictId, TableId, TableRef,
};
use rustc_hash::FxHashMap;

use crate::table::TableData;

/// Catalog view of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub column_id: ColumnId,
    pub name: String,
    pub column_type: ColumnType,
    pub encoding: ColumnEncoding,
    /// Dictionary backing a dictionary-encoded column.
    pub dict_id: Option<DictId>,
}

impl ColumnInfo {
    pub fn description(&self) -> ColumnDescription {
        ColumnDescription {
            name: self.name.clone(),
            column_type: self.column_type.clone(),
            encoding: self.encoding,
        }
    }
}

/// Catalog view of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableInfo {
    pub db_id: DatabaseId,
    pub table_id: TableId,
    pub name: String,
    pub fragment_size: usize,
    pub columns: Vec<ColumnInfo>,
}

impl TableInfo {
    pub fn column(&self, column_id: ColumnId) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.column_id == column_id)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// A registered table: immutable catalog info plus lock-guarded contents.
pub(crate) struct TableEntry {
    pub(crate) info: TableInfo,
    pub(crate) data: RwLock<TableData>,
}

impl TableEntry {
    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, TableData>> {
        let data = self.data.read().map_err(|_| Error::poisoned("table"))?;
        data.ensure_live(&self.info.name)?;
        Ok(data)
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, TableData>> {
        let data = self.data.write().map_err(|_| Error::poisoned("table"))?;
        data.ensure_live(&self.info.name)?;
        Ok(data)
    }
}

struct DirectoryInner {
    by_name: FxHashMap<String, TableId>,
    tables: FxHashMap<TableId, Arc<TableEntry>>,
    /// Next id to hand out. Starts at 1 and never goes back, so dropped ids are not reused.
    next_table_id: TableId,
}

pub(crate) struct TableDirectory {
    inner: RwLock<DirectoryInner>,
}

impl TableDirectory {
    pub(crate) fn new() -> Self {
        Self {
            inner: RwLock::new(DirectoryInner {
                by_name: FxHashMap::default(),
                tables: FxHashMap::default(),
                next_table_id: 1,
            }),
        }
    }

    /// Allocate an id for `name` and register the entry `build` produces for it.
    pub(crate) fn register<F>(&self, name: &str, build: F) -> Result<Arc<TableEntry>>
    where
        F: FnOnce(TableId) -> TableEntry,
    {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| Error::poisoned("table directory"))?;
        if inner.by_name.contains_key(name) {
            return Err(Error::TableAlreadyExists(name.to_string()));
        }
        let table_id = inner.next_table_id;
        inner.next_table_id = table_id
            .checked_add(1)
            .ok_or_else(|| Error::Internal("table id space exhausted".into()))?;
        let entry = Arc::new(build(table_id));
        inner.by_name.insert(name.to_string(), table_id);
        inner.tables.insert(table_id, Arc::clone(&entry));
        Ok(entry)
    }

    pub(crate) fn resolve(&self, table: &TableRef) -> Result<Arc<TableEntry>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| Error::poisoned("table directory"))?;
        let table_id = match table {
            TableRef::Id(id) => *id,
            TableRef::Name(name) => *inner
                .by_name
                .get(name)
                .ok_or_else(|| Error::table_not_found(table))?,
        };
        inner
            .tables
            .get(&table_id)
            .cloned()
            .ok_or_else(|| Error::table_not_found(table))
    }

    /// Unregister a table. The entry stays alive for holders of its `Arc`.
    pub(crate) fn remove(&self, table: &TableRef) -> Result<Option<Arc<TableEntry>>> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| Error::poisoned("table directory"))?;
        let table_id = match table {
            TableRef::Id(id) => Some(*id),
            TableRef::Name(name) => inner.by_name.get(name).copied(),
        };
        let Some(entry) = table_id.and_then(|id| inner.tables.remove(&id)) else {
            return Ok(None);
        };
        inner.by_name.remove(&entry.info.name);
        Ok(Some(entry))
    }

    /// Catalog info of every table, ordered by id.
    pub(crate) fn list(&self) -> Result<Vec<TableInfo>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| Error::poisoned("table directory"))?;
        let mut tables: Vec<TableInfo> =
            inner.tables.values().map(|entry| entry.info.clone()).collect();
        tables.sort_by_key(|info| info.table_id);
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(table_id: TableId, name: &str) -> TableEntry {
        TableEntry {
            info: TableInfo {
                db_id: 1,
                table_id,
                name: name.to_string(),
                fragment_size: 10,
                columns: Vec::new(),
            },
            data: RwLock::new(TableData::new(10, Vec::new())),
        }
    }

    #[test]
    fn ids_are_not_reused_after_remove() {
        let dir = TableDirectory::new();
        let a = dir.register("a", |id| entry(id, "a")).unwrap();
        assert_eq!(a.info.table_id, 1);
        dir.remove(&TableRef::from("a")).unwrap().unwrap();
        let again = dir.register("a", |id| entry(id, "a")).unwrap();
        assert_eq!(again.info.table_id, 2);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let dir = TableDirectory::new();
        dir.register("t", |id| entry(id, "t")).unwrap();
        assert!(matches!(
            dir.register("t", |id| entry(id, "t")),
            Err(Error::TableAlreadyExists(_))
        ));
    }

    #[test]
    fn resolve_by_name_and_id() {
        let dir = TableDirectory::new();
        dir.register("x", |id| entry(id, "x")).unwrap();
        dir.register("y", |id| entry(id, "y")).unwrap();
        assert_eq!(dir.resolve(&TableRef::from("y")).unwrap().info.table_id, 2);
        assert_eq!(dir.resolve(&TableRef::Id(1)).unwrap().info.name, "x");
        assert!(matches!(
            dir.resolve(&TableRef::Id(9)),
            Err(Error::TableNotFound(_))
        ));
        let names: Vec<_> = dir.list().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["x", "y"]);
    }
}
