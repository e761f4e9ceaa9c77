// Licensed under the Apache-2.0 license

//! Relational store adapter.
//!
//! The store holds the four tables of the schema (`mpus`, `peripherals`,
//! `registers`, `fields`) and offers two primitives over them: insert a row
//! and get back its generated id, and select the rows matching a predicate.
//!
//! ## On-disk format
//!
//! ```text
//! {"format":"svd-db","version":1}                               <- header
//! {"table":"mpus","id":1,"row":{"name":"STM32F401"}}
//! {"table":"peripherals","id":1,"row":{"mpu_id":1,"name":"GPIOA",...}}
//! ...
//! ```
//!
//! Every insert is its own commit: the row is checked against the table's
//! UNIQUE column, appended as one journal line and flushed before it becomes
//! visible to queries. A failed conversion therefore leaves every row written
//! before the failure in place.

use crate::error::{Result, SvdDbError};
use crate::model::{Entity, FieldRow, Id, MpuRow, PeripheralRow, RegisterRow, Stored, Table};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// File name searched for when no explicit store path is given.
pub const DEFAULT_STORE_NAME: &str = "default-svd.db";

const FORMAT: &str = "svd-db";
const VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Header {
    format: String,
    version: u32,
}

#[derive(Serialize)]
struct JournalEntry<'a, E> {
    table: Table,
    id: Id,
    row: &'a E,
}

#[derive(Deserialize)]
struct RawEntry {
    table: Table,
    id: Id,
    row: serde_json::Value,
}

/// In-memory image of the four tables, each kept in id order.
#[derive(Clone, Debug, Default)]
pub struct Tables {
    pub(crate) mpus: Vec<Stored<MpuRow>>,
    pub(crate) peripherals: Vec<Stored<PeripheralRow>>,
    pub(crate) registers: Vec<Stored<RegisterRow>>,
    pub(crate) fields: Vec<Stored<FieldRow>>,
    /// Row positions keyed by table and parent id, in id order.
    children: HashMap<(Table, Id), Vec<usize>>,
}

#[derive(Debug)]
enum Backing {
    Memory,
    Journal(BufWriter<File>),
    ReadOnly,
}

#[derive(Debug)]
pub struct Store {
    tables: Tables,
    backing: Backing,
    path: Option<PathBuf>,
}

impl Store {
    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            tables: Tables::default(),
            backing: Backing::Memory,
            path: None,
        }
    }

    /// Create a new, empty store file. An existing file is never overwritten.
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => SvdDbError::StoreExists(path.to_path_buf()),
                _ => SvdDbError::Io(e),
            })?;
        let mut journal = BufWriter::new(file);
        let header = Header {
            format: FORMAT.to_string(),
            version: VERSION,
        };
        serde_json::to_writer(&mut journal, &header).map_err(|e| store_failure(path, e))?;
        journal.write_all(b"\n")?;
        journal.flush()?;
        debug!("Created store {}", path.display());

        Ok(Self {
            tables: Tables::default(),
            backing: Backing::Journal(journal),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an existing store file for reading.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| SvdDbError::StoreNotFound {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let mut lines = BufReader::new(file).lines();

        let header = lines
            .next()
            .transpose()?
            .and_then(|line| serde_json::from_str::<Header>(&line).ok());
        match header {
            Some(h) if h.format == FORMAT && h.version == VERSION => {}
            _ => {
                return Err(store_failure(
                    path,
                    "not an svd database (missing or unknown header)",
                ))
            }
        }

        let mut tables = Tables::default();
        for (index, line) in lines.enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: RawEntry = serde_json::from_str(&line)
                .map_err(|e| store_failure(path, format!("line {}: {e}", index + 2)))?;
            tables.replay(entry)?;
        }
        debug!(
            "Opened store {} ({} peripherals, {} registers, {} fields)",
            path.display(),
            tables.peripherals.len(),
            tables.registers.len(),
            tables.fields.len()
        );

        Ok(Self {
            tables,
            backing: Backing::ReadOnly,
            path: Some(path.to_path_buf()),
        })
    }

    /// Path of the backing file, if there is one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Insert a row and return its generated id.
    pub fn insert<E: Entity>(&mut self, row: &E) -> Result<Id> {
        let table = E::TABLE.name();
        let rows = E::rows(&self.tables);

        if let Some(key) = row.unique_key() {
            if rows.iter().any(|s| s.row.unique_key() == Some(key)) {
                return Err(SvdDbError::QueryFailure {
                    entity: table,
                    key: key.to_string(),
                    reason: format!("UNIQUE constraint failed: {table}.name"),
                });
            }
        }
        let id = rows.last().map_or(1, |s| s.id + 1);

        match &mut self.backing {
            Backing::Memory => {}
            Backing::ReadOnly => {
                return Err(SvdDbError::QueryFailure {
                    entity: table,
                    key: format!("id {id}"),
                    reason: "store was opened read-only".to_string(),
                })
            }
            Backing::Journal(journal) => {
                let line = serde_json::to_string(&JournalEntry {
                    table: E::TABLE,
                    id,
                    row,
                })
                .map_err(|e| SvdDbError::QueryFailure {
                    entity: table,
                    key: format!("id {id}"),
                    reason: e.to_string(),
                })?;
                writeln!(journal, "{line}")?;
                journal.flush()?;
            }
        }

        self.tables.push(Stored {
            id,
            row: row.clone(),
        });
        Ok(id)
    }

    /// All rows of `E`'s table matching `predicate`, in id order.
    pub fn select<E: Entity>(&self, predicate: impl Fn(&E) -> bool) -> Vec<Stored<E>> {
        E::rows(&self.tables)
            .iter()
            .filter(|s| predicate(&s.row))
            .cloned()
            .collect()
    }

    /// Rows of `E`'s table whose parent is `parent_id`, in id order.
    ///
    /// Served from an index kept up to date on insert, so the cost depends
    /// on the number of children rather than the size of the table.
    pub fn children<E: Entity>(&self, parent_id: Id) -> Vec<Stored<E>> {
        let rows = E::rows(&self.tables);
        self.tables
            .children
            .get(&(E::TABLE, parent_id))
            .map(|positions| {
                positions
                    .iter()
                    .filter_map(|&i| rows.get(i).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of rows in `E`'s table.
    pub fn count<E: Entity>(&self) -> usize {
        E::rows(&self.tables).len()
    }

    /// The row of `E`'s table with the given id.
    pub fn get<E: Entity>(&self, id: Id) -> Result<Stored<E>> {
        let rows = E::rows(&self.tables);
        rows.binary_search_by_key(&id, |s| s.id)
            .map(|index| rows[index].clone())
            .map_err(|_| SvdDbError::QueryFailure {
                entity: E::TABLE.name(),
                key: format!("id {id}"),
                reason: "no such row".to_string(),
            })
    }
}

impl Tables {
    fn push<E: Entity>(&mut self, stored: Stored<E>) {
        if let Some(parent_id) = stored.row.parent_id() {
            let position = E::rows(self).len();
            self.children
                .entry((E::TABLE, parent_id))
                .or_default()
                .push(position);
        }
        E::rows_mut(self).push(stored);
    }

    fn replay(&mut self, entry: RawEntry) -> Result<()> {
        match entry.table {
            Table::Mpus => replay_into::<MpuRow>(self, entry),
            Table::Peripherals => replay_into::<PeripheralRow>(self, entry),
            Table::Registers => replay_into::<RegisterRow>(self, entry),
            Table::Fields => replay_into::<FieldRow>(self, entry),
        }
    }
}

fn replay_into<E: Entity>(tables: &mut Tables, entry: RawEntry) -> Result<()> {
    let failure = |reason: String| SvdDbError::QueryFailure {
        entity: E::TABLE.name(),
        key: format!("id {}", entry.id),
        reason,
    };
    let row: E = serde_json::from_value(entry.row).map_err(|e| failure(e.to_string()))?;
    if E::rows(tables)
        .last()
        .is_some_and(|last| last.id >= entry.id)
    {
        return Err(failure("journal ids out of order".to_string()));
    }
    tables.push(Stored { id: entry.id, row });
    Ok(())
}

fn store_failure(path: &Path, reason: impl ToString) -> SvdDbError {
    SvdDbError::QueryFailure {
        entity: "store",
        key: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Look for `name` in `start` and then in each of its ancestors.
pub fn find_upwards(start: &Path, name: &str) -> Result<PathBuf> {
    let start = start
        .canonicalize()
        .map_err(|e| SvdDbError::StoreNotFound {
            path: start.join(name),
            detail: e.to_string(),
        })?;
    for dir in start.ancestors() {
        let candidate = dir.join(name);
        if candidate.is_file() {
            debug!("Found store {}", candidate.display());
            return Ok(candidate);
        }
    }
    Err(SvdDbError::StoreNotFound {
        path: PathBuf::from(name),
        detail: format!("searched upwards from {}", start.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mpu(name: &str) -> MpuRow {
        MpuRow {
            name: name.to_string(),
            description: None,
        }
    }

    fn peripheral(name: &str) -> PeripheralRow {
        PeripheralRow {
            mpu_id: 1,
            derived_from_id: None,
            name: name.to_string(),
            base_address: "0x40000000".to_string(),
            description: None,
        }
    }

    #[test]
    fn test_insert_generates_sequential_ids_per_table() {
        let mut store = Store::in_memory();
        assert_eq!(store.insert(&mpu("mpu1")).unwrap(), 1);
        assert_eq!(store.insert(&peripheral("GPIOA")).unwrap(), 1);
        assert_eq!(store.insert(&peripheral("GPIOB")).unwrap(), 2);
        assert_eq!(store.get::<PeripheralRow>(2).unwrap().row.name, "GPIOB");
    }

    #[test]
    fn test_unique_name_rejected() {
        let mut store = Store::in_memory();
        store.insert(&peripheral("GPIOA")).unwrap();
        let err = store.insert(&peripheral("GPIOA")).unwrap_err();
        assert!(matches!(
            err,
            SvdDbError::QueryFailure { entity: "peripherals", .. }
        ));
        assert_eq!(store.select::<PeripheralRow>(|_| true).len(), 1);
    }

    #[test]
    fn test_select_and_get_miss() {
        let mut store = Store::in_memory();
        store.insert(&peripheral("GPIOA")).unwrap();
        store.insert(&peripheral("SPI1")).unwrap();
        let spi = store.select::<PeripheralRow>(|p| p.name.starts_with("SPI"));
        assert_eq!(spi.len(), 1);
        assert_eq!(spi[0].id, 2);

        let err = store.get::<RegisterRow>(7).unwrap_err();
        assert_eq!(
            err.to_string(),
            "registers query failed for id 7: no such row"
        );
    }

    fn register(peripheral_id: Id, name: &str) -> RegisterRow {
        RegisterRow {
            peripheral_id,
            name: name.to_string(),
            address_offset: "0x0".to_string(),
            reset_value: None,
            description: None,
        }
    }

    fn names(rows: Vec<Stored<RegisterRow>>) -> Vec<String> {
        rows.into_iter().map(|r| r.row.name).collect()
    }

    #[test]
    fn test_children_by_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        {
            let mut store = Store::create(&path).unwrap();
            store.insert(&register(1, "CR1")).unwrap();
            store.insert(&register(2, "SR")).unwrap();
            store.insert(&register(1, "CR2")).unwrap();
            assert_eq!(names(store.children(1)), ["CR1", "CR2"]);
            assert!(store.children::<FieldRow>(1).is_empty());
        }

        let store = Store::open(&path).unwrap();
        assert_eq!(names(store.children(1)), ["CR1", "CR2"]);
        assert_eq!(names(store.children(2)), ["SR"]);
        assert!(store.children::<RegisterRow>(3).is_empty());
        assert_eq!(store.children::<RegisterRow>(1)[1].id, 3);
    }

    #[test]
    fn test_journal_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        {
            let mut store = Store::create(&path).unwrap();
            store.insert(&mpu("mpu1")).unwrap();
            store.insert(&peripheral("GPIOA")).unwrap();
            store
                .insert(&RegisterRow {
                    peripheral_id: 1,
                    name: "MODER".to_string(),
                    address_offset: "0x0".to_string(),
                    reset_value: Some("0xA8000000".to_string()),
                    description: None,
                })
                .unwrap();
        }

        let store = Store::open(&path).unwrap();
        assert_eq!(store.path(), Some(path.as_path()));
        assert_eq!(store.get::<MpuRow>(1).unwrap().row, mpu("mpu1"));
        let reg = store.get::<RegisterRow>(1).unwrap().row;
        assert_eq!(reg.reset_value.as_deref(), Some("0xA8000000"));
        assert_eq!(reg.description, None);
    }

    #[test]
    fn test_opened_store_is_read_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        drop(Store::create(&path).unwrap());
        let mut store = Store::open(&path).unwrap();
        assert!(matches!(
            store.insert(&mpu("mpu1")),
            Err(SvdDbError::QueryFailure { .. })
        ));
    }

    #[test]
    fn test_create_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(
            Store::create(&path),
            Err(SvdDbError::StoreExists(p)) if p == path
        ));
    }

    #[test]
    fn test_open_rejects_foreign_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.db");
        std::fs::write(&path, "hello\n").unwrap();
        let err = Store::open(&path).err().unwrap();
        assert!(err.to_string().contains("not an svd database"));

        assert!(matches!(
            Store::open(&dir.path().join("missing.db")),
            Err(SvdDbError::StoreNotFound { .. })
        ));
    }

    #[test]
    fn test_find_upwards() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(DEFAULT_STORE_NAME), "").unwrap();

        let found = find_upwards(&nested, DEFAULT_STORE_NAME).unwrap();
        assert_eq!(
            found,
            dir.path().canonicalize().unwrap().join(DEFAULT_STORE_NAME)
        );
        assert!(matches!(
            find_upwards(&nested, "no-such-file.db"),
            Err(SvdDbError::StoreNotFound { .. })
        ));
    }
}
