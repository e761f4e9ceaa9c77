// Licensed under the Apache-2.0 license

//! Ingestion pipeline: SVD device tree → store rows.
//!
//! Peripherals are processed in document order. A peripheral with a
//! `derivedFrom` attribute is linked to its target through the name → id map
//! built up as peripherals are inserted, so the target must appear earlier in
//! the document. Derived peripherals own no registers.
//!
//! Nothing is rolled back on failure: rows committed before the error stay in
//! the store, and the caller is expected to discard a store whose conversion
//! failed.

use crate::bits;
use crate::error::{Result, SvdDbError};
use crate::model::{FieldRow, Id, MpuRow, PeripheralRow, RegisterRow};
use crate::store::Store;
use crate::util::parse_number;
use log::{debug, info, warn};
use registers_svd as svd;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Register width assumed when `<size>` is absent.
const DEFAULT_REGISTER_SIZE: u64 = 32;

/// Row counts from one conversion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub mpu_id: Id,
    pub peripherals: usize,
    pub derived: usize,
    pub registers: usize,
    pub fields: usize,
}

/// Default store path for a source file: the same path with a `.db` extension.
pub fn default_output_path(source: &Path) -> PathBuf {
    source.with_extension("db")
}

/// Parse `source` and write it to a new store at `output`.
///
/// The source is parsed completely before the store file is created, so a
/// malformed document never leaves a file behind.
pub fn convert(source: &Path, output: &Path) -> Result<IngestSummary> {
    let device = svd::parse_file(source)?;
    let mut store = Store::create(output)?;
    ingest(&mut store, &device)
}

/// Insert `device` into `store`.
pub fn ingest(store: &mut Store, device: &svd::Device) -> Result<IngestSummary> {
    Ingestor {
        store,
        peripheral_ids: HashMap::new(),
        summary: IngestSummary::default(),
    }
    .run(device)
}

struct Ingestor<'s> {
    store: &'s mut Store,
    /// Ids of the peripherals inserted so far, for `derivedFrom` lookups.
    peripheral_ids: HashMap<String, Id>,
    summary: IngestSummary,
}

impl Ingestor<'_> {
    fn run(mut self, device: &svd::Device) -> Result<IngestSummary> {
        let mpu_id = self.store.insert(&MpuRow {
            name: device.name.clone(),
            description: non_empty(&device.description),
        })?;
        self.summary.mpu_id = mpu_id;

        for peripheral in &device.peripherals {
            self.insert_peripheral(mpu_id, peripheral)?;
        }

        info!(
            "Converted {}: {} peripherals ({} derived), {} registers, {} fields",
            device.name,
            self.summary.peripherals,
            self.summary.derived,
            self.summary.registers,
            self.summary.fields
        );
        Ok(self.summary)
    }

    fn insert_peripheral(&mut self, mpu_id: Id, p: &svd::Peripheral) -> Result<()> {
        info!("Processing Peripheral: {}", p.name);

        let derived_from_id = match &p.derived_from {
            Some(target) => Some(*self.peripheral_ids.get(target).ok_or_else(|| {
                SvdDbError::UnresolvedDerivation {
                    peripheral: p.name.clone(),
                    target: target.clone(),
                }
            })?),
            None => None,
        };

        let id = self.store.insert(&PeripheralRow {
            mpu_id,
            derived_from_id,
            name: p.name.clone(),
            base_address: p.base_address.clone(),
            description: non_empty(&p.description),
        })?;
        self.peripheral_ids.insert(p.name.clone(), id);
        self.summary.peripherals += 1;

        if derived_from_id.is_some() {
            self.summary.derived += 1;
            if !p.registers.is_empty() {
                debug!(
                    "Ignoring {} registers declared on derived peripheral {}",
                    p.registers.len(),
                    p.name
                );
            }
            return Ok(());
        }

        for register in &p.registers {
            self.insert_register(id, register)?;
        }
        Ok(())
    }

    fn insert_register(&mut self, peripheral_id: Id, r: &svd::Register) -> Result<()> {
        debug!("Processing Register: {}", r.name);
        let id = self.store.insert(&RegisterRow {
            peripheral_id,
            name: r.name.clone(),
            address_offset: r.address_offset.clone(),
            reset_value: non_empty(&r.reset_value),
            description: non_empty(&r.description),
        })?;
        self.summary.registers += 1;

        let width = r
            .size
            .as_deref()
            .and_then(parse_number)
            .unwrap_or(DEFAULT_REGISTER_SIZE);
        for field in &r.fields {
            self.insert_field(id, r, width, field)?;
        }
        Ok(())
    }

    fn insert_field(
        &mut self,
        register_id: Id,
        r: &svd::Register,
        width: u64,
        f: &svd::Field,
    ) -> Result<()> {
        let position = bits::normalize(f).map_err(|source| SvdDbError::MalformedField {
            register: r.name.clone(),
            field: f.name.clone(),
            source,
        })?;
        // TODO: reject instead of warn once vendor files with oversized fields are audited
        if u64::from(position.end()) > width {
            warn!(
                "Field {}.{} (offset {}, {} bits) extends past the {}-bit register",
                r.name, f.name, position.bit_offset, position.num_bits, width
            );
        }

        self.store.insert(&FieldRow {
            register_id,
            name: f.name.clone(),
            num_bits: position.num_bits,
            bit_offset: position.bit_offset,
            description: non_empty(&f.description),
        })?;
        self.summary.fields += 1;
        Ok(())
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.is_empty())
}
