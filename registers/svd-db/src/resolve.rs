// Licensed under the Apache-2.0 license

//! Resolution engine: peripheral name → fully populated register/field tree.
//!
//! Lookups match peripheral names case-insensitively and accept `%` and `_`
//! wildcards. A derived peripheral keeps its own name and base address but
//! takes its registers from the peripheral it is derived from.

use crate::bits::BitPosition;
use crate::error::{Result, SvdDbError};
use crate::model::{FieldRow, Id, MpuRow, PeripheralRow, RegisterRow, Stored};
use crate::store::Store;
use crate::util::like;
use std::fmt;

/// A peripheral together with its effective registers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedPeripheral {
    pub id: Id,
    pub name: String,
    pub base_address: String,
    pub description: Option<String>,
    /// Name of the peripheral the registers were read from, if not this one.
    pub derived_from: Option<String>,
    /// Registers in ascending name order.
    pub registers: Vec<ResolvedRegister>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedRegister {
    pub id: Id,
    pub name: String,
    pub address_offset: String,
    pub reset_value: Option<String>,
    pub description: Option<String>,
    /// Fields in ascending bit offset order.
    pub fields: Vec<ResolvedField>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedField {
    pub name: String,
    pub num_bits: u32,
    pub bit_offset: u32,
    pub description: Option<String>,
}

impl ResolvedField {
    pub fn position(&self) -> BitPosition {
        BitPosition::new(self.bit_offset, self.num_bits)
    }
}

impl From<FieldRow> for ResolvedField {
    fn from(row: FieldRow) -> Self {
        Self {
            name: row.name,
            num_bits: row.num_bits,
            bit_offset: row.bit_offset,
            description: row.description,
        }
    }
}

/// Name of the store's MPU.
pub fn mpu_name(store: &Store) -> Result<String> {
    store
        .select::<MpuRow>(|_| true)
        .into_iter()
        .next()
        .map(|mpu| mpu.row.name)
        .ok_or_else(|| SvdDbError::EntityNotFound {
            entity: "mpu",
            key: "% (check this is a svd database)".to_string(),
        })
}

/// All peripherals in ascending name order.
pub fn fetch_peripherals(store: &Store) -> Vec<Stored<PeripheralRow>> {
    fetch_peripherals_like(store, "%")
}

/// Peripherals whose name matches `pattern`, in ascending name order.
pub fn fetch_peripherals_like(store: &Store, pattern: &str) -> Vec<Stored<PeripheralRow>> {
    let mut peripherals = store.select::<PeripheralRow>(|p| like(pattern, &p.name));
    peripherals.sort_by(|a, b| a.row.name.cmp(&b.row.name));
    peripherals
}

/// First peripheral (in insertion order) whose name matches `pattern`.
pub fn fetch_peripheral_by_name(store: &Store, pattern: &str) -> Result<Stored<PeripheralRow>> {
    store
        .select::<PeripheralRow>(|p| like(pattern, &p.name))
        .into_iter()
        .next()
        .ok_or_else(|| SvdDbError::EntityNotFound {
            entity: "peripheral",
            key: pattern.to_string(),
        })
}

pub fn fetch_peripheral(store: &Store, id: Id) -> Result<Stored<PeripheralRow>> {
    store.get(id)
}

/// Registers owned by `peripheral_id`, in ascending name order.
pub fn fetch_registers(store: &Store, peripheral_id: Id) -> Vec<Stored<RegisterRow>> {
    let mut registers = store.children::<RegisterRow>(peripheral_id);
    registers.sort_by(|a, b| a.row.name.cmp(&b.row.name));
    registers
}

/// Fields of `register_id`, in ascending bit offset order.
pub fn fetch_fields(store: &Store, register_id: Id) -> Vec<Stored<FieldRow>> {
    let mut fields = store.children::<FieldRow>(register_id);
    fields.sort_by_key(|f| f.row.bit_offset);
    fields
}

/// Follow `derived_from_id` links to the peripheral that owns the registers.
///
/// Ingestion only accepts links to peripherals inserted earlier, so the chain
/// always ends; the step limit guards against a hand-edited store.
fn register_owner(
    store: &Store,
    peripheral: &Stored<PeripheralRow>,
) -> Result<Stored<PeripheralRow>> {
    let limit = store.count::<PeripheralRow>();
    let mut owner = peripheral.clone();
    let mut steps = 0;
    while let Some(target) = owner.row.derived_from_id {
        steps += 1;
        if steps > limit {
            return Err(SvdDbError::QueryFailure {
                entity: "peripheral",
                key: format!("id {}", peripheral.id),
                reason: "derived-from chain does not terminate".to_string(),
            });
        }
        owner = fetch_peripheral(store, target)?;
    }
    Ok(owner)
}

/// Collect all the registers and their fields for the named peripheral.
pub fn resolve(store: &Store, name: &str) -> Result<ResolvedPeripheral> {
    resolve_peripheral(store, fetch_peripheral_by_name(store, name)?)
}

/// Collect all the registers and their fields for an already fetched peripheral.
pub fn resolve_peripheral(
    store: &Store,
    peripheral: Stored<PeripheralRow>,
) -> Result<ResolvedPeripheral> {
    let owner = register_owner(store, &peripheral)?;

    let registers = fetch_registers(store, owner.id)
        .into_iter()
        .map(|Stored { id, row }| ResolvedRegister {
            id,
            name: row.name,
            address_offset: row.address_offset,
            reset_value: row.reset_value,
            description: row.description,
            fields: fetch_fields(store, id)
                .into_iter()
                .map(|f| f.row.into())
                .collect(),
        })
        .collect();

    Ok(ResolvedPeripheral {
        id: peripheral.id,
        derived_from: (owner.id != peripheral.id).then_some(owner.row.name),
        name: peripheral.row.name,
        base_address: peripheral.row.base_address,
        description: peripheral.row.description,
        registers,
    })
}

impl fmt::Display for ResolvedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Field:  {}, number bits {}, bit offset: {}",
            self.name, self.num_bits, self.bit_offset
        )
    }
}

impl fmt::Display for ResolvedRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Register: {}, address offset: {}",
            self.name, self.address_offset
        )?;
        for field in &self.fields {
            write!(f, "    {field}")?;
        }
        Ok(())
    }
}

impl fmt::Display for ResolvedPeripheral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Peripheral: {}, base address: {}",
            self.name, self.base_address
        )?;
        for register in &self.registers {
            write!(f, "  {register}")?;
        }
        Ok(())
    }
}
