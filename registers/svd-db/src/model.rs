// Licensed under the Apache-2.0 license

//! Row types for the four store tables.
//!
//! Ownership is strictly hierarchical: an MPU owns peripherals, a peripheral
//! owns registers, a register owns fields. Each child row carries its
//! parent's id. `derived_from_id` is the only same-level reference and is a
//! lookup key, never an ownership edge.

use crate::store::Tables;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Generated row id. Ids start at 1 and increase per table.
pub type Id = i64;

/// The four tables of the store schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Mpus,
    Peripherals,
    Registers,
    Fields,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Mpus => "mpus",
            Table::Peripherals => "peripherals",
            Table::Registers => "registers",
            Table::Fields => "fields",
        }
    }
}

/// A row type that lives in one of the store tables.
pub trait Entity: Clone + Serialize + DeserializeOwned {
    const TABLE: Table;

    /// Rows of this entity's table, in id order.
    fn rows(tables: &Tables) -> &[Stored<Self>];

    fn rows_mut(tables: &mut Tables) -> &mut Vec<Stored<Self>>;

    /// Value of the table's UNIQUE column, if the table has one.
    fn unique_key(&self) -> Option<&str> {
        None
    }

    /// Id of the owning row in the parent table.
    fn parent_id(&self) -> Option<Id> {
        None
    }
}

/// A row together with the id the store assigned to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stored<E> {
    pub id: Id,
    pub row: E,
}

/// `mpus(id, name UNIQUE, description)`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MpuRow {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `peripherals(id, mpu_id, derived_from_id, name UNIQUE, base_address, description)`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeripheralRow {
    pub mpu_id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_from_id: Option<Id>,
    pub name: String,
    pub base_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `registers(id, peripheral_id, name, address_offset, reset_value, description)`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRow {
    pub peripheral_id: Id,
    pub name: String,
    pub address_offset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `fields(id, register_id, name, num_bits, bit_offset, description)`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRow {
    pub register_id: Id,
    pub name: String,
    pub num_bits: u32,
    pub bit_offset: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Entity for MpuRow {
    const TABLE: Table = Table::Mpus;

    fn rows(tables: &Tables) -> &[Stored<Self>] {
        &tables.mpus
    }

    fn rows_mut(tables: &mut Tables) -> &mut Vec<Stored<Self>> {
        &mut tables.mpus
    }

    fn unique_key(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl Entity for PeripheralRow {
    const TABLE: Table = Table::Peripherals;

    fn rows(tables: &Tables) -> &[Stored<Self>] {
        &tables.peripherals
    }

    fn rows_mut(tables: &mut Tables) -> &mut Vec<Stored<Self>> {
        &mut tables.peripherals
    }

    fn unique_key(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn parent_id(&self) -> Option<Id> {
        Some(self.mpu_id)
    }
}

impl Entity for RegisterRow {
    const TABLE: Table = Table::Registers;

    fn rows(tables: &Tables) -> &[Stored<Self>] {
        &tables.registers
    }

    fn rows_mut(tables: &mut Tables) -> &mut Vec<Stored<Self>> {
        &mut tables.registers
    }

    fn parent_id(&self) -> Option<Id> {
        Some(self.peripheral_id)
    }
}

impl Entity for FieldRow {
    const TABLE: Table = Table::Fields;

    fn rows(tables: &Tables) -> &[Stored<Self>] {
        &tables.fields
    }

    fn rows_mut(tables: &mut Tables) -> &mut Vec<Stored<Self>> {
        &mut tables.fields
    }

    fn parent_id(&self) -> Option<Id> {
        Some(self.register_id)
    }
}
