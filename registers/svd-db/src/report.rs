// Licensed under the Apache-2.0 license

//! Human-readable reports over a store: peripheral listings, register
//! listings, a detailed per-peripheral display and a whole-store dump.
//!
//! Descriptions are only included when `verbose` is set.

use crate::config::RegisterFilter;
use crate::error::Result;
use crate::resolve::{
    fetch_peripheral, fetch_peripherals, mpu_name, resolve, resolve_peripheral,
};
use crate::store::Store;
use std::fmt::Write;

fn described(description: Option<&str>, verbose: bool) -> String {
    match description {
        Some(description) if verbose => format!(" - {description}"),
        _ => String::new(),
    }
}

/// Names of every peripheral in the store, in ascending order.
pub fn list_peripherals(store: &Store, verbose: bool) -> Result<String> {
    let mut output = String::new();
    writeln!(output, "Available Peripherals for MPU: {}", mpu_name(store)?)?;
    for peripheral in fetch_peripherals(store) {
        writeln!(
            output,
            "{}{}",
            peripheral.row.name,
            described(peripheral.row.description.as_deref(), verbose)
        )?;
    }
    Ok(output)
}

/// Names of the registers of `peripheral`, following derivation.
pub fn list_registers(store: &Store, peripheral: &str, verbose: bool) -> Result<String> {
    let mut output = String::new();
    writeln!(
        output,
        "Registers for Peripheral: {peripheral} for MPU: {}",
        mpu_name(store)?
    )?;
    for register in resolve(store, peripheral)?.registers {
        writeln!(
            output,
            "{}{}",
            register.name,
            described(register.description.as_deref(), verbose)
        )?;
    }
    Ok(output)
}

/// Registers and fields of `peripheral` with offsets, reset values and masks.
pub fn display(
    store: &Store,
    peripheral: &str,
    filter: &RegisterFilter,
    verbose: bool,
) -> Result<String> {
    let mut output = String::new();
    writeln!(
        output,
        "Registers and fields for Peripheral: {peripheral} for MPU: {}",
        mpu_name(store)?
    )?;

    let resolved = resolve(store, peripheral)?;
    writeln!(
        output,
        "{} base address: {}",
        resolved.name, resolved.base_address
    )?;
    if let Some(owner) = &resolved.derived_from {
        writeln!(output, "Has the same registers as {owner}")?;
    }

    for register in filter.apply(&resolved.registers) {
        writeln!(
            output,
            "Register {} offset: {}, reset: {}{}",
            register.name,
            register.address_offset,
            register.reset_value.as_deref().unwrap_or_default(),
            described(register.description.as_deref(), verbose)
        )?;
        for field in &register.fields {
            writeln!(
                output,
                "    {}: number bits {}, bit offset: {}, mask: 0x{:08X}{}",
                field.name,
                field.num_bits,
                field.bit_offset,
                field.position().shifted_mask(),
                described(field.description.as_deref(), verbose)
            )?;
        }
    }
    Ok(output)
}

/// Every peripheral with its registers and fields.
///
/// Derived peripherals name the peripheral they share registers with instead
/// of repeating them.
pub fn dump(store: &Store) -> Result<String> {
    let mut output = String::new();
    writeln!(output, "MPU: {}", mpu_name(store)?)?;
    writeln!(output, "Database Dump:")?;

    for peripheral in fetch_peripherals(store) {
        match peripheral.row.derived_from_id {
            Some(target) => {
                writeln!(
                    output,
                    "Peripheral: {}, base address: {}",
                    peripheral.row.name, peripheral.row.base_address
                )?;
                let target = fetch_peripheral(store, target)?;
                writeln!(output, "  Registers the same as {}", target.row.name)?;
            }
            None => write!(output, "{}", resolve_peripheral(store, peripheral)?)?,
        }
        writeln!(output)?;
    }
    Ok(output)
}
