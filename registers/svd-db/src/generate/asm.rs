// Licensed under the Apache-2.0 license

//! Assembler `.equ` generation.

use crate::config::GenerateOptions;
use crate::error::Result;
use crate::pattern::{expand, Expansion};
use crate::resolve::ResolvedRegister;
use crate::store::Store;
use std::fmt::{self, Write};

/// Generate `.equ` directives for `peripheral`.
///
/// A multi-instance template such as `TIM_n` emits a `_BASE` equate for every
/// numbered member and labels the register block with the template name.
/// Nothing after the base addresses is emitted when the register filter
/// leaves no registers.
pub fn generate_asm(store: &Store, peripheral: &str, options: &GenerateOptions) -> Result<String> {
    let expansion = expand(store, peripheral);
    let resolved = expansion.resolve(store)?;

    let mut output = String::new();
    match &expansion {
        Expansion::Family { members, .. } => {
            for member in members {
                writeln!(
                    output,
                    ".equ {}_BASE, {}",
                    member.row.name, member.row.base_address
                )?;
            }
        }
        Expansion::Single(_) => {
            writeln!(
                output,
                ".equ {}_BASE, {}",
                resolved.name, resolved.base_address
            )?;
        }
    }

    let registers = options.filter.apply(&resolved.registers);
    write_registers(&mut output, expansion.label(), &registers)?;
    Ok(output)
}

fn write_registers(
    output: &mut String,
    label: &str,
    registers: &[&ResolvedRegister],
) -> fmt::Result {
    if registers.is_empty() {
        return Ok(());
    }

    writeln!(output, "; Registers for {label}")?;
    for register in registers {
        writeln!(
            output,
            "  .equ _{}, {}",
            register.name, register.address_offset
        )?;
    }

    for register in registers {
        writeln!(output, "; Bitfields for _{}", register.name)?;
        for field in &register.fields {
            let name = format!("{}_{}", register.name, field.name);
            if field.num_bits == 1 {
                writeln!(output, "  .equ b_{name}, 1<<{}", field.bit_offset)?;
            } else {
                writeln!(
                    output,
                    "  .equ m_{name}, 0x{:08X}",
                    field.position().shifted_mask()
                )?;
                writeln!(output, "  .equ o_{name}, {}", field.bit_offset)?;
            }
        }
    }
    Ok(())
}
