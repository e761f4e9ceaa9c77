// Licensed under the Apache-2.0 license

//! Forth generation: flat constants and `registers` structures.

use crate::config::GenerateOptions;
use crate::error::{Result, SvdDbError};
use crate::resolve::{resolve, ResolvedRegister};
use crate::store::Store;
use crate::util::{forth_hex, parse_number, short_prefix};
use std::fmt::Write;

/// Support word emitted ahead of the constants when requested.
///
/// `m_` constants are meant to be used with it, e.g.
/// `5 m_spi_CR2_TSER SPI1_BASE modify-reg`; `b_` constants go straight to
/// `bic!` or `bis!`.
pub const MODIFY_REG_WORDS: &str = r"
: modify-reg ( value mask pos reg -- )
    >r tuck         \ -- value pos mask pos
    lshift r@ bic!  \ clear mask first
    lshift r> bis!  \ set the value bits
;
";

/// Structure-defining words emitted ahead of a `registers` block when
/// requested.
pub const REGISTER_WORDS: &str = r"
: registers ( -- )
    0 ;             \ offset start

: reg
    <builds         ( offset -- newoffset )
        dup , cell+
    does>           ( structure-base -- structure-member-address )
        @ + ;

: regC
    <builds         ( offset -- newoffset )
        dup , cell+
    does>           ( structure-base stream -- structure-member-address )
        @ swap $18 * + + ;

: end-registers ( -- )
    drop ;          \ last offset

\ bit masks
: bit ( n -- n )
    1 swap lshift 1-foldable ;
";

/// Generate flat Forth constants for `peripheral`.
///
/// Register constants are named `<prefix>_<REG>` where the prefix is the
/// first three letters of the peripheral name, lower-cased.
pub fn generate_forth_constants(
    store: &Store,
    peripheral: &str,
    options: &GenerateOptions,
) -> Result<String> {
    let resolved = resolve(store, peripheral)?;

    let mut output = String::new();
    if options.support_words {
        writeln!(output, "{MODIFY_REG_WORDS}")?;
    }

    writeln!(
        output,
        "{} constant {}_BASE",
        forth_hex(&resolved.base_address),
        resolved.name
    )?;

    let prefix = short_prefix(&resolved.name, 3);
    let registers = options.filter.apply(&resolved.registers);

    for register in &registers {
        writeln!(
            output,
            "  {}_BASE {} + constant {prefix}_{}",
            resolved.name,
            forth_hex(&register.address_offset),
            register.name
        )?;
    }

    for register in &registers {
        writeln!(output, "  \\ Bitfields for {prefix}_{}", register.name)?;
        for field in &register.fields {
            let name = format!("{prefix}_{}_{}", register.name, field.name);
            if field.num_bits == 1 {
                writeln!(output, "  1 {} lshift constant b_{name}", field.bit_offset)?;
            } else {
                writeln!(
                    output,
                    "  ${:08X} {} 2constant m_{name}",
                    field.position().mask(),
                    field.bit_offset
                )?;
            }
        }
    }

    Ok(output)
}

/// Generate a Forth `registers ... end-registers` structure for `peripheral`.
///
/// Registers are laid out in ascending offset order, four bytes apart. A gap
/// in the layout is bridged by replacing the running offset with the next
/// register's offset.
pub fn generate_forth_registers(
    store: &Store,
    peripheral: &str,
    options: &GenerateOptions,
) -> Result<String> {
    let resolved = resolve(store, peripheral)?;

    let mut output = String::new();
    if options.support_words {
        writeln!(output, "{REGISTER_WORDS}")?;
    }

    writeln!(
        output,
        "{} constant {}",
        forth_hex(&resolved.base_address),
        resolved.name
    )?;
    writeln!(output, "  registers")?;

    let prefix = short_prefix(&resolved.name, 2);
    let registers = by_offset(options.filter.apply(&resolved.registers))?;

    let mut addr: u64 = 0;
    for (offset, register) in &registers {
        if *offset != addr {
            writeln!(output, "    drop ${offset:08X}")?;
            addr = *offset;
        }
        addr += 4;
        writeln!(output, "    reg _{prefix}{}", register.name)?;
    }
    writeln!(output, "  end-registers")?;

    for (_, register) in &registers {
        writeln!(output, "\n\\ Bitfields for {}", register.name)?;
        for field in &register.fields {
            let name = format!("{}_{}", register.name, field.name);
            if field.num_bits == 1 {
                writeln!(output, "  {} bit constant b_{name}", field.bit_offset)?;
            } else {
                writeln!(
                    output,
                    "  ${:08X} {} 2constant m_{name}",
                    field.position().mask(),
                    field.bit_offset
                )?;
            }
        }
    }

    Ok(output)
}

/// Pair each register with its numeric offset, in ascending offset order.
///
/// Offsets must fit in 32 bits. Registers sharing an offset keep their
/// incoming (name) order.
fn by_offset(registers: Vec<&ResolvedRegister>) -> Result<Vec<(u64, &ResolvedRegister)>> {
    let mut registers = registers
        .into_iter()
        .map(|register| {
            parse_number(&register.address_offset)
                .filter(|offset| *offset <= u64::from(u32::MAX))
                .map(|offset| (offset, register))
                .ok_or_else(|| SvdDbError::InvalidAddress {
                    value: register.address_offset.clone(),
                })
        })
        .collect::<Result<Vec<_>>>()?;
    registers.sort_by_key(|(offset, _)| *offset);
    Ok(registers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::test_support::gpio_store;
    use crate::model::RegisterRow;

    #[test]
    fn test_constants() {
        let store = gpio_store();
        let output = generate_forth_constants(&store, "GPIOA", &GenerateOptions::new()).unwrap();
        assert_eq!(
            output,
            r"$40020000 constant GPIOA_BASE
  GPIOA_BASE $10 + constant gpi_IDR
  GPIOA_BASE $00 + constant gpi_MODER
  GPIOA_BASE $04 + constant gpi_OTYPER
  \ Bitfields for gpi_IDR
  1 0 lshift constant b_gpi_IDR_IDR0
  \ Bitfields for gpi_MODER
  $00000003 0 2constant m_gpi_MODER_MODER0
  $00000003 2 2constant m_gpi_MODER_MODER1
  \ Bitfields for gpi_OTYPER
  1 0 lshift constant b_gpi_OTYPER_OT0
  1 1 lshift constant b_gpi_OTYPER_OT1
"
        );
    }

    #[test]
    fn test_constants_support_words() {
        let store = gpio_store();
        let options = GenerateOptions::new()
            .support_words(true)
            .register_filter("nomatch");
        let output = generate_forth_constants(&store, "GPIOA", &options).unwrap();
        assert_eq!(
            output,
            format!("{MODIFY_REG_WORDS}\n$40020000 constant GPIOA_BASE\n")
        );
        assert!(output.starts_with("\n: modify-reg ( value mask pos reg -- )\n"));
    }

    #[test]
    fn test_registers_structure() {
        let store = gpio_store();
        let output = generate_forth_registers(&store, "GPIOA", &GenerateOptions::new()).unwrap();
        assert_eq!(
            output,
            r"$40020000 constant GPIOA
  registers
    reg _gpMODER
    reg _gpOTYPER
    drop $00000010
    reg _gpIDR
  end-registers

\ Bitfields for MODER
  $00000003 0 2constant m_MODER_MODER0
  $00000003 2 2constant m_MODER_MODER1

\ Bitfields for OTYPER
  0 bit constant b_OTYPER_OT0
  1 bit constant b_OTYPER_OT1

\ Bitfields for IDR
  0 bit constant b_IDR_IDR0
"
        );
    }

    #[test]
    fn test_registers_not_starting_at_zero() {
        let store = gpio_store();
        let options = GenerateOptions::new().register_filter("idr");
        let output = generate_forth_registers(&store, "GPIOB", &options).unwrap();
        assert_eq!(
            output,
            r"$40020400 constant GPIOB
  registers
    drop $00000010
    reg _gpIDR
  end-registers

\ Bitfields for IDR
  0 bit constant b_IDR_IDR0
"
        );
    }

    #[test]
    fn test_registers_empty_filter_keeps_scaffolding() {
        let store = gpio_store();
        let options = GenerateOptions::new()
            .register_filter("nomatch")
            .support_words(true);
        let output = generate_forth_registers(&store, "GPIOA", &options).unwrap();
        assert_eq!(
            output,
            format!("{REGISTER_WORDS}\n$40020000 constant GPIOA\n  registers\n  end-registers\n")
        );
    }

    #[test]
    fn test_registers_invalid_offset() {
        let mut store = gpio_store();
        store
            .insert(&RegisterRow {
                peripheral_id: 1,
                name: "BROKEN".to_string(),
                address_offset: "0xZZ".to_string(),
                reset_value: None,
                description: None,
            })
            .unwrap();
        let err = generate_forth_registers(&store, "GPIOA", &GenerateOptions::new()).unwrap_err();
        assert!(matches!(err, SvdDbError::InvalidAddress { value } if value == "0xZZ"));
    }

    #[test]
    fn test_registers_offset_beyond_32_bits() {
        let mut store = gpio_store();
        store
            .insert(&RegisterRow {
                peripheral_id: 1,
                name: "HUGE".to_string(),
                address_offset: "0xFFFFFFFFFFFFFFFF".to_string(),
                reset_value: None,
                description: None,
            })
            .unwrap();
        let err = generate_forth_registers(&store, "GPIOA", &GenerateOptions::new()).unwrap_err();
        assert!(
            matches!(err, SvdDbError::InvalidAddress { value } if value == "0xFFFFFFFFFFFFFFFF")
        );
    }

    #[test]
    fn test_registers_at_top_of_32_bit_range() {
        let mut store = gpio_store();
        store
            .insert(&RegisterRow {
                peripheral_id: 1,
                name: "LAST".to_string(),
                address_offset: "0xFFFFFFFC".to_string(),
                reset_value: None,
                description: None,
            })
            .unwrap();
        let options = GenerateOptions::new().register_filter("last");
        let output = generate_forth_registers(&store, "GPIOA", &options).unwrap();
        assert!(output.contains("    drop $FFFFFFFC\n    reg _gpLAST\n  end-registers\n"));
    }
}
