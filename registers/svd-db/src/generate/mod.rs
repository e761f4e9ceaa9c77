// Licensed under the Apache-2.0 license

//! Generation engine: resolved register trees → source text.
//!
//! Three dialects are supported:
//!
//! - [`Dialect::Assembler`]: `.equ` directives for base addresses, register
//!   offsets and bitfield masks. Multi-instance templates (`TIM_n`) emit one
//!   base address per family member.
//! - [`Dialect::ForthConstants`]: flat `constant`/`2constant` definitions
//!   addressed from the peripheral base.
//! - [`Dialect::ForthRegisters`]: a `registers ... end-registers` structure
//!   whose member offsets are laid out in address order.
//!
//! Each generator returns the complete text; nothing is written until the
//! whole tree has been rendered.

mod asm;
mod forth;

pub use asm::generate_asm;
pub use forth::{
    generate_forth_constants, generate_forth_registers, MODIFY_REG_WORDS, REGISTER_WORDS,
};

use crate::config::GenerateOptions;
use crate::error::Result;
use crate::store::Store;

/// Output dialect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    Assembler,
    ForthConstants,
    ForthRegisters,
}

/// Generate `peripheral` in the requested dialect.
pub fn generate(
    store: &Store,
    peripheral: &str,
    dialect: Dialect,
    options: &GenerateOptions,
) -> Result<String> {
    match dialect {
        Dialect::Assembler => generate_asm(store, peripheral, options),
        Dialect::ForthConstants => generate_forth_constants(store, peripheral, options),
        Dialect::ForthRegisters => generate_forth_registers(store, peripheral, options),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::gpio_store;
    use super::*;

    #[test]
    fn test_dispatch_matches_dialect_functions() {
        let store = gpio_store();
        let options = GenerateOptions::new().register_filter("idr");
        assert_eq!(
            generate(&store, "GPIOA", Dialect::Assembler, &options).unwrap(),
            generate_asm(&store, "GPIOA", &options).unwrap()
        );
        assert_eq!(
            generate(&store, "GPIOA", Dialect::ForthConstants, &options).unwrap(),
            generate_forth_constants(&store, "GPIOA", &options).unwrap()
        );
        assert_eq!(
            generate(&store, "GPIOA", Dialect::ForthRegisters, &options).unwrap(),
            generate_forth_registers(&store, "GPIOA", &options).unwrap()
        );
    }
}
