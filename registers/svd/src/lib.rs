// Licensed under the Apache-2.0 license

//! CMSIS-SVD front end.
//!
//! Parses the subset of the CMSIS-SVD schema that the register database
//! cares about into an owned tree:
//!
//! ```text
//! device
//! └── peripherals > peripheral   (derivedFrom attribute)
//!     └── registers > register
//!         └── fields > field     (bitOffset/bitWidth | bitRange | lsb/msb)
//! ```
//!
//! Clusters, register arrays and enumerated values are not read. Bit positions
//! are kept exactly as written; turning them into a canonical offset/width
//! pair is left to the consumer.
//!
//! ```
//! let device = registers_svd::parse(r#"
//! <device>
//!   <name>STM32F401</name>
//!   <peripherals>
//!     <peripheral>
//!       <name>GPIOA</name>
//!       <baseAddress>0x40020000</baseAddress>
//!     </peripheral>
//!   </peripherals>
//! </device>"#).unwrap();
//! assert_eq!(device.peripherals[0].name, "GPIOA");
//! ```

pub mod device;
mod error;
mod parse;

pub use device::{Device, Field, Peripheral, Register};
pub use error::SvdParseError;
pub use parse::{parse, parse_file};
