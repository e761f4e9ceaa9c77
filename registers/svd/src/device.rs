// Licensed under the Apache-2.0 license

//! Owned SVD device tree.
//!
//! Every optional element is an `Option<String>`; an element that is present
//! but empty is kept as `Some("")` so that "absent" stays distinguishable.

/// The root `<device>` element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Device {
    pub name: String,
    pub description: Option<String>,
    pub peripherals: Vec<Peripheral>,
}

/// A `<peripheral>` element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Peripheral {
    pub name: String,
    pub description: Option<String>,
    /// Base address exactly as written, e.g. `0x40020000`.
    pub base_address: String,
    pub group_name: Option<String>,
    /// Value of the `derivedFrom` attribute.
    pub derived_from: Option<String>,
    pub registers: Vec<Register>,
}

/// A `<register>` element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Register {
    pub name: String,
    pub description: Option<String>,
    /// Offset from the peripheral base, exactly as written.
    pub address_offset: String,
    /// Register width in bits, exactly as written.
    pub size: Option<String>,
    pub access: Option<String>,
    pub reset_value: Option<String>,
    pub fields: Vec<Field>,
}

/// A `<field>` element.
///
/// Only one of the three bit-position encodings is expected to be present:
/// `bit_offset` + `bit_width`, `bit_range` (`[hi:lo]`) or `lsb` + `msb`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub description: Option<String>,
    pub bit_offset: Option<String>,
    pub bit_width: Option<String>,
    pub bit_range: Option<String>,
    pub lsb: Option<String>,
    pub msb: Option<String>,
    pub access: Option<String>,
}
