// Licensed under the Apache-2.0 license

//! Pattern expander for multi-instance peripheral templates.
//!
//! A name ending in `_n` stands for a family of numbered peripherals sharing
//! one register layout: `SPI_n` expands to `SPI0`, `SPI1`, ... and `TIM_n` to
//! `TIM1` .. `TIM12`, while a peripheral such as `TIMER_AUX` that does not end
//! in a digit is left out.

use crate::error::Result;
use crate::model::{PeripheralRow, Stored};
use crate::resolve::{
    fetch_peripherals_like, resolve, resolve_peripheral, ResolvedPeripheral,
};
use crate::store::Store;
use log::debug;

/// Suffix marking a multi-instance template.
pub const MULTI_INSTANCE_MARKER: &str = "_n";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expansion {
    /// Numbered peripherals matching `template`, in ascending name order.
    Family {
        template: String,
        members: Vec<Stored<PeripheralRow>>,
    },
    /// A single peripheral name or pattern.
    Single(String),
}

impl Expansion {
    /// Name used when labelling generated output.
    pub fn label(&self) -> &str {
        match self {
            Expansion::Family { template, .. } => template,
            Expansion::Single(name) => name,
        }
    }

    /// Register/field tree for the expansion.
    ///
    /// Members of a family share their layout, so the first member's tree
    /// stands for all of them.
    pub fn resolve(&self, store: &Store) -> Result<ResolvedPeripheral> {
        match self {
            Expansion::Family { template, members } => match members.first() {
                Some(first) => resolve_peripheral(store, first.clone()),
                None => resolve(store, template),
            },
            Expansion::Single(name) => resolve(store, name),
        }
    }
}

/// Expand `name` if it is a multi-instance template.
///
/// When no numbered peripheral matches, the template with its marker removed
/// is treated as a literal peripheral name.
pub fn expand(store: &Store, name: &str) -> Expansion {
    let Some(template) = name.strip_suffix(MULTI_INSTANCE_MARKER) else {
        return Expansion::Single(name.to_string());
    };

    let members: Vec<_> = fetch_peripherals_like(store, &format!("{template}%"))
        .into_iter()
        .filter(|p| p.row.name.ends_with(|c: char| c.is_ascii_digit()))
        .collect();

    if members.is_empty() {
        debug!("No numbered peripherals match {name}, using {template}");
        Expansion::Single(template.to_string())
    } else {
        debug!(
            "{name} expands to {}",
            members
                .iter()
                .map(|p| p.row.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Expansion::Family {
            template: template.to_string(),
            members,
        }
    }
}
