// Licensed under the Apache-2.0 license

//! roxmltree walker producing a [`Device`].

use crate::device::{Device, Field, Peripheral, Register};
use crate::error::SvdParseError;
use roxmltree::{Document, Node};
use std::path::Path;

/// Parse an SVD document held in memory.
pub fn parse(input: &str) -> Result<Device, SvdParseError> {
    let doc = Document::parse(input)?;
    let root = doc.root_element();
    if !root.has_tag_name("device") {
        return Err(SvdParseError::UnexpectedRoot(
            root.tag_name().name().to_string(),
        ));
    }

    let peripherals = grandchildren(root, "peripherals", "peripheral")
        .into_iter()
        .map(parse_peripheral)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Device {
        name: required_text(root, "name")?,
        description: description(root),
        peripherals,
    })
}

/// Read and parse an SVD file.
pub fn parse_file(path: &Path) -> Result<Device, SvdParseError> {
    let input = std::fs::read_to_string(path).map_err(|source| SvdParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&input)
}

fn parse_peripheral(node: Node) -> Result<Peripheral, SvdParseError> {
    let registers = grandchildren(node, "registers", "register")
        .into_iter()
        .map(parse_register)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Peripheral {
        name: required_text(node, "name")?,
        description: description(node),
        base_address: required_text(node, "baseAddress")?,
        group_name: text(node, "groupName"),
        derived_from: node
            .attribute("derivedFrom")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        registers,
    })
}

fn parse_register(node: Node) -> Result<Register, SvdParseError> {
    let fields = grandchildren(node, "fields", "field")
        .into_iter()
        .map(parse_field)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Register {
        name: required_text(node, "name")?,
        description: description(node),
        address_offset: required_text(node, "addressOffset")?,
        size: text(node, "size"),
        access: text(node, "access"),
        reset_value: text(node, "resetValue"),
        fields,
    })
}

fn parse_field(node: Node) -> Result<Field, SvdParseError> {
    Ok(Field {
        name: required_text(node, "name")?,
        description: description(node),
        bit_offset: text(node, "bitOffset"),
        bit_width: text(node, "bitWidth"),
        bit_range: text(node, "bitRange"),
        lsb: text(node, "lsb"),
        msb: text(node, "msb"),
        access: text(node, "access"),
    })
}

fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(tag))
}

/// `<container><tag/>...</container>` children of `node`, in document order.
fn grandchildren<'a, 'input>(
    node: Node<'a, 'input>,
    container: &str,
    tag: &str,
) -> Vec<Node<'a, 'input>> {
    node.children()
        .filter(|n| n.has_tag_name(container))
        .flat_map(|c| c.children().filter(move |n| n.has_tag_name(tag)))
        .collect()
}

fn text(node: Node, tag: &str) -> Option<String> {
    child(node, tag).map(|n| n.text().unwrap_or_default().trim().to_string())
}

/// Descriptions are frequently wrapped and indented in vendor files.
fn description(node: Node) -> Option<String> {
    child(node, "description").map(|n| {
        n.text()
            .unwrap_or_default()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    })
}

fn required_text(node: Node, tag: &str) -> Result<String, SvdParseError> {
    match text(node, tag) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(SvdParseError::MissingElement {
            element: node.tag_name().name().to_string(),
            tag: tag.to_string(),
            line: node.document().text_pos_at(node.range().start).row,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<device schemaVersion="1.1" xmlns:xs="http://www.w3.org/2001/XMLSchema-instance">
  <name>STM32F401</name>
  <description>STM32F401
      series</description>
  <peripherals>
    <peripheral>
      <name>SPI1</name>
      <baseAddress>0x40013000</baseAddress>
      <groupName>SPI</groupName>
      <registers>
        <register>
          <name>CR1</name>
          <addressOffset>0x0</addressOffset>
          <size>0x20</size>
          <resetValue>0x00000000</resetValue>
          <fields>
            <field>
              <name>BIDIMODE</name>
              <description>Bidirectional data mode enable</description>
              <bitOffset>15</bitOffset>
              <bitWidth>1</bitWidth>
            </field>
            <field>
              <name>BR</name>
              <bitRange>[5:3]</bitRange>
            </field>
          </fields>
        </register>
      </registers>
    </peripheral>
    <peripheral derivedFrom="SPI1">
      <name>SPI2</name>
      <baseAddress>0x40003800</baseAddress>
    </peripheral>
  </peripherals>
</device>
"#;

    #[test]
    fn test_parse_device_tree() {
        let device = parse(SAMPLE).unwrap();
        assert_eq!(device.name, "STM32F401");
        assert_eq!(device.description.as_deref(), Some("STM32F401 series"));
        assert_eq!(device.peripherals.len(), 2);

        let spi1 = &device.peripherals[0];
        assert_eq!(spi1.base_address, "0x40013000");
        assert_eq!(spi1.group_name.as_deref(), Some("SPI"));
        assert_eq!(spi1.derived_from, None);
        assert_eq!(spi1.registers.len(), 1);

        let cr1 = &spi1.registers[0];
        assert_eq!(cr1.address_offset, "0x0");
        assert_eq!(cr1.size.as_deref(), Some("0x20"));
        assert_eq!(cr1.reset_value.as_deref(), Some("0x00000000"));
        assert_eq!(cr1.fields[0].bit_offset.as_deref(), Some("15"));
        assert_eq!(cr1.fields[0].bit_width.as_deref(), Some("1"));
        assert_eq!(cr1.fields[1].bit_range.as_deref(), Some("[5:3]"));
        assert_eq!(cr1.fields[1].description, None);

        let spi2 = &device.peripherals[1];
        assert_eq!(spi2.derived_from.as_deref(), Some("SPI1"));
        assert!(spi2.registers.is_empty());
    }

    #[test]
    fn test_missing_base_address() {
        let err = parse(
            r#"<device><name>X</name><peripherals>
<peripheral><name>GPIOA</name></peripheral>
</peripherals></device>"#,
        )
        .unwrap_err();
        match err {
            SvdParseError::MissingElement { element, tag, line } => {
                assert_eq!(element, "peripheral");
                assert_eq!(tag, "baseAddress");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_wrong_root() {
        assert!(matches!(
            parse("<board><name>X</name></board>"),
            Err(SvdParseError::UnexpectedRoot(root)) if root == "board"
        ));
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(
            parse("<device><name>X</name>"),
            Err(SvdParseError::Xml(_))
        ));
    }
}
