/// The UL base all Operational-Pattern labels share.
const OP_LABEL_BASE: [u8; 12] = [
    0x06, 0x0E, 0x2B, 0x34, 0x04, 0x01, 0x01, 0x01, 0x0D, 0x01, 0x02, 0x01,
];

/// Offset of the Operational-Pattern UL inside a partition-pack value.
const OP_LABEL_OFFSET: usize = 64;

/// Decodes the operational-pattern label (`OP1a`, `OP2b`, `OP-Atom`, ...)
/// from a partition-pack value.
///
/// Returns `None` when the value carries no recognizable OP label.
#[must_use]
pub fn operational_pattern(value: &[u8]) -> Option<String> {
    let label = value.get(OP_LABEL_OFFSET..OP_LABEL_OFFSET + 16)?;
    if label[..12] != OP_LABEL_BASE {
        return None;
    }

    let item_complexity = label[12];
    let package_complexity = label[13];

    if item_complexity == 0x10 {
        return Some("OP-Atom".to_owned());
    }

    let item = match item_complexity {
        1 => "OP1",
        2 => "OP2",
        3 => "OP3",
        _ => return None,
    };
    let package = match package_complexity {
        1 => "a",
        2 => "b",
        3 => "c",
        // Package complexity 0 only appears under the atom pattern.
        0 => return Some("OP-Atom".to_owned()),
        _ => return None,
    };

    Some(format!("{item}{package}"))
}
