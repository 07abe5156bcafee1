//! Generic field extraction, driven by a dialect's rule table.

use crate::dialect::Dialect;
use crate::record::RawFieldMap;

/// Scan every line of a report once, in order, and capture the value after
/// each matching marker.
///
/// A line matching no marker is ignored. When a field's marker appears on
/// more than one line the later capture overwrites the earlier one;
/// summary sections restate fields and the restated value is the one that
/// counts. Absence of a field is not an error at this stage; record
/// assembly decides what was mandatory.
pub fn extract_fields(text: &str, dialect: Dialect) -> RawFieldMap {
    let mut fields = RawFieldMap::new();
    for line in text.lines() {
        for rule in dialect.rules() {
            let Some(pos) = line.find(rule.marker) else {
                continue;
            };
            let after = &line[pos + rule.marker.len()..];
            // The qualifier column is fixed-width in characters, not bytes.
            let skipped: String = after.chars().skip(rule.qualifier_width).collect();
            let mut value = skipped.trim().to_string();
            if rule.numeric {
                value.retain(|c| c != ',');
            }
            if value.is_empty() {
                log::trace!("marker {:?} matched but the value is empty", rule.marker);
                continue;
            }
            fields.insert(rule.key, value);
        }
    }
    fields
}
