use indexmap::IndexMap;
use serde::Serialize;
use ts_rs::TS;

use super::attrs::{parse_attributes, AttrMap};
use super::tag::scan_tags;
use super::{NETWORK_KEYS, SERIAL_KEY};
use crate::config::ToolConfig;

/// One device as seen across the whole file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct DeviceRecord {
    pub serial: String,
    /// How many times `sn="<serial>"` appears anywhere in the text,
    /// structured tags included.
    #[ts(type = "number")]
    pub occurrence_count: usize,
    /// Whether at least one recognized element tag carries this serial.
    pub is_structured: bool,
    pub network_id: Option<String>,
    /// Attribute snapshot from the last structured tag with this serial.
    /// Empty for serials that only ever appear as bare references.
    #[ts(type = "Record<string, string>")]
    pub attributes: AttrMap,
}

/// Build the device inventory for one file.
///
/// Two independent passes: recognized element tags establish membership and
/// the attribute snapshot (the last tag with a given serial wins), then a
/// whole-text scan for `sn="..."` establishes occurrence counts, creating
/// bare records for serials no tag carries. The result is sorted by count
/// descending; ties keep first-discovery order.
#[must_use]
pub fn build_inventory(text: &str, config: &ToolConfig) -> Vec<DeviceRecord> {
    let mut records = scan_structured(text, config);
    tally_occurrences(text, &mut records);
    let mut inventory: Vec<DeviceRecord> = records.into_values().collect();
    inventory.sort_by(|a, b| b.occurrence_count.cmp(&a.occurrence_count));
    inventory
}

fn scan_structured(text: &str, config: &ToolConfig) -> IndexMap<String, DeviceRecord> {
    let mut records = IndexMap::new();
    for span in scan_tags(text, &config.elements) {
        let attributes = parse_attributes(span.interior(text));
        let Some(serial) = attributes.get(SERIAL_KEY).filter(|sn| !sn.is_empty()) else {
            continue;
        };
        let serial = serial.clone();
        let network_id = NETWORK_KEYS
            .iter()
            .find_map(|key| attributes.get(*key))
            .cloned();
        records.insert(
            serial.clone(),
            DeviceRecord {
                serial,
                occurrence_count: 0,
                is_structured: true,
                network_id,
                attributes,
            },
        );
    }
    records
}

fn tally_occurrences(text: &str, records: &mut IndexMap<String, DeviceRecord>) {
    for serial in scan_serial_refs(text) {
        if let Some(record) = records.get_mut(&serial) {
            record.occurrence_count += 1;
        } else {
            records.insert(
                serial.clone(),
                DeviceRecord {
                    serial,
                    occurrence_count: 1,
                    is_structured: false,
                    network_id: None,
                    attributes: AttrMap::new(),
                },
            );
        }
    }
}

/// Every serial mentioned as `sn="value"` anywhere in the text, in order.
/// Matches are non-overlapping; an empty or unterminated value counts for
/// nothing.
fn scan_serial_refs(text: &str) -> Vec<String> {
    let pattern = format!("{SERIAL_KEY}=\"");
    let needle = pattern.as_bytes();
    let bytes = text.as_bytes();
    let mut serials = Vec::new();
    let mut pos = 0;
    while pos + needle.len() <= bytes.len() {
        if &bytes[pos..pos + needle.len()] != needle {
            pos += 1;
            continue;
        }
        let value_start = pos + needle.len();
        let mut value_end = value_start;
        while value_end < bytes.len() && bytes[value_end] != b'"' {
            value_end += 1;
        }
        if value_end >= bytes.len() {
            break;
        }
        if value_end > value_start {
            serials.push(text[value_start..value_end].to_string());
        }
        pos = value_end + 1;
    }
    serials
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn inventory(text: &str) -> Vec<DeviceRecord> {
        build_inventory(text, &ToolConfig::default())
    }

    fn find<'a>(records: &'a [DeviceRecord], serial: &str) -> &'a DeviceRecord {
        records
            .iter()
            .find(|r| r.serial == serial)
            .expect("serial missing from inventory")
    }

    #[test]
    fn structured_tag_counts_its_own_serial() {
        let records = inventory(r#"<PMU sn="111" networkid="A01"/>"#);
        assert_eq!(records.len(), 1);
        let device = &records[0];
        assert_eq!(device.serial, "111");
        assert_eq!(device.occurrence_count, 1);
        assert!(device.is_structured);
        assert_eq!(device.network_id.as_deref(), Some("A01"));
        assert_eq!(device.attributes.get("networkid").unwrap(), "A01");
    }

    #[test]
    fn count_spans_structured_and_bare_references() {
        let text = r#"<PMU sn="X" networkid="A01"/>
            <Zone master="X" label="not a serial mention"/>
            route sn="X" to sn="X"
            fallback sn="X""#;
        let records = inventory(text);
        let device = find(&records, "X");
        assert_eq!(device.occurrence_count, 4);
        assert!(device.is_structured);
    }

    #[test]
    fn bare_only_serial_is_unstructured() {
        let records = inventory(r#"link sn="777" and again sn="777""#);
        let device = find(&records, "777");
        assert_eq!(device.occurrence_count, 2);
        assert!(!device.is_structured);
        assert!(device.network_id.is_none());
        assert!(device.attributes.is_empty());
    }

    #[test]
    fn last_structured_tag_wins_the_snapshot() {
        let text = r#"<PMU sn="5" networkid="A01" amb_act_lev="10"/>
                      <PMU sn="5" networkid="B07" amb_act_lev="90"/>"#;
        let records = inventory(text);
        let device = find(&records, "5");
        assert_eq!(device.occurrence_count, 2);
        assert_eq!(device.network_id.as_deref(), Some("B07"));
        assert_eq!(device.attributes.get("amb_act_lev").unwrap(), "90");
    }

    #[test]
    fn network_id_falls_back_to_legacy_key() {
        let records = inventory(r#"<PMU sn="1" network="C03"/>"#);
        assert_eq!(find(&records, "1").network_id.as_deref(), Some("C03"));
    }

    #[test]
    fn networkid_preferred_over_legacy_key() {
        let records = inventory(r#"<PMU sn="1" network="C03" networkid="A01"/>"#);
        assert_eq!(find(&records, "1").network_id.as_deref(), Some("A01"));
    }

    #[test]
    fn empty_serial_never_becomes_a_device() {
        let records = inventory(r#"<PMU sn="" networkid="A01"/> bare sn="""#);
        assert!(records.is_empty());
    }

    #[test]
    fn tag_without_serial_ignored() {
        let records = inventory(r#"<PMU networkid="A01" name="unlabeled"/>"#);
        assert!(records.is_empty());
    }

    #[test]
    fn sorted_by_count_descending_ties_keep_discovery_order() {
        let text = r#"<PMU sn="a"/> <PMU sn="b"/> <PMU sn="c"/>
                      ref sn="b" ref sn="b""#;
        let records = inventory(text);
        let serials: Vec<&str> = records.iter().map(|r| r.serial.as_str()).collect();
        assert_eq!(serials, vec!["b", "a", "c"]);
        assert_eq!(records[0].occurrence_count, 3);
    }

    #[test]
    fn configured_elements_extend_membership() {
        let config = ToolConfig {
            elements: vec!["PMU".to_string(), "Sensor".to_string()],
            ..ToolConfig::default()
        };
        let text = r#"<Sensor sn="s1" networkid="A02"/> <PMU sn="p1"/>"#;
        let records = build_inventory(text, &config);
        assert!(find(&records, "s1").is_structured);
        assert!(find(&records, "p1").is_structured);
    }

    #[test]
    fn empty_text_yields_empty_inventory() {
        assert!(inventory("").is_empty());
    }
}
