use serde::Deserialize;
use ts_rs::TS;

use super::attrs::{parse_attributes, AttrMap};
use super::inventory::DeviceRecord;
use super::tag::{apply_attributes, scan_tags};
use super::{NAME_KEY, NETWORK_KEYS, PRIMARY_NETWORK_KEY, SERIAL_KEY};
use crate::config::ToolConfig;

/// Rename a device, optionally pulling calibration data from a donor.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct RenameRequest {
    pub target_serial: String,
    pub new_serial: String,
    /// How many textual occurrences to rewrite. Clamped to `1..=count`;
    /// omitted means all of them.
    #[serde(default)]
    pub occurrence_limit: Option<usize>,
    /// Donor device whose calibration values are stamped onto every rewritten
    /// tag. The whole rename aborts if the donor doesn't exist.
    #[serde(default)]
    pub clone_source: Option<String>,
    /// New network assignment for every rewritten tag.
    #[serde(default)]
    pub network_override: Option<String>,
}

/// Copy calibration data from one device onto another, serials untouched.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct CloneRequest {
    pub source_serial: String,
    pub target_serial: String,
    #[serde(default)]
    pub network_override: Option<String>,
}

/// Rewrite `text` so up to `occurrence_limit` occurrences of the target
/// serial become the new serial.
///
/// Structured tags carrying the serial are rewritten first (serial attribute,
/// optional donor calibration values, optional network assignment, and the
/// old serial inside a `name` label); whatever budget remains is spent on a
/// plain-text replacement of `sn="target"` elsewhere. Returns None when the
/// request can't proceed: empty serials, a target the inventory doesn't
/// know, or a named donor that doesn't exist.
#[must_use]
pub fn rename(
    text: &str,
    inventory: &[DeviceRecord],
    config: &ToolConfig,
    request: &RenameRequest,
) -> Option<String> {
    if request.target_serial.is_empty() || request.new_serial.is_empty() {
        return None;
    }
    let device = inventory
        .iter()
        .find(|record| record.serial == request.target_serial)?;
    let overlay = match request.clone_source.as_deref() {
        Some(donor) => Some(calibration_overlay(inventory, config, donor)?),
        None => None,
    };
    let limit = match request.occurrence_limit {
        Some(requested) => requested.clamp(1, device.occurrence_count.max(1)),
        None => device.occurrence_count.max(1),
    };

    let mut out = String::with_capacity(text.len() + 64);
    let mut last = 0;
    let mut replaced = 0usize;
    for span in scan_tags(text, &config.elements) {
        out.push_str(&text[last..span.start]);
        let tag_text = span.text(text);
        let attributes = parse_attributes(span.interior(text));
        let is_target = attributes
            .get(SERIAL_KEY)
            .is_some_and(|sn| sn == &request.target_serial);
        if is_target && replaced < limit {
            let desired = desired_attributes(&attributes, request, overlay.as_ref());
            out.push_str(&apply_attributes(tag_text, &desired));
            replaced += 1;
        } else {
            out.push_str(tag_text);
        }
        last = span.end;
    }
    out.push_str(&text[last..]);

    // Structured tags always come out of the budget first; anything left
    // goes to bare references. If budget remains, every structured target
    // tag has already been rewritten, so the needle can't hit one twice.
    if replaced < limit {
        let needle = format!("{SERIAL_KEY}=\"{}\"", request.target_serial);
        let replacement = format!("{SERIAL_KEY}=\"{}\"", request.new_serial);
        out = replace_limited(&out, &needle, &replacement, limit - replaced);
    }
    Some(out)
}

/// Stamp the donor's calibration values (and optionally a new network
/// assignment) onto every structured tag of the target device.
///
/// Serials are left alone and there is no occurrence budget. A target with
/// no structured tags is not an error: the text comes back unchanged. A
/// missing donor returns None.
#[must_use]
pub fn clone_calibration(
    text: &str,
    inventory: &[DeviceRecord],
    config: &ToolConfig,
    request: &CloneRequest,
) -> Option<String> {
    if request.source_serial.is_empty() || request.target_serial.is_empty() {
        return None;
    }
    let overlay = calibration_overlay(inventory, config, &request.source_serial)?;

    let mut out = String::with_capacity(text.len() + 64);
    let mut last = 0;
    for span in scan_tags(text, &config.elements) {
        out.push_str(&text[last..span.start]);
        let tag_text = span.text(text);
        let attributes = parse_attributes(span.interior(text));
        let is_target = attributes
            .get(SERIAL_KEY)
            .is_some_and(|sn| sn == &request.target_serial);
        if is_target {
            let mut desired = overlay.clone();
            if let Some(network) = &request.network_override {
                desired.insert(network_key(&attributes).to_string(), network.clone());
            }
            out.push_str(&apply_attributes(tag_text, &desired));
        } else {
            out.push_str(tag_text);
        }
        last = span.end;
    }
    out.push_str(&text[last..]);
    Some(out)
}

/// The values one matched tag should end up with, in application order:
/// donor calibration data, network assignment, the new serial, then the
/// serial embedded in the label (first occurrence only).
fn desired_attributes(
    attributes: &AttrMap,
    request: &RenameRequest,
    overlay: Option<&AttrMap>,
) -> AttrMap {
    let mut desired = overlay.cloned().unwrap_or_default();
    if let Some(network) = &request.network_override {
        desired.insert(network_key(attributes).to_string(), network.clone());
    }
    desired.insert(SERIAL_KEY.to_string(), request.new_serial.clone());
    if let Some(label) = attributes.get(NAME_KEY) {
        if label.contains(&request.target_serial) {
            desired.insert(
                NAME_KEY.to_string(),
                label.replacen(&request.target_serial, &request.new_serial, 1),
            );
        }
    }
    desired
}

/// Calibration values a device can donate, in whitelist order. None when the
/// inventory has no such device; a structured device with no whitelisted
/// attributes (or a bare one with none at all) donates an empty overlay.
fn calibration_overlay(
    inventory: &[DeviceRecord],
    config: &ToolConfig,
    serial: &str,
) -> Option<AttrMap> {
    let donor = inventory.iter().find(|record| record.serial == serial)?;
    let mut overlay = AttrMap::new();
    for key in &config.calibration_keys {
        if let Some(value) = donor.attributes.get(key) {
            overlay.insert(key.clone(), value.clone());
        }
    }
    Some(overlay)
}

/// Which key receives a network assignment: whichever the tag already has,
/// else the primary one gets appended.
fn network_key(attributes: &AttrMap) -> &'static str {
    NETWORK_KEYS
        .iter()
        .copied()
        .find(|key| attributes.contains_key(*key))
        .unwrap_or(PRIMARY_NETWORK_KEY)
}

/// Left-to-right, non-overlapping replacement of at most `limit` matches.
fn replace_limited(text: &str, needle: &str, replacement: &str, limit: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut done = 0usize;
    while done < limit {
        let Some(found) = text[last..].find(needle) else {
            break;
        };
        let at = last + found;
        out.push_str(&text[last..at]);
        out.push_str(replacement);
        last = at + needle.len();
        done += 1;
    }
    out.push_str(&text[last..]);
    out
}
