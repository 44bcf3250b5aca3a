use crate::mapfile::DeviceRecord;

/// Human-readable summary of the device inventory, one line per device,
/// already in inventory order (count descending).
pub fn describe_inventory(document_name: Option<&str>, devices: &[DeviceRecord]) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Document: {}", document_name.unwrap_or("(none)")));
    lines.push(format!("\nDevices ({})", devices.len()));
    for device in devices {
        let kind = if device.is_structured {
            "structured"
        } else {
            "bare"
        };
        let network = device.network_id.as_deref().unwrap_or("-");
        lines.push(format!(
            "  - sn {} ({} occurrence{}, {kind}, network {network})",
            device.serial,
            device.occurrence_count,
            if device.occurrence_count == 1 { "" } else { "s" },
        ));
    }

    lines.join("\n")
}

/// Full detail for one device: counts plus the attribute snapshot in the
/// order the file declares it.
pub fn describe_device(device: &DeviceRecord) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Device sn {}", device.serial));
    lines.push(format!("  occurrences: {}", device.occurrence_count));
    lines.push(format!(
        "  structured: {}",
        if device.is_structured { "yes" } else { "no" }
    ));
    if let Some(network) = &device.network_id {
        lines.push(format!("  network: {network}"));
    }

    if !device.attributes.is_empty() {
        lines.push(format!("\nAttributes ({})", device.attributes.len()));
        for (key, value) in &device.attributes {
            lines.push(format!("  {key} = \"{value}\""));
        }
    }

    lines.join("\n")
}
