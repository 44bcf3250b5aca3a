//! Reading and rewriting `.map` text: the attribute pair grammar, tag
//! discovery, the device inventory, and the rename/clone passes. Edits are
//! surgical splices into the original text, so every byte the caller didn't
//! ask to change survives verbatim.

// The scanners work on byte offsets they produced themselves.
#[allow(clippy::indexing_slicing)]
pub mod attrs;
#[allow(clippy::indexing_slicing)]
pub mod engine;
#[allow(clippy::indexing_slicing)]
pub mod inventory;
#[allow(clippy::indexing_slicing)]
pub mod tag;

pub use attrs::{parse_attributes, AttrMap};
pub use engine::{clone_calibration, rename, CloneRequest, RenameRequest};
pub use inventory::{build_inventory, DeviceRecord};
pub use tag::{apply_attributes, scan_tags, TagSpan};

/// Attribute key carrying a device serial.
pub(crate) const SERIAL_KEY: &str = "sn";

/// Attribute key of the human-readable label; renames patch the old serial
/// inside it when present.
pub(crate) const NAME_KEY: &str = "name";

/// Key written when a network assignment has to be appended to a tag.
pub(crate) const PRIMARY_NETWORK_KEY: &str = "networkid";

/// Keys that may carry the network assignment, in lookup priority order.
pub(crate) const NETWORK_KEYS: [&str; 2] = [PRIMARY_NETWORK_KEY, "network"];
