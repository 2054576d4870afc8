//! Access to the XFA packets of a form container.
//!
//! A PDF stores XFA either as one XDP stream or as an array of alternating
//! packet names and streams (`preamble`, `config`, `template`, `datasets`,
//! ..., `postamble`). Opening the PDF itself is left to the caller; this
//! module works on the packet bytes through the [`PacketStore`] trait.
//!
//! # Example
//!
//! ```ignore
//! use xfa_fieldmap::container::{PacketSet, XfaSession};
//! use xfa_fieldmap::tree::FieldTree;
//!
//! let packets = PacketSet::from_xdp(&xdp_bytes)?;
//! let mut session = XfaSession::new(packets);
//! session.fill(&FieldTree::from_json_str(r#"{"form1": {"Name": "Ann"}}"#)?)?;
//! let xdp = session.into_store().to_xdp();
//! ```

mod packets;
mod session;

pub use packets::PacketSet;
pub use session::XfaSession;

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// XFA packets this crate reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketName {
    /// Form description and bindings
    Template,
    /// Bound data (`xfa:datasets`)
    Datasets,
    /// Saved form DOM state
    Form,
}

impl PacketName {
    /// Packet name as stored in the container.
    pub fn as_str(&self) -> &'static str {
        match self {
            PacketName::Template => "template",
            PacketName::Datasets => "datasets",
            PacketName::Form => "form",
        }
    }
}

impl fmt::Display for PacketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PacketName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "template" => Ok(PacketName::Template),
            "datasets" => Ok(PacketName::Datasets),
            "form" => Ok(PacketName::Form),
            _ => Err(Error::UnknownPacket(s.to_string())),
        }
    }
}

/// Byte-level access to a container's XFA packets.
pub trait PacketStore {
    /// Bytes of a packet, or `None` if the container has no such packet.
    fn read_packet(&self, name: PacketName) -> Result<Option<Vec<u8>>>;

    /// Replace (or add) a packet.
    fn write_packet(&mut self, name: PacketName, bytes: Vec<u8>) -> Result<()>;
}
