//! In-memory packet collections.

use super::{PacketName, PacketStore};
use crate::error::Result;
use crate::xml::XmlDocument;
use indexmap::IndexMap;

const POSTAMBLE: &str = "postamble";

/// Ordered XFA packets, keyed by packet name.
///
/// Built from the name/stream pairs of a PDF `/XFA` array or by splitting
/// a single XDP stream. [`PacketSet::to_xdp`] concatenates the packets in
/// order, which reassembles the XDP document in both cases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacketSet {
    packets: IndexMap<String, Vec<u8>>,
}

impl PacketSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, bytes)` pairs in container order.
    pub fn from_pairs<I, N, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, B)>,
        N: Into<String>,
        B: Into<Vec<u8>>,
    {
        let mut set = Self::new();
        for (name, bytes) in pairs {
            set.insert(name, bytes);
        }
        set
    }

    /// Split an XDP document into its top-level packets.
    ///
    /// The XDP opening and closing tags are kept as `preamble` and
    /// `postamble`. A document whose root is not `xdp` is stored as a
    /// single packet named after its root element.
    pub fn from_xdp(bytes: &[u8]) -> Result<Self> {
        let document = XmlDocument::parse(bytes)?;
        let mut set = Self::new();

        if document.root.local_name() != "xdp" {
            set.insert(document.root.local_name().to_string(), bytes.to_vec());
            return Ok(set);
        }

        set.insert("preamble", document.head_bytes()?);
        for packet in document.root.elements() {
            set.insert(packet.local_name().to_string(), packet.to_bytes()?);
        }
        set.insert(POSTAMBLE, document.tail_bytes()?);
        log::debug!("Split XDP into {} packet(s)", set.len());
        Ok(set)
    }

    /// Add or replace a packet. A replaced packet keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        let name = name.into();
        let bytes = bytes.into();
        match self.key_of(&name) {
            Some(existing) => {
                self.packets.insert(existing, bytes);
            },
            None => {
                self.packets.insert(name, bytes);
            },
        }
    }

    /// Packet bytes by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.key_of(name)
            .and_then(|k| self.packets.get(&k))
            .map(Vec::as_slice)
    }

    /// Packet names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packets.keys().map(String::as_str)
    }

    /// Number of packets.
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    /// Whether the set holds no packets.
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Concatenate all packets in order.
    pub fn to_xdp(&self) -> Vec<u8> {
        self.packets.values().flat_map(|b| b.iter().copied()).collect()
    }

    /// Name/bytes pairs in order, as stored in a PDF `/XFA` array.
    pub fn into_pairs(self) -> Vec<(String, Vec<u8>)> {
        self.packets.into_iter().collect()
    }

    fn key_of(&self, name: &str) -> Option<String> {
        self.packets
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .cloned()
    }
}

impl PacketStore for PacketSet {
    fn read_packet(&self, name: PacketName) -> Result<Option<Vec<u8>>> {
        Ok(self.get(name.as_str()).map(<[u8]>::to_vec))
    }

    fn write_packet(&mut self, name: PacketName, bytes: Vec<u8>) -> Result<()> {
        if self.key_of(name.as_str()).is_some() {
            self.insert(name.as_str(), bytes);
            return Ok(());
        }
        // new packets go before the closing XDP tag
        match self.packets.get_index_of(POSTAMBLE) {
            Some(index) => {
                self.packets.shift_insert(index, name.as_str().to_string(), bytes);
            },
            None => {
                self.packets.insert(name.as_str().to_string(), bytes);
            },
        }
        Ok(())
    }
}
