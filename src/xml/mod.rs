//! Owned XML element trees for XFA packets.
//!
//! XFA packets are small enough to hold in memory, and the injector needs
//! to create and reorder elements, so packets are parsed into an owned
//! tree with [`quick_xml`] and written back out with its `Writer`.
//!
//! Element names are stored exactly as they appear (`xfa:data`), and all
//! lookups compare the local part only, so a `datasets` packet matches the
//! same way whether or not its producer used a namespace prefix.

mod element;
mod reader;
mod writer;

pub use element::{local_name, XmlElement, XmlNode};
pub use reader::XmlDocument;
