// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::type_complexity)]
#![allow(clippy::enum_variant_names)]
#![allow(clippy::should_implement_trait)]
#![allow(clippy::match_like_matches_macro)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]
#![cfg_attr(test, allow(unused_variables))]

//! # XFA Fieldmap
//!
//! Maps field values between JSON-shaped field trees and the XML data trees
//! of XFA (XML Forms Architecture) forms.
//!
//! ## Core Features
//!
//! - **Path Translation**: zero-based JSON indices to one-based XFA occurrences and back
//! - **Skeletons**: empty field trees derived from a form's template bindings
//! - **Field Types**: text, select, checkbox, radio, date and time descriptors with options and formats
//! - **Injection**: writes values into `datasets` or `form` packets, creating missing nodes
//! - **Extraction**: reads values back in the shape of a skeleton
//! - **Packets**: splits XDP documents and PDF `/XFA` arrays into named packets
//!
//! ## Quick Start
//!
//! ```ignore
//! use xfa_fieldmap::{build_skeleton, inject, extract, DataDocument, FieldTree, XfaTemplate};
//!
//! let template = XfaTemplate::parse(&template_bytes)?;
//! let skeleton = build_skeleton(&template);
//!
//! let fields = FieldTree::from_json_str(r#"{"form1": {"Name": {"First": "Ann"}}}"#)?;
//! let mut data = DataDocument::new_datasets();
//! inject(&mut data, template.base_tag(), &fields)?;
//!
//! let values = extract(&data, &skeleton)?;
//! println!("{}", values.to_json()?);
//! ```
//!
//! ## Working on a whole form
//!
//! ```ignore
//! use xfa_fieldmap::{PacketSet, XfaSession};
//!
//! let mut session = XfaSession::new(PacketSet::from_xdp(&xdp_bytes)?);
//! let types = session.field_types()?;
//! session.fill(&fields)?;
//! std::fs::write("filled.xdp", session.into_store().to_xdp())?;
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration
pub mod config;

// XML tree model
pub mod xml;

// Field trees and paths
pub mod path;
pub mod tree;

// Template packet: skeletons and field types
pub mod template;

// Data packets: injection and extraction
pub mod data;

// Packet containers
pub mod container;

// Re-exports
pub use config::MapperConfig;
pub use container::{PacketName, PacketSet, PacketStore, XfaSession};
pub use data::{
    data_skeleton, decode_choices, extract, inject, DataDocument, InjectStats, ValueExtractor,
    ValueInjector,
};
pub use error::{Error, Result};
pub use path::{to_json_path, to_xfa_path, JsonPath, JsonSegment, XfaPath, XfaSegment};
pub use template::{
    build_skeleton, classify, FieldKind, FieldType, FieldTypeDescriptor, Skeleton, TypeTree,
    XfaTemplate,
};
pub use tree::{FieldTree, Tree};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
