//! The binary codec: JSON ↔ graph, for both container variants.
//!
//! Reading builds properties in dependency order, resolves buffers from the
//! BIN chunk, data URIs, or the I/O platform, and dissolves buffer views
//! while slicing accessors. Writing assigns indices in root-list order,
//! groups accessors into one buffer view per (buffer, usage category), and
//! never produces output its own reader would reject.

mod glb;
mod reader;
mod writer;

pub use glb::{Glb, Header};
pub use reader::{ReadContext, ReadOptions, Reader};
pub use writer::{Artifacts, Format, WriteContext, WriteOptions, Writer};
