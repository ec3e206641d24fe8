pub mod connector;
pub mod memory;

pub use connector::{Collection, Connectors, GetOptions, Selector};
pub use memory::{CollectionStats, MemoryCollection};
