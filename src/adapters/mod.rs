// Adapters layer: concrete sink implementations.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::MemorySink;
#[cfg(feature = "postgres")]
pub use postgres::PostgresSink;
