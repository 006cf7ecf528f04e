//! Driver implementations for the graph SPI.

mod memory;
mod surreal;

pub use memory::InMemoryGraphDriver;
pub use surreal::SurrealGraphDriver;
