//! Cache layer: key derivation, backend seam, and the consistency gate.
//!
//! The cache is only ever mutated through the gate's population and
//! invalidation operations; business logic never writes to it directly.

pub mod gate;
pub mod key;
pub mod memory;
pub mod traits;
