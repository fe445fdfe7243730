//! The per-event pipeline: intent → market data → narratives → reply.

pub mod intent;
pub mod market;
pub mod narrative;
pub mod pipeline;
pub mod reply;
