//! Domain models shared across the whole webhook pipeline.

pub mod event;
pub mod market;
pub mod reply;
pub mod ticker;

pub use event::{WebhookBody, WebhookEvent};
pub use market::{Fetched, FundamentalsSnapshot, PricePoint};
pub use reply::{NarrativeReply, TextMessage};
pub use ticker::{StockIdentity, TickerExtraction};
