//! arena-backfill — replay completed livestream records onto a Pub/Sub topic.
//!
//! Reads a header line followed by `<id>  <start>  <end>` records, skips
//! (and logs) anything malformed, and publishes the rest as
//! `{livestreamId, startTime, endTime}` JSON messages in batches.

pub mod error;
pub mod job;
pub mod publisher;
pub mod record;

pub use error::{BackfillError, BackfillResult, PublishError, PublishResult, RecordError};
pub use job::{Backfill, BackfillReport};
pub use publisher::{MessagePublisher, PubSubPublisher};
pub use record::parse_record;
