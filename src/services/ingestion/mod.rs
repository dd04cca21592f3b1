//! Ingestion: responsibility and boundaries
//!
//! Everything between a ready-made `Event` and the telemetry server: stream
//! creation, local heartbeat pre-merging, the ordered commit queue with retries
//! and the wire transports. Nothing here inspects windows or builds payloads.

mod aw_server;
mod client;
mod memory;
mod merge;
mod queue;
mod transport;
mod r#trait;

pub use self::aw_server::AwServerTransport;
pub use self::client::ActivityWatchClient;
pub use self::memory::MemoryTransport;
pub use self::r#trait::{local_hostname, stream_id, IngestionClient, EVENT_KIND};
pub use self::transport::Transport;
