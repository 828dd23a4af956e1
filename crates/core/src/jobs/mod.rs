//! Background job queue abstraction.
//!
//! Download monitoring and seeding reclamation run outside the request path.
//! The router and reclaimer only enqueue; execution is owned by whatever
//! scheduler the host process wires in.

mod types;

pub use types::{JobKind, JobQueue, JobQueueError, MonitorDownloadPayload, MONITOR_RETRIES};
