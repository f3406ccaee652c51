//! Queue names

/// Logical queue names shared by producers, workers and consumers
///
/// Names are plain list keys so any process speaking to the same broker can
/// find them.
pub struct Queues;

impl Queues {
    /// Inbound order-book payloads: `lob_queue`
    pub const LOB: &'static str = "lob_queue";

    /// Outbound prediction responses: `results_queue`
    pub const RESULTS: &'static str = "results_queue";

    /// One worker's in-flight list for acknowledged delivery:
    /// `lob_queue:processing:<worker>`
    ///
    /// Lists are never shared, so recovering one worker's list cannot steal
    /// messages another live worker is still handling.
    pub fn processing(queue: &str, worker: &str) -> String {
        format!("{}:processing:{}", queue, worker)
    }
}
