pub mod availability;
pub mod error;
pub mod index;
pub mod query;
pub mod scoring;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use async_trait::async_trait;

pub use availability::{map_availability, AvailabilityEntry, AvailabilityMap};
pub use error::{DataIntegrityError, InvalidRequest, UnsatisfiableBatch};
pub use index::{BusySetIndex, RoomOccupancy, Snapshot};
pub use query::SlotQuery;
pub use types::{
    Batch, BatchRequest, ConflictReport, DayOfWeek, MultiPoolRequest, Outcome, Person, PersonId,
    RoomId, Slot, Solution, Suggestions, TargetSpec, TimetableEntry,
};

/// Batch count checks shared by every entry point: `requested >= 1` and
/// `max >= requested` when a ceiling is given.
pub fn validate_batch_counts(requested: u32, max: Option<u32>) -> Result<(), InvalidRequest> {
    if requested == 0 {
        return Err(InvalidRequest::ZeroBatches);
    }
    if let Some(max) = max {
        if max < requested {
            return Err(InvalidRequest::MaxBelowRequest {
                requested: requested as usize,
                max: max as usize,
            });
        }
    }
    Ok(())
}

/// Runs a batch search against a published snapshot.
#[async_trait]
pub trait BatchSearch: Send + Sync + 'static {
    async fn search(&self, snapshot: Arc<Snapshot>, req: BatchRequest) -> anyhow::Result<Outcome>;
}
