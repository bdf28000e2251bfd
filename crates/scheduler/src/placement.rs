use jobsched_common::ids::WorkerId;

/// Strategy for choosing which live worker receives the next job (§4.2,
/// §9 Design Notes). Injected as an explicit collaborator rather than a
/// free function, matching the teacher's pattern of passing small strategy
/// objects (e.g. its circuit breaker registry) into the scheduling loop.
pub trait PlacementPolicy: Send + Sync {
    fn choose(&self, live: &[WorkerId]) -> Option<WorkerId>;
}

/// Default placement: stable, deterministic choice of the lexicographically
/// first live worker ID. Simple and sufficient since gang/topology/fair-share
/// placement are explicit Non-goals (§1).
pub struct StableFirstPolicy;

impl PlacementPolicy for StableFirstPolicy {
    fn choose(&self, live: &[WorkerId]) -> Option<WorkerId> {
        live.iter().min().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_lexicographically_first() {
        let policy = StableFirstPolicy;
        let live = vec![WorkerId::new("worker-b"), WorkerId::new("worker-a")];
        assert_eq!(policy.choose(&live), Some(WorkerId::new("worker-a")));
    }

    #[test]
    fn empty_pool_yields_none() {
        let policy = StableFirstPolicy;
        assert_eq!(policy.choose(&[]), None);
    }
}
