/// Result of feeding one event to a transition function.
///
/// The event-processing queue treats these three outcomes differently:
/// `Applied` events are consumed, `Requeue` events go back to the tail of
/// the queue to be retried once more state has arrived, and `Dropped`
/// events are discarded for good — either because they are a harmless
/// duplicate of something already applied, or because applying them would
/// violate an invariant the agent can't locally repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Requeue,
    Dropped,
}

impl ApplyOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }

    pub fn should_requeue(self) -> bool {
        matches!(self, Self::Requeue)
    }
}
