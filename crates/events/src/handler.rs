/// Execute an aggregate command in place (no IO, no persistence).
///
/// 1. **Decide**: `aggregate.handle(command)` produces events without mutating.
/// 2. **Evolve**: each event is applied to the aggregate.
///
/// Useful for tests and for replaying decisions inline. The persisted path
/// goes through the infra `CommandDispatcher`, which adds optimistic
/// concurrency and publication.
pub fn execute<A>(aggregate: &mut A, command: &A::Command) -> Result<Vec<A::Event>, A::Error>
where
    A: clubledger_core::Aggregate,
{
    let events = A::handle(aggregate, command)?;
    for ev in &events {
        A::apply(aggregate, ev);
    }
    Ok(events)
}
