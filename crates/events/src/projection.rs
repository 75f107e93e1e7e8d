use crate::{Event, EventEnvelope};

/// A projection builds a read model from an append-only event stream.
///
/// Read models are disposable: they can be dropped and rebuilt by replaying
/// the store. Projections must be idempotent, since the same envelope may be
/// delivered more than once; tracking the last applied `sequence_number` per
/// aggregate is the usual way to get there.
///
/// Storage of the read model is an infra concern; this trait only describes
/// how an envelope is folded into it. Interior mutability lets one projection
/// be shared between the command path and a background consumer.
pub trait Projection: Send + Sync {
    type Ev: Event;
    type Error: core::fmt::Debug + Send + Sync + 'static;

    /// Fold one envelope into the read model.
    ///
    /// Envelopes already seen for their aggregate are skipped without error.
    fn apply(&self, envelope: &EventEnvelope<Self::Ev>) -> Result<(), Self::Error>;
}
