//! Mutation hooks
//!
//! Observers notified after every successful insert, update, or delete.
//! Each event carries the type tag the row was written under.

/// Kind of mutation that happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Insert,
    Update,
    Delete,
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationKind::Insert => write!(f, "insert"),
            MutationKind::Update => write!(f, "update"),
            MutationKind::Delete => write!(f, "delete"),
        }
    }
}

/// A committed mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationEvent {
    pub kind: MutationKind,
    /// Type tag of the written record
    pub data_type: String,
    /// Primary key of the affected row
    pub id: u64,
}

/// Observer of committed mutations
pub trait MutationHook: Send + Sync {
    fn on_mutation(&self, event: &MutationEvent);
}
