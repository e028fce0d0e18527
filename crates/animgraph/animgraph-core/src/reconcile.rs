//! Merging freshly imported transitions with those already present in a
//! target graph.

use crate::model::Graph;

/// Append `existing` after `imported`.
///
/// No transition de-duplication, no state identity reconciliation and no
/// conflict detection: callers that need a set-like merge must filter before
/// materializing. `existing`'s blend tree ids are re-based so sharing within
/// either side survives.
pub fn merge(imported: Graph, existing: Graph) -> Graph {
    let mut merged = imported;
    merged.append(existing);
    merged
}
