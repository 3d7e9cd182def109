//! Advisory observability hook for resolution progress.
//!
//! Purely informational; implementations must not influence resolution.

use crate::types::Gav;

/// Notified as merges and downloads happen during resolution.
///
/// All methods have no-op defaults so implementors override only what they
/// observe.
pub trait ResolutionListener: Send + Sync {
    fn property_merged(&self, _key: &str, _value: &str) {}

    fn dependency_management_merged(&self, _gav: &Gav) {}

    fn bom_imported(&self, _bom: &Gav, _declared_in: &Gav) {}

    fn parent_resolved(&self, _parent: &Gav, _child: &Gav) {}
}

/// The default listener: observes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl ResolutionListener for NoopListener {}
