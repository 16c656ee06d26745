//! Optimistic concurrency primitives for read-modify-write documents.

/// A document that carries a monotonically increasing write counter.
pub trait Versioned {
    /// Current version (number of committed writes).
    fn version(&self) -> u64;
}

/// The version a guarded write expects to replace.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExpectedVersion(pub u64);

impl ExpectedVersion {
    /// Expect whatever version `doc` was read at.
    pub fn of(doc: &impl Versioned) -> Self {
        Self(doc.version())
    }

    pub fn matches(self, actual: u64) -> bool {
        self.0 == actual
    }
}
