//! Ordering guard for overlapping data loads.
//!
//! Every load is stamped with a generation when issued. A response is applied
//! only if it is newer than the last applied one, so a slow response can never
//! overwrite state from a load that was issued after it.

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshGuard {
    issued: u64,
    applied: u64,
}

impl RefreshGuard {
    /// Stamp a new load.
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Whether a response for `generation` should replace current state.
    /// Records it as applied when it does.
    pub fn accept(&mut self, generation: u64) -> bool {
        if generation <= self.applied || generation > self.issued {
            return false;
        }
        self.applied = generation;
        true
    }

    /// Loads issued but not yet answered or superseded.
    pub fn in_flight(&self) -> bool {
        self.issued > self.applied
    }

    pub fn applied(&self) -> u64 {
        self.applied
    }
}
