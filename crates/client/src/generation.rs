//! Request generations for overlapping fetches.
//!
//! Each fetch takes a token when it is issued. When its response arrives it
//! is applied only if no newer fetch has been issued in the meantime, so the
//! last issued request wins regardless of the order responses resolve in.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationToken(u64);

#[derive(Debug, Default)]
pub struct Generation {
    latest: u64,
    pending: bool,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token, superseding all earlier ones.
    pub fn start(&mut self) -> GenerationToken {
        self.latest = self.latest.wrapping_add(1);
        self.pending = true;
        GenerationToken(self.latest)
    }

    pub fn is_current(&self, token: GenerationToken) -> bool {
        token.0 == self.latest
    }

    /// Mark `token` as resolved. Returns `false` for a stale token, whose
    /// response must be discarded.
    pub fn finish(&mut self, token: GenerationToken) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.pending = false;
        true
    }

    /// Whether the latest issued request is still outstanding.
    pub fn is_pending(&self) -> bool {
        self.pending
    }
}
