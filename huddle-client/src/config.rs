use crate::transport::TransportConfig;

/// What to do with a remote candidate that arrives before the session it
/// belongs to can accept it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EarlyCandidatePolicy {
    /// Discard and log. Candidates racing ahead of session creation are lost.
    #[default]
    Drop,
    /// Queue per remote peer and replay once the remote description is set.
    Buffer,
}

#[derive(Debug, Clone, Default)]
pub struct CoordinatorConfig {
    pub transport: TransportConfig,
    pub early_candidates: EarlyCandidatePolicy,
}

impl CoordinatorConfig {
    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_early_candidates(mut self, policy: EarlyCandidatePolicy) -> Self {
        self.early_candidates = policy;
        self
    }
}
