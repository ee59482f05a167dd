/// Lifecycle of an asynchronous result sink
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SinkState {
    /// Created, request not yet issued
    Idle,
    /// Request issued, accepting results
    Active,
    /// A batch is being delivered to the host
    Flushing,
    /// Terminal status reported with success
    Completed,
    /// Terminal status reported with a failure code
    Failed,
    /// Cancelled by the host
    Cancelled,
}

impl SinkState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SinkState::Completed | SinkState::Failed | SinkState::Cancelled)
    }
}

impl Default for SinkState {
    fn default() -> Self {
        SinkState::Idle
    }
}
