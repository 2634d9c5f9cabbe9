/// Cancellation for the receive loop. The token observes a crossbeam channel
/// whose only sender is held by the `Canceller`; cancelling drops the sender,
/// and a disconnected channel stays disconnected, so every clone of the token
/// sees the cancellation from then on.
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};

/// Owning side. Dropping it cancels as well.
#[derive(Debug)]
pub struct Canceller {
    tx: Sender<()>,
}

impl Canceller {
    pub fn cancel(self) {
        drop(self.tx);
    }
}

#[derive(Clone, Debug)]
pub struct CancelToken {
    rx: Receiver<()>,
}

impl CancelToken {
    /// Non-blocking check.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }
}

pub fn cancellation() -> (Canceller, CancelToken) {
    let (tx, rx) = bounded(0);
    (Canceller { tx }, CancelToken { rx })
}
