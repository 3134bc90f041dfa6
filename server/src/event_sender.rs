use crossbeam_channel::{self as channel, Receiver, Sender};

use crate::transport::TransportError;

/// Creates a connected [`EventSender`] / [`EventQueue`] pair
pub fn event_channel<S>() -> (EventSender<S>, EventQueue<S>) {
    let (sender, receiver) = channel::unbounded();
    (EventSender { sender }, EventQueue { receiver })
}

/// Submits simulation events for later dispatch. Can be cloned and handed
/// to other threads.
pub struct EventSender<S> {
    sender: Sender<S>,
}

impl<S> Clone for EventSender<S> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<S> EventSender<S> {
    pub fn submit(&self, event: S) -> Result<(), TransportError> {
        self.sender
            .send(event)
            .map_err(|_| TransportError::Disconnected)
    }
}

/// Receiving side of [`event_channel`], drained by the tick loop
pub struct EventQueue<S> {
    receiver: Receiver<S>,
}

impl<S> EventQueue<S> {
    /// Everything submitted so far, in submission order per sender
    pub fn drain(&self) -> Vec<S> {
        self.receiver.try_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
