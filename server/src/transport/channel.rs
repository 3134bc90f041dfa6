use crossbeam_channel::{self as channel, Receiver, Sender, TryRecvError, TrySendError};

use tessera_shared::ConnectionKey;

use super::{PacketReceiver, PacketSender, TransportError};

type Packet = (ConnectionKey, Box<[u8]>);

/// In-process packet queues. The tick loop gets the sender/receiver pair,
/// the network side gets the [`IoEndpoint`].
pub struct PacketChannel;

impl PacketChannel {
    pub fn unbounded() -> (Box<dyn PacketSender>, Box<dyn PacketReceiver>, IoEndpoint) {
        let (outgoing_sender, outgoing_receiver) = channel::unbounded();
        let (incoming_sender, incoming_receiver) = channel::unbounded();
        Self::wire(outgoing_sender, outgoing_receiver, incoming_sender, incoming_receiver)
    }

    /// Queues that hold at most `capacity` packets in each direction.
    /// Packets beyond that are dropped, never waited on.
    pub fn bounded(
        capacity: usize,
    ) -> (Box<dyn PacketSender>, Box<dyn PacketReceiver>, IoEndpoint) {
        let (outgoing_sender, outgoing_receiver) = channel::bounded(capacity);
        let (incoming_sender, incoming_receiver) = channel::bounded(capacity);
        Self::wire(outgoing_sender, outgoing_receiver, incoming_sender, incoming_receiver)
    }

    fn wire(
        outgoing_sender: Sender<Packet>,
        outgoing_receiver: Receiver<Packet>,
        incoming_sender: Sender<Packet>,
        incoming_receiver: Receiver<Packet>,
    ) -> (Box<dyn PacketSender>, Box<dyn PacketReceiver>, IoEndpoint) {
        (
            Box::new(ChannelSender {
                sender: outgoing_sender,
            }),
            Box::new(ChannelReceiver {
                receiver: incoming_receiver,
            }),
            IoEndpoint {
                incoming: incoming_sender,
                outgoing: outgoing_receiver,
            },
        )
    }
}

struct ChannelSender {
    sender: Sender<Packet>,
}

impl PacketSender for ChannelSender {
    fn send(&self, connection: &ConnectionKey, payload: &[u8]) -> Result<(), TransportError> {
        try_send(&self.sender, *connection, payload)
    }
}

struct ChannelReceiver {
    receiver: Receiver<Packet>,
}

impl PacketReceiver for ChannelReceiver {
    fn receive(&mut self) -> Result<Option<Packet>, TransportError> {
        match self.receiver.try_recv() {
            Ok(packet) => Ok(Some(packet)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TransportError::Disconnected),
        }
    }
}

/// The network side of a [`PacketChannel`]
#[derive(Clone)]
pub struct IoEndpoint {
    incoming: Sender<Packet>,
    outgoing: Receiver<Packet>,
}

impl IoEndpoint {
    /// Hands a payload received from `connection` to the tick loop
    pub fn deliver(&self, connection: ConnectionKey, payload: &[u8]) -> Result<(), TransportError> {
        try_send(&self.incoming, connection, payload)
    }

    /// Drains every payload the tick loop has sent so far
    pub fn take_outgoing(&self) -> Vec<Packet> {
        self.outgoing.try_iter().collect()
    }

    pub fn outgoing_len(&self) -> usize {
        self.outgoing.len()
    }
}

fn try_send(
    sender: &Sender<Packet>,
    connection: ConnectionKey,
    payload: &[u8],
) -> Result<(), TransportError> {
    sender
        .try_send((connection, payload.into()))
        .map_err(|error| match error {
            TrySendError::Full(_) => TransportError::QueueFull { connection },
            TrySendError::Disconnected(_) => TransportError::Disconnected,
        })
}
