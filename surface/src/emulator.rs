//! Surface emulator: the protocol core and surface state shared between the transport loop
//! and local input.
//!
//! Every received message and every local event is processed while holding the state lock,
//! so the host never observes a half-applied update. Produced messages are queued on a
//! channel and written to the transport by [`Emulator::run`].

use std::sync::Arc;

use bytes::Bytes;
use futures::{channel::mpsc, pin_mut, SinkExt, Stream, StreamExt};
use lc_protocol::{
    packet::HEADER, Action, ChannelMessage, CoreConfig, FrameEvent, ProtocolCore, SurfaceState,
    Transmit,
};
use tokio::{select, sync::Mutex};

use crate::{
    display::Snapshot, input::InputEvent, utils::recorder::Message, LcError, Transport,
};

/// Queues outgoing messages for the transport loop
#[derive(Clone, Debug)]
pub struct ChannelTx(pub mpsc::UnboundedSender<Bytes>);

impl Transmit for ChannelTx {
    fn transmit(&mut self, msg: Bytes) {
        if self.0.unbounded_send(msg).is_err() {
            log::warn!("transport loop is gone, dropping outgoing message");
        }
    }
}

struct Shared {
    core: ProtocolCore,
    surface: SurfaceState,
}

#[derive(Clone)]
pub struct Emulator {
    shared: Arc<Mutex<Shared>>,
    tx: ChannelTx,
}

impl Emulator {
    /// Creates an emulator along with the receiving end of its outgoing messages
    pub fn new(config: CoreConfig) -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded();
        let shared = Shared {
            core: ProtocolCore::new(config),
            surface: SurfaceState::new(),
        };

        let emulator = Emulator {
            shared: Arc::new(Mutex::new(shared)),
            tx: ChannelTx(tx),
        };
        (emulator, rx)
    }

    /// Processes one complete message received from the host
    pub async fn handle_message(&self, msg: &Bytes) -> Result<(), LcError> {
        let status = match msg.first() {
            Some(&status) => status,
            None => return Ok(()),
        };

        if status == HEADER[0] {
            let mut tx = self.tx.clone();
            let mut shared = self.shared.lock().await;
            let Shared { core, surface } = &mut *shared;
            let event = core.feed_sysex(msg, surface, &mut tx);
            if event != FrameEvent::Completed {
                log::trace!("sysex ended with {:?}", event);
            }
            return Ok(());
        }

        if status >= 0xF0 {
            log::trace!("ignoring system message {:02x?}", msg.as_ref());
            return Ok(());
        }

        let msg = ChannelMessage::from_bytes(msg.clone())?;
        let mut shared = self.shared.lock().await;
        let Shared { core, surface } = &mut *shared;
        match core.on_midi(&msg, surface) {
            Ok(Action::Unsupported) => log::trace!("unsupported message {:?}", msg),
            Ok(action) => log::trace!("{:?}", action),
            Err(e) => log::debug!("{:?}: {}", msg, e),
        }
        Ok(())
    }

    /// Applies a local input event, sending the resulting messages to the host
    pub async fn apply_input(&self, event: &InputEvent) -> Result<(), LcError> {
        let mut tx = self.tx.clone();
        let mut shared = self.shared.lock().await;
        let Shared { core, surface } = &mut *shared;
        event.apply(core, surface, &mut tx)?;
        Ok(())
    }

    pub async fn snapshot(&self) -> Snapshot {
        Snapshot::from(&self.shared.lock().await.surface)
    }

    /// A snapshot if the surface changed since the last call
    pub async fn take_snapshot(&self) -> Option<Snapshot> {
        Snapshot::take(&mut self.shared.lock().await.surface)
    }

    /// Device id in use, if one was detected or configured
    pub async fn device_id(&self) -> Option<u8> {
        self.shared.lock().await.core.identity().resolved()
    }

    /// Feeds the received side of a recorded session through the emulator, returning every
    /// message it produced. Recorded `Sent` lines are ignored.
    pub async fn replay<S>(
        &self,
        session: S,
        outgoing: &mut mpsc::UnboundedReceiver<Bytes>,
    ) -> Result<Vec<Bytes>, LcError>
    where
        S: Stream<Item = Message>,
    {
        pin_mut!(session);

        let mut produced = Vec::new();
        while let Some(msg) = session.next().await {
            if let Message::Received(msg) = msg {
                if let Err(e) = self.handle_message(&msg).await {
                    log::warn!("dropping message {:02x?}: {}", msg.as_ref(), e);
                }
            }
            while let Ok(Some(msg)) = outgoing.try_next() {
                produced.push(msg);
            }
        }

        Ok(produced)
    }

    /// Forwards messages between the transport and the emulator until the transport closes
    pub async fn run(
        &self,
        mut transport: Transport,
        mut outgoing: mpsc::UnboundedReceiver<Bytes>,
    ) -> Result<(), LcError> {
        loop {
            select! {
                msg = transport.next() => {
                    let msg = msg.ok_or(LcError::TransportClosed)??;
                    if let Err(e) = self.handle_message(&msg).await {
                        log::warn!("dropping message {:02x?}: {}", msg.as_ref(), e);
                    }
                },
                msg = outgoing.next() => {
                    match msg {
                        Some(msg) => transport.send(msg).await?,
                        None => return Ok(()),
                    }
                },
            }
        }
    }
}
