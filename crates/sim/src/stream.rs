//! Client end of a simulated subscribe stream.

use async_trait::async_trait;
use gnmi_primitives::transport::{SubscribeStream, TransportError};
use gnmi_primitives::wire::{ClientMessage, ServerMessage};
use tokio::sync::mpsc;

/// Default channel buffer size.
pub(crate) const DEFAULT_BUFFER_SIZE: usize = 64;

/// In-memory [`SubscribeStream`] backed by a pair of mpsc channels; the
/// device end is held by a session task.
#[derive(Debug)]
pub struct SimStream {
    /// `None` once closed, which ends the session task.
    tx: Option<mpsc::Sender<ClientMessage>>,
    rx: mpsc::Receiver<ServerMessage>,
}

/// Device end of the channel pair.
#[derive(Debug)]
pub(crate) struct DeviceEnd {
    pub requests: mpsc::Receiver<ClientMessage>,
    pub responses: mpsc::Sender<ServerMessage>,
}

impl SimStream {
    pub(crate) fn pair() -> (Self, DeviceEnd) {
        let (tx, requests) = mpsc::channel(DEFAULT_BUFFER_SIZE);
        let (responses, rx) = mpsc::channel(DEFAULT_BUFFER_SIZE);

        (
            Self { tx: Some(tx), rx },
            DeviceEnd {
                requests,
                responses,
            },
        )
    }
}

#[async_trait]
impl SubscribeStream for SimStream {
    async fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError> {
        let Some(tx) = &self.tx else {
            return Err(TransportError::Send("stream closed".to_owned()));
        };

        tx.send(message.clone())
            .await
            .map_err(|_| TransportError::Send("device hung up".to_owned()))
    }

    async fn recv(&mut self) -> Result<Option<ServerMessage>, TransportError> {
        Ok(self.rx.recv().await)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        drop(self.tx.take());
        self.rx.close();
        Ok(())
    }
}
