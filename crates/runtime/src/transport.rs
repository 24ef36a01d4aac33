//! Stdio transport for the bridge protocol.
//!
//! Frames are 4-byte little-endian length prefixes followed by a JSON body,
//! matching the framing used by the bridge on its stdin/stdout. The
//! transport splits into a sender half (used by the connection's writer
//! task) and a receiver half (a read loop pushing decoded values into an
//! unbounded channel).

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Writer half of a transport.
#[async_trait]
pub trait TransportSender: Send {
    /// Encodes and writes one frame.
    async fn send(&mut self, message: Value) -> Result<()>;
}

/// Reader half of a transport.
#[async_trait]
pub trait TransportReceiver: Send {
    /// Runs the read loop until EOF, a read error, or the consumer hangs up.
    async fn run(&mut self) -> Result<()>;
}

/// The pieces a [`Connection`](crate::Connection) needs from a transport.
pub struct TransportParts {
    pub sender: Box<dyn TransportSender>,
    pub receiver: Box<dyn TransportReceiver>,
    pub message_rx: mpsc::UnboundedReceiver<Value>,
}

/// Length-prefixed JSON transport over a pair of byte streams.
pub struct PipeTransport<W, R> {
    sender: PipeSender<W>,
    receiver: PipeReceiver<R>,
}

impl<W, R> PipeTransport<W, R>
where
    W: AsyncWrite + Unpin + Send + 'static,
    R: AsyncRead + Unpin + Send + 'static,
{
    /// Creates a transport over the given streams.
    ///
    /// Returns the transport and the receiver for decoded inbound frames.
    pub fn new(writer: W, reader: R) -> (Self, mpsc::UnboundedReceiver<Value>) {
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let transport = Self {
            sender: PipeSender { writer },
            receiver: PipeReceiver { reader, message_tx },
        };
        (transport, message_rx)
    }

    /// Splits into sender and receiver halves.
    pub fn into_parts(self) -> (PipeSender<W>, PipeReceiver<R>) {
        (self.sender, self.receiver)
    }

    /// Boxes the halves together with the message channel for a connection.
    pub fn into_transport_parts(self, message_rx: mpsc::UnboundedReceiver<Value>) -> TransportParts {
        let (sender, receiver) = self.into_parts();
        TransportParts {
            sender: Box::new(sender),
            receiver: Box::new(receiver),
            message_rx,
        }
    }
}

/// Writes length-prefixed JSON frames.
pub struct PipeSender<W> {
    writer: W,
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> TransportSender for PipeSender<W> {
    async fn send(&mut self, message: Value) -> Result<()> {
        let body = serde_json::to_vec(&message)?;
        let length = u32::try_from(body.len())
            .map_err(|_| Error::TransportError("Frame exceeds u32 length".to_string()))?;
        self.writer
            .write_all(&length.to_le_bytes())
            .await
            .map_err(|e| Error::TransportError(format!("Failed to write length prefix: {e}")))?;
        self.writer
            .write_all(&body)
            .await
            .map_err(|e| Error::TransportError(format!("Failed to write frame body: {e}")))?;
        self.writer
            .flush()
            .await
            .map_err(|e| Error::TransportError(format!("Failed to flush frame: {e}")))?;
        Ok(())
    }
}

/// Reads length-prefixed JSON frames and forwards them on a channel.
pub struct PipeReceiver<R> {
    reader: R,
    message_tx: mpsc::UnboundedSender<Value>,
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> TransportReceiver for PipeReceiver<R> {
    async fn run(&mut self) -> Result<()> {
        loop {
            let mut len_buf = [0u8; 4];
            self.reader
                .read_exact(&mut len_buf)
                .await
                .map_err(|e| Error::TransportError(format!("Failed to read length prefix: {e}")))?;
            let length = u32::from_le_bytes(len_buf) as usize;

            let mut body = vec![0u8; length];
            self.reader
                .read_exact(&mut body)
                .await
                .map_err(|e| Error::TransportError(format!("Failed to read frame body: {e}")))?;

            let value: Value = serde_json::from_slice(&body)
                .map_err(|e| Error::TransportError(format!("Malformed frame: {e}")))?;

            if self.message_tx.send(value).is_err() {
                // Consumer gone; clean shutdown.
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_writes_length_prefixed_frame() {
        let (mut our_read, their_write) = tokio::io::duplex(1024);
        let (their_read, _our_write) = tokio::io::duplex(1024);

        let (transport, _rx) = PipeTransport::new(their_write, their_read);
        let (mut sender, _receiver) = transport.into_parts();

        let message = serde_json::json!({"id": 1, "method": "open", "params": {"smart": true}});
        sender.send(message.clone()).await.unwrap();

        let mut len_buf = [0u8; 4];
        our_read.read_exact(&mut len_buf).await.unwrap();
        let length = u32::from_le_bytes(len_buf) as usize;

        let mut body = vec![0u8; length];
        our_read.read_exact(&mut body).await.unwrap();
        let received: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(received, message);
    }

    #[tokio::test]
    async fn receiver_forwards_frames_in_order() {
        let (_our_read, their_write) = tokio::io::duplex(4096);
        let (their_read, mut our_write) = tokio::io::duplex(4096);

        let (transport, mut rx) = PipeTransport::new(their_write, their_read);
        let (_sender, mut receiver) = transport.into_parts();
        let read_task = tokio::spawn(async move { receiver.run().await });

        let messages = vec![
            serde_json::json!({"id": 1, "data": null}),
            serde_json::json!({"type": 11041, "data": {"sender": "u1"}}),
            serde_json::json!({"id": 2, "data": {"ok": true}}),
        ];
        for msg in &messages {
            let body = serde_json::to_vec(msg).unwrap();
            our_write
                .write_all(&(body.len() as u32).to_le_bytes())
                .await
                .unwrap();
            our_write.write_all(&body).await.unwrap();
        }
        our_write.flush().await.unwrap();

        for expected in &messages {
            assert_eq!(&rx.recv().await.unwrap(), expected);
        }

        drop(our_write);
        drop(rx);
        let _ = read_task.await;
    }

    #[tokio::test]
    async fn truncated_length_prefix_is_an_error() {
        let (_our_read, their_write) = tokio::io::duplex(1024);
        let (their_read, mut our_write) = tokio::io::duplex(1024);

        let (transport, _rx) = PipeTransport::new(their_write, their_read);
        let (_sender, mut receiver) = transport.into_parts();

        our_write.write_all(&[0x01, 0x02]).await.unwrap();
        drop(our_write);

        let result = receiver.run().await;
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read length prefix")
        );
    }

    #[tokio::test]
    async fn closed_pipe_terminates_the_loop() {
        let (_our_read, their_write) = tokio::io::duplex(1024);
        let (their_read, our_write) = tokio::io::duplex(1024);

        let (transport, _rx) = PipeTransport::new(their_write, their_read);
        let (_sender, mut receiver) = transport.into_parts();

        drop(our_write);
        assert!(receiver.run().await.is_err());
    }

    #[tokio::test]
    async fn dropped_consumer_is_a_clean_shutdown() {
        let (_our_read, their_write) = tokio::io::duplex(1024);
        let (their_read, mut our_write) = tokio::io::duplex(1024);

        let (transport, rx) = PipeTransport::new(their_write, their_read);
        let (_sender, mut receiver) = transport.into_parts();
        drop(rx);

        let body = serde_json::to_vec(&serde_json::json!({"id": 1})).unwrap();
        our_write
            .write_all(&(body.len() as u32).to_le_bytes())
            .await
            .unwrap();
        our_write.write_all(&body).await.unwrap();
        our_write.flush().await.unwrap();

        assert!(receiver.run().await.is_ok());
    }
}
