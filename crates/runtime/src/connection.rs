//! Request/response correlation layer on top of the transport.
//!
//! Handles:
//! - Generating unique request ids
//! - Correlating responses with pending requests
//! - Distinguishing pushes (inbound messages) from responses
//! - Forwarding pushes to the registered consumer
//!
//! # Message flow
//!
//! 1. Caller invokes [`Connection::call`] with a method and params
//! 2. Connection assigns an id and registers a oneshot callback
//! 3. The request is queued to the writer task and sent over the transport
//! 4. The read loop receives frames, decodes them as [`Message`]
//! 5. Responses complete the matching callback; pushes go to the push sink

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::task::{Context, Poll};

use parking_lot::Mutex as ParkingLotMutex;
use serde_json::Value;
use tokio::sync::Mutex as TokioMutex;
use tokio::sync::{mpsc, oneshot};

use wecom_protocol::{ErrorPayload, Message, Push, Request, Response};

use crate::error::{Error, Result};
use crate::transport::{TransportParts, TransportReceiver, TransportSender};

/// Pending request callbacks keyed by request id.
type CallbackMap = Arc<TokioMutex<HashMap<u32, oneshot::Sender<Result<Value>>>>>;

/// RAII guard ensuring callback cleanup when a request future is dropped.
struct CancelGuard {
    id: u32,
    callbacks: CallbackMap,
    completed: bool,
}

impl CancelGuard {
    fn new(id: u32, callbacks: CallbackMap) -> Self {
        Self {
            id,
            callbacks,
            completed: false,
        }
    }

    fn complete(&mut self) {
        self.completed = true;
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        let id = self.id;
        let callbacks = Arc::clone(&self.callbacks);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if callbacks.lock().await.remove(&id).is_some() {
                    tracing::debug!(id, "removed orphaned request callback");
                }
            });
        }
    }
}

/// Future returned by [`Connection::call`] with cancellation cleanup.
struct ResponseFuture {
    rx: oneshot::Receiver<Result<Value>>,
    guard: CancelGuard,
}

impl Future for ResponseFuture {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(result) => {
                self.guard.complete();
                Poll::Ready(result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Connection to the bridge process.
///
/// Correlates requests with responses using sequential ids and oneshot
/// channels, and forwards unsolicited pushes to a single consumer taken
/// via [`take_pushes`](Connection::take_pushes).
pub struct Connection {
    /// Sequential request id counter.
    last_id: AtomicU32,
    /// Pending request callbacks keyed by request id.
    callbacks: CallbackMap,
    /// Queue of outbound frames consumed by the writer task.
    outbound_tx: mpsc::UnboundedSender<Value>,
    /// Writer half of the transport (taken by `run()`).
    transport_sender: Arc<TokioMutex<Option<Box<dyn TransportSender>>>>,
    /// Reader half of the transport (taken by `run()`).
    transport_receiver: Arc<TokioMutex<Option<Box<dyn TransportReceiver>>>>,
    /// Decoded inbound frames from the transport (taken by `run()`).
    message_rx: Arc<TokioMutex<Option<mpsc::UnboundedReceiver<Value>>>>,
    /// Receiver for outbound frames (taken by `run()`).
    outbound_rx: Arc<TokioMutex<Option<mpsc::UnboundedReceiver<Value>>>>,
    /// Sender for inbound pushes.
    push_tx: mpsc::UnboundedSender<Push>,
    /// Push consumer handed out once.
    push_rx: ParkingLotMutex<Option<mpsc::UnboundedReceiver<Push>>>,
}

impl Connection {
    /// Creates a connection over the given transport parts.
    pub fn new(parts: TransportParts) -> Self {
        let TransportParts {
            sender,
            receiver,
            message_rx,
        } = parts;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (push_tx, push_rx) = mpsc::unbounded_channel();

        Self {
            last_id: AtomicU32::new(0),
            callbacks: Arc::new(TokioMutex::new(HashMap::new())),
            outbound_tx,
            transport_sender: Arc::new(TokioMutex::new(Some(sender))),
            transport_receiver: Arc::new(TokioMutex::new(Some(receiver))),
            message_rx: Arc::new(TokioMutex::new(Some(message_rx))),
            outbound_rx: Arc::new(TokioMutex::new(Some(outbound_rx))),
            push_tx,
            push_rx: ParkingLotMutex::new(Some(push_rx)),
        }
    }

    /// Takes the push stream. Returns `None` after the first call.
    pub fn take_pushes(&self) -> Option<mpsc::UnboundedReceiver<Push>> {
        self.push_rx.lock().take()
    }

    /// Sends a method call to the bridge and awaits the response.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(id, method, "sending request");

        let (tx, rx) = oneshot::channel();
        self.callbacks.lock().await.insert(id, tx);
        let guard = CancelGuard::new(id, Arc::clone(&self.callbacks));

        let request = Request {
            id,
            method: method.to_string(),
            params,
        };
        let request_value = serde_json::to_value(&request)?;

        if self.outbound_tx.send(request_value).is_err() {
            tracing::error!("failed to queue request: outbound channel closed");
            return Err(Error::ChannelClosed);
        }

        ResponseFuture { rx, guard }.await
    }

    /// Runs the message dispatch loop.
    ///
    /// Spawns the transport reader and writer tasks, then dispatches decoded
    /// frames until the transport closes. Call once, from a spawned task.
    pub async fn run(self: &Arc<Self>) {
        let mut transport_receiver = self
            .transport_receiver
            .lock()
            .await
            .take()
            .expect("run() can only be called once - transport receiver already taken");

        let mut transport_sender = self
            .transport_sender
            .lock()
            .await
            .take()
            .expect("run() can only be called once - transport sender already taken");

        let mut outbound_rx = self
            .outbound_rx
            .lock()
            .await
            .take()
            .expect("run() can only be called once - outbound receiver already taken");

        let reader_handle = tokio::spawn(async move {
            if let Err(e) = transport_receiver.run().await {
                tracing::error!("transport read error: {e}");
            }
        });

        let writer_handle = tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                if let Err(e) = transport_sender.send(message).await {
                    tracing::error!("transport write error: {e}");
                    break;
                }
            }
        });

        let mut message_rx = self
            .message_rx
            .lock()
            .await
            .take()
            .expect("run() can only be called once - message receiver already taken");

        while let Some(message_value) = message_rx.recv().await {
            match serde_json::from_value::<Message>(message_value) {
                Ok(message) => {
                    if let Err(e) = self.dispatch_internal(message).await {
                        tracing::error!("error dispatching message: {e}");
                    }
                }
                Err(e) => {
                    tracing::error!("failed to parse message: {e}");
                }
            }
        }

        let _ = reader_handle.await;
        let _ = writer_handle.await;
    }

    /// Dispatch an incoming message (test-only public version).
    #[cfg(test)]
    pub async fn dispatch(self: &Arc<Self>, message: Message) -> Result<()> {
        self.dispatch_internal(message).await
    }

    async fn dispatch_internal(self: &Arc<Self>, message: Message) -> Result<()> {
        match message {
            Message::Response(response) => self.complete_request(response).await,
            Message::Push(push) => {
                if self.push_tx.send(push).is_err() {
                    tracing::debug!("push dropped: no consumer attached");
                }
                Ok(())
            }
            Message::Unknown(value) => {
                tracing::debug!(
                    "unknown message shape (ignored): {}",
                    serde_json::to_string(&value).unwrap_or_else(|_| "<unprintable>".to_string())
                );
                Ok(())
            }
        }
    }

    async fn complete_request(&self, response: Response) -> Result<()> {
        let callback = self
            .callbacks
            .lock()
            .await
            .remove(&response.id)
            .ok_or_else(|| {
                Error::ProtocolError(format!("No pending request for response id={}", response.id))
            })?;

        let result = match response.error {
            Some(error) => Err(remote_error(error)),
            None => Ok(response.data.unwrap_or(Value::Null)),
        };

        let _ = callback.send(result);
        Ok(())
    }
}

/// Converts an [`ErrorPayload`] from the bridge into [`Error::Remote`].
fn remote_error(error: ErrorPayload) -> Error {
    Error::Remote {
        name: error.name.unwrap_or_else(|| "Error".to_string()),
        message: error.message,
        code: error.code,
    }
}
