//! TCP connection to the game server
//!
//! A [`Connection`] owns the write half of the socket behind an async mutex so
//! that frames from concurrent senders never interleave. The read half is moved
//! into a background receive task that splits the byte stream into frames,
//! decodes them and pushes the results onto the dispatch queue. When the stream
//! ends or fails, the task enqueues a single [`NetworkEvent::Disconnected`] and
//! exits.

use crate::dispatch::{DispatchQueue, DispatchSender, NetworkEvent};
use log::{debug, error, info, warn};
use shared::{codec, read_length_prefix, EncodeError, FrameError, WireMessage, LENGTH_PREFIX_LEN};
use std::io;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("failed to connect to {addr}: {source}")]
    Unreachable {
        addr: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("connection is not open")]
    NotConnected,
    #[error("failed to encode message: {0}")]
    Encode(#[from] EncodeError),
    #[error("failed to write frame: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ConnectionState::Connecting,
            1 => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ConnectionState::Connecting => 0,
            ConnectionState::Connected => 1,
            ConnectionState::Disconnected => 2,
        }
    }
}

#[derive(Debug, Clone)]
struct SharedState(Arc<AtomicU8>);

impl SharedState {
    fn new(state: ConnectionState) -> Self {
        SharedState(Arc::new(AtomicU8::new(state.as_u8())))
    }

    fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: ConnectionState) {
        self.0.store(state.as_u8(), Ordering::Release);
    }
}

pub struct Connection {
    peer: String,
    writer: Arc<Mutex<OwnedWriteHalf>>,
    state: SharedState,
    receiver: JoinHandle<()>,
}

impl Connection {
    /// Opens a connection with a fresh dispatch queue of `queue_capacity`.
    pub async fn connect(
        host: &str,
        port: u16,
        queue_capacity: usize,
    ) -> Result<(Self, DispatchQueue<NetworkEvent>), ConnectError> {
        let (events, queue) = DispatchQueue::bounded(queue_capacity);
        let connection = Self::connect_with(host, port, events).await?;
        Ok((connection, queue))
    }

    /// Opens a connection that feeds an existing queue.
    pub async fn connect_with(
        host: &str,
        port: u16,
        events: DispatchSender<NetworkEvent>,
    ) -> Result<Self, ConnectError> {
        let addr = format!("{}:{}", host, port);
        let state = SharedState::new(ConnectionState::Connecting);

        info!("Connecting to {}...", addr);
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|source| ConnectError::Unreachable {
                addr: addr.clone(),
                source,
            })?;
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to disable Nagle on {}: {}", addr, e);
        }

        let (reader, writer) = stream.into_split();
        state.set(ConnectionState::Connected);
        info!("Connected to {}", addr);

        let receiver = tokio::spawn(receive_loop(reader, events, state.clone()));

        Ok(Connection {
            peer: addr,
            writer: Arc::new(Mutex::new(writer)),
            state,
            receiver,
        })
    }

    /// Encodes and writes one frame. Concurrent callers are serialized so
    /// each frame reaches the socket whole.
    pub async fn send(&self, message: &WireMessage) -> Result<(), SendError> {
        if self.state.get() != ConnectionState::Connected {
            return Err(SendError::NotConnected);
        }

        let frame = codec::encode_frame_message(message)?;
        let mut writer = self.writer.lock().await;
        if let Err(e) = write_frame(&mut *writer, &frame).await {
            warn!("Send of {} to {} failed: {}", message.kind(), self.peer, e);
            self.state.set(ConnectionState::Disconnected);
            return Err(SendError::Io(e));
        }

        debug!("Sent {} ({} bytes)", message.kind(), frame.len());
        Ok(())
    }

    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    pub fn is_connected(&self) -> bool {
        self.state.get() == ConnectionState::Connected
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Stops the receive task and shuts down the write half.
    pub async fn close(&self) {
        self.receiver.abort();
        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.shutdown().await {
            debug!("Shutdown of {} reported: {}", self.peer, e);
        }
        self.state.set(ConnectionState::Disconnected);
        info!("Closed connection to {}", self.peer);
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.receiver.abort();
    }
}

async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &[u8]) -> io::Result<()> {
    writer.write_all(frame).await?;
    writer.flush().await
}

/// Fills `buf` from `reader`, returning how many bytes arrived before EOF.
async fn read_full<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Reads one length-prefixed frame and returns its payload.
///
/// A clean EOF before the first prefix byte is [`FrameError::Closed`]; EOF
/// anywhere later is [`FrameError::Truncated`].
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, FrameError> {
    let mut prefix = [0u8; LENGTH_PREFIX_LEN];
    let got = read_full(reader, &mut prefix).await?;
    if got == 0 {
        return Err(FrameError::Closed);
    }
    if got < LENGTH_PREFIX_LEN {
        return Err(FrameError::Truncated {
            expected: LENGTH_PREFIX_LEN,
            actual: got,
        });
    }

    let len = read_length_prefix(prefix)?;
    let mut payload = vec![0u8; len];
    let got = read_full(reader, &mut payload).await?;
    if got < len {
        return Err(FrameError::Truncated {
            expected: len,
            actual: got,
        });
    }
    Ok(payload)
}

async fn receive_loop(
    mut reader: OwnedReadHalf,
    events: DispatchSender<NetworkEvent>,
    state: SharedState,
) {
    let reason = loop {
        match read_frame(&mut reader).await {
            Ok(payload) => match codec::decode(&payload) {
                Ok(message) => {
                    debug!("Received {} ({} bytes)", message.kind(), payload.len());
                    if events.enqueue(NetworkEvent::Message(message)).await.is_err() {
                        break "dispatch queue closed".to_string();
                    }
                }
                Err(e) => {
                    warn!("Dropping undecodable frame ({} bytes): {}", payload.len(), e);
                }
            },
            Err(FrameError::Closed) => {
                info!("Server closed the connection");
                break "connection closed by server".to_string();
            }
            Err(e) => {
                error!("Receive loop stopped: {}", e);
                break e.to_string();
            }
        }
    };

    state.set(ConnectionState::Disconnected);
    if events
        .enqueue(NetworkEvent::Disconnected { reason })
        .await
        .is_err()
    {
        debug!("Disconnect notice dropped; simulation already gone");
    }
}
