//! Server network layer: connection multiplexing and the main event loop

use crate::client_manager::ClientId;
use crate::config::ServerConfig;
use crate::dictionary::Dictionary;
use crate::error::ServerError;
use crate::lobby::Lobby;
use log::{debug, error, info, warn};
use shared::LineReader;
use std::collections::HashMap;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Messages sent from connection reader tasks to the multiplexer
#[derive(Debug)]
enum ConnectionEvent {
    Line { client: ClientId, line: String },
    Closed { client: ClientId },
}

impl ConnectionEvent {
    fn client(&self) -> ClientId {
        match self {
            ConnectionEvent::Line { client, .. } | ConnectionEvent::Closed { client } => *client,
        }
    }
}

/// One unit of work handed to the event loop
#[derive(Debug)]
pub enum Readiness {
    Incoming { stream: TcpStream, addr: SocketAddr },
    Line { client: ClientId, line: String },
    Closed { client: ClientId },
}

impl From<ConnectionEvent> for Readiness {
    fn from(event: ConnectionEvent) -> Self {
        match event {
            ConnectionEvent::Line { client, line } => Readiness::Line { client, line },
            ConnectionEvent::Closed { client } => Readiness::Closed { client },
        }
    }
}

/// Reader and writer tasks serving one client socket
#[derive(Debug)]
struct Connection {
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Connection {
    fn abort(&self) {
        self.reader.abort();
        self.writer.abort();
    }
}

/// Watches the listening socket and every client connection.
///
/// Each watched connection has a reader task that frames lines and queues
/// them here, and a writer task draining the client's outbox; the tasks share
/// the server's single thread and never touch game state. `wait_ready` is the
/// only place the server suspends.
pub struct Multiplexer {
    listener: TcpListener,
    watched: HashMap<ClientId, Connection>,
    events_tx: mpsc::UnboundedSender<ConnectionEvent>,
    events_rx: mpsc::UnboundedReceiver<ConnectionEvent>,
    max_line_len: usize,
    outbox_capacity: usize,
}

impl Multiplexer {
    /// Creates the listening socket on all interfaces.
    pub fn listen(config: &ServerConfig) -> Result<Self, ServerError> {
        let port = config.port;
        let listener = create_listener(port, config.backlog)
            .map_err(|source| ServerError::Listen { port, source })?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Ok(Self {
            listener,
            watched: HashMap::new(),
            events_tx,
            events_rx,
            max_line_len: config.max_line_len,
            outbox_capacity: config.outbox_capacity,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Starts serving `client`: lines from `reader` are queued as events and
    /// the returned outbox feeds `writer`.
    pub fn watch<R, W>(&mut self, client: ClientId, reader: R, writer: W) -> mpsc::Sender<String>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let events = self.events_tx.clone();
        let reader = tokio::spawn(read_lines(client, reader, self.max_line_len, events));
        let (outbox, writer) = spawn_writer(client, writer, self.outbox_capacity);

        if let Some(previous) = self.watched.insert(client, Connection { reader, writer }) {
            previous.abort();
        }
        outbox
    }

    /// Stops both tasks of `client`, which drops and closes its socket.
    pub fn unwatch(&mut self, client: ClientId) -> bool {
        match self.watched.remove(&client) {
            Some(connection) => {
                connection.abort();
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    fn is_watched(&self, client: ClientId) -> bool {
        self.watched.contains_key(&client)
    }

    #[cfg(test)]
    fn watched_len(&self) -> usize {
        self.watched.len()
    }

    /// Blocks until a connection is pending or a watched client has input.
    ///
    /// The listening socket is checked first on every wake. Events from
    /// clients that were unwatched after queueing them are dropped, and
    /// transient accept errors are retried.
    ///
    /// Client events come out in the order their reader tasks queued them,
    /// not ordered by socket. Since accepting always wins, a steady stream of
    /// new connections delays line events until the backlog drains.
    pub async fn wait_ready(&mut self) -> Result<Readiness, ServerError> {
        loop {
            tokio::select! {
                biased;

                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => return Ok(Readiness::Incoming { stream, addr }),
                    Err(e) if is_transient(&e) => {
                        warn!("accept: {}", e);
                    }
                    Err(e) => return Err(ServerError::Accept(e)),
                },

                Some(event) = self.events_rx.recv() => {
                    let client = event.client();
                    if self.watched.contains_key(&client) {
                        return Ok(event.into());
                    }
                    debug!("Dropping event for unwatched client {}", client);
                }
            }
        }
    }
}

fn create_listener(port: u16, backlog: u32) -> io::Result<TcpListener> {
    let socket = TcpSocket::new_v4()?;
    socket.set_reuseaddr(true)?;
    socket.bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))?;
    socket.listen(backlog)
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}

/// Reader task: forwards complete lines until the peer leaves.
async fn read_lines<R>(
    client: ClientId,
    reader: R,
    max_line_len: usize,
    events: mpsc::UnboundedSender<ConnectionEvent>,
) where
    R: AsyncRead + Unpin,
{
    let mut lines = LineReader::new(reader, max_line_len);

    loop {
        match lines.read_line().await {
            Ok(Some(line)) => {
                debug!("[{}] Found newline {:?}", client, line);
                if events.send(ConnectionEvent::Line { client, line }).is_err() {
                    return;
                }
            }
            Ok(None) => {
                debug!("[{}] Read 0 bytes", client);
                let _ = events.send(ConnectionEvent::Closed { client });
                return;
            }
            Err(e) => {
                warn!("[{}] Read failed: {}", client, e);
                let _ = events.send(ConnectionEvent::Closed { client });
                return;
            }
        }
    }
}

/// Spawns the writer task for one connection and returns its outbox.
///
/// The task exits on the first failed write; from then on sends to the
/// returned channel fail, which is how a dead peer is detected. At most
/// `capacity` messages wait while a write is blocked, so a peer that stops
/// reading fills the outbox instead of server memory. Dropping the sender
/// flushes what is queued and shuts the write half down.
fn spawn_writer<W>(
    client: ClientId,
    writer: W,
    capacity: usize,
) -> (mpsc::Sender<String>, JoinHandle<()>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<String>(capacity);

    let handle = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(message) = rx.recv().await {
            if let Err(e) = writer.write_all(message.as_bytes()).await {
                warn!("Write to client {} failed: {}", client, e);
                return;
            }
        }
        let _ = writer.shutdown().await;
    });

    (tx, handle)
}

/// Main server coordinating connections and the game
pub struct Server {
    mux: Multiplexer,
    lobby: Lobby,
}

impl Server {
    pub async fn bind(config: ServerConfig, dictionary: Dictionary) -> Result<Self, ServerError> {
        let mux = Multiplexer::listen(&config)?;
        let addr = mux.local_addr().map_err(|source| ServerError::Listen {
            port: config.port,
            source,
        })?;
        info!("Server listening on {}", addr);

        Ok(Server {
            mux,
            lobby: Lobby::new(dictionary, &config),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.mux.local_addr()
    }

    /// Main server loop; returns only if the listening socket fails.
    pub async fn run(mut self) -> Result<(), ServerError> {
        info!("Server started successfully");

        loop {
            let ready = match self.mux.wait_ready().await {
                Ok(ready) => ready,
                Err(e) => {
                    error!("Server stopping: {}", e);
                    return Err(e);
                }
            };

            match ready {
                Readiness::Incoming { stream, addr } => self.accept(stream, addr),
                Readiness::Line { client, line } => self.lobby.handle_line(client, &line),
                Readiness::Closed { client } => self.lobby.handle_disconnect(client),
            }

            for client in self.lobby.take_closed() {
                self.mux.unwatch(client);
            }
        }
    }

    fn accept(&mut self, stream: TcpStream, addr: SocketAddr) {
        info!("Connection from {}", addr);
        let (reader, writer) = stream.into_split();
        let client = self.lobby.allocate_id();

        let outbox = self.mux.watch(client, reader, writer);
        self.lobby.admit(client, addr, outbox);
    }
}
