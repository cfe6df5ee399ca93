use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use relay_protocol::Framing;
use relay_server::logger::{Logger, Severity};
use relay_server::transport::{write_message, MessageReader};
use relay_server::{Server, ServerState};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

const READ_TIMEOUT: Duration = Duration::from_secs(2);
const QUIET_PERIOD: Duration = Duration::from_millis(200);

#[derive(Default)]
struct RecordingLogger {
    entries: Mutex<Vec<(Severity, String)>>,
}

impl RecordingLogger {
    fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .any(|(s, text)| *s == severity && text.contains(needle))
    }
}

impl Logger for RecordingLogger {
    fn log(&self, severity: Severity, text: &str) {
        self.entries.lock().unwrap().push((severity, text.to_string()));
    }
}

struct Relay {
    server: Arc<Server>,
    addr: SocketAddr,
    logger: Arc<RecordingLogger>,
    task: JoinHandle<()>,
}

impl Relay {
    async fn start(framing: Framing) -> Result<Self> {
        let logger = Arc::new(RecordingLogger::default());
        let server = Server::new(framing, logger.clone());
        let listener = server.bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let serving = Arc::clone(&server);
        let task = tokio::spawn(async move { serving.serve(listener).await });

        Ok(Self {
            server,
            addr,
            logger,
            task,
        })
    }

    /// Wait until exactly `n` connections are registered.
    async fn wait_for_connections(&self, n: usize) -> Result<()> {
        timeout(READ_TIMEOUT, async {
            while self.server.connection_count().await != n {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .with_context(|| format!("registry never reached {n} connections"))
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Client {
    reader: MessageReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: MessageReader::new(reader, Framing::LengthPrefixed),
            writer,
        })
    }

    async fn send(&mut self, message: &str) -> Result<()> {
        write_message(&mut self.writer, Framing::LengthPrefixed, message).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<String> {
        timeout(READ_TIMEOUT, self.reader.read_message())
            .await
            .context("timed out waiting for a message")??
            .context("relay closed the connection")
    }

    /// Nothing else arrives for a short while.
    async fn assert_quiet(&mut self) {
        let next = timeout(QUIET_PERIOD, self.reader.read_message()).await;
        assert!(next.is_err(), "unexpected extra frame: {next:?}");
    }
}

#[tokio::test]
async fn lone_client_hears_its_own_message_once() -> Result<()> {
    let relay = Relay::start(Framing::LengthPrefixed).await?;
    let mut alice = Client::connect(relay.addr).await?;
    relay.wait_for_connections(1).await?;

    alice.send("hello").await?;

    assert_eq!(alice.recv().await?, "hello");
    alice.assert_quiet().await;
    Ok(())
}

#[tokio::test]
async fn every_client_receives_every_broadcast() -> Result<()> {
    let relay = Relay::start(Framing::LengthPrefixed).await?;

    let mut clients = Vec::new();
    for _ in 0..4 {
        clients.push(Client::connect(relay.addr).await?);
    }
    relay.wait_for_connections(4).await?;

    clients[2].send("from the third").await?;

    for client in &mut clients {
        assert_eq!(client.recv().await?, "from the third");
    }
    Ok(())
}

#[tokio::test]
async fn departed_client_is_no_longer_targeted() -> Result<()> {
    let relay = Relay::start(Framing::LengthPrefixed).await?;
    let mut alice = Client::connect(relay.addr).await?;
    let mut bob = Client::connect(relay.addr).await?;
    relay.wait_for_connections(2).await?;

    alice.send("hi").await?;
    assert_eq!(alice.recv().await?, "hi");
    assert_eq!(bob.recv().await?, "hi");

    drop(alice);
    relay.wait_for_connections(1).await?;
    assert!(relay.logger.contains(Severity::Warn, "Disconnecting from"));

    bob.send("bye").await?;
    assert_eq!(bob.recv().await?, "bye");
    bob.assert_quiet().await;
    Ok(())
}

#[tokio::test]
async fn churn_leaves_only_open_connections_registered() -> Result<()> {
    let relay = Relay::start(Framing::LengthPrefixed).await?;

    let mut clients = Vec::new();
    for _ in 0..10 {
        clients.push(Client::connect(relay.addr).await?);
    }
    relay.wait_for_connections(10).await?;

    let leaving: Vec<Client> = clients.drain(..5).collect();
    let closers: Vec<_> = leaving
        .into_iter()
        .map(|mut client| {
            tokio::spawn(async move {
                let _ = client.writer.shutdown().await;
                drop(client);
            })
        })
        .collect();
    for closer in closers {
        closer.await?;
    }
    relay.wait_for_connections(5).await?;

    clients[0].send("still five").await?;
    for client in &mut clients {
        assert_eq!(client.recv().await?, "still five");
    }
    Ok(())
}

#[tokio::test]
async fn bind_conflict_logs_fatal_and_never_listens() -> Result<()> {
    let blocker = TcpListener::bind("127.0.0.1:0").await?;
    let addr = blocker.local_addr()?;

    let logger = Arc::new(RecordingLogger::default());
    let server = Server::new(Framing::LengthPrefixed, logger.clone());
    let mut states = server.subscribe_state();

    timeout(READ_TIMEOUT, server.start(&addr.to_string()))
        .await
        .context("start should return after a bind failure")?;

    assert_eq!(server.state(), ServerState::Stopped);
    assert!(logger.contains(Severity::Fatal, "could not be started"));
    assert!(!logger.contains(Severity::Info, "Server started"));
    assert_ne!(*states.borrow_and_update(), ServerState::Listening);
    Ok(())
}

#[tokio::test]
async fn serving_reports_listening_state() -> Result<()> {
    let relay = Relay::start(Framing::LengthPrefixed).await?;
    let mut states = relay.server.subscribe_state();

    timeout(
        READ_TIMEOUT,
        states.wait_for(|state| *state == ServerState::Listening),
    )
    .await??;
    assert!(relay.logger.contains(Severity::Info, "Server started!"));
    Ok(())
}

#[tokio::test]
async fn line_framing_relays_plain_text() -> Result<()> {
    let relay = Relay::start(Framing::Line).await?;

    let stream = TcpStream::connect(relay.addr).await?;
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    relay.wait_for_connections(1).await?;

    writer.write_all(b"hello\r\n\nworld\n").await?;

    let mut line = String::new();
    timeout(READ_TIMEOUT, reader.read_line(&mut line)).await??;
    assert_eq!(line, "hello\n");

    line.clear();
    timeout(READ_TIMEOUT, reader.read_line(&mut line)).await??;
    assert_eq!(line, "world\n");
    Ok(())
}

#[tokio::test]
async fn garbage_frame_drops_only_the_offender() -> Result<()> {
    let relay = Relay::start(Framing::LengthPrefixed).await?;
    let mut good = Client::connect(relay.addr).await?;
    let mut bad = Client::connect(relay.addr).await?;
    relay.wait_for_connections(2).await?;

    bad.writer.write_all(&[0x00, 0x02, 0xff, 0xfe]).await?;
    relay.wait_for_connections(1).await?;
    assert!(relay.logger.contains(Severity::Warn, "Connection lost"));

    good.send("unaffected").await?;
    assert_eq!(good.recv().await?, "unaffected");
    Ok(())
}
