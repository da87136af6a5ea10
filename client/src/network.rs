use log::{debug, info};
use shared::NEWLINE;
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

pub struct Client {
    stream: TcpStream,
}

impl Client {
    pub async fn connect(addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = TcpStream::connect(addr).await?;
        info!("Connected to {}", stream.peer_addr()?);
        Ok(Client { stream })
    }

    /// Relays stdin to the server and the server to stdout until either side ends.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let (reader, writer) = self.stream.into_split();

        tokio::select! {
            result = forward_input(tokio::io::stdin(), writer) => {
                result?;
                info!("Input closed");
            }
            result = relay_output(reader, tokio::io::stdout()) => {
                result?;
                info!("Server closed the connection");
            }
        }

        Ok(())
    }
}

/// Frames each input line with the network newline and sends it.
///
/// Returns when `input` reaches end of file.
pub async fn forward_input<R, W>(input: R, mut server: W) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(input).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end_matches('\r');
        debug!("Sending {:?}", line);
        server.write_all(frame(line).as_bytes()).await?;
    }
    server.shutdown().await
}

/// Copies server output to `out` as it arrives.
pub async fn relay_output<R, W>(mut server: R, mut out: W) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; 1024];

    loop {
        let n = server.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        out.write_all(&buf[..n]).await?;
        out.flush().await?;
    }
}

pub fn frame(line: &str) -> String {
    format!("{}{}", line, NEWLINE)
}
