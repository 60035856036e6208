//! Test utilities: an in-memory client wired to `handle_connection`.

use boardd::bbs::{handle_connection, CommandProcessor, ConnectionSettings, Session};
use boardd::board::BoardRegistry;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;

/// Registry with the default five groups.
#[allow(dead_code)]
pub fn default_registry() -> Arc<BoardRegistry> {
    let config = boardd::config::Config::default();
    Arc::new(BoardRegistry::new(config.group_pairs()))
}

/// Read one CRLF-terminated reply. Multi-line replies use bare `\n` inside.
#[allow(dead_code)]
pub async fn read_reply<R: AsyncBufRead + Unpin>(reader: &mut R) -> Option<String> {
    let mut buf = Vec::new();
    loop {
        let n = reader.read_until(b'\n', &mut buf).await.expect("read");
        if n == 0 {
            return if buf.is_empty() { None } else { Some(String::from_utf8(buf).expect("utf8")) };
        }
        if buf.ends_with(b"\r\n") {
            buf.truncate(buf.len() - 2);
            return Some(String::from_utf8(buf).expect("utf8"));
        }
    }
}

#[allow(dead_code)]
pub async fn send_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) {
    writer.write_all(line.as_bytes()).await.expect("write");
    writer.write_all(b"\r\n").await.expect("write");
    writer.flush().await.expect("flush");
}

/// A client connected to a server-side session task over an in-memory pipe.
#[allow(dead_code)]
pub struct TestClient {
    pub reader: BufReader<ReadHalf<DuplexStream>>,
    pub writer: WriteHalf<DuplexStream>,
    pub task: JoinHandle<anyhow::Result<()>>,
}

#[allow(dead_code)]
impl TestClient {
    pub fn connect(processor: &CommandProcessor, settings: ConnectionSettings, id: &str) -> Self {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let session = Session::new(id.to_string(), format!("duplex-{}", id));
        let task = tokio::spawn(handle_connection(server, session, processor.clone(), settings));
        let (r, w) = tokio::io::split(client);
        TestClient {
            reader: BufReader::new(r),
            writer: w,
            task,
        }
    }

    pub async fn ask(&mut self, line: &str) -> String {
        send_line(&mut self.writer, line).await;
        read_reply(&mut self.reader).await.expect("reply")
    }

    /// Close the client side and wait for the server task to finish.
    pub async fn hang_up(self) -> anyhow::Result<()> {
        let TestClient { reader, writer, task } = self;
        drop(reader);
        drop(writer);
        task.await.expect("join")
    }
}
