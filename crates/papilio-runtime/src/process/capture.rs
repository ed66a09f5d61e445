//! Concurrent accumulation of a child's output streams.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::trace;

const CHUNK_SIZE: usize = 4096;

/// How long to keep draining pipes after the child is gone. A grandchild
/// that inherited the pipes can otherwise hold them open indefinitely.
const DRAIN_LIMIT: Duration = Duration::from_secs(2);

type Buffer = Arc<Mutex<Vec<u8>>>;

/// One pipe being read in the background.
struct StreamReader {
    buffer: Buffer,
    task: JoinHandle<()>,
}

/// Readers for both pipes of one child.
pub(super) struct OutputCapture {
    stdout: Option<StreamReader>,
    stderr: Option<StreamReader>,
}

impl OutputCapture {
    /// Take the child's piped stdout/stderr and start reading them.
    pub(super) fn spawn(child: &mut Child, program: &str) -> Self {
        Self {
            stdout: child
                .stdout
                .take()
                .map(|s| StreamReader::spawn(s, program, "stdout")),
            stderr: child
                .stderr
                .take()
                .map(|s| StreamReader::spawn(s, program, "stderr")),
        }
    }

    /// Let both readers reach end of stream, then decode what they
    /// collected. Whatever arrived is returned even if a pipe never closes.
    pub(super) async fn finish(self) -> (String, String) {
        tokio::join!(finish_reader(self.stdout), finish_reader(self.stderr))
    }
}

impl StreamReader {
    fn spawn<R>(stream: R, program: &str, stream_name: &'static str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Buffer::default();
        let task = tokio::spawn(accumulate(
            stream,
            Arc::clone(&buffer),
            program.to_string(),
            stream_name,
        ));
        Self { buffer, task }
    }
}

async fn accumulate<R>(mut stream: R, buffer: Buffer, program: String, stream_name: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                trace!(
                    program = %program,
                    stream = stream_name,
                    "{}",
                    String::from_utf8_lossy(&chunk[..n]).trim_end()
                );
                buffer
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .extend_from_slice(&chunk[..n]);
            }
            Err(e) => {
                trace!(program = %program, stream = stream_name, error = %e, "Pipe read failed");
                break;
            }
        }
    }
}

async fn finish_reader(reader: Option<StreamReader>) -> String {
    let Some(StreamReader { buffer, mut task }) = reader else {
        return String::new();
    };
    if tokio::time::timeout(DRAIN_LIMIT, &mut task).await.is_err() {
        task.abort();
    }
    let bytes = buffer.lock().unwrap_or_else(PoisonError::into_inner);
    String::from_utf8_lossy(&bytes).into_owned()
}
