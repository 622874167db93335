use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::debug;

type LineCallback = Box<dyn Fn(String) -> BoxFuture<'static, ()> + Send + Sync>;

/// Reads one encoder output stream and dispatches lines to pattern callbacks
///
/// Every line is checked against all registered substrings in registration
/// order; each match awaits its callback before the next pattern is tried, so
/// a slow callback slows the reader down instead of piling up work.
pub struct StreamWatcher<R> {
    label: String,
    reader: R,
    patterns: Vec<(String, LineCallback)>,
}

impl<R> StreamWatcher<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    pub fn new(label: impl Into<String>, reader: R) -> Self {
        Self {
            label: label.into(),
            reader,
            patterns: Vec::new(),
        }
    }

    /// Invoke `callback` with every line containing `pattern`
    pub fn register_pattern<F, Fut>(&mut self, pattern: impl Into<String>, callback: F) -> &mut Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.patterns
            .push((pattern.into(), Box::new(move |line| callback(line).boxed())));
        self
    }

    /// Consume the stream on its own task until it closes
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        let mut reader = BufReader::new(self.reader);
        let mut buf = Vec::new();

        loop {
            match next_line(&mut reader, &mut buf).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    debug!("{}: read error, stopping watcher: {}", self.label, e);
                    break;
                }
            }

            let line = String::from_utf8_lossy(&buf);
            if line.trim().is_empty() {
                continue;
            }
            debug!("{}: {}", self.label, line);

            for (pattern, callback) in &self.patterns {
                if line.contains(pattern.as_str()) {
                    callback(line.to_string()).await;
                }
            }
        }

        debug!("{}: stream closed", self.label);
    }
}

/// Read up to the next `\n` or `\r` into `buf`; false once the stream is exhausted
///
/// The encoder redraws its progress line with bare carriage returns, so both
/// bytes end a line.
async fn next_line<B>(reader: &mut B, buf: &mut Vec<u8>) -> io::Result<bool>
where
    B: AsyncBufRead + Unpin,
{
    buf.clear();
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(!buf.is_empty());
        }

        if let Some(end) = available.iter().position(|b| *b == b'\n' || *b == b'\r') {
            buf.extend_from_slice(&available[..end]);
            reader.consume(end + 1);
            return Ok(true);
        }

        let len = available.len();
        buf.extend_from_slice(available);
        reader.consume(len);
    }
}
