//! Line-delimited stdio transport
//!
//! One JSON-RPC message per line in, one response per line out. stdout is
//! the protocol channel, so nothing else may write to it. A line that is
//! not UTF-8 gets a parse error reply; only I/O failures stop the loop.

use domain_vector::VectorRepository;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::mcp::{self, McpHandler, McpResponse};

/// Serve messages from `reader` until EOF, writing responses to `writer`.
pub async fn serve<R, I, O>(handler: &McpHandler<R>, mut reader: I, mut writer: O) -> Result<()>
where
    R: VectorRepository + ?Sized,
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let mut buffer = Vec::new();
    let mut handled = 0usize;

    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer).await? == 0 {
            break;
        }

        let response = match std::str::from_utf8(&buffer) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                handled += 1;
                debug!(bytes = line.len(), "Received message");
                handler.handle_json(line).await
            }
            Err(e) => {
                handled += 1;
                warn!(error = %e, "Received a line that is not UTF-8");
                mcp::encode(&McpResponse::parse_error(e))
            }
        };

        if let Some(response) = response {
            writer.write_all(response.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }

    info!(messages = handled, "Input closed, stopping transport");
    Ok(())
}

/// Serve the process's stdin/stdout
pub async fn serve_stdio<R>(handler: &McpHandler<R>) -> Result<()>
where
    R: VectorRepository + ?Sized,
{
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve(handler, stdin, stdout).await
}
