use std::io::IoSlice;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

/// Writes one response to the client.
///
/// Takes ownership of the [`Response`]: the head is serialized into its
/// own buffer and the body buffer is reused as-is, so the two are
/// submitted as a single vectored write instead of being concatenated.
/// Dropping the writer after the write releases the response.
pub struct ResponseWriter {
    head: Vec<u8>,
    body: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: Response) -> Self {
        Self {
            head: response.serialize_head(),
            body: response.body,
            written: 0,
        }
    }

    /// Total number of bytes this response occupies on the wire.
    pub fn len(&self) -> usize {
        self.head.len() + self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub async fn write_to<S>(&mut self, stream: &mut S) -> anyhow::Result<()>
    where
        S: AsyncWrite + Unpin,
    {
        let total = self.len();

        while self.written < total {
            let n = if self.written < self.head.len() {
                let bufs = [
                    IoSlice::new(&self.head[self.written..]),
                    IoSlice::new(&self.body),
                ];
                stream.write_vectored(&bufs).await?
            } else {
                stream.write(&self.body[self.written - self.head.len()..]).await?
            };

            if n == 0 {
                anyhow::bail!("connection closed while writing response");
            }

            self.written += n;
        }

        stream.flush().await?;
        Ok(())
    }
}
