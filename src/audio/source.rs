use crate::{Error, Result};
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Drain a readable byte source (file, in-memory cursor, socket, test double).
pub async fn read_source<R>(mut source: R) -> Result<Bytes>
where
    R: AsyncRead + Unpin + Send,
{
    let mut buf = Vec::new();
    source.read_to_end(&mut buf).await?;
    if buf.is_empty() {
        return Err(Error::validation("Audio source is empty"));
    }
    Ok(Bytes::from(buf))
}
