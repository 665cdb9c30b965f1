//! Negotiation message framing.
//!
//! Every message is `<unsigned varint length><payload>` where the payload is
//! a UTF-8 string terminated by `\n`. Reads consume exactly one frame and
//! never buffer ahead, so the stream can be handed to a protocol handler
//! untouched once negotiation ends.

use crate::domain::NegotiationError;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::compat::TokioAsyncReadCompatExt;
use unsigned_varint::aio::read_usize;
use unsigned_varint::{decode, encode};

/// Header both sides send first.
pub const PROTOCOL_ID: &str = "/multistream/1.0.0";

/// Reply to a request no handler accepts.
pub const NOT_AVAILABLE: &str = "na";

/// Request asking the listener to list its protocols.
pub const LIST: &str = "ls";

/// Largest accepted payload, newline included.
pub const MAX_MESSAGE_SIZE: usize = 1024;

/// Write one frame carrying `payload` verbatim.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), NegotiationError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut prefix = encode::usize_buffer();
    let prefix = encode::usize(payload.len(), &mut prefix);

    let mut frame = Vec::with_capacity(prefix.len() + payload.len());
    frame.extend_from_slice(prefix);
    frame.extend_from_slice(payload);

    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Write `message` followed by a newline as one frame.
pub async fn write_message<W>(writer: &mut W, message: &str) -> Result<(), NegotiationError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    write_frame(writer, encode_line(message).as_slice()).await
}

/// Read one frame and return its raw payload.
///
/// A clean end of stream before the first prefix byte yields
/// [`NegotiationError::Exhausted`].
pub async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>, NegotiationError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let len = read_length_prefix(reader).await?;
    if len > MAX_MESSAGE_SIZE {
        return Err(NegotiationError::MessageTooLarge {
            size: len,
            limit: MAX_MESSAGE_SIZE,
        });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

/// Read one frame and return its message without the trailing newline.
pub async fn read_message<R>(reader: &mut R) -> Result<String, NegotiationError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut payload = read_frame(reader).await?;

    match payload.pop() {
        Some(b'\n') => {}
        _ => {
            return Err(NegotiationError::InvalidMessage(
                "missing trailing newline".to_string(),
            ))
        }
    }

    String::from_utf8(payload).map_err(|e| NegotiationError::InvalidMessage(e.to_string()))
}

/// Body of the listener's reply to `ls`.
///
/// `<varint count>` then one `<varint len><protocol>\n` per protocol, then
/// a final `\n`.
#[must_use]
pub fn encode_protocol_list(protocols: &[String]) -> Vec<u8> {
    let mut count = encode::usize_buffer();
    let mut body = encode::usize(protocols.len(), &mut count).to_vec();

    for protocol in protocols {
        let line = encode_line(protocol);
        let mut len = encode::usize_buffer();
        body.extend_from_slice(encode::usize(line.len(), &mut len));
        body.extend_from_slice(&line);
    }
    body.push(b'\n');
    body
}

/// Parse a body produced by [`encode_protocol_list`].
pub fn decode_protocol_list(body: &[u8]) -> Result<Vec<String>, NegotiationError> {
    let invalid = |e: decode::Error| NegotiationError::InvalidMessage(e.to_string());

    let (count, mut rest) = decode::usize(body).map_err(invalid)?;
    let mut protocols = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        let (len, tail) = decode::usize(rest).map_err(invalid)?;
        if tail.len() < len || len == 0 {
            return Err(NegotiationError::InvalidMessage(
                "truncated protocol list".to_string(),
            ));
        }
        let (line, tail) = tail.split_at(len);
        let protocol = std::str::from_utf8(&line[..len - 1])
            .map_err(|e| NegotiationError::InvalidMessage(e.to_string()))?;
        protocols.push(protocol.to_string());
        rest = tail;
    }
    Ok(protocols)
}

fn encode_line(message: &str) -> Vec<u8> {
    let mut line = Vec::with_capacity(message.len() + 1);
    line.extend_from_slice(message.as_bytes());
    line.push(b'\n');
    line
}

async fn read_length_prefix<R>(reader: &mut R) -> Result<usize, NegotiationError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    match read_usize((&mut *reader).compat()).await {
        Ok(len) => Ok(len),
        Err(e) => {
            let e: io::Error = e.into();
            match e.kind() {
                io::ErrorKind::UnexpectedEof => Err(NegotiationError::Exhausted),
                io::ErrorKind::InvalidData => Err(NegotiationError::InvalidMessage(e.to_string())),
                _ => Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_message_framing_on_the_wire() {
        let (mut a, mut b) = duplex(64);
        write_message(&mut a, "/a/1.0.0").await.unwrap();
        drop(a);

        let mut raw = Vec::new();
        b.read_to_end(&mut raw).await.unwrap();
        assert_eq!(raw[0], 9);
        assert_eq!(&raw[1..], b"/a/1.0.0\n");
    }

    #[tokio::test]
    async fn test_read_does_not_consume_following_bytes() {
        let (mut a, mut b) = duplex(64);
        write_message(&mut a, "/a/1.0.0").await.unwrap();
        a.write_all(b"payload").await.unwrap();
        drop(a);

        assert_eq!(read_message(&mut b).await.unwrap(), "/a/1.0.0");
        let mut rest = Vec::new();
        b.read_to_end(&mut rest).await.unwrap();
        assert_eq!(rest, b"payload");
    }

    #[tokio::test]
    async fn test_missing_newline_rejected() {
        let (mut a, mut b) = duplex(64);
        write_frame(&mut a, b"/a/1.0.0").await.unwrap();

        assert!(matches!(
            read_message(&mut b).await,
            Err(NegotiationError::InvalidMessage(_))
        ));
    }

    #[tokio::test]
    async fn test_oversized_message_rejected() {
        let (mut a, mut b) = duplex(64);
        let mut prefix = encode::usize_buffer();
        a.write_all(encode::usize(4096, &mut prefix)).await.unwrap();

        assert!(matches!(
            read_message(&mut b).await,
            Err(NegotiationError::MessageTooLarge { size: 4096, .. })
        ));
    }

    #[tokio::test]
    async fn test_eof_before_message_is_exhausted() {
        let (a, mut b) = duplex(64);
        drop(a);

        assert!(matches!(
            read_message(&mut b).await,
            Err(NegotiationError::Exhausted)
        ));
    }

    #[tokio::test]
    async fn test_overlong_prefix_rejected() {
        let (mut a, mut b) = duplex(64);
        a.write_all(&[0xff; 12]).await.unwrap();

        assert!(matches!(
            read_message(&mut b).await,
            Err(NegotiationError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_protocol_list_body() {
        let protocols = vec!["/a/1.0.0".to_string(), "/b/1.0.0".to_string()];
        let body = encode_protocol_list(&protocols);

        assert_eq!(body.last(), Some(&b'\n'));
        assert_eq!(decode_protocol_list(&body).unwrap(), protocols);
    }
}
