//! Dialer side of the negotiation exchange.
//!
//! Used by outbound streams and by tests that play the remote peer.

use crate::codec::{
    decode_protocol_list, read_frame, read_message, write_message, LIST, NOT_AVAILABLE,
    PROTOCOL_ID,
};
use crate::domain::NegotiationError;
use tokio::io::{AsyncRead, AsyncWrite};

/// Exchange headers with the listener.
pub async fn handshake<S>(stream: &mut S) -> Result<(), NegotiationError>
where
    S: AsyncRead + AsyncWrite + Unpin + ?Sized,
{
    write_message(stream, PROTOCOL_ID).await?;
    let header = read_message(stream).await?;
    if header != PROTOCOL_ID {
        return Err(NegotiationError::HeaderMismatch(header));
    }
    Ok(())
}

/// Propose `protocol`. `Ok(false)` means the listener declined and another
/// proposal may follow on the same stream.
pub async fn try_protocol<S>(stream: &mut S, protocol: &str) -> Result<bool, NegotiationError>
where
    S: AsyncRead + AsyncWrite + Unpin + ?Sized,
{
    write_message(stream, protocol).await?;
    let reply = read_message(stream).await?;
    if reply == protocol {
        Ok(true)
    } else if reply == NOT_AVAILABLE {
        Ok(false)
    } else {
        Err(NegotiationError::InvalidMessage(format!(
            "unexpected reply {reply:?} to {protocol:?}"
        )))
    }
}

/// Ask the listener which protocols it serves.
pub async fn list_protocols<S>(stream: &mut S) -> Result<Vec<String>, NegotiationError>
where
    S: AsyncRead + AsyncWrite + Unpin + ?Sized,
{
    write_message(stream, LIST).await?;
    let body = read_frame(stream).await?;
    decode_protocol_list(&body)
}

/// Handshake, then propose each of `protocols` in order until one is
/// accepted.
pub async fn select<S>(stream: &mut S, protocols: &[&str]) -> Result<String, NegotiationError>
where
    S: AsyncRead + AsyncWrite + Unpin + ?Sized,
{
    handshake(stream).await?;
    for protocol in protocols {
        if try_protocol(stream, protocol).await? {
            return Ok((*protocol).to_string());
        }
    }
    Err(NegotiationError::Exhausted)
}
