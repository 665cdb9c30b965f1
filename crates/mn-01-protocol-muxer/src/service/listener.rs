//! Listener side of the negotiation exchange.

use crate::codec::{
    encode_protocol_list, read_message, write_frame, write_message, LIST, NOT_AVAILABLE,
    PROTOCOL_ID,
};
use crate::domain::{NegotiationError, ProtocolEntry, ProtocolTable};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::trace;

/// Agree on a protocol with the dialer on `stream`.
///
/// Exchanges headers, then answers requests until one matches an entry in
/// `table`: a match is acknowledged by echoing the request, a miss gets
/// [`NOT_AVAILABLE`] and the dialer may try again, `ls` gets the list of
/// registered ids. Returns the matched entry.
pub async fn negotiate_inbound<S>(
    stream: &mut S,
    table: &ProtocolTable,
) -> Result<ProtocolEntry, NegotiationError>
where
    S: AsyncRead + AsyncWrite + Unpin + ?Sized,
{
    write_message(stream, PROTOCOL_ID).await?;
    let header = read_message(stream).await?;
    if header != PROTOCOL_ID {
        return Err(NegotiationError::HeaderMismatch(header));
    }

    loop {
        let request = read_message(stream).await?;

        if request == LIST {
            trace!("Answering protocol list request");
            write_frame(stream, &encode_protocol_list(&table.protocols())).await?;
            continue;
        }

        match table.find(&request) {
            Some(entry) => {
                write_message(stream, &request).await?;
                return Ok(entry.clone());
            }
            None => {
                trace!(requested = %request, "Protocol not available");
                write_message(stream, NOT_AVAILABLE).await?;
            }
        }
    }
}
