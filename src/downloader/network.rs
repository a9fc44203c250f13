//! Classification of transport errors seen while streaming

use std::error::Error as StdError;
use std::io;

/// Trait for errors that can be recognised as the device hanging up
///
/// The appliance closes connections abruptly near the end of a stream. That
/// case ends the transfer normally; every other transport error fails the
/// item.
pub trait PeerClosed {
    /// Returns true if the remote side closed the connection
    fn is_peer_closed(&self) -> bool;
}

impl PeerClosed for reqwest::Error {
    fn is_peer_closed(&self) -> bool {
        error_chain_is_peer_closed(self)
    }
}

impl PeerClosed for io::Error {
    fn is_peer_closed(&self) -> bool {
        is_closed_kind(self.kind())
    }
}

fn is_closed_kind(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::BrokenPipe
    )
}

/// Walk the source chain looking for a closed-connection cause
///
/// Matches an `io::Error` of a closed-connection kind anywhere in the chain,
/// or hyper's "connection closed before message completed".
pub fn error_chain_is_peer_closed(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>()
            && is_closed_kind(io_err.kind())
        {
            return true;
        }
        if e.to_string().contains("connection closed") {
            return true;
        }
        current = e.source();
    }
    false
}
