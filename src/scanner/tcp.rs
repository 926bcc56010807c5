use std::io::ErrorKind;
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};

use crate::scanner::results::PortScanStatus;

/// Outcome of one connect attempt; the error text is kept for the log line.
#[derive(Debug)]
pub struct ConnectOutcome {
    pub status: PortScanStatus,
    pub detail: Option<String>,
}

/// Races a TCP connect against `limit`.
pub async fn connect_scan(addr: SocketAddr, limit: Duration) -> ConnectOutcome {
    match timeout(limit, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => {
            // Connected only once the peer is visible on the socket
            match stream.peer_addr() {
                Ok(_) => ConnectOutcome { status: PortScanStatus::Open, detail: None },
                Err(e) => ConnectOutcome { status: PortScanStatus::Error, detail: Some(e.to_string()) },
            }
        }
        Ok(Err(e)) => ConnectOutcome {
            status: classify_connect_error(e.kind()),
            detail: Some(format!("{:?}", e.kind())),
        },
        Err(_) => ConnectOutcome { status: PortScanStatus::TimedOut, detail: None },
    }
}

/// Refusals and unreachability mean nothing is listening; anything else is
/// an unexpected transport failure.
pub fn classify_connect_error(kind: ErrorKind) -> PortScanStatus {
    match kind {
        ErrorKind::ConnectionRefused
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::HostUnreachable
        | ErrorKind::NetworkUnreachable
        | ErrorKind::NetworkDown
        | ErrorKind::AddrNotAvailable => PortScanStatus::Closed,
        _ => PortScanStatus::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_connect_error() {
        assert_eq!(classify_connect_error(ErrorKind::ConnectionRefused), PortScanStatus::Closed);
        assert_eq!(classify_connect_error(ErrorKind::HostUnreachable), PortScanStatus::Closed);
        assert_eq!(classify_connect_error(ErrorKind::PermissionDenied), PortScanStatus::Error);
    }

    #[tokio::test]
    async fn test_connect_to_listener_is_open() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let outcome = connect_scan(addr, Duration::from_millis(1000)).await;
        assert_eq!(outcome.status, PortScanStatus::Open);
    }
}
