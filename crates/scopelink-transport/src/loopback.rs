use std::sync::{Arc, Mutex};

use bytes::{Buf, BytesMut};

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// One endpoint of an in-memory connected pair.
///
/// Bytes sent on one endpoint become readable on the other. Queues are
/// unbounded and nothing ever blocks, which makes this the transport of
/// choice for tests and for same-process host tooling.
pub struct Loopback {
    tx: Arc<Mutex<Pipe>>,
    rx: Arc<Mutex<Pipe>>,
}

struct Pipe {
    buf: BytesMut,
    closed: bool,
}

impl Pipe {
    fn new() -> Self {
        Self {
            buf: BytesMut::new(),
            closed: false,
        }
    }
}

impl Loopback {
    /// Create two connected endpoints.
    pub fn pair() -> (Loopback, Loopback) {
        let a = Arc::new(Mutex::new(Pipe::new()));
        let b = Arc::new(Mutex::new(Pipe::new()));
        (
            Loopback {
                tx: Arc::clone(&a),
                rx: Arc::clone(&b),
            },
            Loopback { tx: b, rx: a },
        )
    }

    /// Number of bytes queued towards the peer.
    pub fn pending(&self) -> usize {
        self.tx.lock().unwrap_or_else(|e| e.into_inner()).buf.len()
    }
}

impl Transport for Loopback {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut pipe = self.tx.lock().unwrap_or_else(|e| e.into_inner());
        if pipe.closed {
            return Err(TransportError::Closed);
        }
        pipe.buf.extend_from_slice(data);
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut pipe = self.rx.lock().unwrap_or_else(|e| e.into_inner());
        let n = pipe.buf.len().min(buf.len());
        if n == 0 {
            return if pipe.closed {
                Err(TransportError::Closed)
            } else {
                Ok(0)
            };
        }
        buf[..n].copy_from_slice(&pipe.buf[..n]);
        pipe.buf.advance(n);
        Ok(n)
    }
}

impl Drop for Loopback {
    fn drop(&mut self) {
        self.tx.lock().unwrap_or_else(|e| e.into_inner()).closed = true;
        self.rx.lock().unwrap_or_else(|e| e.into_inner()).closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let (mut a, mut b) = Loopback::pair();

        a.send(b"hello").unwrap();
        let mut buf = [0u8; 16];
        let n = b.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"hello");
    }

    #[test]
    fn empty_recv_returns_zero() {
        let (_a, mut b) = Loopback::pair();
        let mut buf = [0u8; 8];
        assert_eq!(b.recv(&mut buf).unwrap(), 0);
    }

    #[test]
    fn recv_respects_caller_buffer() {
        let (mut a, mut b) = Loopback::pair();
        a.send(&[1, 2, 3, 4, 5]).unwrap();

        let mut buf = [0u8; 2];
        assert_eq!(b.recv(&mut buf).unwrap(), 2);
        assert_eq!(buf, [1, 2]);
        assert_eq!(b.recv(&mut buf).unwrap(), 2);
        assert_eq!(buf, [3, 4]);
        assert_eq!(b.recv(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], 5);
        assert_eq!(b.recv(&mut buf).unwrap(), 0);
    }

    #[test]
    fn both_directions_are_independent() {
        let (mut a, mut b) = Loopback::pair();

        a.send(b"ping").unwrap();
        b.send(b"pong").unwrap();

        let mut buf = [0u8; 8];
        let n = a.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"pong");
        let n = b.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"ping");
    }

    #[test]
    fn drained_peer_drop_is_an_error() {
        let (a, mut b) = Loopback::pair();
        drop(a);

        let mut buf = [0u8; 8];
        assert!(matches!(b.recv(&mut buf), Err(TransportError::Closed)));
        assert!(matches!(b.send(b"x"), Err(TransportError::Closed)));
    }

    #[test]
    fn queued_bytes_survive_peer_drop() {
        let (mut a, mut b) = Loopback::pair();
        a.send(b"last words").unwrap();
        drop(a);

        let mut buf = [0u8; 16];
        let n = b.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"last words");
        assert!(matches!(b.recv(&mut buf), Err(TransportError::Closed)));
    }

    #[test]
    fn producer_thread_pump_thread() {
        let (mut a, mut b) = Loopback::pair();

        let producer = std::thread::spawn(move || {
            for i in 0..32u8 {
                a.send(&[i]).unwrap();
            }
            a
        });

        let mut got = Vec::new();
        let mut buf = [0u8; 8];
        while got.len() < 32 {
            match b.recv(&mut buf) {
                Ok(0) => std::thread::yield_now(),
                Ok(n) => got.extend_from_slice(&buf[..n]),
                Err(e) => panic!("recv failed: {e}"),
            }
        }
        producer.join().unwrap();
        assert_eq!(got, (0..32u8).collect::<Vec<_>>());
    }
}
