#![allow(dead_code)] // each test binary uses a subset of the helpers

use scopelink::{Scope, ScopeCallbacks, ScopeConfig, ScopeLink};
use scopelink_transport::{Loopback, Transport};
use scopelink_wire::{FrameCodec, SerialFraming, FOOTER_LEN, HEADER_LEN};

/// A scope wired to loopback links, with the peer ends exposed so tests
/// can play the remote tool.
pub struct Harness {
    pub scope: Scope,
    pub cmd_peer: Loopback,
    pub stream_peer: Loopback,
}

pub fn harness(cfg: ScopeConfig) -> Harness {
    harness_with_callbacks(cfg, None)
}

pub fn harness_with_callbacks(
    cfg: ScopeConfig,
    callbacks: Option<Box<dyn ScopeCallbacks>>,
) -> Harness {
    let (cmd, cmd_peer) = Loopback::pair();
    let (stream, stream_peer) = Loopback::pair();

    let scope = Scope::new(
        cfg,
        ScopeLink {
            intf_cmd: Box::new(cmd),
            intf_stream: Box::new(stream),
            proto_cmd: Box::new(SerialFraming::new()),
            proto_stream: Box::new(SerialFraming::new()),
            callbacks,
        },
    )
    .expect("scope construction");

    Harness {
        scope,
        cmd_peer,
        stream_peer,
    }
}

/// Build one wire frame the way the remote tool would.
pub fn build_frame(id: u8, payload: &[u8]) -> Vec<u8> {
    let codec = SerialFraming::new();
    let mut buf = vec![0u8; HEADER_LEN + payload.len() + FOOTER_LEN];
    buf[HEADER_LEN..HEADER_LEN + payload.len()].copy_from_slice(payload);
    let mut cursor = HEADER_LEN + payload.len();
    codec.frame_final(id, &mut buf, &mut cursor).unwrap();
    buf
}

/// Send a command frame into the scope's command link.
pub fn send_cmd(peer: &mut Loopback, id: u8, payload: &[u8]) {
    peer.send(&build_frame(id, payload)).unwrap();
}

/// Drain one frame from a peer endpoint, if a complete one is queued.
pub fn recv_frame(peer: &mut Loopback) -> Option<(u8, Vec<u8>)> {
    let codec = SerialFraming::new();
    let mut bytes = Vec::new();
    let mut chunk = [0u8; 256];
    loop {
        match peer.recv(&mut chunk) {
            Ok(0) => break,
            Ok(n) => bytes.extend_from_slice(&chunk[..n]),
            Err(_) => break,
        }
    }
    let frame = codec.frame_get(&bytes).ok()?;
    Some((frame.id, frame.payload.to_vec()))
}

/// Drain every queued frame from a peer endpoint.
pub fn recv_all_frames(peer: &mut Loopback) -> Vec<(u8, Vec<u8>)> {
    let codec = SerialFraming::new();
    let mut bytes = Vec::new();
    let mut chunk = [0u8; 256];
    loop {
        match peer.recv(&mut chunk) {
            Ok(0) => break,
            Ok(n) => bytes.extend_from_slice(&chunk[..n]),
            Err(_) => break,
        }
    }

    let mut frames = Vec::new();
    while let Ok(frame) = codec.frame_get(&bytes) {
        let consumed = frame.drop;
        frames.push((frame.id, frame.payload.to_vec()));
        bytes.drain(..consumed);
    }
    frames
}
