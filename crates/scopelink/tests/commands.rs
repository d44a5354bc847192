//! Remote-control behavior: info queries, start/enable/divider set
//! requests, ACK frames, and receive-buffer handling.

mod common;

use std::sync::{Arc, Mutex};

use common::{build_frame, harness, harness_with_callbacks, recv_all_frames, recv_frame, send_cmd};
use scopelink::{
    ChannelType, SampleType, ScopeCallbacks, ScopeConfig, ScopeError, FLAG_ACK_SUPPORT,
    FLAG_DIVIDER_SUPPORT,
};
use scopelink_transport::Transport;

const ID_CMNINFO: u8 = 2;
const ID_CHINFO: u8 = 3;
const ID_ACK: u8 = 4;
const ID_START: u8 = 5;
const ID_ENABLE: u8 = 6;
const ID_DIV: u8 = 7;

const REQ_SINGLE: u8 = 0;
const REQ_BULK: u8 = 1;
const REQ_ALL: u8 = 2;

fn cfg() -> ScopeConfig {
    ScopeConfig {
        channels: 2,
        streambuf_len: 64,
        rx_padding: 4,
        ..ScopeConfig::default()
    }
}

fn ack_code(payload: &[u8]) -> i32 {
    i32::from_le_bytes(payload.try_into().expect("ack payload is 4 bytes"))
}

#[test]
fn cmninfo_reports_capabilities() {
    let mut h = harness(cfg());

    send_cmd(&mut h.cmd_peer, ID_CMNINFO, &[]);
    h.scope.recv().unwrap();

    let (id, payload) = recv_frame(&mut h.cmd_peer).expect("cmninfo reply");
    assert_eq!(id, ID_CMNINFO);
    assert_eq!(payload, vec![2, FLAG_DIVIDER_SUPPORT | FLAG_ACK_SUPPORT, 4]);
}

#[test]
fn cmninfo_with_payload_is_rejected_without_reply() {
    let mut h = harness(cfg());

    send_cmd(&mut h.cmd_peer, ID_CMNINFO, &[0]);
    assert!(matches!(
        h.scope.recv(),
        Err(ScopeError::InvalidArgument(_))
    ));
    assert!(recv_frame(&mut h.cmd_peer).is_none());
}

#[test]
fn chinfo_reports_registration_and_name() {
    let mut h = harness(cfg());
    h.scope
        .chan_init(1, "motor_rpm", ChannelType::new(SampleType::F32), 2, 1)
        .unwrap();
    h.scope.chan_en(1, true).unwrap();
    h.scope.chan_div(1, 3).unwrap();

    send_cmd(&mut h.cmd_peer, ID_CHINFO, &[1]);
    h.scope.recv().unwrap();

    let (id, payload) = recv_frame(&mut h.cmd_peer).expect("chinfo reply");
    assert_eq!(id, ID_CHINFO);

    let mut expected = vec![1, SampleType::F32.to_wire(), 2, 3, 1];
    expected.extend_from_slice(b"motor_rpm\0");
    assert_eq!(payload, expected);
}

#[test]
fn chinfo_wrong_length_is_rejected_without_reply() {
    let mut h = harness(cfg());

    send_cmd(&mut h.cmd_peer, ID_CHINFO, &[0, 1]);
    assert!(matches!(
        h.scope.recv(),
        Err(ScopeError::InvalidArgument(_))
    ));
    assert!(recv_frame(&mut h.cmd_peer).is_none());
}

#[test]
fn chinfo_out_of_range_channel_is_rejected() {
    let mut h = harness(cfg());

    send_cmd(&mut h.cmd_peer, ID_CHINFO, &[9]);
    assert!(matches!(h.scope.recv(), Err(ScopeError::InvalidChannel(9))));
    assert!(recv_frame(&mut h.cmd_peer).is_none());
}

#[test]
fn remote_start_and_stop_with_acks() {
    let mut h = harness(cfg());

    send_cmd(&mut h.cmd_peer, ID_START, &[1]);
    h.scope.recv().unwrap();
    assert!(h.scope.is_started());

    let (id, payload) = recv_frame(&mut h.cmd_peer).expect("ack");
    assert_eq!(id, ID_ACK);
    assert_eq!(ack_code(&payload), 0);

    send_cmd(&mut h.cmd_peer, ID_START, &[0]);
    h.scope.recv().unwrap();
    assert!(!h.scope.is_started());
}

#[test]
fn start_with_invalid_value_acks_failure() {
    let mut h = harness(cfg());

    send_cmd(&mut h.cmd_peer, ID_START, &[2]);
    assert!(matches!(
        h.scope.recv(),
        Err(ScopeError::InvalidArgument(_))
    ));
    assert!(!h.scope.is_started());

    let (id, payload) = recv_frame(&mut h.cmd_peer).expect("ack");
    assert_eq!(id, ID_ACK);
    assert_eq!(ack_code(&payload), -1);
}

#[test]
fn start_with_wrong_length_gets_no_ack() {
    let mut h = harness(cfg());

    send_cmd(&mut h.cmd_peer, ID_START, &[1, 1]);
    assert!(matches!(
        h.scope.recv(),
        Err(ScopeError::InvalidArgument(_))
    ));
    assert!(recv_frame(&mut h.cmd_peer).is_none());
}

#[test]
fn acks_can_be_disabled() {
    let mut h = harness(ScopeConfig {
        ack_frames: false,
        ..cfg()
    });

    send_cmd(&mut h.cmd_peer, ID_START, &[1]);
    h.scope.recv().unwrap();
    assert!(h.scope.is_started());
    assert!(recv_frame(&mut h.cmd_peer).is_none());
}

#[test]
fn enable_single_channel_remotely() {
    let mut h = harness(cfg());
    h.scope
        .chan_init(0, "a", ChannelType::new(SampleType::U8), 1, 0)
        .unwrap();

    send_cmd(&mut h.cmd_peer, ID_ENABLE, &[REQ_SINGLE, 0, 1]);
    h.scope.recv().unwrap();

    assert!(h.scope.channel(0).unwrap().enabled);
    let (id, payload) = recv_frame(&mut h.cmd_peer).expect("ack");
    assert_eq!(id, ID_ACK);
    assert_eq!(ack_code(&payload), 0);
}

#[test]
fn enable_bulk_sets_distinct_values() {
    let mut h = harness(cfg());
    for ch in 0..2 {
        h.scope
            .chan_init(ch, "c", ChannelType::new(SampleType::U8), 1, 0)
            .unwrap();
    }

    send_cmd(&mut h.cmd_peer, ID_ENABLE, &[REQ_BULK, 0, 1, 0]);
    h.scope.recv().unwrap();

    assert!(h.scope.channel(0).unwrap().enabled);
    assert!(!h.scope.channel(1).unwrap().enabled);
}

#[test]
fn enable_bulk_with_one_bad_value_mutates_nothing() {
    let mut h = harness(cfg());
    for ch in 0..2 {
        h.scope
            .chan_init(ch, "c", ChannelType::new(SampleType::U8), 1, 0)
            .unwrap();
    }

    send_cmd(&mut h.cmd_peer, ID_ENABLE, &[REQ_BULK, 0, 1, 2]);
    assert!(matches!(
        h.scope.recv(),
        Err(ScopeError::InvalidArgument(_))
    ));

    assert!(!h.scope.channel(0).unwrap().enabled);
    assert!(!h.scope.channel(1).unwrap().enabled);

    let (id, payload) = recv_frame(&mut h.cmd_peer).expect("ack");
    assert_eq!(id, ID_ACK);
    assert_eq!(ack_code(&payload), -1);
}

#[test]
fn enable_all_applies_one_value_everywhere() {
    let mut h = harness(cfg());
    for ch in 0..2 {
        h.scope
            .chan_init(ch, "c", ChannelType::new(SampleType::U8), 1, 0)
            .unwrap();
    }

    send_cmd(&mut h.cmd_peer, ID_ENABLE, &[REQ_ALL, 0, 1]);
    h.scope.recv().unwrap();
    assert!(h.scope.channel(0).unwrap().enabled);
    assert!(h.scope.channel(1).unwrap().enabled);
}

#[test]
fn enable_with_wrong_bulk_length_is_rejected() {
    let mut h = harness(cfg());

    send_cmd(&mut h.cmd_peer, ID_ENABLE, &[REQ_BULK, 0, 1]);
    assert!(matches!(
        h.scope.recv(),
        Err(ScopeError::InvalidArgument(_))
    ));
    let (id, payload) = recv_frame(&mut h.cmd_peer).expect("ack");
    assert_eq!(id, ID_ACK);
    assert_eq!(ack_code(&payload), -1);
}

#[test]
fn divider_set_remotely() {
    let mut h = harness(cfg());
    h.scope
        .chan_init(0, "c", ChannelType::new(SampleType::U8), 1, 0)
        .unwrap();

    send_cmd(&mut h.cmd_peer, ID_DIV, &[REQ_SINGLE, 0, 9]);
    h.scope.recv().unwrap();
    assert_eq!(h.scope.channel(0).unwrap().div, 9);

    send_cmd(&mut h.cmd_peer, ID_DIV, &[REQ_ALL, 0, 4]);
    h.scope.recv().unwrap();
    assert_eq!(h.scope.channel(0).unwrap().div, 4);
    assert_eq!(h.scope.channel(1).unwrap().div, 4);
}

#[test]
fn divider_request_unsupported_when_not_configured() {
    let mut h = harness(ScopeConfig {
        divider: false,
        ..cfg()
    });

    send_cmd(&mut h.cmd_peer, ID_DIV, &[REQ_SINGLE, 0, 1]);
    assert!(matches!(h.scope.recv(), Err(ScopeError::Unsupported(_))));

    let (id, payload) = recv_frame(&mut h.cmd_peer).expect("ack");
    assert_eq!(id, ID_ACK);
    assert_eq!(ack_code(&payload), -2);
}

struct RecordingCallbacks {
    starts: Arc<Mutex<Vec<bool>>>,
    user_frames: Arc<Mutex<Vec<(u8, Vec<u8>)>>>,
}

impl ScopeCallbacks for RecordingCallbacks {
    fn on_start(&mut self, start: bool) -> scopelink::Result<()> {
        self.starts.lock().unwrap().push(start);
        Ok(())
    }

    fn on_user_frame(&mut self, id: u8, payload: &[u8]) -> scopelink::Result<()> {
        self.user_frames
            .lock()
            .unwrap()
            .push((id, payload.to_vec()));
        Ok(())
    }
}

#[test]
fn user_frames_reach_the_callback() {
    let user_frames = Arc::new(Mutex::new(Vec::new()));
    let starts = Arc::new(Mutex::new(Vec::new()));
    let mut h = harness_with_callbacks(
        cfg(),
        Some(Box::new(RecordingCallbacks {
            starts: Arc::clone(&starts),
            user_frames: Arc::clone(&user_frames),
        })),
    );

    send_cmd(&mut h.cmd_peer, 42, &[0xCA, 0xFE]);
    h.scope.recv().unwrap();

    assert_eq!(
        user_frames.lock().unwrap().as_slice(),
        &[(42u8, vec![0xCA, 0xFE])]
    );
}

#[test]
fn start_callback_sees_local_and_remote_starts() {
    let starts = Arc::new(Mutex::new(Vec::new()));
    let mut h = harness_with_callbacks(
        cfg(),
        Some(Box::new(RecordingCallbacks {
            starts: Arc::clone(&starts),
            user_frames: Arc::new(Mutex::new(Vec::new())),
        })),
    );

    h.scope.stream_start(true).unwrap();
    send_cmd(&mut h.cmd_peer, ID_START, &[0]);
    h.scope.recv().unwrap();

    assert_eq!(starts.lock().unwrap().as_slice(), &[true, false]);
}

#[test]
fn unknown_id_without_callback_is_unsupported() {
    let mut h = harness(cfg());

    send_cmd(&mut h.cmd_peer, 42, &[]);
    assert!(matches!(h.scope.recv(), Err(ScopeError::Unsupported(_))));
}

#[test]
fn partial_frame_waits_for_more_bytes() {
    let mut h = harness(cfg());
    let wire = build_frame(ID_CMNINFO, &[]);
    let (head, tail) = wire.split_at(3);

    h.cmd_peer.send(head).unwrap();
    h.scope.recv().unwrap();
    assert!(recv_frame(&mut h.cmd_peer).is_none());

    h.cmd_peer.send(tail).unwrap();
    h.scope.recv().unwrap();
    let (id, _) = recv_frame(&mut h.cmd_peer).expect("cmninfo reply");
    assert_eq!(id, ID_CMNINFO);
}

#[test]
fn garbage_before_frame_is_discarded() {
    let mut h = harness(cfg());

    let mut wire = vec![0xFF, 0x00, 0xA5];
    wire.extend_from_slice(&build_frame(ID_CMNINFO, &[]));
    h.cmd_peer.send(&wire).unwrap();

    h.scope.recv().unwrap();
    let (id, _) = recv_frame(&mut h.cmd_peer).expect("cmninfo reply");
    assert_eq!(id, ID_CMNINFO);

    // The buffer was compacted past the garbage; a second frame parses
    // on its own.
    send_cmd(&mut h.cmd_peer, ID_START, &[1]);
    h.scope.recv().unwrap();
    assert!(h.scope.is_started());
}

#[test]
fn one_frame_handled_per_recv_call() {
    let mut h = harness(cfg());

    send_cmd(&mut h.cmd_peer, ID_START, &[1]);
    send_cmd(&mut h.cmd_peer, ID_CMNINFO, &[]);

    h.scope.recv().unwrap();
    assert!(h.scope.is_started());
    let replies = recv_all_frames(&mut h.cmd_peer);
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].0, ID_ACK);

    h.scope.recv().unwrap();
    let replies = recv_all_frames(&mut h.cmd_peer);
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].0, ID_CMNINFO);
}

#[test]
fn garbage_flood_resynchronizes_when_buffer_fills() {
    let mut h = harness(ScopeConfig {
        rxbuf_len: 32,
        ..cfg()
    });

    h.cmd_peer.send(&[0xA5; 32]).unwrap();
    h.scope.recv().unwrap();

    // The full garbage buffer was dropped; a real frame still works.
    send_cmd(&mut h.cmd_peer, ID_CMNINFO, &[]);
    h.scope.recv().unwrap();
    let (id, _) = recv_frame(&mut h.cmd_peer).expect("cmninfo reply");
    assert_eq!(id, ID_CMNINFO);
}
