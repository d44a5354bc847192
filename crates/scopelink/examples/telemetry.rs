//! A scope instance with one producer thread and a pump loop, wired to
//! an in-process "remote tool" over loopback links.
//!
//! Run with: `cargo run --example telemetry`

use std::sync::Arc;
use std::time::Duration;

use scopelink::{ChannelType, FrameId, SampleType, Scope, ScopeConfig, ScopeLink};
use scopelink_transport::{Loopback, Transport};
use scopelink_wire::{FrameCodec, SerialFraming, FOOTER_LEN, HEADER_LEN};

fn main() -> scopelink::Result<()> {
    let (cmd, mut cmd_tool) = Loopback::pair();
    let (stream, mut stream_tool) = Loopback::pair();

    let scope = Arc::new(Scope::new(
        ScopeConfig {
            channels: 2,
            streambuf_len: 512,
            ..ScopeConfig::default()
        },
        ScopeLink {
            intf_cmd: Box::new(cmd),
            intf_stream: Box::new(stream),
            proto_cmd: Box::new(SerialFraming::new()),
            proto_stream: Box::new(SerialFraming::new()),
            callbacks: None,
        },
    )?);

    scope.chan_init(0, "vbus_mv", ChannelType::new(SampleType::U16), 1, 0)?;
    scope.chan_init(1, "accel", ChannelType::new(SampleType::F32), 3, 0)?;
    scope.chan_all_en(true)?;

    // The tool side asks for streaming to start.
    let codec = SerialFraming::new();
    let mut start = vec![0u8; HEADER_LEN + 1 + FOOTER_LEN];
    start[HEADER_LEN] = 1;
    let mut cursor = HEADER_LEN + 1;
    codec
        .frame_final(FrameId::Start as u8, &mut start, &mut cursor)
        .unwrap();
    cmd_tool.send(&start).unwrap();

    // A producer thread feeding both channels.
    let producer = {
        let scope = Arc::clone(&scope);
        std::thread::spawn(move || {
            for i in 0..100u16 {
                scope.put_u16(0, 3300 + i).unwrap();
                let t = i as f32 * 0.01;
                scope.put_vf32(1, &[t.sin(), t.cos(), 9.81]).unwrap();
                std::thread::sleep(Duration::from_millis(1));
            }
        })
    };

    // The pump: poll commands, flush the stream, print what the tool
    // receives.
    let mut wire = Vec::new();
    let mut chunk = [0u8; 512];
    for _ in 0..40 {
        scope.recv()?;
        scope.stream()?;

        while let Ok(n) = stream_tool.recv(&mut chunk) {
            if n == 0 {
                break;
            }
            wire.extend_from_slice(&chunk[..n]);
        }
        while let Ok(frame) = codec.frame_get(&wire) {
            let consumed = frame.drop;
            println!(
                "stream frame: {} payload bytes, flags {:#04x}",
                frame.payload.len(),
                frame.payload[0]
            );
            wire.drain(..consumed);
        }

        std::thread::sleep(Duration::from_millis(5));
    }

    producer.join().unwrap();
    Ok(())
}
