use std::sync::{Mutex, MutexGuard};

use tracing::{debug, error};

use scopelink_transport::Transport;
use scopelink_wire::FrameCodec;

use crate::buffer::StreamBuffer;
use crate::chan::ChannelInfo;
use crate::config::{ScopeCallbacks, ScopeConfig, ScopeLink};
use crate::error::{Result, ScopeError};
use crate::types::{
    CommonInfo, FrameId, CHAN_NAME_MAX, FLAG_ACK_SUPPORT, FLAG_DIVIDER_SUPPORT,
};

/// Largest CHINFO response payload: the fixed fields plus a
/// NUL-terminated name.
pub(crate) const CHINFO_DATA_MAX: usize = 5 + CHAN_NAME_MAX + 1;

/// A telemetry/scope instance.
///
/// Owns the channel table, the stream and receive buffers, and the
/// transport/codec collaborators for both links. Any number of producer
/// threads may call the `put_*` family concurrently; exactly one pump
/// context is expected to call [`recv`](Scope::recv) and
/// [`stream`](Scope::stream) periodically. All state is guarded by one
/// internal lock held for the duration of each operation, including
/// transport sends — a slow transport stalls producers by design,
/// trading latency for correctness.
pub struct Scope {
    shared: Mutex<Shared>,
}

/// All mutable instance state, guarded by the instance lock.
pub(crate) struct Shared {
    pub(crate) intf_cmd: Box<dyn Transport>,
    pub(crate) intf_stream: Box<dyn Transport>,
    pub(crate) proto_cmd: Box<dyn FrameCodec>,
    pub(crate) proto_stream: Box<dyn FrameCodec>,
    pub(crate) callbacks: Option<Box<dyn ScopeCallbacks>>,

    pub(crate) cmninfo: CommonInfo,
    pub(crate) chinfo: Vec<ChannelInfo>,
    /// Divider counters, present iff divider support is configured.
    pub(crate) cntr: Option<Vec<u32>>,
    pub(crate) started: bool,

    pub(crate) stream: StreamBuffer,
    pub(crate) stream_retry: bool,
    /// Critical-channel scratch buffer; never holds data across calls.
    pub(crate) cribuf: Option<Box<[u8]>>,
    pub(crate) check_critical_space: bool,

    pub(crate) rxbuf: Box<[u8]>,
    pub(crate) rxbuf_i: usize,
    pub(crate) txbuf: Box<[u8]>,

    pub(crate) ack_frames: bool,
}

impl Scope {
    /// Build an instance from its configuration and collaborators.
    ///
    /// All buffers are allocated up front; a rejected configuration
    /// returns an error and no partially-usable instance.
    pub fn new(cfg: ScopeConfig, link: ScopeLink) -> Result<Self> {
        cfg.validate()?;

        let stream_hdr = link.proto_stream.header_len();
        let stream_min = stream_hdr + 1 + link.proto_stream.footer_len();
        if cfg.streambuf_len < stream_min {
            error!(
                streambuf_len = cfg.streambuf_len,
                stream_min, "stream buffer cannot hold an empty frame"
            );
            return Err(ScopeError::Config("stream buffer too small"));
        }

        let txbuf_len =
            link.proto_cmd.header_len() + CHINFO_DATA_MAX + link.proto_cmd.footer_len();

        let mut flags = 0u8;
        if cfg.divider {
            flags |= FLAG_DIVIDER_SUPPORT;
        }
        if cfg.ack_frames {
            flags |= FLAG_ACK_SUPPORT;
        }

        let shared = Shared {
            intf_cmd: link.intf_cmd,
            intf_stream: link.intf_stream,
            proto_cmd: link.proto_cmd,
            proto_stream: link.proto_stream,
            callbacks: link.callbacks,
            cmninfo: CommonInfo {
                chmax: cfg.channels,
                flags,
                rx_padding: cfg.rx_padding,
            },
            chinfo: (0..cfg.channels).map(|_| ChannelInfo::unset()).collect(),
            cntr: cfg
                .divider
                .then(|| vec![0u32; cfg.channels as usize]),
            started: false,
            stream: StreamBuffer::new(cfg.streambuf_len, stream_hdr),
            stream_retry: false,
            cribuf: cfg
                .cribuf_len
                .map(|len| vec![0u8; len].into_boxed_slice()),
            check_critical_space: cfg.check_critical_space,
            rxbuf: vec![0u8; cfg.rxbuf_len].into_boxed_slice(),
            rxbuf_i: 0,
            txbuf: vec![0u8; txbuf_len].into_boxed_slice(),
            ack_frames: cfg.ack_frames,
        };

        Ok(Self {
            shared: Mutex::new(shared),
        })
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Flush accumulated stream data as one framed packet.
    ///
    /// It is the embedding application's responsibility to call this
    /// periodically. No-op success when streaming is stopped or the
    /// buffer is empty. On transport failure the finalized frame stays
    /// buffered and the next call retries it verbatim.
    pub fn stream(&self) -> Result<()> {
        let mut shared = self.lock();
        let shared = &mut *shared;

        if !shared.started {
            return Ok(());
        }
        if shared.stream.is_empty() {
            return Ok(());
        }

        let (buf, cursor) = shared.stream.parts_mut();
        send_buffer(
            shared.proto_stream.as_ref(),
            shared.intf_stream.as_mut(),
            &mut shared.stream_retry,
            buf,
            cursor,
        )?;

        shared.stream.reset();
        Ok(())
    }

    /// Start or stop the data stream locally (the programmatic
    /// equivalent of a remote START request).
    pub fn stream_start(&self, start: bool) -> Result<()> {
        let mut shared = self.lock();
        debug!(start, "local stream start");
        shared.start_set(start)
    }

    /// Whether streaming is currently started.
    pub fn is_started(&self) -> bool {
        self.lock().started
    }

    /// The instance-level info block as reported to the remote peer.
    pub fn common_info(&self) -> CommonInfo {
        self.lock().cmninfo
    }
}

impl Shared {
    /// Flip the started flag and notify the user callback.
    ///
    /// The flag is updated even when the callback fails; stopping is
    /// cooperative and must not be vetoed.
    pub(crate) fn start_set(&mut self, start: bool) -> Result<()> {
        self.started = start;

        if let Some(cb) = self.callbacks.as_mut() {
            if let Err(e) = cb.on_start(start) {
                error!(start, "start callback failed: {e}");
                return Err(e);
            }
        }

        Ok(())
    }
}

/// Finalize (unless retrying) and send one buffered frame.
///
/// Shared by the periodic stream flush and the critical-channel bypass.
/// The retry flag guarantees a frame is stamped exactly once: a frame
/// that failed to send is already finalized and must be retried
/// verbatim, never re-stamped.
pub(crate) fn send_buffer(
    proto: &dyn FrameCodec,
    intf: &mut dyn Transport,
    retry: &mut bool,
    buf: &mut [u8],
    cursor: &mut usize,
) -> Result<()> {
    if !*retry {
        proto.frame_final(FrameId::Stream as u8, buf, cursor)?;
    }

    match intf.send(&buf[..*cursor]) {
        Ok(()) => {
            *retry = false;
            Ok(())
        }
        Err(e) => {
            error!("stream send failed: {e}");
            *retry = true;
            Err(e.into())
        }
    }
}
