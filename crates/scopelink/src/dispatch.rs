use tracing::{debug, error, warn};

use crate::error::{Result, ScopeError};
use crate::instance::{Scope, Shared};
use crate::types::FrameId;

/// Set-request kind: one channel.
const SET_REQ_SINGLE: u8 = 0;
/// Set-request kind: per-channel values for every channel.
const SET_REQ_BULK: u8 = 1;
/// Set-request kind: one value applied to every channel.
const SET_REQ_ALL: u8 = 2;

impl Shared {
    /// Finalize and send one command-link frame from the tx scratch
    /// buffer.
    fn frame_send(&mut self, id: u8, data: &[u8]) -> Result<()> {
        let hdr = self.proto_cmd.header_len();
        let need = hdr + data.len() + self.proto_cmd.footer_len();
        if self.txbuf.len() < need {
            error!(need, have = self.txbuf.len(), "tx buffer too small");
            return Err(ScopeError::InvalidArgument("reply exceeds tx buffer"));
        }

        let mut cursor = hdr;
        self.txbuf[cursor..cursor + data.len()].copy_from_slice(data);
        cursor += data.len();

        self.proto_cmd.frame_final(id, &mut self.txbuf, &mut cursor)?;
        self.intf_cmd.send(&self.txbuf[..cursor])?;
        Ok(())
    }

    /// Reply with the common-info block.
    fn cmninfo_send(&mut self) -> Result<()> {
        let data = self.cmninfo.to_wire();
        self.frame_send(FrameId::CommonInfo as u8, &data)
    }

    /// Reply with one channel's registration and name.
    fn chinfo_send(&mut self, ch: u8) -> Result<()> {
        if ch >= self.cmninfo.chmax {
            error!(ch, "chinfo request for out-of-range channel");
            return Err(ScopeError::InvalidChannel(ch));
        }

        let info = &self.chinfo[ch as usize];
        let mut data = [0u8; crate::instance::CHINFO_DATA_MAX];
        data[0] = info.enabled as u8;
        data[1] = info.ctype.to_wire();
        data[2] = info.vdim;
        data[3] = info.div;
        data[4] = info.mlen;
        let name = info.name.as_bytes();
        data[5..5 + name.len()].copy_from_slice(name);
        let dlen = 5 + name.len() + 1; // name terminated with NUL

        self.frame_send(FrameId::ChannelInfo as u8, &data[..dlen])
    }

    /// Confirm a set request with its status code, if ACK frames are
    /// configured. ACK delivery failures are logged, not propagated.
    fn ack(&mut self, res: &Result<()>) {
        if !self.ack_frames {
            return;
        }
        let code: i32 = match res {
            Ok(()) => 0,
            Err(e) => e.wire_code(),
        };
        if let Err(e) = self.frame_send(FrameId::Ack as u8, &code.to_le_bytes()) {
            error!("ack send failed: {e}");
        }
    }

    /// Handle an ENABLE set request. Bulk and all variants validate
    /// every value before mutating anything.
    fn enable_req(&mut self, payload: &[u8]) -> Result<()> {
        let chmax = self.cmninfo.chmax as usize;
        if payload.len() < 2 {
            error!(dlen = payload.len(), "enable request too short");
            return Err(ScopeError::InvalidArgument("enable request too short"));
        }
        let (req, ch, data) = (payload[0], payload[1], &payload[2..]);

        match req {
            SET_REQ_SINGLE => {
                if payload.len() != 3 {
                    error!(dlen = payload.len(), "invalid enable single length");
                    return Err(ScopeError::InvalidArgument("enable single length"));
                }
                if data[0] > 1 {
                    return Err(ScopeError::InvalidArgument("enable value"));
                }
                if ch as usize >= chmax {
                    return Err(ScopeError::InvalidChannel(ch));
                }
                self.chinfo[ch as usize].enabled = data[0] == 1;
            }
            SET_REQ_BULK => {
                if payload.len() != 2 + chmax {
                    error!(dlen = payload.len(), "invalid enable bulk length");
                    return Err(ScopeError::InvalidArgument("enable bulk length"));
                }
                if data.iter().any(|&v| v > 1) {
                    return Err(ScopeError::InvalidArgument("enable value"));
                }
                for (info, &v) in self.chinfo.iter_mut().zip(data) {
                    info.enabled = v == 1;
                }
            }
            SET_REQ_ALL => {
                if payload.len() != 3 {
                    error!(dlen = payload.len(), "invalid enable all length");
                    return Err(ScopeError::InvalidArgument("enable all length"));
                }
                if data[0] > 1 {
                    return Err(ScopeError::InvalidArgument("enable value"));
                }
                for info in &mut self.chinfo {
                    info.enabled = data[0] == 1;
                }
            }
            _ => {
                error!(req, "invalid enable request kind");
                return Err(ScopeError::InvalidArgument("enable request kind"));
            }
        }

        debug!(req, ch, "enable request applied");
        Ok(())
    }

    /// Handle a DIV set request. Same shapes as ENABLE; any divider
    /// value is legal.
    fn div_req(&mut self, payload: &[u8]) -> Result<()> {
        let chmax = self.cmninfo.chmax as usize;
        if payload.len() < 2 {
            error!(dlen = payload.len(), "div request too short");
            return Err(ScopeError::InvalidArgument("div request too short"));
        }
        let (req, ch, data) = (payload[0], payload[1], &payload[2..]);

        match req {
            SET_REQ_SINGLE => {
                if payload.len() != 3 {
                    error!(dlen = payload.len(), "invalid div single length");
                    return Err(ScopeError::InvalidArgument("div single length"));
                }
                if ch as usize >= chmax {
                    return Err(ScopeError::InvalidChannel(ch));
                }
                self.chinfo[ch as usize].div = data[0];
            }
            SET_REQ_BULK => {
                if payload.len() != 2 + chmax {
                    error!(dlen = payload.len(), "invalid div bulk length");
                    return Err(ScopeError::InvalidArgument("div bulk length"));
                }
                for (info, &v) in self.chinfo.iter_mut().zip(data) {
                    info.div = v;
                }
            }
            SET_REQ_ALL => {
                if payload.len() != 3 {
                    error!(dlen = payload.len(), "invalid div all length");
                    return Err(ScopeError::InvalidArgument("div all length"));
                }
                for info in &mut self.chinfo {
                    info.div = data[0];
                }
            }
            _ => {
                error!(req, "invalid div request kind");
                return Err(ScopeError::InvalidArgument("div request kind"));
            }
        }

        debug!(req, ch, "div request applied");
        Ok(())
    }

    /// Dispatch one inbound command frame.
    pub(crate) fn handle_frame(&mut self, id: u8, payload: &[u8]) -> Result<()> {
        match FrameId::from_wire(id) {
            Some(FrameId::CommonInfo) => {
                debug!("common info request");
                if !payload.is_empty() {
                    error!(dlen = payload.len(), "invalid cmninfo request length");
                    return Err(ScopeError::InvalidArgument("cmninfo request length"));
                }
                self.cmninfo_send()
            }

            Some(FrameId::ChannelInfo) => {
                debug!("channel info request");
                if payload.len() != 1 {
                    error!(dlen = payload.len(), "invalid chinfo request length");
                    return Err(ScopeError::InvalidArgument("chinfo request length"));
                }
                self.chinfo_send(payload[0])
            }

            Some(FrameId::Start) => {
                debug!("start request");
                if payload.len() != 1 {
                    error!(dlen = payload.len(), "invalid start request length");
                    return Err(ScopeError::InvalidArgument("start request length"));
                }
                let res = if payload[0] <= 1 {
                    self.start_set(payload[0] == 1)
                } else {
                    Err(ScopeError::InvalidArgument("start value"))
                };
                self.ack(&res);
                res
            }

            Some(FrameId::Enable) => {
                debug!("enable request");
                let res = self.enable_req(payload);
                self.ack(&res);
                res
            }

            Some(FrameId::Divider) => {
                debug!("divider request");
                let res = if self.cntr.is_some() {
                    self.div_req(payload)
                } else {
                    Err(ScopeError::Unsupported("divider"))
                };
                self.ack(&res);
                res
            }

            // Everything else, including the stream/ack ids a peer
            // should never send us, lands in the user bucket.
            Some(FrameId::Stream) | Some(FrameId::Ack) | None => {
                if let Some(cb) = self.callbacks.as_mut() {
                    cb.on_user_frame(id, payload).map_err(|e| {
                        error!(id, "user frame callback failed: {e}");
                        e
                    })
                } else {
                    error!(id, "unsupported frame id");
                    Err(ScopeError::Unsupported("frame id"))
                }
            }
        }
    }
}

impl Scope {
    /// Receive and handle inbound protocol data.
    ///
    /// Drains the command transport into the receive buffer, extracts at
    /// most one complete frame, dispatches it, and compacts the buffer
    /// by exactly the bytes the codec consumed. "No complete frame yet"
    /// is not an error; it just means wait for more bytes.
    ///
    /// It is the embedding application's responsibility to call this
    /// periodically.
    pub fn recv(&self) -> Result<()> {
        let mut shared = self.lock();
        let shared = &mut *shared;

        loop {
            if shared.rxbuf_i >= shared.rxbuf.len() {
                break;
            }
            let n = {
                let spare = &mut shared.rxbuf[shared.rxbuf_i..];
                shared.intf_cmd.recv(spare)?
            };
            if n == 0 {
                break;
            }
            shared.rxbuf_i += n;
        }

        if shared.rxbuf_i == 0 {
            return Ok(());
        }

        // The frame borrows the receive buffer while dispatch mutates
        // the rest of the instance, so take the buffer out for the
        // duration.
        let mut rxbuf = std::mem::take(&mut shared.rxbuf);

        let (res, consumed) = match shared.proto_cmd.frame_get(&rxbuf[..shared.rxbuf_i]) {
            Ok(frame) => {
                let drop = frame.drop.min(shared.rxbuf_i);
                let res = shared.handle_frame(frame.id, frame.payload);
                (res, drop)
            }
            Err(_) if shared.rxbuf_i == rxbuf.len() => {
                // Full buffer and still no frame: drop everything to
                // resynchronize.
                warn!("receive buffer full with no frame, resynchronizing");
                (Ok(()), shared.rxbuf_i)
            }
            Err(_) => (Ok(()), 0),
        };

        if consumed > 0 {
            rxbuf.copy_within(consumed..shared.rxbuf_i, 0);
            shared.rxbuf_i -= consumed;
        }
        shared.rxbuf = rxbuf;

        res
    }
}
