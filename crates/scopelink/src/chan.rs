use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{Result, ScopeError};
use crate::instance::{Scope, Shared};
use crate::types::{ChannelType, SampleType, CHAN_NAME_MAX, TYPE_CODE_LAST, USER_TYPE_FIRST};

/// One row of the channel table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Whether puts on this channel are currently encoded.
    pub enabled: bool,
    /// Declared type plus critical flag.
    pub ctype: ChannelType,
    /// Vector dimension (1 = scalar; 0 for metadata-only channels).
    pub vdim: u8,
    /// Rate divider: only 1 in every `div + 1` samples is encoded.
    pub div: u8,
    /// Metadata length every sample on this channel carries.
    pub mlen: u8,
    /// Channel name, bounded to [`CHAN_NAME_MAX`] bytes.
    pub name: String,
}

impl ChannelInfo {
    pub(crate) fn unset() -> Self {
        Self {
            enabled: false,
            ctype: ChannelType::new(SampleType::Undef),
            vdim: 0,
            div: 0,
            mlen: 0,
            name: String::new(),
        }
    }
}

/// Outcome of the validation gate in front of every put.
pub(crate) enum Gate {
    /// Encode the sample.
    Store { critical: bool },
    /// Silently drop: not started, channel disabled, or decimated.
    Skip,
}

impl Shared {
    /// The gatekeeper called before every sample is encoded.
    ///
    /// Distinguishes cheap fast-rejects (`Gate::Skip`, not an error) from
    /// layout mismatches and true capacity failures. Only the main-buffer
    /// capacity failure raises the overflow flag; the critical path has
    /// its own smaller buffer and its own failure mode.
    pub(crate) fn validate(
        &mut self,
        ch: u8,
        dtype: SampleType,
        vdim: u8,
        mlen: u8,
    ) -> Result<Gate> {
        if !self.started {
            return Ok(Gate::Skip);
        }

        if ch >= self.cmninfo.chmax {
            error!(ch, "put on out-of-range channel");
            return Err(ScopeError::InvalidChannel(ch));
        }

        let info = &self.chinfo[ch as usize];
        if !info.enabled {
            return Ok(Gate::Skip);
        }

        if info.ctype.dtype != dtype || info.vdim != vdim || info.mlen != mlen {
            error!(ch, ?dtype, vdim, mlen, "sample layout mismatch");
            return Err(ScopeError::LayoutMismatch(ch));
        }

        // Rate divider: a modulo decimator, not a leaky bucket. The
        // counter keeps its phase across enable/divider changes.
        if let Some(cntr) = self.cntr.as_mut() {
            cntr[ch as usize] = cntr[ch as usize].wrapping_add(1);
            if cntr[ch as usize] % (info.div as u32 + 1) != 0 {
                return Ok(Gate::Skip);
            }
        }

        let sample_len = 1 + dtype.size_of() * vdim as usize + mlen as usize;
        let foot = self.proto_stream.footer_len();

        if info.ctype.critical {
            if self.check_critical_space {
                let need = self.proto_stream.header_len() + sample_len + foot;
                let have = self.cribuf.as_ref().map_or(0, |b| b.len());
                if have < need {
                    error!(ch, need, have, "critical sample exceeds critical buffer");
                    return Err(ScopeError::CriticalFull);
                }
            }
            return Ok(Gate::Store { critical: true });
        }

        if self.stream.cursor() + sample_len + foot > self.stream.capacity() {
            self.stream.mark_overflow();
            return Err(ScopeError::StreamFull);
        }

        Ok(Gate::Store { critical: false })
    }
}

impl Scope {
    /// Initialize a channel slot: record its type, dimension, and
    /// metadata length, and reset enable/divider state.
    ///
    /// `name` is truncated to [`CHAN_NAME_MAX`] bytes. Critical channel
    /// types require the instance to be configured with a critical
    /// buffer.
    pub fn chan_init(
        &self,
        ch: u8,
        name: &str,
        ctype: ChannelType,
        vdim: u8,
        mlen: u8,
    ) -> Result<()> {
        let mut shared = self.lock();

        if ch >= shared.cmninfo.chmax {
            error!(ch, "chan_init on out-of-range channel");
            return Err(ScopeError::InvalidChannel(ch));
        }

        if ctype.critical && shared.cribuf.is_none() {
            error!(ch, "critical channels not configured");
            return Err(ScopeError::InvalidArgument(
                "critical channels not configured",
            ));
        }

        // The type code is a 5-bit wire field; a stray user code would
        // collide with the reserved and critical bits.
        if let SampleType::User(code) = ctype.dtype {
            if !(USER_TYPE_FIRST..=TYPE_CODE_LAST).contains(&code) {
                error!(ch, code, "user type code out of range");
                return Err(ScopeError::InvalidArgument("user type code out of range"));
            }
        }

        shared.chinfo[ch as usize] = ChannelInfo {
            enabled: false,
            ctype,
            vdim,
            mlen,
            div: 0,
            name: bounded_name(name),
        };

        debug!(ch, ?ctype, vdim, mlen, "channel initialized");
        Ok(())
    }

    /// Enable or disable a channel. Fails on slots that were never
    /// initialized.
    pub fn chan_en(&self, ch: u8, en: bool) -> Result<()> {
        let mut shared = self.lock();

        if ch >= shared.cmninfo.chmax {
            error!(ch, "chan_en on out-of-range channel");
            return Err(ScopeError::InvalidChannel(ch));
        }

        if shared.chinfo[ch as usize].ctype.dtype == SampleType::Undef {
            error!(ch, "chan_en on uninitialized channel");
            return Err(ScopeError::ChannelNotInitialized(ch));
        }

        debug!(ch, en, "channel enable");
        shared.chinfo[ch as usize].enabled = en;
        Ok(())
    }

    /// Configure the rate divider for a channel: only 1 in every
    /// `div + 1` samples is encoded.
    pub fn chan_div(&self, ch: u8, div: u8) -> Result<()> {
        let mut shared = self.lock();

        if shared.cntr.is_none() {
            return Err(ScopeError::Unsupported("divider"));
        }

        if ch >= shared.cmninfo.chmax {
            error!(ch, "chan_div on out-of-range channel");
            return Err(ScopeError::InvalidChannel(ch));
        }

        debug!(ch, div, "channel divider");
        shared.chinfo[ch as usize].div = div;
        Ok(())
    }

    /// Enable or disable every channel. Best-effort, not atomic: keeps
    /// going past failures and reports the first error.
    pub fn chan_all_en(&self, en: bool) -> Result<()> {
        let chmax = self.lock().cmninfo.chmax;
        let mut first_err = None;

        for ch in 0..chmax {
            if let Err(e) = self.chan_en(ch, en) {
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Snapshot of one channel's registration.
    pub fn channel(&self, ch: u8) -> Result<ChannelInfo> {
        let shared = self.lock();
        if ch >= shared.cmninfo.chmax {
            return Err(ScopeError::InvalidChannel(ch));
        }
        Ok(shared.chinfo[ch as usize].clone())
    }
}

/// Copy at most `CHAN_NAME_MAX` bytes of `name`, respecting UTF-8
/// boundaries.
fn bounded_name(name: &str) -> String {
    if name.len() <= CHAN_NAME_MAX {
        return name.to_owned();
    }
    let mut end = CHAN_NAME_MAX;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_owned()
}
