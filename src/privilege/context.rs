//! Shared operation-mode cell.
//!
//! [`ModeCell`] is the explicit context object that replaces a process-wide
//! mode global. It is shared by `Arc` between the probe, the locale service,
//! and the session. Reads are public; the only writer is
//! [`ChannelProbe`](super::ChannelProbe), enforced by the setter's visibility.
//!
//! Every write bumps an epoch, even if the mode does not change. The locale
//! service keys its cached connection on `(mode, epoch)`, so a re-probe always
//! retires the previous connection.

use crate::domain::OperationMode;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Clone, Copy, Default)]
struct ModeState {
    mode: OperationMode,
    epoch: u64,
}

/// Operation mode plus a re-probe epoch, readable from any component.
#[derive(Debug, Default)]
pub struct ModeCell {
    inner: RwLock<ModeState>,
}

impl ModeCell {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current operation mode.
    #[must_use]
    pub fn get(&self) -> OperationMode {
        self.snapshot().0
    }

    /// Returns the mode together with the epoch of the probe that set it.
    #[must_use]
    pub fn snapshot(&self) -> (OperationMode, u64) {
        let state = *self.inner.read().unwrap_or_else(PoisonError::into_inner);
        (state.mode, state.epoch)
    }

    pub(in crate::privilege) fn set(&self, mode: OperationMode) -> u64 {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        state.mode = mode;
        state.epoch = state.epoch.wrapping_add(1);
        tracing::debug!(mode = %mode, epoch = state.epoch, "operation mode updated");
        state.epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_write_bumps_epoch() {
        let cell = ModeCell::new();
        assert_eq!(cell.snapshot(), (OperationMode::None, 0));

        cell.set(OperationMode::Root);
        cell.set(OperationMode::Root);
        assert_eq!(cell.snapshot(), (OperationMode::Root, 2));
    }
}
