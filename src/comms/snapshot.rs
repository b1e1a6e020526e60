use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};

/// UI-relevant engine state, published by the audio path.
///
/// Every field is its own atomic. Readers poll [`UiSnapshot::update_count`]
/// and re-read the fields when it moves; the fields are not updated as one
/// transaction, so a reader may briefly see a mix of old and new values.
#[derive(Debug, Default)]
pub struct UiSnapshot {
    update_count: AtomicU32,
    is_processing: AtomicBool,
    polyphony: AtomicUsize,
    dropped_messages: AtomicU64,
    refresh_requested: AtomicBool,
}

impl UiSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_count(&self) -> u32 {
        self.update_count.load(Ordering::Acquire)
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing.load(Ordering::Relaxed)
    }

    /// Voices sounding at the end of the last block.
    pub fn polyphony(&self) -> usize {
        self.polyphony.load(Ordering::Relaxed)
    }

    /// Audio → UI messages lost to a full queue.
    pub fn dropped_messages(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    // Audio path side. Each setter bumps the counter only on a real change.

    pub(crate) fn set_processing(&self, processing: bool) {
        if self.is_processing.swap(processing, Ordering::Relaxed) != processing {
            self.bump();
        }
    }

    pub(crate) fn set_polyphony(&self, voices: usize) {
        if self.polyphony.swap(voices, Ordering::Relaxed) != voices {
            self.bump();
        }
    }

    pub(crate) fn set_dropped_messages(&self, dropped: u64) {
        if self.dropped_messages.swap(dropped, Ordering::Relaxed) != dropped {
            self.bump();
        }
    }

    #[inline]
    fn bump(&self) {
        self.update_count.fetch_add(1, Ordering::Release);
    }

    /// Ask the audio path to resend every parameter value.
    pub(crate) fn request_refresh(&self) {
        self.refresh_requested.store(true, Ordering::Release);
    }

    /// Consume a pending refresh request.
    pub(crate) fn take_refresh_request(&self) -> bool {
        self.refresh_requested.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_moves_only_on_change() {
        let snap = UiSnapshot::new();
        assert_eq!(snap.update_count(), 0);

        snap.set_processing(true);
        assert_eq!(snap.update_count(), 1);
        snap.set_processing(true);
        assert_eq!(snap.update_count(), 1);

        snap.set_polyphony(3);
        snap.set_polyphony(3);
        assert_eq!(snap.update_count(), 2);
        assert_eq!(snap.polyphony(), 3);
        assert!(snap.is_processing());
    }

    #[test]
    fn refresh_request_is_consumed_once() {
        let snap = UiSnapshot::new();
        assert!(!snap.take_refresh_request());
        snap.request_refresh();
        assert!(snap.take_refresh_request());
        assert!(!snap.take_refresh_request());
    }
}
