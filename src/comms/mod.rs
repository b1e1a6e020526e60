//! Communication between the control surface and the audio path.
//!
//! Two bounded SPSC queues (`FromUi` in, `ToUi` out) plus a shared
//! [`UiSnapshot`] of atomics. Nothing here locks or allocates after
//! [`channel`] returns.

pub mod message;
pub mod queue;
pub mod snapshot;

use std::sync::Arc;

pub use message::{FromUi, ToUi};
pub use queue::{queue, Receiver, Sender};
pub use snapshot::UiSnapshot;

use crate::param::{ParamId, ParamInfo, ParamTable};

/// Build both ends of the UI link. `capacity` applies to each queue.
pub fn channel(capacity: usize, params: Arc<ParamTable>) -> (SynthComms, UiHandle) {
    let (to_ui, from_synth) = queue(capacity);
    let (to_synth, from_ui) = queue(capacity);
    let snapshot = Arc::new(UiSnapshot::new());

    let synth = SynthComms {
        to_ui,
        from_ui,
        snapshot: Arc::clone(&snapshot),
    };
    let ui = UiHandle {
        to_synth,
        from_synth,
        snapshot,
        params,
    };
    (synth, ui)
}

/// Audio path end. Owned by the engine.
pub struct SynthComms {
    pub(crate) to_ui: Sender<ToUi>,
    pub(crate) from_ui: Receiver<FromUi>,
    snapshot: Arc<UiSnapshot>,
}

impl SynthComms {
    #[inline]
    pub fn send(&mut self, msg: ToUi) -> bool {
        self.to_ui.try_enqueue(msg)
    }

    pub fn snapshot(&self) -> &UiSnapshot {
        &self.snapshot
    }

    /// Messages to the control surface lost to a full queue.
    pub fn dropped(&self) -> u64 {
        self.to_ui.dropped()
    }

    /// Mirror the drop counter into the snapshot.
    pub(crate) fn publish_drops(&self) {
        self.snapshot.set_dropped_messages(self.to_ui.dropped());
    }
}

/// Control surface end.
///
/// Everything the editor needs: the two queues, the published snapshot,
/// and read access to parameter descriptions.
pub struct UiHandle {
    to_synth: Sender<FromUi>,
    from_synth: Receiver<ToUi>,
    snapshot: Arc<UiSnapshot>,
    params: Arc<ParamTable>,
}

impl UiHandle {
    /// Queue a message for the audio path. False means it was dropped.
    pub fn try_send(&mut self, msg: FromUi) -> bool {
        self.to_synth.try_enqueue(msg)
    }

    pub fn try_recv(&mut self) -> Option<ToUi> {
        self.from_synth.try_dequeue()
    }

    pub fn begin_edit(&mut self, id: ParamId) -> bool {
        self.try_send(FromUi::BeginEdit { id: id.raw() })
    }

    pub fn adjust(&mut self, id: ParamId, value: f64) -> bool {
        self.try_send(FromUi::AdjustValue {
            id: id.raw(),
            value,
        })
    }

    pub fn end_edit(&mut self, id: ParamId) -> bool {
        self.try_send(FromUi::EndEdit { id: id.raw() })
    }

    /// Ask for a `ToUi::ParamValue` of every parameter on the next block,
    /// e.g. when an editor opens.
    pub fn request_refresh(&self) {
        self.snapshot.request_refresh();
    }

    pub fn snapshot(&self) -> &UiSnapshot {
        &self.snapshot
    }

    pub fn params(&self) -> &ParamTable {
        &self.params
    }

    pub fn param_info(&self, raw: u32) -> Option<&ParamInfo> {
        self.params.lookup(raw)
    }

    /// Messages this side failed to queue.
    pub fn dropped(&self) -> u64 {
        self.to_synth.dropped()
    }
}
