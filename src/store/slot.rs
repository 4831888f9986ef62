use parking_lot::Condvar;
use parking_lot::Mutex;
use parking_lot::RwLock;
use serde_json::Value;

/// Current contents of one path.
#[derive(Debug, Default)]
pub(super) struct SlotState {
    /// `None` when the path was never written or is tombstoned
    pub(super) value: Option<Value>,
    /// Version of the last committed mutation, 0 before the first write
    pub(super) version: u64,
    /// Commit sequence for publish ordering; unlike `version` it never resets
    pub(super) sequence: u64,
}

impl SlotState {
    /// Version of the live value, if any.
    pub(super) fn live_version(&self) -> Option<u64> {
        self.value.as_ref().map(|_| self.version)
    }
}

/// Per-path storage cell.
///
/// `state` is the write critical section. `sequencer` runs after `state` is
/// released and forces fan-out for this path into commit order.
#[derive(Debug, Default)]
pub(super) struct Slot {
    pub(super) state: RwLock<SlotState>,
    sequencer: PublishSequencer,
}

impl Slot {
    /// Runs `publish` once every earlier commit of this path has published.
    pub(super) fn publish_in_order<R>(
        &self,
        sequence: u64,
        publish: impl FnOnce() -> R,
    ) -> R {
        self.sequencer.run(sequence, publish)
    }
}

#[derive(Debug, Default)]
struct PublishSequencer {
    /// Highest commit sequence already published
    published: Mutex<u64>,
    turn: Condvar,
}

impl PublishSequencer {
    fn run<R>(
        &self,
        sequence: u64,
        f: impl FnOnce() -> R,
    ) -> R {
        let mut published = self.published.lock();
        assert!(
            sequence > *published,
            "publish sequence went backwards: {} after {}",
            sequence,
            *published
        );
        while *published + 1 != sequence {
            self.turn.wait(&mut published);
        }

        let out = f();
        *published = sequence;
        self.turn.notify_all();
        out
    }
}
