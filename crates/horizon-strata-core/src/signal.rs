//! Signal/slot notifications for Horizon Strata.
//!
//! Renderers announce what they did (a pass was applied, a slot was patched,
//! an action was routed) through signals. Observers connect slots (closures)
//! that are invoked synchronously, on the emitting thread, when the signal is
//! emitted.
//!
//! # Reentrancy
//!
//! Slots are invoked after the connection table lock has been released, so a
//! slot may connect, disconnect, or trigger a render that emits the same signal
//! again without deadlocking. Connections made during an emission are not
//! invoked by that emission.
//!
//! # Example
//!
//! ```
//! use horizon_strata_core::Signal;
//!
//! let applied = Signal::<usize>::new();
//!
//! let conn_id = applied.connect(|changes| {
//!     println!("applied {} changes", changes);
//! });
//!
//! applied.emit(3);
//! applied.disconnect(conn_id);
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::error::{Result, SignalError};
use crate::logging::targets;

new_key_type! {
    /// Identifies one connection of a [`Signal`].
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

struct Connections<Args> {
    slots: SlotMap<ConnectionId, (u64, Slot<Args>)>,
    /// Slot map keys are reused, so invocation order is kept separately.
    next_order: u64,
}

/// A synchronous notification with any number of connected slots.
///
/// Slots are invoked in connection order.
pub struct Signal<Args> {
    connections: Mutex<Connections<Args>>,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Creates a signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(Connections {
                slots: SlotMap::with_key(),
                next_order: 0,
            }),
        }
    }

    /// Connects a slot. Returns the id to disconnect it with.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let mut connections = self.connections.lock();
        connections.next_order += 1;
        let order = connections.next_order;
        connections.slots.insert((order, Arc::new(slot)))
    }

    /// Disconnects a slot. Returns `false` if `id` was not connected.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().slots.remove(id).is_some()
    }

    /// Disconnects a slot, reporting an unknown id as an error.
    pub fn try_disconnect(&self, id: ConnectionId) -> Result<()> {
        if self.disconnect(id) {
            Ok(())
        } else {
            Err(SignalError::InvalidConnection)
        }
    }

    /// Disconnects every slot.
    pub fn disconnect_all(&self) {
        self.connections.lock().slots.clear();
    }

    /// Number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().slots.len()
    }

    /// Invokes every connected slot with `args`.
    pub fn emit(&self, args: Args) {
        let mut slots: Vec<(u64, Slot<Args>)> = self
            .connections
            .lock()
            .slots
            .values()
            .map(|(order, slot)| (*order, Arc::clone(slot)))
            .collect();
        if slots.is_empty() {
            return;
        }
        slots.sort_unstable_by_key(|(order, _)| *order);

        tracing::trace!(target: targets::SIGNAL, slots = slots.len(), "emitting signal");
        for (_, slot) in slots {
            slot(&args);
        }
    }
}

impl<Args> fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connections.lock().slots.len())
            .finish()
    }
}

static_assertions::assert_impl_all!(Signal<()>: Send, Sync);
