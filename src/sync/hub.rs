use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::document::Frame;

/// A frame serialized once and shared across all deliveries.
pub type FramePayload = Arc<str>;

type FrameSender = mpsc::UnboundedSender<FramePayload>;

/// The set of currently open viewer connections.
///
/// Each entry maps a connection id to the sending half of that viewer's
/// delivery channel. The WebSocket task owns the receiving half; when it
/// exits the channel closes and the next broadcast pass prunes the entry.
#[derive(Default)]
pub struct ConnectionRegistry {
    conns: DashMap<Uuid, FrameSender>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection. Registering an id that is already present is a
    /// no-op guard: the original sender stays and `false` is returned.
    pub fn register(&self, id: Uuid, tx: FrameSender) -> bool {
        match self.conns.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(tx);
                true
            }
        }
    }

    /// Remove a connection if present. Idempotent.
    pub fn unregister(&self, id: &Uuid) -> bool {
        self.conns.remove(id).is_some()
    }

    /// Sending half for one connection, if registered.
    pub fn sender(&self, id: &Uuid) -> Option<FrameSender> {
        self.conns.get(id).map(|entry| entry.value().clone())
    }

    /// Point-in-time membership for a broadcast pass.
    pub fn snapshot(&self) -> Vec<(Uuid, FrameSender)> {
        self.conns
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }
}

/// Fan-out hub: owns the registry and pushes frames to every viewer.
#[derive(Default)]
pub struct SyncHub {
    registry: ConnectionRegistry,
}

impl SyncHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new viewer connection and hand back its id plus the
    /// receiving half of its delivery channel.
    pub fn attach(&self) -> (Uuid, mpsc::UnboundedReceiver<FramePayload>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.registry.register(id, tx);
        (id, rx)
    }

    /// Drop a viewer connection. Safe to call more than once.
    pub fn detach(&self, id: &Uuid) {
        if self.registry.unregister(id) {
            debug!("connection {id} unregistered");
        }
    }

    /// Send a frame to a single connection (the catch-up frame on connect).
    pub fn send_to(&self, id: &Uuid, frame: &Frame) -> bool {
        let Some(payload) = encode(frame) else {
            return false;
        };
        match self.registry.sender(id) {
            Some(tx) => tx.send(payload).is_ok(),
            None => false,
        }
    }

    /// Push a frame to every registered connection.
    ///
    /// A connection whose channel is closed is unregistered after the
    /// pass; its failure never aborts delivery to the rest. Returns the
    /// number of connections that accepted the frame.
    pub fn broadcast(&self, frame: &Frame) -> usize {
        let Some(payload) = encode(frame) else {
            return 0;
        };

        let mut dead = Vec::new();
        let mut delivered = 0;
        for (id, tx) in self.registry.snapshot() {
            if tx.send(payload.clone()).is_ok() {
                delivered += 1;
            } else {
                dead.push(id);
            }
        }

        for id in &dead {
            self.registry.unregister(id);
            debug!("pruned dead connection {id}");
        }

        delivered
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }
}

fn encode(frame: &Frame) -> Option<FramePayload> {
    match serde_json::to_string(frame) {
        Ok(json) => Some(FramePayload::from(json)),
        Err(err) => {
            error!("failed to serialize frame: {err}");
            None
        }
    }
}
