pub mod hub;

pub use hub::{ConnectionRegistry, SyncHub};

// Live connection fan-out: the registry tracks every open viewer
// channel and the hub pushes serialized state frames to all of them,
// pruning connections that can no longer receive.
