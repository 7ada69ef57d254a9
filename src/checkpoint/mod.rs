//! Persistence of trained networks: whole-agent checkpoints with metadata,
//! and bare network snapshots for loading a pretrained brain.

mod manager;
mod metadata;

pub use manager::{
    load_pretrained, save_network, CheckpointData, CheckpointManager, CheckpointManagerConfig,
};
pub use metadata::{CheckpointMetadata, CheckpointMetrics};
