// Checkpoints domain - immutable reference data for site gates

pub mod models;

pub use models::Checkpoint;
