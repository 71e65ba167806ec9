pub mod filesystem;
pub mod records;

pub use filesystem::ContentStorage;
pub use records::{NewMedia, RecordFilter, RecordStore, ShotPeer};
