pub mod payload;

pub use payload::RecordPayload;
