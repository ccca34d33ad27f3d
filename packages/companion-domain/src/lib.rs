pub mod chunk;
pub mod event;
pub mod profile;
pub mod protocol;
pub mod tags;
pub mod text;

pub use chunk::ChunkRecord;
pub use event::EventKind;
pub use profile::UserProfile;
pub use protocol::{Protocol, ProtocolSource, Track};
pub use tags::TagExpansion;
