pub mod model;
pub mod registry;

pub use model::{Room, RoomSnapshot, RoomStatus};
pub use registry::RoomRegistry;
