pub mod settings;

pub use settings::{PipelineSettings, RoomSettings, Settings};
