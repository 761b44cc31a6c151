// Playback queue controller for an embedded video player fed by a paginated
// listing service.

pub mod config;
pub mod error;
pub mod player;
pub mod remote;
pub mod ui;

pub use config::{Pagination, PlayerConfig};
pub use error::{PlayerError, Result};
pub use player::controller::{
    ControllerEvent, ControllerHandle, ControllerState, Direction, FetchKind, PlaybackController,
};
pub use player::embed::{PlayerFactory, PlayerState, StateListener, VideoPlayer};
pub use player::queue::{OrderingKey, Queue, VideoId, VideoRecord, LOW_WATERMARK};
pub use remote::listing::{HttpVideoSource, PageRequest, VideoPage, VideoSource};
pub use remote::viewed::{HttpViewedReporter, ViewedReporter};
pub use ui::view::PlaylistView;
