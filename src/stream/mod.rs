//! Streaming coordination
//!
//! - Rate: two-sample throughput estimation
//! - Buffering: poll loop driving the progress sink
//! - Playback: player capability traits + lifecycle supervision
//! - Overlay: paused-playback status overlay
//! - Mpv: concrete player adapter (subprocess + JSON IPC)
//! - Session: buffer-then-play orchestration for the UI layer

pub mod buffering;
pub mod mpv;
pub mod overlay;
pub mod playback;
pub mod rate;
pub mod session;

pub use buffering::{BufferingMonitor, BufferingOutcome, ProgressSink};
pub use overlay::{Overlay, OverlayController, OverlayState, StatusText, TextOverlay};
pub use playback::{AbortFlag, PlaybackSupervisor, Player, PlayerError, PlayerEvents};
pub use rate::RateEstimator;
pub use session::StreamSession;
