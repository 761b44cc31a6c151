// ==========================================
// EMBEDDED PLAYER CAPABILITY
// ==========================================
// The controller doesn't play video itself. It drives an embeddable player
// (a browser iframe, a desktop widget, a terminal stand-in...) through a
// tiny surface:
// - cue a video by id
// - play / pause
// - tell us when its state changes, most importantly when a video ENDS
//
// Key Concept: the player can't exist without a video.
// Embeddable players misbehave when created empty, so construction goes
// through a PlayerFactory that is only called once the first video is known.

use tokio::sync::mpsc::UnboundedSender;

use crate::player::controller::ControllerEvent;
use crate::player::queue::VideoId;

// ==========================================
// PLAYER STATE ENUM
// ==========================================
// What the player reports through its state-change notification.
//
// Only Ended means anything to the controller; every other state is
// accepted and ignored so players can report whatever they like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

// ==========================================
// VIDEO PLAYER TRAIT
// ==========================================
// Commands the controller sends to a live player.
//
// These are fire-and-forget: a real player applies them asynchronously and
// reports back (if at all) through the StateListener it was created with.
pub trait VideoPlayer: Send {
    // Load a video, replacing whatever was loaded before
    fn cue_video_by_id(&mut self, id: &VideoId);

    fn play_video(&mut self);

    fn pause_video(&mut self);
}

// ==========================================
// PLAYER FACTORY TRAIT
// ==========================================
// Creates the player, bound to its first video.
//
// Parameters:
// - initial_video: the video the player starts with (never empty)
// - listener: where the player must send its state changes; this is the
//   "ended" listener registration
pub trait PlayerFactory: Send {
    fn create(
        &mut self,
        initial_video: &VideoId,
        listener: StateListener,
    ) -> Box<dyn VideoPlayer>;
}

// ==========================================
// STATE LISTENER
// ==========================================
// Handed to the player at construction. Forwards state changes onto the
// controller's event channel, so an "ended" notification is handled on the
// same single line of control as clicks and fetch completions.
#[derive(Debug, Clone)]
pub struct StateListener {
    events: UnboundedSender<ControllerEvent>,
}

impl StateListener {
    pub(crate) fn new(events: UnboundedSender<ControllerEvent>) -> Self {
        StateListener { events }
    }

    pub fn notify(&self, state: PlayerState) {
        // The controller being gone just means the session is over
        let _ = self.events.send(ControllerEvent::StateChanged(state));
    }
}
