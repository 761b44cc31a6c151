// The playlist surface the controller keeps in sync with the queue.
// Rendering is someone else's job; this is only what gets told to it.

use crate::player::queue::VideoRecord;

pub trait PlaylistView: Send {
    // A video became current: show its title/description and highlight
    // its playlist entry (position is its index in the queue)
    fn show_video(&mut self, video: &VideoRecord, position: usize);

    // Nothing to play, in either the "no videos at all" or "watched
    // everything" sense
    fn show_no_video(&mut self);

    // Playlist fragments for a page added at the end, in playback order
    fn append_to_playlist(&mut self, fragments: Vec<String>);

    // Playlist fragments for a page added at the front, in playback order
    fn prepend_to_playlist(&mut self, fragments: Vec<String>);
}
