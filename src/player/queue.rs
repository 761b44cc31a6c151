// ==========================================
// QUEUE MANAGEMENT MODULE
// ==========================================
// This module holds the playback order for the video player.
// It handles:
// - Adding fetched pages to the tail (next page) or head (previous page)
// - Moving a cursor forwards and backwards through the videos
// - Answering "are we running low?" so the controller can prefetch
// - The single-flight flag that stops two page fetches overlapping
//
// Key Concept: the queue only ever grows.
// - Unlike a music queue that pops tracks off the front, nothing is removed
// - "Where we are" is a cursor (index) into the sequence
// - Going back is just moving the cursor, no history list needed
//
// The queue is pure data: no I/O, no async. The controller owns one.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::VecDeque;
use std::fmt;

// How close to either end of the queue the cursor may get before the
// controller asks the listing service for another page.
pub const LOW_WATERMARK: isize = 5;

// ==========================================
// WIRE TOKENS
// ==========================================
// The listing service sends ids and ordering keys as either JSON strings or
// JSON numbers depending on the backend. We never do arithmetic on them, so
// both end up as the exact text the server sent.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireToken {
    Text(String),
    Number(serde_json::Number),
}

fn token_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match WireToken::deserialize(deserializer)? {
        WireToken::Text(text) => text,
        WireToken::Number(number) => number.to_string(),
    })
}

// Opaque video identifier, handed to the player and the viewed endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoId(#[serde(deserialize_with = "token_text")] String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        VideoId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Opaque pagination token. Sent back to the listing service as
// ?after=<key> or ?before=<key>.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderingKey(#[serde(deserialize_with = "token_text")] String);

impl OrderingKey {
    pub fn new(key: impl Into<String>) -> Self {
        OrderingKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ==========================================
// VIDEO RECORD STRUCT
// ==========================================
// One video as returned by the listing service.
//
// Fields explained:
//
// id: VideoId
//   - What the player is cued with, and what we report as viewed
//
// title / description: String
//   - Pushed to the details panel when this video becomes current
//   - Missing fields decode as empty strings
//
// html_snippet: String
//   - Pre-rendered playlist entry from the server
//   - Treated as one opaque blob; we never look inside it
//
// ordering_key: Option<OrderingKey>
//   - Where this video sits in the server's ordering
//   - The head and tail keys are the pagination cursors
//   - Optional because older listing endpoints don't send it
//
// Records are never mutated after they land in the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: VideoId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub html_snippet: String,
    #[serde(default)]
    pub ordering_key: Option<OrderingKey>,
}

impl VideoRecord {
    pub fn new(
        id: VideoId,
        title: String,
        description: String,
        html_snippet: String,
        ordering_key: Option<OrderingKey>,
    ) -> Self {
        VideoRecord {
            id,
            title,
            description,
            html_snippet,
            ordering_key,
        }
    }
}

// ==========================================
// QUEUE STRUCT
// ==========================================
// Fields explained:
//
// records: VecDeque<VideoRecord>
//   - Every video fetched so far, in playback order
//   - VecDeque because "previous page" results go on the FRONT
//     and "next page" results go on the BACK
//
// index: isize
//   - The cursor, signed on purpose:
//     * -1 means "before the first video" (nothing started yet)
//     * 0..len-1 points at a playable video
//     * len means "past the last video" (forward exhaustion)
//   - It never leaves [-1, len]
//
// fetch_in_flight: bool
//   - The single-flight guard for page fetches
//   - Set when a fetch is dispatched, cleared when its result is handled
//   - While set, new fetch requests are dropped (not queued!)
#[derive(Debug)]
pub struct Queue {
    records: VecDeque<VideoRecord>,
    index: isize,
    fetch_in_flight: bool,
}

impl Default for Queue {
    fn default() -> Self {
        Self::new()
    }
}

impl Queue {
    // ==========================================
    // CONSTRUCTOR: new()
    // ==========================================
    // Empty queue with the cursor before the (not yet existing) first video.
    pub fn new() -> Self {
        Queue {
            records: VecDeque::new(),
            index: -1,
            fetch_in_flight: false,
        }
    }

    // ==========================================
    // ADDING VIDEOS: append()
    // ==========================================
    // Adds a page of videos to the tail, keeping their order.
    //
    // Example:
    // - Queue: [A, B], index 1
    // - append([C, D])
    // - Queue: [A, B, C, D], index still 1 (still B)
    //
    // If the cursor was past the end (exhausted) it now points at C,
    // which is how the controller recovers from exhaustion.
    pub fn append(&mut self, records: Vec<VideoRecord>) {
        self.records.extend(records);
    }

    // ==========================================
    // ADDING VIDEOS: prepend()
    // ==========================================
    // Adds a page of videos to the head. `records` must already be in
    // playback order (records[0] becomes the new head).
    //
    // The cursor shifts by records.len() so it keeps pointing at the
    // same video it did before. Fetching an older page must never change
    // what's "current".
    //
    // Example:
    // - Queue: [C, D], index 0 (C)
    // - prepend([A, B])
    // - Queue: [A, B, C, D], index 2 (still C)
    //
    // Edge case: index -1 means nothing is current, so there's nothing to
    // keep in place and the cursor stays before the (new) head.
    pub fn prepend(&mut self, records: Vec<VideoRecord>) {
        let added = records.len() as isize;

        // push_front one by one in reverse so records[0] ends up first
        for record in records.into_iter().rev() {
            self.records.push_front(record);
        }

        if self.index >= 0 {
            self.index += added;
        }
    }

    // ==========================================
    // NAVIGATION: advance()
    // ==========================================
    // Moves the cursor one step forward.
    //
    // Returns: Option<&VideoRecord>
    // - Some(video): the video now under the cursor
    // - None: we stepped onto the past-the-end slot, or were already there
    //
    // Cases:
    // - index < len: index += 1, then look up (None if it became len)
    // - index == len: no-op, None
    pub fn advance(&mut self) -> Option<&VideoRecord> {
        if self.index >= self.len() as isize {
            return None;
        }

        self.index += 1;
        self.current()
    }

    // ==========================================
    // NAVIGATION: retreat()
    // ==========================================
    // Moves the cursor one step back.
    //
    // Only valid when index > 0. At index 0 (first video) or -1 (nothing
    // started) this is a no-op returning None.
    //
    // Retreating from the past-the-end slot lands on the last video.
    pub fn retreat(&mut self) -> Option<&VideoRecord> {
        if self.index <= 0 {
            return None;
        }

        self.index -= 1;
        self.current()
    }

    // ==========================================
    // PREFETCH CHECKS
    // ==========================================
    // is_running_low(): fewer than LOW_WATERMARK videos from the cursor to
    // the tail (counting the current one).
    //
    // Boundary:
    // - len 5, index 0 → 5 - 0 = 5, NOT low
    // - len 4, index 0 → 4, low
    // - len 0, index -1 → 1, low (so the very first page is always wanted)
    pub fn is_running_low(&self) -> bool {
        self.len() as isize - self.index < LOW_WATERMARK
    }

    // Mirror image for the head: fewer than LOW_WATERMARK videos from the
    // first one up to and including the cursor.
    pub fn is_running_low_behind(&self) -> bool {
        self.index + 1 < LOW_WATERMARK
    }

    // ==========================================
    // SINGLE-FLIGHT GUARD
    // ==========================================
    // try_begin_fetch() claims the guard.
    //
    // Returns: bool
    // - true: guard was free, now held; caller should dispatch the fetch
    // - false: a fetch is already outstanding; caller drops the request
    //
    // No waiting list: a request dropped here is gone, even if the
    // outstanding fetch is for the other direction.
    pub fn try_begin_fetch(&mut self) -> bool {
        if self.fetch_in_flight {
            return false;
        }
        self.fetch_in_flight = true;
        true
    }

    // Releases the guard. Called from the fetch completion handler.
    pub fn finish_fetch(&mut self) {
        self.fetch_in_flight = false;
    }

    pub fn is_fetch_in_flight(&self) -> bool {
        self.fetch_in_flight
    }

    // ==========================================
    // QUEUE INSPECTION
    // ==========================================
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn index(&self) -> isize {
        self.index
    }

    // The video under the cursor, None at -1 or past the end.
    pub fn current(&self) -> Option<&VideoRecord> {
        self.get(self.index)
    }

    // Signed lookup so callers can pass the cursor straight in.
    pub fn get(&self, index: isize) -> Option<&VideoRecord> {
        if index < 0 {
            return None;
        }
        self.records.get(index as usize)
    }

    // First video, its ordering key is the "before" cursor.
    pub fn head(&self) -> Option<&VideoRecord> {
        self.records.front()
    }

    // Last video, its ordering key is the "after" cursor.
    pub fn tail(&self) -> Option<&VideoRecord> {
        self.records.back()
    }

    // True once the cursor has moved past the last fetched video.
    pub fn is_exhausted(&self) -> bool {
        self.index >= self.len() as isize
    }

    pub fn iter(&self) -> impl Iterator<Item = &VideoRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str) -> VideoRecord {
        VideoRecord::new(
            VideoId::new(id),
            format!("title {}", id),
            format!("description {}", id),
            format!("<div>{}</div>", id),
            Some(OrderingKey::new(format!("key-{}", id))),
        )
    }

    fn videos(ids: &[&str]) -> Vec<VideoRecord> {
        ids.iter().map(|id| video(id)).collect()
    }

    fn current_id(queue: &Queue) -> Option<&str> {
        queue.current().map(|v| v.id.as_str())
    }

    #[test]
    fn new_queue_starts_before_first_item() {
        let queue = Queue::new();
        assert_eq!(queue.index(), -1);
        assert_eq!(queue.len(), 0);
        assert!(queue.current().is_none());
        assert!(!queue.is_fetch_in_flight());
    }

    #[test]
    fn append_preserves_order() {
        let mut queue = Queue::new();
        queue.append(videos(&["a", "b"]));
        queue.append(videos(&["c"]));

        let ids: Vec<&str> = queue.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(queue.head().map(|v| v.id.as_str()), Some("a"));
        assert_eq!(queue.tail().map(|v| v.id.as_str()), Some("c"));
    }

    #[test]
    fn advance_walks_to_past_the_end_and_stops() {
        let mut queue = Queue::new();
        queue.append(videos(&["a", "b"]));

        assert_eq!(queue.advance().map(|v| v.id.as_str()), Some("a"));
        assert_eq!(queue.advance().map(|v| v.id.as_str()), Some("b"));
        assert!(queue.advance().is_none());
        assert_eq!(queue.index(), 2);
        assert!(queue.is_exhausted());

        // already past the end: no-op
        assert!(queue.advance().is_none());
        assert_eq!(queue.index(), 2);
    }

    #[test]
    fn advance_on_empty_queue_moves_to_zero_only() {
        let mut queue = Queue::new();
        assert!(queue.advance().is_none());
        assert_eq!(queue.index(), 0);
        assert!(queue.advance().is_none());
        assert_eq!(queue.index(), 0);
    }

    #[test]
    fn retreat_stops_at_first_item() {
        let mut queue = Queue::new();
        queue.append(videos(&["a", "b"]));
        queue.advance();
        queue.advance();

        assert_eq!(queue.retreat().map(|v| v.id.as_str()), Some("a"));
        assert_eq!(queue.index(), 0);
        assert!(queue.retreat().is_none());
        assert_eq!(queue.index(), 0);
    }

    #[test]
    fn retreat_before_start_is_noop() {
        let mut queue = Queue::new();
        queue.append(videos(&["a"]));
        assert!(queue.retreat().is_none());
        assert_eq!(queue.index(), -1);
    }

    #[test]
    fn retreat_from_past_the_end_lands_on_last_item() {
        let mut queue = Queue::new();
        queue.append(videos(&["a", "b"]));
        queue.advance();
        queue.advance();
        queue.advance();
        assert!(queue.is_exhausted());

        assert_eq!(queue.retreat().map(|v| v.id.as_str()), Some("b"));
    }

    #[test]
    fn cursor_never_leaves_bounds() {
        let mut queue = Queue::new();
        queue.append(videos(&["a", "b", "c"]));

        // a fixed, awkward walk: forwards past the end, back past the start
        let moves = [
            true, true, true, true, true, false, false, false, false, false, true, false, true,
            true, true, true,
        ];
        for forward in moves {
            if forward {
                queue.advance();
            } else {
                queue.retreat();
            }
            assert!(queue.index() >= -1);
            assert!(queue.index() <= queue.len() as isize);
        }
    }

    #[test]
    fn prepend_keeps_current_item() {
        let mut queue = Queue::new();
        queue.append(videos(&["c", "d"]));
        queue.advance();
        queue.advance();
        assert_eq!(current_id(&queue), Some("d"));

        queue.prepend(videos(&["a", "b"]));

        assert_eq!(queue.index(), 3);
        assert_eq!(current_id(&queue), Some("d"));
        assert_eq!(queue.head().map(|v| v.id.as_str()), Some("a"));
        assert_eq!(queue.get(1).map(|v| v.id.as_str()), Some("b"));
    }

    #[test]
    fn prepend_before_start_leaves_cursor_alone() {
        let mut queue = Queue::new();
        queue.append(videos(&["c"]));
        queue.prepend(videos(&["a", "b"]));

        assert_eq!(queue.index(), -1);
        assert_eq!(queue.advance().map(|v| v.id.as_str()), Some("a"));
    }

    #[test]
    fn prepend_while_exhausted_stays_exhausted() {
        let mut queue = Queue::new();
        queue.append(videos(&["b"]));
        queue.advance();
        queue.advance();
        assert!(queue.is_exhausted());

        queue.prepend(videos(&["a"]));
        assert_eq!(queue.index(), 2);
        assert!(queue.is_exhausted());
    }

    #[test]
    fn append_after_exhaustion_makes_cursor_valid_again() {
        let mut queue = Queue::new();
        queue.append(videos(&["a"]));
        queue.advance();
        queue.advance();
        assert!(queue.current().is_none());

        queue.append(videos(&["b"]));
        assert_eq!(current_id(&queue), Some("b"));
    }

    #[test]
    fn running_low_boundary() {
        let mut queue = Queue::new();
        queue.append(videos(&["1", "2", "3", "4", "5"]));
        queue.advance();
        // 5 - 0 == 5
        assert!(!queue.is_running_low());

        queue.advance();
        // 5 - 1 == 4
        assert!(queue.is_running_low());
    }

    #[test]
    fn running_low_on_empty_queue() {
        let queue = Queue::new();
        assert!(queue.is_running_low());
    }

    #[test]
    fn running_low_behind_boundary() {
        let mut queue = Queue::new();
        queue.append(videos(&["1", "2", "3", "4", "5", "6", "7"]));
        for _ in 0..4 {
            queue.advance();
        }
        // index 3: four videos up to and including the cursor
        assert!(queue.is_running_low_behind());

        queue.advance();
        // index 4: five
        assert!(!queue.is_running_low_behind());
    }

    #[test]
    fn fetch_guard_is_single_flight() {
        let mut queue = Queue::new();
        assert!(queue.try_begin_fetch());
        assert!(!queue.try_begin_fetch());
        assert!(queue.is_fetch_in_flight());

        queue.finish_fetch();
        assert!(!queue.is_fetch_in_flight());
        assert!(queue.try_begin_fetch());
    }

    #[test]
    fn record_decodes_numeric_and_string_tokens() {
        let json = r#"{"id": 123, "title": "t", "description": "d",
                       "html_snippet": "<div></div>", "ordering_key": "2018-01-01"}"#;
        let record: VideoRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id.as_str(), "123");
        assert_eq!(record.ordering_key, Some(OrderingKey::new("2018-01-01")));

        let json = r#"{"id": "abc", "ordering_key": 42}"#;
        let record: VideoRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id.as_str(), "abc");
        assert_eq!(record.title, "");
        assert_eq!(record.ordering_key, Some(OrderingKey::new("42")));
    }
}
