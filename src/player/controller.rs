// ==========================================
// PLAYBACK CONTROLLER
// ==========================================
// Drives one embedded player through the queue.
// It decides:
// - when to fetch another page (and in which direction)
// - when to move the cursor forwards or backwards
// - when to report a video as viewed
// - what the player and the playlist view should show
//
// Key Concept: one line of control.
// Everything the controller reacts to (player state changes, next/previous
// clicks, finished page fetches) arrives as a ControllerEvent on a single
// channel and is handled with &mut self. Network calls are spawned and never
// awaited by navigation, so a slow listing service never blocks a click.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::config::Pagination;
use crate::error::PlayerError;
use crate::player::embed::{PlayerFactory, PlayerState, StateListener, VideoPlayer};
use crate::player::queue::{OrderingKey, Queue, VideoRecord};
use crate::remote::listing::{PageRequest, VideoPage, VideoSource};
use crate::remote::viewed::ViewedReporter;
use crate::ui::view::PlaylistView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

// Why a page was fetched. Captured when the fetch is dispatched and carried
// through to its completion, so a page is always appended or prepended
// according to the request, whatever happened to the queue meanwhile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Initial,
    Next,
    Previous,
}

#[derive(Debug)]
pub enum ControllerEvent {
    StateChanged(PlayerState),
    Next,
    Previous,
    PageLoaded {
        kind: FetchKind,
        result: Result<VideoPage, PlayerError>,
    },
    Shutdown,
}

// Derived from the queue and the player, never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    // No player yet: still loading, or there was nothing to play
    Empty,
    // A video is cued or playing
    Playing,
    // Cursor moved past the last fetched video
    Exhausted,
}

// Cheap handle for the outside world (buttons, key bindings) to drive the
// controller without borrowing it.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    events: UnboundedSender<ControllerEvent>,
}

impl ControllerHandle {
    pub fn next(&self) {
        let _ = self.events.send(ControllerEvent::Next);
    }

    pub fn previous(&self) {
        let _ = self.events.send(ControllerEvent::Previous);
    }

    pub fn shutdown(&self) {
        let _ = self.events.send(ControllerEvent::Shutdown);
    }
}

pub struct PlaybackController {
    queue: Queue,
    source: Arc<dyn VideoSource>,
    reporter: Arc<dyn ViewedReporter>,
    factory: Box<dyn PlayerFactory>,
    view: Box<dyn PlaylistView>,
    // Created once the first video is known
    player: Option<Box<dyn VideoPlayer>>,
    pagination: Pagination,
    resume_from: Option<OrderingKey>,
    // Last `next` link seen, only followed in Pagination::NextUrl mode
    next_link: Option<String>,
    // Set once there is provably nothing before the head
    head_exhausted: bool,
    events_tx: UnboundedSender<ControllerEvent>,
    events_rx: UnboundedReceiver<ControllerEvent>,
}

impl PlaybackController {
    pub fn new(
        source: Arc<dyn VideoSource>,
        reporter: Arc<dyn ViewedReporter>,
        factory: Box<dyn PlayerFactory>,
        view: Box<dyn PlaylistView>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        PlaybackController {
            queue: Queue::new(),
            source,
            reporter,
            factory,
            view,
            player: None,
            pagination: Pagination::OrderingKey,
            resume_from: None,
            next_link: None,
            // Without a resume point the first page starts at the beginning
            head_exhausted: true,
            events_tx,
            events_rx,
        }
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    // Start from (and including) this key instead of the beginning.
    // Only meaningful with ordering-key pagination.
    pub fn with_resume_from(mut self, key: Option<OrderingKey>) -> Self {
        self.head_exhausted = key.is_none();
        self.resume_from = key;
        self
    }

    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            events: self.events_tx.clone(),
        }
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn state(&self) -> ControllerState {
        if self.player.is_none() {
            ControllerState::Empty
        } else if self.queue.current().is_some() {
            ControllerState::Playing
        } else {
            ControllerState::Exhausted
        }
    }

    // ==========================================
    // EVENT LOOP
    // ==========================================

    // Kick off the first fetch and handle events until shutdown
    pub async fn run(mut self) {
        self.initialize();

        while let Some(event) = self.events_rx.recv().await {
            if !self.handle_event(event) {
                break;
            }
        }

        info!("Playback controller stopped");
    }

    // Handle whatever is already waiting on the channel, without blocking.
    // For hosts that own their own loop (a UI tick, a test).
    // Returns how many events were handled.
    pub fn handle_pending(&mut self) -> usize {
        let mut handled = 0;

        loop {
            match self.events_rx.try_recv() {
                Ok(event) => {
                    handled += 1;
                    if !self.handle_event(event) {
                        break;
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        handled
    }

    // Returns false once the controller should stop
    pub fn handle_event(&mut self, event: ControllerEvent) -> bool {
        match event {
            ControllerEvent::StateChanged(PlayerState::Ended) => self.on_playback_ended(),
            ControllerEvent::StateChanged(state) => {
                debug!("Ignoring player state {:?}", state);
            }
            ControllerEvent::Next => self.request_next(),
            ControllerEvent::Previous => self.request_previous(),
            ControllerEvent::PageLoaded { kind, result } => self.on_page_loaded(kind, result),
            ControllerEvent::Shutdown => return false,
        }
        true
    }

    // ==========================================
    // OPERATIONS
    // ==========================================

    // Issue the first fetch. The player is created when it completes.
    pub fn initialize(&mut self) {
        let request = PageRequest::First {
            start: self.resume_start(),
        };
        self.dispatch_fetch(FetchKind::Initial, request);
    }

    pub fn request_next(&mut self) {
        if self.queue.index() >= self.queue.len() as isize - 1 {
            debug!("Already at the last fetched video");
            return;
        }
        self.advance_to(Direction::Forward, true);
    }

    pub fn request_previous(&mut self) {
        if self.queue.index() <= 0 {
            debug!("Already at the first video");
            return;
        }
        self.advance_to(Direction::Backward, true);
    }

    // The player stopped on its own, so no pause/resume around the step
    pub fn on_playback_ended(&mut self) {
        if self.player.is_none() {
            warn!("Got an ended signal without a player");
            return;
        }
        self.advance_to(Direction::Forward, false);
    }

    // Fetch another page if the cursor is close to that end of the queue.
    // Returns true if a fetch was dispatched.
    pub fn maybe_prefetch_more(&mut self, direction: Direction) -> bool {
        let request = match direction {
            Direction::Forward => {
                if !self.queue.is_running_low() {
                    return false;
                }
                match self.next_page_request() {
                    Some(request) => request,
                    None => {
                        debug!("No cursor for the next page, not prefetching");
                        return false;
                    }
                }
            }
            Direction::Backward => {
                if self.head_exhausted
                    || self.pagination == Pagination::NextUrl
                    || !self.queue.is_running_low_behind()
                {
                    return false;
                }
                match self.queue.head().and_then(|v| v.ordering_key.clone()) {
                    Some(key) => PageRequest::Before(key),
                    None => return false,
                }
            }
        };

        let kind = match direction {
            Direction::Forward => FetchKind::Next,
            Direction::Backward => FetchKind::Previous,
        };
        self.dispatch_fetch(kind, request)
    }

    // Fire-and-forget report for the video under the cursor
    pub fn report_viewed(&self) {
        // Stepping back from "no more videos" leaves nothing to report
        if self.queue.is_exhausted() {
            debug!("Queue exhausted, nothing to report viewed");
            return;
        }

        let Some(video) = self.queue.current() else {
            error!(
                index = self.queue.index(),
                len = self.queue.len(),
                "Queue index out of range, not reporting viewed"
            );
            return;
        };

        let reporter = Arc::clone(&self.reporter);
        let id = video.id.clone();

        tokio::spawn(async move {
            if let Err(e) = reporter.mark_viewed(&id).await {
                warn!("Failed to mark {} as viewed: {}", id, e);
            }
        });
    }

    // ==========================================
    // NAVIGATION
    // ==========================================
    // The one path shared by clicks and the ended signal:
    // 1. pause (clicks only)
    // 2. report the outgoing video
    // 3. move the cursor
    // 4. prefetch if the new position is close to the edge
    // 5. cue + show + play, or show "no video" if we ran off the end
    fn advance_to(&mut self, direction: Direction, explicit: bool) {
        if explicit {
            if let Some(player) = self.player.as_mut() {
                player.pause_video();
            }
        }

        self.report_viewed();

        let video = match direction {
            Direction::Forward => self.queue.advance().cloned(),
            Direction::Backward => self.queue.retreat().cloned(),
        };

        self.maybe_prefetch_more(direction);

        match video {
            Some(video) => self.play(&video),
            None => {
                info!("No more videos");
                self.view.show_no_video();
            }
        }
    }

    fn play(&mut self, video: &VideoRecord) {
        let Some(player) = self.player.as_mut() else {
            return;
        };

        debug!("Cueing video {} at {}", video.id, self.queue.index());
        player.cue_video_by_id(&video.id);
        self.view.show_video(video, self.queue.index() as usize);
        player.play_video();
    }

    // ==========================================
    // FETCHING
    // ==========================================

    fn dispatch_fetch(&mut self, kind: FetchKind, request: PageRequest) -> bool {
        if !self.queue.try_begin_fetch() {
            debug!("Fetch already in flight, dropping {:?} request", kind);
            return false;
        }

        debug!("Dispatching {:?} fetch: {:?}", kind, request);
        let source = Arc::clone(&self.source);
        let events = self.events_tx.clone();

        tokio::spawn(async move {
            let result = source.fetch_page(request).await;
            let _ = events.send(ControllerEvent::PageLoaded { kind, result });
        });

        true
    }

    fn resume_start(&self) -> Option<OrderingKey> {
        match self.pagination {
            Pagination::OrderingKey => self.resume_from.clone(),
            Pagination::NextUrl => None,
        }
    }

    // None when there is no cursor to continue from. Asking for the first
    // page again would append videos already in the queue.
    fn next_page_request(&self) -> Option<PageRequest> {
        match self.pagination {
            Pagination::OrderingKey => self
                .queue
                .tail()
                .and_then(|v| v.ordering_key.clone())
                .map(PageRequest::After),
            Pagination::NextUrl => self.next_link.clone().map(PageRequest::Link),
        }
    }

    fn on_page_loaded(&mut self, kind: FetchKind, result: Result<VideoPage, PlayerError>) {
        // Cleared on failure too, so the next navigation step can retry
        self.queue.finish_fetch();

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                warn!("{:?} fetch failed: {}", kind, e);
                if kind == FetchKind::Initial {
                    self.view.show_no_video();
                }
                return;
            }
        };

        // A page without a link keeps the old one, so it gets asked again
        if let Some(next) = page.next {
            self.next_link = Some(next);
        }

        match kind {
            FetchKind::Initial => {
                self.append_page(page.videos);
                self.start();
            }
            FetchKind::Next => {
                let was_exhausted = self.player.is_some() && self.queue.is_exhausted();
                self.append_page(page.videos);

                if was_exhausted {
                    if let Some(video) = self.queue.current().cloned() {
                        info!("New videos arrived, resuming playback");
                        self.play(&video);
                    }
                }
            }
            FetchKind::Previous => self.prepend_page(page.videos),
        }
    }

    fn append_page(&mut self, videos: Vec<VideoRecord>) {
        if videos.is_empty() {
            return;
        }

        let fragments = videos.iter().map(|v| v.html_snippet.clone()).collect();
        self.queue.append(videos);
        self.view.append_to_playlist(fragments);
    }

    fn prepend_page(&mut self, mut videos: Vec<VideoRecord>) {
        if videos.is_empty() {
            debug!("Nothing before the first video");
            self.head_exhausted = true;
            return;
        }

        // "before" pages come nearest-first
        videos.reverse();

        let fragments = videos.iter().map(|v| v.html_snippet.clone()).collect();
        self.queue.prepend(videos);
        self.view.prepend_to_playlist(fragments);
    }

    // First page is in: cue video #1 or admit there's nothing to watch
    fn start(&mut self) {
        let Some(video) = self.queue.advance().cloned() else {
            info!("No videos to play");
            self.view.show_no_video();
            return;
        };

        info!("Starting playback with {}", video.id);
        self.view.show_video(&video, self.queue.index() as usize);

        let listener = StateListener::new(self.events_tx.clone());
        self.player = Some(self.factory.create(&video.id, listener));
    }
}
