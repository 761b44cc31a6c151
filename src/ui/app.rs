// Terminal harness for the playback controller
// Runs the controller against a live listing service with a stand-in player
// that prints what it was told, and reads commands from stdin:
//   n = next, p = previous, e = pretend the current video ended, q = quit

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::config::PlayerConfig;
use crate::player::controller::PlaybackController;
use crate::player::embed::{PlayerFactory, PlayerState, StateListener, VideoPlayer};
use crate::player::queue::{VideoId, VideoRecord};
use crate::remote::listing::HttpVideoSource;
use crate::remote::viewed::HttpViewedReporter;
use crate::ui::view::PlaylistView;

const HELP: &str = "Commands: [n]ext [p]revious [e]nd current video [q]uit";

// Stand-in for an embedded player: no video, just a log of commands
struct TerminalPlayer {
    current: VideoId,
}

impl VideoPlayer for TerminalPlayer {
    fn cue_video_by_id(&mut self, id: &VideoId) {
        self.current = id.clone();
        println!("[player] cued {}", id);
    }

    fn play_video(&mut self) {
        println!("[player] playing {}", self.current);
    }

    fn pause_video(&mut self) {
        println!("[player] paused {}", self.current);
    }
}

// Keeps the listener the controller registers, so the stdin loop can
// deliver "ended" the way a real player would
struct TerminalPlayerFactory {
    listener: Arc<Mutex<Option<StateListener>>>,
}

impl PlayerFactory for TerminalPlayerFactory {
    fn create(
        &mut self,
        initial_video: &VideoId,
        listener: StateListener,
    ) -> Box<dyn VideoPlayer> {
        println!("[player] created with {}", initial_video);
        if let Ok(mut slot) = self.listener.lock() {
            *slot = Some(listener);
        }
        Box::new(TerminalPlayer {
            current: initial_video.clone(),
        })
    }
}

struct TerminalView {
    no_video_title: String,
    no_video_description: String,
    playlist_len: usize,
}

impl PlaylistView for TerminalView {
    fn show_video(&mut self, video: &VideoRecord, position: usize) {
        println!(
            "[{}/{}] {}\n        {}",
            position + 1,
            self.playlist_len,
            video.title,
            video.description
        );
    }

    fn show_no_video(&mut self) {
        println!("{}\n        {}", self.no_video_title, self.no_video_description);
    }

    fn append_to_playlist(&mut self, fragments: Vec<String>) {
        self.playlist_len += fragments.len();
        println!("[playlist] +{} at the end ({} total)", fragments.len(), self.playlist_len);
    }

    fn prepend_to_playlist(&mut self, fragments: Vec<String>) {
        self.playlist_len += fragments.len();
        println!("[playlist] +{} at the start ({} total)", fragments.len(), self.playlist_len);
    }
}

pub async fn run(config: PlayerConfig) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .cookie_store(true)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let source = HttpVideoSource::new(client.clone(), config.api_url()?)?;
    let reporter =
        HttpViewedReporter::new(client, config.viewed_api_url()?, config.csrf_token.clone())?;

    let listener = Arc::new(Mutex::new(None));
    let factory = TerminalPlayerFactory {
        listener: Arc::clone(&listener),
    };
    let view = TerminalView {
        no_video_title: config.no_video_title.clone(),
        no_video_description: config.no_video_description.clone(),
        playlist_len: 0,
    };

    let controller = PlaybackController::new(
        Arc::new(source),
        Arc::new(reporter),
        Box::new(factory),
        Box::new(view),
    )
    .with_pagination(config.pagination)
    .with_resume_from(config.resume_key());

    let handle = controller.handle();
    let controller_task = tokio::spawn(controller.run());

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        match line.trim() {
            "n" => handle.next(),
            "p" => handle.previous(),
            "e" => {
                let registered = listener.lock().ok().and_then(|slot| slot.clone());
                match registered {
                    Some(listener) => listener.notify(PlayerState::Ended),
                    None => println!("No player yet"),
                }
            }
            "q" => break,
            "" => {}
            other => {
                debug!("Unknown command {:?}", other);
                println!("{}", HELP);
            }
        }
    }

    info!("Shutting down");
    handle.shutdown();
    controller_task.await.context("Controller task failed")?;

    Ok(())
}
