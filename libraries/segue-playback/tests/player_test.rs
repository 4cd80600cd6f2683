//! Async player task tests
//!
//! Runs the player on a paused tokio clock so the progress timer is
//! deterministic. Engine reports are sent from the test through the sinks
//! and tickets the mock engine collected.

mod common;

use common::{item, EngineCall, EngineLog, MockBackground, MockEngine};
use segue_playback::{
    EngineFailure, PlaybackConfig, PlaybackError, PlaybackState, Player, PlayerEvent,
    RemoteCommand,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::timeout;

// ===== Test Helpers =====

struct TestPlayer {
    player: Player,
    task: JoinHandle<()>,
    events: broadcast::Receiver<PlayerEvent>,
    engine: Arc<Mutex<EngineLog>>,
}

fn spawn_player() -> TestPlayer {
    let engine = MockEngine::default();
    let log = engine.log.clone();
    let config = PlaybackConfig {
        event_capacity: 1024,
        ..PlaybackConfig::default()
    };

    let (player, task) = Player::spawn(
        config,
        Box::new(engine),
        Box::new(MockBackground::default()),
    );
    let events = player.subscribe();

    TestPlayer {
        player,
        task,
        events,
        engine: log,
    }
}

async fn wait_for(events: &mut broadcast::Receiver<PlayerEvent>, name: &str) -> PlayerEvent {
    let wait = async {
        loop {
            match events.recv().await {
                Ok(event) if event.name() == name => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event bus closed"),
            }
        }
    };

    timeout(Duration::from_secs(5), wait)
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {}", name))
}

impl TestPlayer {
    fn report_ready(&self) {
        self.engine.lock().unwrap().sinks.last().unwrap().ready();
    }

    /// Enqueue `names`, play, and wait until the first one is playing
    async fn start(&mut self, names: &[&str]) {
        for name in names {
            self.player.enqueue(item(name)).unwrap();
        }
        self.player.play().unwrap();
        wait_for(&mut self.events, "will-play-item").await;

        self.report_ready();
        wait_for(&mut self.events, "did-play").await;
    }
}

// ===== Tests =====

#[tokio::test(start_paused = true)]
async fn test_play_through_task() {
    let mut t = spawn_player();
    t.start(&["a", "b"]).await;

    let status = t.player.status().await.unwrap();
    assert_eq!(status.state, PlaybackState::Playing);
    assert_eq!(status.current_index, Some(0));
    assert!(status.background_held);
}

#[tokio::test(start_paused = true)]
async fn test_progress_ticks_while_playing() {
    let mut t = spawn_player();
    t.start(&["a"]).await;
    t.engine.lock().unwrap().position = Duration::from_secs(30);

    match wait_for(&mut t.events, "progress-updated").await {
        PlayerEvent::ProgressUpdated { elapsed, progress } => {
            assert_eq!(elapsed, 30.0);
            assert_eq!(progress, 0.25);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_no_progress_while_paused() {
    let mut t = spawn_player();
    t.start(&["a"]).await;

    t.player.pause().unwrap();
    wait_for(&mut t.events, "did-pause").await;

    tokio::time::sleep(Duration::from_secs(3)).await;
    while let Ok(event) = t.events.try_recv() {
        assert_ne!(event.name(), "progress-updated");
    }
}

#[tokio::test(start_paused = true)]
async fn test_seek_completion_is_delivered() {
    let mut t = spawn_player();
    t.start(&["a"]).await;

    let done = t.player.seek_to_progress_with_completion(0.5).unwrap();
    t.player.status().await.unwrap();

    let ticket = t.engine.lock().unwrap().tickets.remove(0);
    ticket.complete(true);

    assert_eq!(done.await, Ok(true));
    assert!(t
        .engine
        .lock()
        .unwrap()
        .calls
        .contains(&EngineCall::Seek(Duration::from_secs(60))));
}

#[tokio::test(start_paused = true)]
async fn test_superseded_seek_resolves_false() {
    let mut t = spawn_player();
    t.start(&["a"]).await;

    t.player.begin_seeking().unwrap();
    let first = t.player.seek_to_progress_with_completion(0.1).unwrap();
    let second = t.player.seek_to_progress_with_completion(0.9).unwrap();

    assert_eq!(first.await, Ok(false));

    let ticket = t.engine.lock().unwrap().tickets.pop().unwrap();
    ticket.complete(true);
    assert_eq!(second.await, Ok(true));

    t.player.end_seeking().unwrap();
    let status = t.player.status().await.unwrap();
    assert_eq!(status.state, PlaybackState::Playing);
}

#[tokio::test(start_paused = true)]
async fn test_play_next_item_reports_exhaustion() {
    let t = spawn_player();
    t.player.enqueue(item("a")).unwrap();

    assert!(t.player.play_next_item().await.unwrap());
    assert!(!t.player.play_next_item().await.unwrap());

    let status = t.player.status().await.unwrap();
    assert_eq!(status.state, PlaybackState::Done);
}

#[tokio::test(start_paused = true)]
async fn test_failure_skips_to_next_item() {
    let mut t = spawn_player();
    t.player.enqueue(item("a")).unwrap();
    t.player.enqueue(item("b")).unwrap();
    t.player.play().unwrap();
    wait_for(&mut t.events, "will-play-item").await;

    t.engine
        .lock()
        .unwrap()
        .sinks
        .last()
        .unwrap()
        .failed(EngineFailure::TrackLoadFailed("truncated".into()));

    match wait_for(&mut t.events, "item-failed").await {
        PlayerEvent::ItemFailed { item, .. } => assert_eq!(item.display_name(), "a"),
        other => panic!("unexpected event {:?}", other),
    }
    match wait_for(&mut t.events, "will-play-item").await {
        PlayerEvent::WillPlayItem { item } => assert_eq!(item.display_name(), "b"),
        other => panic!("unexpected event {:?}", other),
    }

    let status = t.player.status().await.unwrap();
    assert!(status.last_error.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_remote_commands_through_handle() {
    let mut t = spawn_player();
    t.start(&["a"]).await;

    t.player.handle_remote(RemoteCommand::TogglePlayPause).unwrap();
    wait_for(&mut t.events, "did-pause").await;

    t.player.handle_remote(RemoteCommand::Play).unwrap();
    wait_for(&mut t.events, "did-play").await;
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_through_handle() {
    let t = spawn_player();
    t.player.enqueue(item("a")).unwrap();
    t.player.insert(item("b"), 0).unwrap();
    t.player.move_item(0, 1).unwrap();

    let snapshot = t.player.snapshot().await.unwrap();
    let names: Vec<_> = snapshot.iter().map(|i| i.display_name()).collect();
    assert_eq!(names, ["a", "b"]);

    t.player.clear().unwrap();
    assert!(t.player.snapshot().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_tears_down_and_closes_handles() {
    let mut t = spawn_player();
    t.start(&["a"]).await;
    let other = t.player.clone();

    t.player.shutdown().await.unwrap();
    t.task.await.unwrap();

    assert_eq!(
        t.engine.lock().unwrap().calls.last(),
        Some(&EngineCall::Stop)
    );
    assert!(matches!(other.play(), Err(PlaybackError::ControllerClosed)));
    assert!(matches!(
        other.status().await,
        Err(PlaybackError::ControllerClosed)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handles_stops_task() {
    let t = spawn_player();
    t.player.enqueue(item("a")).unwrap();

    drop(t.player);
    timeout(Duration::from_secs(1), t.task)
        .await
        .expect("player task kept running")
        .unwrap();
}
