use std::sync::{Arc, Mutex};
use std::time::Duration;

use tally_types::WindowSettings;
use tokio::sync::watch;
use tokio::time::timeout;

use super::*;
use crate::encounter::EncounterEntry;
use crate::snapshot::{EncounterInfo, KnownEntity, Participant, ParticipantInfo, ParticipantStats, TargetTally};
use crate::visibility::Visibility;

fn boss_x() -> Entity {
    Entity::boss(1000, "BossX")
}

fn options(window: WindowSettings) -> ServiceOptions {
    ServiceOptions {
        app_name: "Tally".to_string(),
        version: "1.0".to_string(),
        window,
    }
}

fn dealing(id: u64, name: &str, damage: i64) -> Participant {
    let mut stats = ParticipantStats::default();
    stats.dealt.targets.insert(
        boss_x().id,
        TargetTally {
            damage,
            timed_damage: damage,
            hits: 1,
            crits: 0,
        },
    );
    stats.dealt.total.damage = damage;
    Participant {
        info: ParticipantInfo::new(id, name),
        stats,
    }
}

fn scenario() -> Snapshot {
    Snapshot {
        first_hit: 1000,
        last_hit: 1010,
        total_damage: 150,
        party_dps: 15,
        entities: vec![KnownEntity {
            entity: boss_x(),
            info: EncounterInfo {
                first_hit: 1000,
                last_hit: 1010,
            },
        }],
        participants: vec![dealing(1, "A", 100), dealing(2, "B", 0), dealing(3, "C", 50)],
        current_boss: Some(boss_x()),
        timed: false,
    }
}

fn names(frame: &Frame) -> Vec<&str> {
    frame.ranked.iter().map(|r| r.name.as_str()).collect()
}

async fn wait_for(frames: &mut watch::Receiver<Arc<Frame>>, pred: impl Fn(&Frame) -> bool) -> Arc<Frame> {
    timeout(Duration::from_secs(2), async {
        loop {
            let frame = frames.borrow_and_update().clone();
            if pred(&frame) {
                return frame;
            }
            frames.changed().await.expect("service stopped");
        }
    })
    .await
    .expect("timed out waiting for frame")
}

#[tokio::test]
async fn test_tick_produces_ranked_frame() {
    let (handle, _upstream, task) = PresentationService::spawn(options(WindowSettings::default()), None);
    let mut frames = handle.frames();

    handle.push_snapshot(scenario()).unwrap();
    let frame = wait_for(&mut frames, |f| !f.ranked.is_empty()).await;

    assert_eq!(names(&frame), vec!["A", "C"]);
    assert_eq!(frame.encounters.entries()[0], EncounterEntry::Total);
    assert_eq!(frame.encounters.entries()[1], EncounterEntry::Boss(boss_x()));
    assert_eq!(frame.selection, Some(boss_x()));
    assert_eq!(frame.encounter_name, "BossX");
    assert_eq!(frame.totals.timer, "00:10");
    assert_eq!(frame.admitted.len(), 2);

    handle.shutdown().unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_reset_clears_state_and_notifies_upstream() {
    let (handle, mut upstream, task) = PresentationService::spawn(options(WindowSettings::default()), None);
    let mut frames = handle.frames();

    handle.push_snapshot(scenario()).unwrap();
    let before = wait_for(&mut frames, |f| !f.ranked.is_empty()).await;

    handle.reset_session().unwrap();
    let after = wait_for(&mut frames, |f| f.epoch == 1).await;

    assert!(after.ranked.is_empty());
    assert_eq!(after.encounters.len(), 1);
    assert_eq!(after.selection, None);
    let torn_down: Vec<_> = before.ranked.iter().map(|r| r.handle).collect();
    assert_eq!(after.evicted.len(), torn_down.len());
    assert!(torn_down.iter().all(|h| after.evicted.contains(h)));
    assert_eq!(upstream.recv().await, Some(UpstreamRequest::ResetSession));

    handle.shutdown().unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_reset_from_aggregator_is_not_echoed() {
    let (handle, mut upstream, task) = PresentationService::spawn(options(WindowSettings::default()), None);
    let mut frames = handle.frames();

    handle.on_session_reset().unwrap();
    wait_for(&mut frames, |f| f.epoch == 1).await;
    handle.toggle_timed().unwrap();

    assert_eq!(upstream.recv().await, Some(UpstreamRequest::SetTimed(true)));
    handle.shutdown().unwrap();
    task.await.unwrap();
}

#[test]
fn test_snapshot_from_before_reset_is_discarded() {
    let (mut service, handle, _upstream) = PresentationService::new(options(WindowSettings::default()), None);

    let stale = TaggedSnapshot {
        epoch: handle.epoch(),
        snapshot: Arc::new(scenario()),
    };
    handle.reset_session().unwrap();

    service.on_snapshot(stale);
    assert!(service.state.frame().ranked.is_empty());

    let fresh = TaggedSnapshot {
        epoch: handle.epoch(),
        snapshot: Arc::new(scenario()),
    };
    service.on_snapshot(fresh);
    assert_eq!(names(service.state.frame()), vec!["A", "C"]);
}

#[tokio::test]
async fn test_newest_snapshot_wins() {
    let (service, handle, _upstream) = PresentationService::new(options(WindowSettings::default()), None);
    let mut frames = handle.frames();

    let mut older = scenario();
    older.participants = vec![dealing(9, "Old", 10)];
    handle.push_snapshot(older).unwrap();
    handle.push_snapshot(scenario()).unwrap();

    let task = tokio::spawn(service.run());
    let frame = wait_for(&mut frames, |f| !f.ranked.is_empty()).await;
    assert_eq!(names(&frame), vec!["A", "C"]);

    handle.shutdown().unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_user_selection_forwarded_only_when_different() {
    let (handle, mut upstream, task) = PresentationService::spawn(options(WindowSettings::default()), None);
    let mut frames = handle.frames();

    let mut snapshot = scenario();
    snapshot.current_boss = None;
    handle.push_snapshot(snapshot).unwrap();
    wait_for(&mut frames, |f| f.encounters.len() == 2).await;

    handle.select_encounter(1).unwrap();
    assert_eq!(
        upstream.recv().await,
        Some(UpstreamRequest::SwitchEncounter(Some(boss_x())))
    );

    // TOTAL matches the aggregator's current boss (none), so nothing is sent
    handle.select_encounter(0).unwrap();
    handle.toggle_timed().unwrap();
    assert_eq!(upstream.recv().await, Some(UpstreamRequest::SetTimed(true)));

    handle.shutdown().unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_connection_title() {
    let (handle, _upstream, task) = PresentationService::spawn(options(WindowSettings::default()), None);
    let mut frames = handle.frames();
    assert_eq!(handle.latest_frame().title, "Tally v1.0: No server");

    handle.connected("Star Forge").unwrap();
    let frame = wait_for(&mut frames, |f| f.title.ends_with("Star Forge")).await;
    assert_eq!(frame.title, "Tally v1.0: Star Forge");

    handle.shutdown().unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_invisible_when_idle_follows_roster() {
    let window = WindowSettings {
        invisible_when_idle: true,
        ..WindowSettings::default()
    };
    let (handle, _upstream, task) = PresentationService::spawn(options(window), None);
    let mut frames = handle.frames();
    handle.set_focus(true, false).unwrap();

    let mut empty = scenario();
    empty.participants.clear();
    handle.push_snapshot(empty).unwrap();
    wait_for(&mut frames, |f| f.visibility == Visibility::Hidden).await;

    handle.push_snapshot(scenario()).unwrap();
    let frame = wait_for(&mut frames, |f| !f.ranked.is_empty()).await;
    assert_eq!(frame.visibility, Visibility::Visible);

    handle.toggle_invisible_when_idle().unwrap();
    handle.on_session_reset().unwrap();
    let frame = wait_for(&mut frames, |f| f.epoch == 1).await;
    assert_eq!(frame.visibility, Visibility::Visible);

    handle.shutdown().unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_meter_starts_hidden_until_a_window_is_focused() {
    let (handle, _upstream, task) = PresentationService::spawn(options(WindowSettings::default()), None);
    let mut frames = handle.frames();
    assert_eq!(frames.borrow().visibility, Visibility::Hidden);

    handle.push_snapshot(scenario()).unwrap();
    let frame = wait_for(&mut frames, |f| !f.ranked.is_empty()).await;
    assert_eq!(frame.visibility, Visibility::Hidden);

    handle.set_focus(false, true).unwrap();
    wait_for(&mut frames, |f| f.visibility == Visibility::Visible).await;

    handle.shutdown().unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_pinned_meter_starts_visible() {
    let window = WindowSettings {
        always_visible: true,
        ..WindowSettings::default()
    };
    let (handle, _upstream, task) = PresentationService::spawn(options(window), None);
    assert_eq!(handle.latest_frame().visibility, Visibility::Visible);

    handle.shutdown().unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_unfocused_window_stays_hidden_on_ticks() {
    let (handle, _upstream, task) = PresentationService::spawn(options(WindowSettings::default()), None);
    let mut frames = handle.frames();

    handle.set_focus(false, false).unwrap();
    wait_for(&mut frames, |f| f.visibility == Visibility::Hidden).await;

    handle.push_snapshot(scenario()).unwrap();
    let frame = wait_for(&mut frames, |f| !f.ranked.is_empty()).await;
    assert_eq!(frame.visibility, Visibility::Hidden);

    handle.set_focus(true, false).unwrap();
    wait_for(&mut frames, |f| f.visibility == Visibility::Visible).await;

    handle.shutdown().unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_render_sink_sees_every_frame() {
    struct Recorder(Arc<Mutex<Vec<usize>>>);
    impl RenderSink for Recorder {
        fn render(&mut self, frame: &Frame) {
            self.0.lock().unwrap().push(frame.ranked.len());
        }
    }

    let seen = Arc::new(Mutex::new(Vec::new()));
    let (handle, _upstream, task) = PresentationService::spawn(
        options(WindowSettings::default()),
        Some(Box::new(Recorder(seen.clone()))),
    );
    let mut frames = handle.frames();

    handle.push_snapshot(scenario()).unwrap();
    wait_for(&mut frames, |f| !f.ranked.is_empty()).await;
    handle.shutdown().unwrap();
    task.await.unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![2]);
}

#[tokio::test]
async fn test_handle_reports_stopped_service() {
    let (handle, _upstream, task) = PresentationService::spawn(options(WindowSettings::default()), None);
    handle.shutdown().unwrap();
    task.await.unwrap();
    assert_eq!(handle.reset_session(), Err(ServiceError::Stopped));
    assert_eq!(handle.push_snapshot(Snapshot::default()), Err(ServiceError::Stopped));
}
