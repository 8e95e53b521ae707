//! Press/release pairing
//!
//! A click-down and click-up (or key press and release) landing on different
//! native frames are merged into one `*_complete` event placed at the release's
//! frame, so the annotation shows the whole gesture and its duration. Pairs that
//! share a frame are already co-located and stay as they are.

use crate::capture::input::{EventKind, InputEvent};
use crate::processing::frames::native_frame_index;
use crate::processing::timeline::TimelineEvent;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PairKey {
    Button(String),
    Key(String),
}

enum Edge {
    Down(PairKey),
    Up(PairKey),
}

fn edge(kind: &EventKind) -> Option<Edge> {
    match kind {
        EventKind::Click { button, pressed: true, .. } => Some(Edge::Down(PairKey::Button(button.clone()))),
        EventKind::Click { button, pressed: false, .. } => Some(Edge::Up(PairKey::Button(button.clone()))),
        EventKind::Press { name } => Some(Edge::Down(PairKey::Key(name.clone()))),
        EventKind::Release { name } => Some(Edge::Up(PairKey::Key(name.clone()))),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairingStats {
    pub merged: usize,
    pub same_frame: usize,
    pub unmatched_releases: usize,
}

/// Merge cross-frame press/release pairs. `events` must be ordered by relative time.
///
/// A release pairs with the most recent unmatched press of the same button or key.
/// Unmatched presses and releases are kept unchanged.
pub fn merge_pairs(events: Vec<TimelineEvent>, fps: f64) -> (Vec<TimelineEvent>, PairingStats) {
    let mut stats = PairingStats::default();
    let mut slots: Vec<Option<TimelineEvent>> = events.into_iter().map(Some).collect();
    let mut open: HashMap<PairKey, Vec<usize>> = HashMap::new();

    for index in 0..slots.len() {
        let Some(current) = slots[index].as_ref() else {
            continue;
        };
        match edge(current.kind()) {
            Some(Edge::Down(key)) => open.entry(key).or_default().push(index),
            Some(Edge::Up(key)) => {
                let Some(press_index) = open.get_mut(&key).and_then(Vec::pop) else {
                    stats.unmatched_releases += 1;
                    continue;
                };
                let (Some(press), Some(release)) = (slots[press_index].as_ref(), slots[index].as_ref()) else {
                    continue;
                };
                let press_frame = native_frame_index(press.relative_time_sec, fps);
                let release_frame = native_frame_index(release.relative_time_sec, fps);
                if press_frame == release_frame {
                    stats.same_frame += 1;
                    continue;
                }

                let merged = complete(press, release);
                slots[press_index] = None;
                slots[index] = merged;
                stats.merged += 1;
            }
            None => {}
        }
    }

    if stats.merged > 0 || stats.unmatched_releases > 0 {
        tracing::debug!(
            merged = stats.merged,
            same_frame = stats.same_frame,
            unmatched_releases = stats.unmatched_releases,
            "Paired press/release events"
        );
    }
    (slots.into_iter().flatten().collect(), stats)
}

/// The merged event keeps the press's payload and sits at the release's time.
fn complete(press: &TimelineEvent, release: &TimelineEvent) -> Option<TimelineEvent> {
    let press_time = press.relative_time_sec;
    let release_time = release.relative_time_sec;
    let duration = release_time - press_time;

    let kind = match press.kind() {
        EventKind::Click { x, y, button, pressed } => EventKind::ClickComplete {
            x: *x,
            y: *y,
            button: button.clone(),
            pressed: *pressed,
            press_time,
            release_time,
            duration,
        },
        EventKind::Press { name } => EventKind::PressComplete {
            name: name.clone(),
            press_time,
            release_time,
            duration,
        },
        _ => return None,
    };

    Some(TimelineEvent {
        relative_time_sec: release_time,
        event: InputEvent::new(release.event.timestamp, kind),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(t: f64, kind: EventKind) -> TimelineEvent {
        TimelineEvent {
            relative_time_sec: t,
            event: InputEvent::new(100.0 + t, kind),
        }
    }

    fn click(t: f64, pressed: bool) -> TimelineEvent {
        event(
            t,
            EventKind::Click {
                x: 5.0,
                y: 6.0,
                button: "left".into(),
                pressed,
            },
        )
    }

    fn key(t: f64, down: bool) -> TimelineEvent {
        let name = "a".to_string();
        event(t, if down { EventKind::Press { name } } else { EventKind::Release { name } })
    }

    #[test]
    fn test_cross_frame_click_is_merged_at_release() {
        let (events, stats) = merge_pairs(vec![click(1.0, true), click(1.2, false)], 30.0);
        assert_eq!(stats.merged, 1);
        assert_eq!(events.len(), 1);
        assert_eq!(native_frame_index(events[0].relative_time_sec, 30.0), 36);
        match events[0].kind() {
            EventKind::ClickComplete {
                button,
                press_time,
                release_time,
                duration,
                ..
            } => {
                assert_eq!(button, "left");
                assert_eq!(*press_time, 1.0);
                assert_eq!(*release_time, 1.2);
                assert!((duration - 0.2).abs() < 1e-9);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_same_frame_pair_is_left_alone() {
        let (events, stats) = merge_pairs(vec![key(1.0, true), key(1.01, false)], 30.0);
        assert_eq!(stats.merged, 0);
        assert_eq!(stats.same_frame, 1);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_unmatched_press_and_release_survive() {
        let (events, stats) = merge_pairs(vec![key(0.5, false), click(1.0, true)], 30.0);
        assert_eq!(stats.unmatched_releases, 1);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].kind().action(), "click");
    }

    #[test]
    fn test_repeated_presses_pair_latest_first() {
        let events = vec![key(0.0, true), key(1.0, true), key(2.0, false), key(3.0, false)];
        let (merged, stats) = merge_pairs(events, 30.0);
        assert_eq!(stats.merged, 2);
        let spans: Vec<(f64, f64)> = merged
            .iter()
            .map(|e| match e.kind() {
                EventKind::PressComplete {
                    press_time,
                    release_time,
                    ..
                } => (*press_time, *release_time),
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(spans, vec![(1.0, 2.0), (0.0, 3.0)]);
    }

    #[test]
    fn test_pairs_are_per_identifier() {
        let right = event(
            0.5,
            EventKind::Click {
                x: 0.0,
                y: 0.0,
                button: "right".into(),
                pressed: false,
            },
        );
        let (events, stats) = merge_pairs(vec![click(0.0, true), right], 30.0);
        assert_eq!(stats.merged, 0);
        assert_eq!(stats.unmatched_releases, 1);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_other_events_keep_their_order() {
        let events = vec![
            click(0.0, true),
            event(0.5, EventKind::Move { x: 1.0, y: 1.0 }),
            click(1.0, false),
            event(1.5, EventKind::Move { x: 2.0, y: 2.0 }),
        ];
        let (merged, _) = merge_pairs(events, 30.0);
        let actions: Vec<&str> = merged.iter().map(|e| e.kind().action()).collect();
        assert_eq!(actions, vec!["move", "click_complete", "move"]);
    }
}
