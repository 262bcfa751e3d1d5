use approx::assert_abs_diff_eq;
use fretwork_audio::{AudioClock, ManualClock, RecordingSink};
use fretwork_domain::{ClickLevel, TempoState, TickEvent, TimeSignature};
use fretwork_metronome::{BeatScheduler, StopHandle};

fn tempo(bpm: u32, signature: &str, subdivisions: u32) -> TempoState {
    TempoState::new(bpm, signature.parse().unwrap(), subdivisions, true).unwrap()
}

#[test]
fn tick_spacing_matches_tempo_everywhere() {
    for bpm in 40..=240 {
        for subdivisions in 1..=4 {
            let clock = ManualClock::new(0.0);
            let mut scheduler =
                BeatScheduler::new(clock.clone(), RecordingSink::new(), tempo(bpm, "4/4", subdivisions));
            scheduler.start();
            clock.set(8.0);
            let ticks = scheduler.poll();
            assert!(ticks.len() >= 5, "bpm {bpm} x{subdivisions}");
            let expected = 60.0 / bpm as f64 / subdivisions as f64;
            for pair in ticks.windows(2) {
                assert_abs_diff_eq!(pair[1].scheduled_time - pair[0].scheduled_time, expected, epsilon = 1e-9);
            }
        }
    }
}

#[test]
fn ticks_are_strictly_increasing_across_polls() {
    let clock = ManualClock::new(0.0);
    let mut scheduler = BeatScheduler::new(clock.clone(), RecordingSink::new(), tempo(173, "7/8", 3));
    scheduler.start();
    for _ in 0..400 {
        scheduler.poll();
        clock.advance(0.025);
    }
    let ticks = scheduler.sink().ticks();
    assert!(ticks.len() > 100);
    assert!(ticks
        .windows(2)
        .all(|pair| pair[0].scheduled_time < pair[1].scheduled_time));
    assert!(ticks.iter().all(|tick| tick.scheduled_time < clock.now() + 0.1));
}

#[test]
fn stop_from_sink_prevents_due_ticks() {
    let handle = StopHandle::default();
    let sink_handle = handle.clone();
    let mut seen = 0;
    let sink = move |_tick: &TickEvent| {
        seen += 1;
        if seen == 2 {
            sink_handle.stop();
        }
    };
    let clock = ManualClock::new(0.0);
    let mut scheduler = BeatScheduler::new(clock.clone(), sink, tempo(120, "4/4", 1))
        .with_stop_handle(handle.clone());
    scheduler.start();
    assert!(handle.is_running());
    // Many ticks are due at once; the sink stops the run after two.
    clock.set(5.0);
    let ticks = scheduler.poll();
    assert_eq!(ticks.len(), 2);
    assert!(!scheduler.is_running());
    assert!(scheduler.poll().is_empty());
}

#[test]
fn stop_then_due_ticks_are_dropped() {
    let clock = ManualClock::new(0.0);
    let mut scheduler = BeatScheduler::new(clock.clone(), RecordingSink::new(), tempo(120, "4/4", 1));
    scheduler.start();
    scheduler.poll();
    clock.set(3.0);
    scheduler.stop();
    assert!(scheduler.poll().is_empty());
    assert_eq!(scheduler.sink().ticks().len(), 1);
}

#[test]
fn six_eight_measures_have_six_beats() {
    let clock = ManualClock::new(0.0);
    let mut scheduler = BeatScheduler::new(clock.clone(), RecordingSink::new(), tempo(120, "6/8", 1));
    scheduler.start();
    clock.set(3.5);
    let ticks = scheduler.poll();
    let accents: Vec<usize> = ticks
        .iter()
        .enumerate()
        .filter(|(_, tick)| tick.level == ClickLevel::Accent)
        .map(|(index, _)| index)
        .collect();
    assert_eq!(accents, vec![0, 6]);
    assert_eq!(ticks[5].beat, 5);
}

#[test]
fn repeated_set_bpm_only_resets() {
    let clock = ManualClock::new(0.0);
    let mut scheduler = BeatScheduler::new(clock.clone(), RecordingSink::new(), tempo(100, "4/4", 1));
    scheduler.start();
    clock.set(1.0);
    scheduler.poll();
    scheduler.set_bpm(100);
    scheduler.set_bpm(100);
    clock.set(4.0);
    let ticks = scheduler.poll();
    assert_eq!(ticks[0].scheduled_time, 1.0);
    assert_eq!(ticks[0].level, ClickLevel::Accent);
    for pair in ticks.windows(2) {
        assert_abs_diff_eq!(pair[1].scheduled_time - pair[0].scheduled_time, 0.6, epsilon = 1e-9);
    }
}

#[test]
fn tap_tempo_drives_scheduler() {
    let clock = ManualClock::new(0.0);
    let mut scheduler =
        BeatScheduler::new(clock, RecordingSink::new(), TempoState::new(90, TimeSignature::COMMON, 1, true).unwrap());
    let mut last = None;
    for i in 0..4 {
        last = scheduler.tap(i as f64 * 500.0);
    }
    assert_eq!(last, Some(120));
    assert_eq!(scheduler.bpm(), 120);

    // 200 ms taps would be 300 bpm: rejected, tempo kept.
    for i in 0..4 {
        assert_eq!(scheduler.tap(10_000.0 + i as f64 * 200.0), None);
    }
    assert_eq!(scheduler.bpm(), 120);
}
