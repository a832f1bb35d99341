//! # Perception scenario tests
//!
//! Runs the full strategies on synthetic frames.

use std::sync::Arc;

use eqpt_if::SensorData;
use image::RgbImage;
use trail_lib::{
    params::{StrategyKind, TrailExecParams},
    per::strategy_from_params,
    sim::render_trail,
    snapshot::FrameSnapshot,
};

fn snapshot(image: RgbImage) -> Arc<FrameSnapshot> {
    Arc::new(FrameSnapshot::new(image, SensorData { ultrasonic_cm: 100.0 }))
}

fn params(kind: StrategyKind) -> TrailExecParams {
    let mut p = TrailExecParams::default();
    p.exec.strategy = kind;
    p
}

#[test]
fn blank_frame_has_no_destination() {
    for kind in [StrategyKind::TrailFollowing, StrategyKind::HorizontalBand].iter() {
        let mut strategy = strategy_from_params(&params(*kind), None);
        strategy.prepare(snapshot(RgbImage::new(100, 100)));

        let inst = strategy.evaluate().unwrap();
        assert_eq!(inst.destination, None);
        assert_eq!(inst.heading_error(), 0.0);
    }
}

#[test]
fn straight_stripe_is_followed_up_the_centre() {
    let mut strategy = strategy_from_params(&params(StrategyKind::TrailFollowing), None);
    strategy.prepare(snapshot(render_trail(100, 100, 10, 0, 0.0)));

    let inst = strategy.evaluate().unwrap();

    let dest = inst.destination.unwrap();
    assert!((dest.x - 50.0).abs() <= 1.0, "destination {:?}", dest);
    assert!(dest.y > 90.0);

    assert!(inst.trail.len() > 5);
    for p in inst.trail.iter() {
        assert!((p.x - 50.0).abs() <= 1.0, "point {:?} off the centre line", p);
    }
    assert!(inst.trail.last().unwrap().y < 20.0);
    assert!(inst.heading_error().abs() < 0.02);
}

#[test]
fn wide_stripe_is_walked_once_to_the_top() {
    let p = params(StrategyKind::TrailFollowing);
    let mut strategy = strategy_from_params(&p, None);
    strategy.prepare(snapshot(render_trail(100, 100, 30, 0, 0.0)));

    let inst = strategy.evaluate().unwrap();

    assert!(inst.trail.len() < p.per.max_trail_points);
    for pair in inst.trail.windows(2) {
        assert!(pair[1].y < pair[0].y, "trail turned back at {:?}", pair[1]);
    }
    for point in inst.trail.iter() {
        assert!((point.x - 50.0).abs() <= 1.0, "point {:?} off the centre line", point);
    }
    assert!(inst.trail.last().unwrap().y < 10.0);
}

#[test]
fn bent_stripe_is_followed_round_the_bend() {
    let mut strategy = strategy_from_params(&params(StrategyKind::TrailFollowing), None);
    strategy.prepare(snapshot(render_trail(100, 100, 10, 50, 45.0)));

    let inst = strategy.evaluate().unwrap();

    // Above the bend the stripe centre moves one pixel right for every pixel up
    let above: Vec<_> = inst
        .trail
        .iter()
        .filter(|p| p.y > 10.0 && p.y < 40.0)
        .collect();
    assert!(!above.is_empty(), "trail {:?} never passed the bend", inst.trail);
    for p in above.iter() {
        let centre = 49.5 + (50.0 - p.y);
        assert!((p.x - centre).abs() <= 3.0, "point {:?} off the bent stripe", p);
    }
    assert!(inst.trail.iter().any(|p| p.y < 25.0));
}

#[test]
fn evaluation_is_repeatable() {
    for kind in [StrategyKind::TrailFollowing, StrategyKind::HorizontalBand].iter() {
        let mut strategy = strategy_from_params(&params(*kind), None);
        strategy.prepare(snapshot(render_trail(100, 100, 10, 50, 30.0)));

        let first = strategy.evaluate().unwrap();
        let second = strategy.evaluate().unwrap();

        assert_eq!(first.trail, second.trail);
        assert_eq!(first.destination, second.destination);
    }
}

#[test]
fn no_state_carries_over_between_frames() {
    let p = params(StrategyKind::TrailFollowing);

    let mut reused = strategy_from_params(&p, None);
    reused.prepare(snapshot(render_trail(100, 100, 10, 50, 45.0)));
    reused.evaluate().unwrap();
    reused.prepare(snapshot(render_trail(100, 100, 10, 0, 0.0)));
    let after_bend = reused.evaluate().unwrap();

    let mut fresh = strategy_from_params(&p, None);
    fresh.prepare(snapshot(render_trail(100, 100, 10, 0, 0.0)));
    let expected = fresh.evaluate().unwrap();

    assert_eq!(after_bend.trail, expected.trail);
}

#[test]
fn horizontal_band_tracks_a_leaning_stripe() {
    let p = params(StrategyKind::HorizontalBand);
    let mut strategy = strategy_from_params(&p, None);
    strategy.prepare(snapshot(render_trail(100, 100, 10, 100, 20.0)));

    let inst = strategy.evaluate().unwrap();

    assert_eq!(inst.trail.len(), p.per.band_levels.len());
    // Bands are bottom first, so x increases along the trail
    for pair in inst.trail.windows(2) {
        assert!(pair[1].x > pair[0].x);
        assert!(pair[1].y < pair[0].y);
    }
}
