//! Seeded pan-and-zoom paths over still section images.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 1.05;
pub const MAX_ZOOM: f64 = 1.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Crop window at normalized time `t` (0 at section start, 1 at its end).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub t: f64,
    pub rect: Rect,
}

/// Generates start and end crop windows for one section image.
///
/// The same `(seed, index)` always yields the same path. Odd section indices
/// pan horizontally and even ones vertically, so consecutive sections alternate.
/// `duration_ms` only scales how far the window travels: short sections pan less.
pub fn generate_ken_burns_path(
    img_w: u32,
    img_h: u32,
    duration_ms: f64,
    seed: u64,
    index: u32,
) -> Vec<Keyframe> {
    let mut rng = StdRng::seed_from_u64(seed ^ (u64::from(index) << 32));

    let min_dim = img_w.min(img_h);
    let zoom = rng.gen_range(MIN_ZOOM..=MAX_ZOOM);
    // Stay inside the zoom bounds after flooring to whole pixels.
    let view = ((min_dim as f64 / zoom).floor() as u32)
        .clamp((min_dim as f64 / MAX_ZOOM).ceil() as u32, min_dim);

    let horizontal = index % 2 == 1;
    let slack = if horizontal { img_w - view } else { img_h - view };

    // Pan over 60-100% of the available slack; at least 3 s of travel to use it all.
    let reach = (duration_ms / 3000.0).clamp(0.0, 1.0);
    let travel = (slack as f64 * rng.gen_range(0.6..=1.0) * reach.max(0.5)).round() as u32;
    let offset = rng.gen_range(0..=slack - travel.min(slack));
    let (from, to) = if rng.gen_bool(0.5) {
        (offset, offset + travel.min(slack))
    } else {
        (offset + travel.min(slack), offset)
    };

    // The fixed axis stays centred.
    let centre = if horizontal {
        (img_h - view) / 2
    } else {
        (img_w - view) / 2
    };

    let rect_at = |along: u32| {
        if horizontal {
            Rect { x: along, y: centre, w: view, h: view }
        } else {
            Rect { x: centre, y: along, w: view, h: view }
        }
    };

    vec![
        Keyframe { t: 0.0, rect: rect_at(from) },
        Keyframe { t: 1.0, rect: rect_at(to) },
    ]
}
