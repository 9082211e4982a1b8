//! FAST-9 segment-test corner detector.

use ndarray::Array2;
use rayon::prelude::*;

/// Bresenham circle of radius 3 as (dx, dy), clockwise from 12 o'clock.
const CIRCLE: [(isize, isize); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// Number of contiguous circle pixels that must all be brighter or darker.
const ARC_LENGTH: usize = 9;

/// Radius of the test circle.
pub const CIRCLE_RADIUS: usize = 3;

/// A FAST corner with its segment-test score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Corner {
    pub row: usize,
    pub col: usize,
    /// Sum of absolute differences of the circle pixels beyond the threshold.
    pub score: i32,
}

/// Detect FAST-9 corners, skipping `border` pixels on every side (at least the
/// circle radius), then keep only 3x3 local maxima of the score.
pub fn detect_corners(image: &Array2<u8>, threshold: u8, border: usize) -> Vec<Corner> {
    let (h, w) = image.dim();
    let border = border.max(CIRCLE_RADIUS);
    if h <= 2 * border || w <= 2 * border {
        return Vec::new();
    }

    let candidates: Vec<Corner> = (border..h - border)
        .into_par_iter()
        .flat_map_iter(|row| {
            (border..w - border).filter_map(move |col| {
                corner_score(image, row, col, threshold).map(|score| Corner { row, col, score })
            })
        })
        .collect();

    non_max_suppression(candidates, (h, w))
}

/// Segment test at one pixel. Returns the corner score if the pixel is a corner.
pub fn corner_score(image: &Array2<u8>, row: usize, col: usize, threshold: u8) -> Option<i32> {
    let center = image[[row, col]] as i32;
    let t = threshold as i32;

    let mut ring = [0i32; 16];
    for (i, &(dx, dy)) in CIRCLE.iter().enumerate() {
        let r = (row as isize + dy) as usize;
        let c = (col as isize + dx) as usize;
        ring[i] = image[[r, c]] as i32 - center;
    }

    // High-speed rejection on the four compass points: a 9-arc covers at least two.
    let compass = [ring[0], ring[4], ring[8], ring[12]];
    let brighter = compass.iter().filter(|&&d| d > t).count();
    let darker = compass.iter().filter(|&&d| d < -t).count();
    if brighter < 2 && darker < 2 {
        return None;
    }

    if !has_arc(&ring, |d| d > t) && !has_arc(&ring, |d| d < -t) {
        return None;
    }

    let score = ring
        .iter()
        .map(|&d| (d.abs() - t).max(0))
        .sum::<i32>();
    Some(score)
}

fn has_arc(ring: &[i32; 16], pred: impl Fn(i32) -> bool) -> bool {
    let mut run = 0usize;
    for i in 0..16 + ARC_LENGTH - 1 {
        if pred(ring[i % 16]) {
            run += 1;
            if run >= ARC_LENGTH {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

/// Keep corners whose score beats all 8 neighbours. Equal scores go to the
/// corner that comes first in row-major order.
fn non_max_suppression(corners: Vec<Corner>, (h, w): (usize, usize)) -> Vec<Corner> {
    let mut scores = Array2::<i32>::zeros((h, w));
    for c in &corners {
        scores[[c.row, c.col]] = c.score;
    }

    corners
        .into_iter()
        .filter(|c| {
            for dr in -1..=1_isize {
                for dc in -1..=1_isize {
                    if dr == 0 && dc == 0 {
                        continue;
                    }
                    let r = c.row as isize + dr;
                    let col = c.col as isize + dc;
                    if r < 0 || r >= h as isize || col < 0 || col >= w as isize {
                        continue;
                    }
                    let other = scores[[r as usize, col as usize]];
                    let earlier = dr < 0 || (dr == 0 && dc < 0);
                    if other > c.score || (other == c.score && earlier) {
                        return false;
                    }
                }
            }
            true
        })
        .collect()
}
