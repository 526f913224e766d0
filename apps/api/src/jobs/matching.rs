//! Mock matching. A right swipe becomes a match with a fixed probability;
//! there is no employer-side decision yet.

use rand::Rng;

use crate::models::job::SwipeDirection;

/// Rolls the match for one swipe. Left swipes never match.
pub fn roll_match<R: Rng + ?Sized>(rng: &mut R, direction: SwipeDirection, probability: f64) -> bool {
    match direction {
        SwipeDirection::Left => false,
        SwipeDirection::Right => rng.gen_bool(probability.clamp(0.0, 1.0)),
    }
}
