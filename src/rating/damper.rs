//! Process-wide rating damper
//!
//! Players leaving the simulation inject their rating (negated) into the
//! damper. Each contest then drains at most [`MAX_CORRECTION`] of it back
//! through the loser's deduction, so the accumulated correction returns to
//! the rating pool gradually.

use serde::{Deserialize, Serialize};

/// Largest amount the damper moves toward zero per contest
pub const MAX_CORRECTION: f64 = 0.1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Damper {
    value: f64,
}

impl Damper {
    pub fn new(value: f64) -> Self {
        Self { value }
    }

    /// Current accumulated correction
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Add `amount` to the accumulated correction
    pub fn adjust(&mut self, amount: f64) {
        self.value += amount;
    }

    /// Apply one contest's correction to a loser's `deduction`
    ///
    /// A positive damper increases the deduction, a negative one decreases
    /// it. The damper moves toward zero by the same offset and never crosses
    /// it: a remainder smaller than [`MAX_CORRECTION`] is consumed entirely.
    pub fn correct(&mut self, deduction: f64) -> f64 {
        if self.value > 0.0 {
            let offset = self.value.min(MAX_CORRECTION);
            self.value -= offset;
            deduction + offset
        } else if self.value < 0.0 {
            let offset = (-self.value).min(MAX_CORRECTION);
            self.value += offset;
            deduction - offset
        } else {
            deduction
        }
    }
}
