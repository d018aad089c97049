//! Damped hill-climbing over the text scale.

use serde::Serialize;

use super::RefineOptions;

/// Search direction along the scale axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards larger scales
    Up,
    /// Towards smaller scales
    Down,
}

impl Direction {
    /// `+1.0` or `-1.0`.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Up => 1.0,
            Direction::Down => -1.0,
        }
    }

    /// The opposite direction.
    pub fn flip(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

/// One step of the search. Values are never mutated; [`advance`] returns
/// the next state.
///
/// [`advance`]: RefinementState::advance
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RefinementState {
    /// Scale to try next
    pub current_scale: f64,
    /// Scale with the lowest score so far
    pub best_scale: f64,
    /// Lowest score so far, `+inf` before the first score
    pub best_score: f64,
    /// Distance of the next move
    pub step: f64,
    /// Direction of the next move
    pub direction: Direction,
}

impl RefinementState {
    /// Starting state.
    pub fn new(options: &RefineOptions) -> Self {
        let start = options.clamp(options.initial_scale);
        Self {
            current_scale: start,
            best_scale: start,
            best_score: f64::INFINITY,
            step: options.initial_step,
            direction: Direction::Up,
        }
    }

    /// Whether `score` beats the best one so far.
    pub fn improves(&self, score: f64) -> bool {
        score < self.best_score
    }

    /// Fold in the score measured at `current_scale` and pick the next scale.
    ///
    /// An improvement records a new best and keeps moving; anything else
    /// reverses direction and halves the step. The next scale is clamped to
    /// the configured bounds. A NaN score never improves.
    pub fn advance(self, score: f64, options: &RefineOptions) -> Self {
        let (best_scale, best_score, step, direction) = if self.improves(score) {
            (self.current_scale, score, self.step, self.direction)
        } else {
            (self.best_scale, self.best_score, self.step * 0.5, self.direction.flip())
        };

        Self {
            current_scale: options.clamp(self.current_scale + direction.sign() * step),
            best_scale,
            best_score,
            step,
            direction,
        }
    }

    /// Whether any score has been recorded.
    pub fn has_score(&self) -> bool {
        self.best_score.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = RefinementState::new(&RefineOptions::default());
        assert_eq!(state.current_scale, 1.0);
        assert_eq!(state.best_scale, 1.0);
        assert!(state.best_score.is_infinite());
        assert_eq!(state.step, 0.08);
        assert_eq!(state.direction, Direction::Up);
        assert!(!state.has_score());
    }

    #[test]
    fn test_improvement_keeps_direction() {
        let options = RefineOptions::default();
        let state = RefinementState::new(&options).advance(0.3, &options);
        assert_eq!(state.best_scale, 1.0);
        assert_eq!(state.best_score, 0.3);
        assert_eq!(state.direction, Direction::Up);
        assert!((state.current_scale - 1.08).abs() < 1e-12);
    }

    #[test]
    fn test_regression_flips_and_halves() {
        let options = RefineOptions::default();
        let state = RefinementState::new(&options)
            .advance(0.3, &options)
            .advance(0.4, &options);
        assert_eq!(state.best_scale, 1.0);
        assert_eq!(state.best_score, 0.3);
        assert_eq!(state.direction, Direction::Down);
        assert!((state.step - 0.04).abs() < 1e-12);
        assert!((state.current_scale - 1.04).abs() < 1e-12);
    }

    #[test]
    fn test_nan_never_improves() {
        let options = RefineOptions::default();
        let state = RefinementState::new(&options)
            .advance(0.3, &options)
            .advance(f64::NAN, &options);
        assert_eq!(state.best_score, 0.3);
        assert_eq!(state.direction, Direction::Down);
    }

    #[test]
    fn test_scale_is_clamped() {
        let options = RefineOptions::default().with_initial_step(1.0);
        let state = RefinementState::new(&options).advance(0.5, &options);
        assert_eq!(state.current_scale, 1.5);

        let options = RefineOptions::default().with_initial_scale(9.0);
        assert_eq!(RefinementState::new(&options).current_scale, 1.5);
    }

    #[test]
    fn test_converges_towards_minimum() {
        let options = RefineOptions::default();
        let score = |scale: f64| (scale - 1.2).abs();

        let mut state = RefinementState::new(&options);
        let mut best_scores = Vec::new();
        for _ in 0..12 {
            state = state.advance(score(state.current_scale), &options);
            best_scores.push(state.best_score);
        }

        assert!((state.best_scale - 1.2).abs() <= options.initial_step / 2.0 + 1e-9);
        assert!(best_scores.windows(2).all(|w| w[1] <= w[0]));
    }
}
