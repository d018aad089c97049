//! Refinement loop configuration.

/// Options for the text-scale refinement loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RefineOptions {
    /// Upper bound on iterations
    pub max_iterations: u32,

    /// Scale tried first
    pub initial_scale: f64,

    /// First step size
    pub initial_step: f64,

    /// Lowest scale ever tried
    pub min_scale: f64,

    /// Highest scale ever tried
    pub max_scale: f64,
}

impl RefineOptions {
    /// Create new refine options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the iteration budget.
    pub fn with_max_iterations(mut self, iterations: u32) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Set the starting scale.
    pub fn with_initial_scale(mut self, scale: f64) -> Self {
        self.initial_scale = scale;
        self
    }

    /// Set the starting step.
    pub fn with_initial_step(mut self, step: f64) -> Self {
        self.initial_step = step.abs();
        self
    }

    /// Set the scale bounds. Swapped bounds are reordered.
    pub fn with_scale_bounds(mut self, min: f64, max: f64) -> Self {
        self.min_scale = min.min(max);
        self.max_scale = min.max(max);
        self
    }

    /// Clamp a scale into the configured bounds.
    pub fn clamp(&self, scale: f64) -> f64 {
        scale.clamp(self.min_scale, self.max_scale)
    }
}

impl Default for RefineOptions {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            initial_scale: 1.0,
            initial_step: 0.08,
            min_scale: 0.5,
            max_scale: 1.5,
        }
    }
}
