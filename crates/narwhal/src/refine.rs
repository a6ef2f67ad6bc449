use crate::options::{LambdaDecay, RefinementOptions};

/// Step-size schedule of the refinement phase.
///
/// Lambda never increases. The schedule is exhausted once the iteration cap is reached or lambda
/// falls below the negligible threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaSchedule {
    lambda: f64,
    initial: f64,
    iteration: usize,
    max_iterations: usize,
    decay: LambdaDecay,
    negligible: f64,
}

impl LambdaSchedule {
    pub fn new(options: &RefinementOptions, max_iterations: usize) -> Self {
        Self {
            lambda: options.initial_lambda,
            initial: options.initial_lambda,
            iteration: 0,
            max_iterations,
            decay: options.decay,
            negligible: options.negligible_lambda,
        }
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Completed passes.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn is_exhausted(&self) -> bool {
        self.iteration >= self.max_iterations || self.lambda < self.negligible
    }

    /// Advances to the next pass and shrinks lambda.
    pub fn reduce(&mut self) {
        self.iteration += 1;
        let n = self.max_iterations.max(1) as f64;
        let factor = match self.decay {
            LambdaDecay::Linear => 1.0 - (self.iteration as f64) / n,
            LambdaDecay::Geometric(f) => f,
        };
        self.lambda *= factor.clamp(0.0, 1.0);
        if self.iteration >= self.max_iterations {
            self.lambda = self.lambda.min(self.initial / n);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(decay: LambdaDecay, n: usize) -> LambdaSchedule {
        LambdaSchedule::new(
            &RefinementOptions {
                initial_lambda: 1.0,
                decay,
                negligible_lambda: 0.0,
            },
            n,
        )
    }

    #[test]
    fn zero_iterations_is_exhausted_immediately() {
        assert!(schedule(LambdaDecay::Linear, 0).is_exhausted());
    }

    #[test]
    fn decay_is_monotone_and_ends_small() {
        for decay in [LambdaDecay::Linear, LambdaDecay::Geometric(0.9)] {
            let mut s = schedule(decay, 8);
            let mut last = s.lambda();
            while !s.is_exhausted() {
                s.reduce();
                assert!(s.lambda() <= last);
                last = s.lambda();
            }
            assert_eq!(s.iteration(), 8);
            assert!(s.lambda() <= 1.0 / 8.0);
        }
    }

    #[test]
    fn negligible_lambda_stops_early() {
        let mut s = LambdaSchedule::new(
            &RefinementOptions {
                initial_lambda: 1.0,
                decay: LambdaDecay::Geometric(0.1),
                negligible_lambda: 0.05,
            },
            100,
        );
        s.reduce();
        assert!(!s.is_exhausted());
        s.reduce();
        assert!(s.is_exhausted());
        assert_eq!(s.iteration(), 2);
    }
}
