use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

#[cfg(not(feature = "std"))]
use num_traits::Float;

/// Smooth pseudo-random values in [0, 1].
///
/// Successive random values are one unit of progress apart, with smoothstep
/// interpolation in between. The generator is cheap to clone, which is how the
/// modeler snapshots it.
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    rng: SmallRng,
    previous: f32,
    next: f32,
    progress: f32,
}

impl NoiseGenerator {
    pub fn new(seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let previous = rng.gen::<f32>();
        let next = rng.gen::<f32>();
        NoiseGenerator {
            rng,
            previous,
            next,
            progress: 0.0,
        }
    }

    pub fn current_value(&self) -> f32 {
        let t = self.progress;
        let smooth = t * t * (3.0 - 2.0 * t);
        self.previous + (self.next - self.previous) * smooth
    }

    /// Moves forward by `delta` units of progress. Negative or non-finite deltas
    /// are ignored.
    pub fn advance_by(&mut self, delta: f32) {
        if !(delta > 0.0) || !delta.is_finite() {
            return;
        }

        self.progress += delta;
        let mut steps = 0;
        while self.progress >= 1.0 {
            self.progress -= 1.0;
            steps += 1;
            if steps > 2 {
                // Intermediate values don't matter, only the last two do.
                self.progress = self.progress.fract();
            }
            self.previous = self.next;
            self.next = self.rng.gen::<f32>();
        }
    }
}

#[test]
fn noise_is_deterministic_and_bounded() {
    let mut a = NoiseGenerator::new(42);
    let mut b = NoiseGenerator::new(42);
    for i in 0..100 {
        let delta = (i % 7) as f32 * 0.13;
        a.advance_by(delta);
        b.advance_by(delta);
        let value = a.current_value();
        assert_eq!(value, b.current_value());
        assert!((0.0..=1.0).contains(&value));
    }

    let mut c = a.clone();
    a.advance_by(0.3);
    c.advance_by(0.3);
    assert_eq!(a.current_value(), c.current_value());

    let mut far = NoiseGenerator::new(1);
    far.advance_by(1.0e6);
    assert!((0.0..=1.0).contains(&far.current_value()));
}
