use rand::Rng;

/// Source of uniform draws over `[lo, hi)`.
pub trait UniformSource {
    fn uniform(&mut self, lo: f32, hi: f32) -> f32;
}

impl<R: Rng + ?Sized> UniformSource for R {
    fn uniform(&mut self, lo: f32, hi: f32) -> f32 {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        if lo < hi {
            let value = self.random_range(lo..hi);
            // Float rounding can land exactly on the open upper bound.
            if value < hi { value } else { lo }
        } else {
            lo
        }
    }
}
