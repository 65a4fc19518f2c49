/// Feedback comb filter with one-pole damping in the feedback path
#[derive(Debug, Clone, Default)]
pub struct CombFilter {
    buffer: Vec<f32>,
    index: usize,
    feedback: f32,
    filter_store: f32,
    damp1: f32,
    damp2: f32,
}

impl CombFilter {
    pub fn new(size: usize) -> Self {
        let mut comb = Self::default();
        comb.set_buffer(size);
        comb
    }

    /// Resize the delay line. This is the only operation that changes its length.
    pub fn set_buffer(&mut self, size: usize) {
        self.buffer = vec![0.0; size.max(1)];
        self.index = 0;
        self.filter_store = 0.0;
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback;
    }

    pub fn set_damp(&mut self, damp: f32) {
        self.damp1 = damp;
        self.damp2 = 1.0 - damp;
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        if self.buffer.is_empty() {
            return 0.0;
        }
        let output = self.buffer[self.index];
        self.filter_store = output * self.damp2 + self.filter_store * self.damp1;
        self.buffer[self.index] = input + self.filter_store * self.feedback;
        self.index += 1;
        if self.index >= self.buffer.len() {
            self.index = 0;
        }
        output
    }

    /// Zero the delay line and damping store, keeping the length
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
        self.filter_store = 0.0;
    }

    pub fn is_clear(&self) -> bool {
        self.filter_store == 0.0 && self.buffer.iter().all(|&s| s == 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_returns_after_one_period() {
        let mut comb = CombFilter::new(4);
        comb.set_feedback(0.5);
        comb.set_damp(0.0);

        let out: Vec<f32> = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
            .iter()
            .map(|&x| comb.process(x))
            .collect();

        assert_eq!(out[0], 0.0);
        assert_eq!(out[4], 1.0);
        assert_eq!(out[8], 0.5);
    }

    #[test]
    fn coefficient_changes_keep_length() {
        let mut comb = CombFilter::new(37);
        comb.set_feedback(0.9);
        comb.set_damp(0.3);
        for _ in 0..100 {
            comb.process(0.25);
        }
        comb.set_feedback(0.1);
        comb.set_damp(0.9);
        assert_eq!(comb.len(), 37);
    }

    #[test]
    fn zero_size_is_clamped() {
        let mut comb = CombFilter::new(0);
        assert_eq!(comb.len(), 1);
        assert!(comb.process(1.0).is_finite());
    }

    #[test]
    fn clear_zeroes_everything() {
        let mut comb = CombFilter::new(8);
        comb.set_feedback(0.7);
        comb.set_damp(0.2);
        for i in 0..50 {
            comb.process(i as f32 * 0.01);
        }
        assert!(!comb.is_clear());
        comb.clear();
        assert!(comb.is_clear());
        assert_eq!(comb.len(), 8);
    }
}
