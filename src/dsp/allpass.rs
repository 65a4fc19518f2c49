/// Schroeder allpass used to diffuse the comb output
#[derive(Debug, Clone, Default)]
pub struct AllpassFilter {
    buffer: Vec<f32>,
    index: usize,
    feedback: f32,
}

impl AllpassFilter {
    pub fn new(size: usize, feedback: f32) -> Self {
        let mut allpass = Self {
            feedback,
            ..Self::default()
        };
        allpass.set_buffer(size);
        allpass
    }

    pub fn set_buffer(&mut self, size: usize) {
        self.buffer = vec![0.0; size.max(1)];
        self.index = 0;
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback;
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
            return input;
        }
        let buf_out = self.buffer[self.index];
        let output = -input + buf_out;
        self.buffer[self.index] = input + buf_out * self.feedback;
        self.index += 1;
        if self.index >= self.buffer.len() {
            self.index = 0;
        }
        output
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
    }

    pub fn is_clear(&self) -> bool {
        self.buffer.iter().all(|&s| s == 0.0)
    }
}
