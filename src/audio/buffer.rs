/// Mutable view over an interleaved `f32` block.
///
/// Sample for frame `f`, channel `c` lives at `f * channels + c`.
pub struct AudioBuffer<'a> {
    data: &'a mut [f32],
    channels: usize,
}

impl<'a> AudioBuffer<'a> {
    /// Returns `None` when the slice cannot be split into whole frames
    pub fn new(data: &'a mut [f32], channels: usize) -> Option<Self> {
        if channels == 0 || data.len() % channels != 0 {
            return None;
        }
        Some(Self { data, channels })
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    pub fn frames(&self) -> usize {
        self.data.len() / self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, frame: usize, channel: usize) -> f32 {
        self.data[frame * self.channels + channel]
    }

    pub fn frames_mut(&mut self) -> std::slice::ChunksExactMut<'_, f32> {
        self.data.chunks_exact_mut(self.channels)
    }

    /// Copy channels beyond the first two from the processed stereo pair
    pub fn mirror_extra_channels(&mut self) {
        if self.channels <= 2 {
            return;
        }
        for frame in self.frames_mut() {
            for ch in 2..frame.len() {
                frame[ch] = frame[ch % 2];
            }
        }
    }

    pub fn scale(&mut self, gain: f32) {
        for s in self.data.iter_mut() {
            *s *= gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ragged_blocks() {
        let mut data = [0.0f32; 5];
        assert!(AudioBuffer::new(&mut data, 2).is_none());
        assert!(AudioBuffer::new(&mut data, 0).is_none());
        assert!(AudioBuffer::new(&mut data, 5).is_some());
    }

    #[test]
    fn indexing_is_frame_major() {
        let mut data = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let buf = AudioBuffer::new(&mut data, 3).unwrap();
        assert_eq!(buf.frames(), 2);
        assert_eq!(buf.get(1, 0), 3.0);
        assert_eq!(buf.get(0, 2), 2.0);
    }

    #[test]
    fn extra_channels_follow_stereo_pair() {
        let mut data = [0.1, 0.2, 9.0, 9.0, 0.3, 0.4, 9.0, 9.0];
        let mut buf = AudioBuffer::new(&mut data, 4).unwrap();
        buf.mirror_extra_channels();
        assert_eq!(data, [0.1, 0.2, 0.1, 0.2, 0.3, 0.4, 0.3, 0.4]);
    }
}
