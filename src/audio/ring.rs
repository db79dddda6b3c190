// Sample ring - Fixed-capacity i16 FIFO between the relay and the device
//
// The producer (frame pump) pushes interleaved samples; the consumer (device
// callback) pops them. The ring never grows: a full ring makes the producer
// wait, an empty one makes the device play silence.

/// Fixed-capacity ring buffer of interleaved samples
pub struct SampleRing {
    /// Internal storage
    buffer: Vec<i16>,

    /// Read position
    read_pos: usize,

    /// Write position
    write_pos: usize,

    /// Number of samples in the ring
    count: usize,
}

impl SampleRing {
    /// Create a ring
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of samples (not frames) the ring holds
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity.max(1)],
            read_pos: 0,
            write_pos: 0,
            count: 0,
        }
    }

    /// Push as many samples from `samples` as fit
    ///
    /// # Returns
    ///
    /// The number of samples taken from the front of `samples`
    pub fn push_slice(&mut self, samples: &[i16]) -> usize {
        let accepted = samples.len().min(self.free());

        for &sample in &samples[..accepted] {
            self.buffer[self.write_pos] = sample;
            self.write_pos = (self.write_pos + 1) % self.buffer.len();
        }
        self.count += accepted;

        accepted
    }

    /// Pop a sample from the ring
    ///
    /// Returns None if the ring is empty.
    pub fn pop(&mut self) -> Option<i16> {
        if self.count == 0 {
            return None;
        }

        let sample = self.buffer[self.read_pos];
        self.read_pos = (self.read_pos + 1) % self.buffer.len();
        self.count -= 1;
        Some(sample)
    }

    /// Number of samples in the ring
    pub fn len(&self) -> usize {
        self.count
    }

    /// Check if the ring is empty
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of samples that can still be pushed
    pub fn free(&self) -> usize {
        self.buffer.len() - self.count
    }

    /// Capacity in samples
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Drop everything queued
    pub fn clear(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_order() {
        let mut ring = SampleRing::new(4);
        assert_eq!(ring.push_slice(&[1, 2, 3]), 3);
        assert_eq!(ring.pop(), Some(1));
        assert_eq!(ring.pop(), Some(2));
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn test_push_stops_when_full() {
        let mut ring = SampleRing::new(4);
        assert_eq!(ring.push_slice(&[1, 2, 3, 4, 5, 6]), 4);
        assert_eq!(ring.free(), 0);
        assert_eq!(ring.push_slice(&[7]), 0);
    }

    #[test]
    fn test_wraparound() {
        let mut ring = SampleRing::new(3);
        ring.push_slice(&[1, 2, 3]);
        ring.pop();
        ring.pop();
        assert_eq!(ring.push_slice(&[4, 5]), 2);

        let drained: Vec<_> = std::iter::from_fn(|| ring.pop()).collect();
        assert_eq!(drained, vec![3, 4, 5]);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut ring = SampleRing::new(8);
        ring.push_slice(&[1, 2, 3]);
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.free(), ring.capacity());
    }
}
