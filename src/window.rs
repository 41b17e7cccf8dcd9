/// Fixed-capacity buffer of `(|mag|, |gyro|)` feature pairs.
///
/// Pairs are stored interleaved (`mag0, gyro0, mag1, gyro1, ...`), the layout
/// the classifier consumes. Filling the last slot hands out a copy of the
/// buffer and wraps the write index back to zero.
pub struct SlidingWindow {
    buffer: Vec<f32>,
    capacity: usize,
    index: usize,
}

impl SlidingWindow {
    pub fn new(capacity: usize) -> Self {
        SlidingWindow {
            buffer: vec![0.0; capacity * 2],
            capacity,
            index: 0,
        }
    }

    /// Write one pair; returns a snapshot when the window becomes full.
    pub fn push(&mut self, mag_magnitude: f32, gyro_magnitude: f32) -> Option<Vec<f32>> {
        self.buffer[self.index * 2] = mag_magnitude;
        self.buffer[self.index * 2 + 1] = gyro_magnitude;
        self.index += 1;

        if self.index >= self.capacity {
            self.index = 0;
            Some(self.buffer.clone())
        } else {
            None
        }
    }

    /// Number of pairs written since the last wrap.
    pub fn len(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.index == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}
