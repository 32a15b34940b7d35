use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Canvas size shared between the UI thread, which writes it every frame,
/// and background sources that lay out into it.
#[derive(Clone, Debug)]
pub struct Viewport {
    size: Arc<[AtomicU32; 2]>,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Arc::new([
                AtomicU32::new(width.to_bits()),
                AtomicU32::new(height.to_bits()),
            ]),
        }
    }

    /// Ignores non-finite or non-positive sizes.
    pub fn set(&self, width: f32, height: f32) {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return;
        }
        self.size[0].store(width.to_bits(), Ordering::Relaxed);
        self.size[1].store(height.to_bits(), Ordering::Relaxed);
    }

    pub fn size(&self) -> (f32, f32) {
        (
            f32::from_bits(self.size[0].load(Ordering::Relaxed)),
            f32::from_bits(self.size[1].load(Ordering::Relaxed)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_size() {
        let viewport = Viewport::new(800.0, 600.0);
        let reader = viewport.clone();
        viewport.set(1024.5, 700.0);
        assert_eq!(reader.size(), (1024.5, 700.0));

        viewport.set(f32::NAN, 10.0);
        viewport.set(0.0, 10.0);
        assert_eq!(reader.size(), (1024.5, 700.0));
    }
}
