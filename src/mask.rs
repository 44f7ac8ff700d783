//! Boolean per-pixel exclusion masks
//!
//! A [`Mask`] always has the spatial shape of the image it was derived from.
//! `true` marks a pixel excluded from clustering (background or skin).

use image::{GrayImage, Luma};

/// Row-major boolean mask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl Mask {
    /// Mask excluding nothing
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![false; width as usize * height as usize],
        }
    }

    /// Mask excluding everything
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![true; width as usize * height as usize],
        }
    }

    /// Build a mask by evaluating `f(x, y)` for every pixel
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    /// Nonzero pixels of a grayscale image become `true`
    pub fn from_gray(image: &GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.pixels().map(|p| p[0] != 0).collect(),
        }
    }

    /// Render as a grayscale image, 255 where excluded
    pub fn to_gray(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([if self.get(x, y) { 255 } else { 0 }])
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// (width, height), matching `image::GenericImageView::dimensions`
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Row-major view of the flags
    pub fn as_slice(&self) -> &[bool] {
        &self.data
    }

    /// Number of excluded pixels
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Excluded share of the image in [0, 1]; 0 for an empty image
    pub fn coverage(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.count() as f64 / self.data.len() as f64
    }

    /// Pixel-wise OR of two masks of the same shape
    pub fn union(&self, other: &Mask) -> Mask {
        assert_eq!(
            self.dimensions(),
            other.dimensions(),
            "mask shapes must match"
        );
        Mask {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| a || b)
                .collect(),
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage_and_count() {
        let mask = Mask::from_fn(4, 2, |x, _| x < 1);
        assert_eq!(mask.count(), 2);
        assert!((mask.coverage() - 0.25).abs() < 1e-9);
        assert_eq!(Mask::empty(0, 0).coverage(), 0.0);
    }

    #[test]
    fn test_union() {
        let left = Mask::from_fn(3, 3, |x, _| x == 0);
        let top = Mask::from_fn(3, 3, |_, y| y == 0);
        let both = left.union(&top);
        assert_eq!(both.count(), 5);
        assert!(both.get(0, 2));
        assert!(both.get(2, 0));
        assert!(!both.get(1, 1));
    }

    #[test]
    #[should_panic(expected = "mask shapes must match")]
    fn test_union_shape_mismatch_panics() {
        Mask::empty(2, 2).union(&Mask::empty(3, 2));
    }

    #[test]
    fn test_gray_round_trip() {
        let mut mask = Mask::empty(5, 4);
        mask.set(3, 2, true);
        let gray = mask.to_gray();
        assert_eq!(gray.get_pixel(3, 2)[0], 255);
        assert_eq!(Mask::from_gray(&gray), mask);
    }
}
