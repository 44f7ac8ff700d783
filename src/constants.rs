//! Default settings and fixed coefficients for the extraction pipeline
//!
//! Every component configuration falls back to the values defined here when
//! a caller does not override them.

/// Center crop and rescale
pub mod resize {
    /// Fraction of height and width kept around the image center
    pub const DEFAULT_CROP: f64 = 0.90;

    /// Height of the resized image in pixels
    pub const DEFAULT_ROWS: u32 = 100;
}

/// Background removal
pub mod background {
    /// Maximum color distance to a corner for a pixel to count as background
    pub const DEFAULT_MAX_DISTANCE: f32 = 5.0;

    /// Corner distances are measured in CIE Lab by default
    pub const DEFAULT_USE_LAB: bool = true;

    /// Edge policy: `<= 0` foreground, `1` background, `> 1` erosion kernel size
    pub const DEFAULT_EDGE_THINNING: i32 = 3;

    /// Odd kernel size of the Gaussian blur applied before edge detection
    pub const DEFAULT_BLUR_RADIUS: u32 = 3;

    /// Sobel magnitude above which a pixel is an edge
    pub const DEFAULT_EDGE_THRESHOLD: u8 = 24;

    /// Mask coverage at or above which a mask is considered degenerate
    pub const DEFAULT_MAX_COVERAGE: f64 = 0.90;
}

/// Skin detection
pub mod skin {
    /// Lower HSV bound: hue in degrees, saturation and value on 0-255
    pub const GENERAL_LOWER: [f32; 3] = [0.0, 48.0, 80.0];

    /// Upper HSV bound: hue in degrees, saturation and value on 0-255
    pub const GENERAL_UPPER: [f32; 3] = [40.0, 255.0, 255.0];

    /// Taps per axis of the Gaussian used to smooth the skin mask
    pub const SMOOTHING_SIZE: u32 = 3;

    /// Sigma of the 3x3 Gaussian used to smooth the skin mask
    pub const SMOOTHING_SIGMA: f32 = 0.8;
}

/// Adaptive k-means
pub mod cluster {
    /// Smallest candidate cluster count
    pub const DEFAULT_MIN_K: usize = 2;

    /// Exclusive upper bound of candidate cluster counts
    pub const DEFAULT_MAX_K: usize = 7;

    /// Restarts per candidate, best compactness kept
    pub const DEFAULT_ATTEMPTS: usize = 10;

    /// Lloyd iterations per restart
    pub const DEFAULT_MAX_ITERATIONS: usize = 50;

    /// Center movement below which a restart has converged
    pub const DEFAULT_EPSILON: f32 = 1.0;

    /// Exponent of the transformed distortion statistic
    pub const DISTORTION_POWER: f64 = 1.5;
}

/// Cluster selection
pub mod selector {
    /// Share of pixels the `ratio` strategy must cover
    pub const DEFAULT_RATIO_THRESHOLD: f64 = 0.75;
}

/// Color naming
pub mod naming {
    /// Rec. 601 luma coefficients in RGB order
    pub const LUMA_COEFFICIENTS: [f32; 3] = [0.299, 0.587, 0.114];

    /// Maximum distance to the gray axis for the monochrome override
    pub const DEFAULT_MAX_GRAY_DISTANCE: f32 = 15.0;

    /// Luminance at or below which a monochrome color is black
    pub const DEFAULT_BLACK_MAX_LUMINANCE: f32 = 45.0;

    /// Luminance at or above which a monochrome color is white
    pub const DEFAULT_WHITE_MIN_LUMINANCE: f32 = 170.0;

    /// Neighbors consulted by the kNN classifier
    pub const DEFAULT_NEIGHBORS: usize = 50;

    pub const DEFAULT_BLACK_NAME: &str = "black";
    pub const DEFAULT_GRAY_NAME: &str = "gray";
    pub const DEFAULT_WHITE_NAME: &str = "white";
}
