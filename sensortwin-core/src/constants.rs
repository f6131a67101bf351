//! Shared numeric defaults and bounds
//!
//! Values that shape pipeline behavior live here rather than inline, so
//! tests and documentation have one place to point at. Constants carry
//! their unit in the name.

/// Drift stage bounds
pub mod drift {
    /// Lower clamp on the sensitivity drift factor; bounds pathological
    /// configurations (a factor of 0.1 means the sensor lost 90% of gain)
    pub const SENSITIVITY_FACTOR_MIN: f64 = 0.1;

    /// Upper clamp on the sensitivity drift factor
    pub const SENSITIVITY_FACTOR_MAX: f64 = 2.0;
}

/// Electromagnetic interference coupling
pub mod emi {
    /// Fraction of the summed interference contribution added to the
    /// scalar field reading
    pub const READING_FRACTION: f64 = 0.1;

    /// Fraction of the summed interference contribution reported as the
    /// spectrum noise floor
    pub const NOISE_FLOOR_FRACTION: f64 = 0.05;

    /// Default frequency-coupling constant: interference a full coupling
    /// constant away in frequency is attenuated to 1/e
    pub const DEFAULT_COUPLING_HZ: f64 = 1000.0;

    /// Default search radius for interference sources
    pub const DEFAULT_SEARCH_RADIUS_M: f64 = 50.0;
}

/// Field sensor frequency response
pub mod field {
    /// Default gain when the dominant frequency matches no table entry
    pub const DEFAULT_GAIN: f64 = 1.0;

    /// Default tolerance for nearest-entry frequency matching
    pub const DEFAULT_FREQUENCY_TOLERANCE_HZ: f64 = 0.5;

    /// Default queried band when the configuration names none
    pub const DEFAULT_FREQUENCY_RANGE_HZ: (f64, f64) = (0.0, 1.0e6);

    /// Harmonic positions reported in spectrum output, as multiples of the
    /// dominant frequency
    pub const HARMONIC_MULTIPLES: [u32; 3] = [3, 5, 7];

    /// Default harmonic amplitude ratios relative to the fundamental
    pub const DEFAULT_HARMONIC_RATIOS: [f64; 3] = [1.0 / 3.0, 1.0 / 5.0, 1.0 / 7.0];
}

/// Thermal imager defaults
pub mod thermal {
    /// Value a dead pixel is forced to, °C
    pub const DEFAULT_DEAD_PIXEL_C: f64 = -40.0;

    /// Value a hot pixel is forced to, °C
    pub const DEFAULT_HOT_PIXEL_C: f64 = 150.0;

    /// Default field of view
    pub const DEFAULT_FOV_DEGREES: f64 = 90.0;

    /// Gaussian blur kernel extends this many sigmas each side
    pub const BLUR_KERNEL_SIGMAS: f64 = 2.0;
}

/// Environmental compensation defaults
pub mod compensation {
    /// Factory calibration reference temperature, °C
    pub const DEFAULT_REFERENCE_TEMP_C: f64 = 25.0;
}
