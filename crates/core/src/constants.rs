//! Constants used throughout the CarePoint core crate.

/// Default appointment length when neither the request nor the environment sets one.
pub const DEFAULT_APPOINTMENT_MINUTES: u32 = 30;

/// Shortest bookable appointment.
pub const MIN_APPOINTMENT_MINUTES: u32 = 5;

/// Longest bookable appointment.
pub const MAX_APPOINTMENT_MINUTES: u32 = 240;

/// Minimum accepted API key length.
pub const MIN_API_KEY_LEN: usize = 16;

/// Maximum number of medications on one prescription.
pub const MAX_MEDICATIONS: usize = 20;
