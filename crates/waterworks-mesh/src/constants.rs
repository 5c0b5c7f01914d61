//! Shared constants for waterworks-mesh. Centralizes the ribbon and outline shape numbers.

// Ribbons
pub const CURTAIN_SEGMENTS_MAX: usize = 24;
pub const CASCADE_SEGMENTS_MIN: usize = 2;
pub(crate) const CURTAIN_BULGE: f32 = 0.35; // sine bulge as a fraction of depth

// Outline
pub const OUTLINE_THICKNESS: f32 = 0.06;
pub const OUTLINE_THICKNESS_MIN: f32 = 0.01;
pub(crate) const OUTLINE_THICKNESS_MAX_RATIO: f32 = 0.4; // of the smallest box extent

// Default UV tiling for world-anchored surfaces (world units per UV repeat)
pub const SURFACE_UV_SCALE: f32 = 4.0;
