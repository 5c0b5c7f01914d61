//! One-dimensional interval helpers used for face gaps and edge overlaps.

/// Shared stretch of two intervals. `len()` is zero when they are disjoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Overlap {
    pub min: f32,
    pub max: f32,
}

impl Overlap {
    #[inline]
    pub fn len(self) -> f32 {
        (self.max - self.min).max(0.0)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.len() <= 0.0
    }

    #[inline]
    pub fn mid(self) -> f32 {
        (self.min + self.max) * 0.5
    }
}

#[inline]
pub fn overlap(a_min: f32, a_max: f32, b_min: f32, b_max: f32) -> Overlap {
    Overlap {
        min: a_min.max(b_min),
        max: a_max.min(b_max),
    }
}

/// Space between a left face at `left_max` and a right face at `right_min`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceGap {
    pub gap: f32,
    pub center: f32,
}

/// Returns the gap when the right face lies at or beyond the left face.
#[inline]
pub fn face_gap(left_max: f32, right_min: f32) -> Option<FaceGap> {
    let gap = right_min - left_max;
    if gap >= 0.0 {
        Some(FaceGap {
            gap,
            center: (left_max + right_min) * 0.5,
        })
    } else {
        None
    }
}

/// Signed distance between two intervals: positive when apart, negative when they intersect.
#[inline]
pub fn separation(a_min: f32, a_max: f32, b_min: f32, b_max: f32) -> f32 {
    (b_min - a_max).max(a_min - b_max)
}
