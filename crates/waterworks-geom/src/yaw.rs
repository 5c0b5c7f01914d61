use crate::{Aabb, Vec3};

/// Rotates a vector by yaw degrees (Y axis), preserving Y.
#[inline]
pub fn rotate_yaw(v: Vec3, yaw_deg: f32) -> Vec3 {
    let r = yaw_deg.to_radians();
    let (s, c) = r.sin_cos();
    Vec3 {
        x: v.x * c - v.z * s,
        y: v.y,
        z: v.x * s + v.z * c,
    }
}

#[inline]
pub fn rotate_yaw_inv(v: Vec3, yaw_deg: f32) -> Vec3 {
    rotate_yaw(v, -yaw_deg)
}

/// Shortest signed angle from `a` to `b`, in degrees within (-180, 180].
pub fn delta_angle_deg(a: f32, b: f32) -> f32 {
    let d = (b - a).rem_euclid(360.0);
    if d > 180.0 { d - 360.0 } else { d }
}

/// AABB of `aabb` after rotating every corner about the origin.
pub fn rotate_aabb_yaw(aabb: &Aabb, yaw_deg: f32) -> Aabb {
    let corners = aabb.corners().map(|c| rotate_yaw(c, yaw_deg));
    Aabb::from_points(corners).unwrap_or(*aabb)
}

/// World AABB of a local box under scale, then yaw, then translation.
pub fn transform_aabb(local: &Aabb, pos: Vec3, yaw_deg: f32, scale: Vec3) -> Aabb {
    let corners = local.corners().map(|c| {
        let scaled = Vec3::new(c.x * scale.x, c.y * scale.y, c.z * scale.z);
        rotate_yaw(scaled, yaw_deg) + pos
    });
    Aabb::from_points(corners).unwrap_or(*local)
}
