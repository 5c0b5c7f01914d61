//! Derives a tile's water volume from its geometry and detects when it needs refreshing.

use waterworks_geom::{Aabb, Vec3, delta_angle_deg, transform_aabb};

use crate::config::WaterConfig;
use crate::constants::*;
use crate::tile::{Pose, TileElement};

/// Union of all volume-shaping elements placed by `pose`.
pub fn collect_world_bounds(pose: &Pose, elements: &[TileElement]) -> Option<Aabb> {
    elements
        .iter()
        .filter(|e| e.role.shapes_volume())
        .map(|e| transform_aabb(&e.local, pose.pos, pose.yaw_deg, pose.scale))
        .reduce(|a, b| a.union(&b))
}

/// Same filter as `collect_world_bounds`, left in tile-local space.
pub fn collect_local_bounds(elements: &[TileElement]) -> Option<Aabb> {
    elements
        .iter()
        .filter(|e| e.role.shapes_volume())
        .map(|e| e.local)
        .reduce(|a, b| a.union(&b))
}

#[inline]
fn clamp_size(s: Vec3) -> Vec3 {
    Vec3::new(
        s.x.clamp(HORIZONTAL_SIZE_MIN, HORIZONTAL_SIZE_MAX),
        s.y.clamp(VERTICAL_SIZE_MIN, VERTICAL_SIZE_MAX),
        s.z.clamp(HORIZONTAL_SIZE_MIN, HORIZONTAL_SIZE_MAX),
    )
}

#[inline]
fn is_degenerate(b: &Aabb) -> bool {
    let s = b.size();
    !b.is_finite() || s.dot(s) <= DEGENERATE_SIZE_SQ
}

/// Replaces garbage with a default slab at the pivot, clamps the size and keeps the
/// box vertically close to the pivot.
pub fn normalize(b: Aabb, pivot: Vec3) -> Aabb {
    if is_degenerate(&b) {
        return Aabb::from_center_size(pivot, FALLBACK_TILE_SIZE);
    }
    let size = clamp_size(b.size());
    let mut center = b.center();
    if (center.y - pivot.y).abs() > CENTER_SNAP_MIN.max(size.y) {
        center.y = pivot.y;
    }
    Aabb::from_center_size(center, size)
}

/// `normalize` for boxes without a meaningful pivot.
pub fn normalize_detached(b: Aabb) -> Aabb {
    if is_degenerate(&b) {
        let center = if b.is_finite() { b.center() } else { Vec3::ZERO };
        return Aabb::from_center_size(center, FALLBACK_TILE_SIZE);
    }
    b.with_size(clamp_size(b.size()))
}

/// Pads the footprint on every side; the result never shrinks below a sliver.
pub fn expand_xz(b: Aabb, padding: f32) -> Aabb {
    if padding.abs() <= PADDING_EPSILON {
        return b;
    }
    let s = b.size();
    b.with_size(Vec3::new(
        (s.x + padding * 2.0).max(PADDED_SIZE_MIN),
        s.y,
        (s.z + padding * 2.0).max(PADDED_SIZE_MIN),
    ))
}

/// Top of the geometry plus `offset`, unless that strays too far from the pivot.
pub fn surface_height(b: &Aabb, pivot_y: f32, offset: f32) -> f32 {
    let pivot_surface = pivot_y + offset;
    let surface = b.max.y + offset;
    if !surface.is_finite() || (surface - pivot_surface).abs() > SURFACE_PIVOT_MIN.max(b.extents().y) {
        pivot_surface
    } else {
        surface
    }
}

/// Horizontal center of the volume: the box center, or the pivot when they disagree.
pub fn resolve_center_xz(b: &Aabb, pivot: Vec3) -> (f32, f32) {
    let c = b.center();
    let (dx, dz) = (c.x - pivot.x, c.z - pivot.z);
    if (dx * dx + dz * dz).sqrt() > PIVOT_XZ_SNAP {
        (pivot.x, pivot.z)
    } else {
        (c.x, c.z)
    }
}

/// Everything derived from one bounds refresh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VolumeMetrics {
    /// Normalized geometry bounds before padding.
    pub raw: Aabb,
    /// Padded footprint, horizontally centered on the resolved volume center.
    pub bounds: Aabb,
    pub surface_y: f32,
    pub depth_below: f32,
    pub above: f32,
}

impl VolumeMetrics {
    pub fn measure(pose: &Pose, elements: &[TileElement], cfg: &WaterConfig) -> Self {
        let collected = collect_world_bounds(pose, elements)
            .unwrap_or_else(|| Aabb::new(pose.pos, pose.pos));
        let raw = normalize(collected, pose.pos);
        let (cx, cz) = resolve_center_xz(&raw, pose.pos);
        let centered = raw.with_center(Vec3::new(cx, raw.center().y, cz));
        let bounds = expand_xz(centered, cfg.surface_padding);
        let surface_y = surface_height(&raw, pose.pos.y, cfg.surface_offset);
        let depth_below = cfg
            .water_depth
            .max(VOLUME_DEPTH_BASE + raw.size().y)
            .max(VOLUME_DEPTH_MIN);
        let above = if cfg.player_check_above_surface > 0.0 {
            cfg.player_check_above_surface
        } else {
            ABOVE_SURFACE_FALLBACK
        };
        Self {
            raw,
            bounds,
            surface_y,
            depth_below,
            above,
        }
    }

    /// Point at the center of the surface.
    #[inline]
    pub fn surface_center(&self) -> Vec3 {
        let c = self.bounds.center();
        Vec3::new(c.x, self.surface_y, c.z)
    }
}

/// Last tracked transform and derived shape, compared against the live values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformSnapshot {
    pub pose: Pose,
    pub surface_y: f32,
    pub bounds: Aabb,
}

impl TransformSnapshot {
    pub fn capture(pose: &Pose, volume: &VolumeMetrics) -> Self {
        Self {
            pose: *pose,
            surface_y: volume.surface_y,
            bounds: volume.bounds,
        }
    }

    /// Cheap per-tick check on the transform alone.
    pub fn pose_moved(&self, pose: &Pose) -> bool {
        (pose.pos - self.pose.pos).length() > MOVE_EPSILON
            || delta_angle_deg(self.pose.yaw_deg, pose.yaw_deg).abs() > ROTATE_EPSILON_DEG
            || (pose.scale - self.pose.scale).length() > SCALE_EPSILON
    }

    /// Full check after a bounds refresh: transform, surface height or footprint size.
    pub fn changed(&self, pose: &Pose, volume: &VolumeMetrics) -> bool {
        let (old, new) = (self.bounds.size(), volume.bounds.size());
        self.pose_moved(pose)
            || (volume.surface_y - self.surface_y).abs() > SURFACE_EPSILON
            || (new.x - old.x).abs() > SIZE_EPSILON
            || (new.z - old.z).abs() > SIZE_EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{ElementRole, TileSpec};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn degenerate_bounds_fall_back_to_slab() {
        let pivot = Vec3::new(5.0, 1.0, -3.0);
        let b = normalize(Aabb::new(pivot, pivot), pivot);
        assert!((b.center() - pivot).length() < 1e-5);
        assert!(approx(b.size().x, 2.0) && approx(b.size().y, 0.2));
        let nan = Aabb::new(Vec3::splat(f32::NAN), Vec3::ONE);
        assert!(normalize(nan, pivot).is_finite());
    }

    #[test]
    fn oversized_bounds_are_clamped() {
        let b = Aabb::new(Vec3::new(-100.0, -0.001, -0.01), Vec3::new(100.0, 0.0, 0.01));
        let n = normalize(b, Vec3::ZERO);
        assert!(approx(n.size().x, 50.0));
        assert!(approx(n.size().y, 0.05));
        assert!(approx(n.size().z, 0.25));
    }

    #[test]
    fn detached_normalize_keeps_its_own_center() {
        let b = Aabb::from_center_size(Vec3::new(4.0, 30.0, 0.0), Vec3::new(80.0, 0.01, 1.0));
        let n = normalize_detached(b);
        assert!((n.center() - b.center()).length() < 1e-4);
        assert!(approx(n.size().x, 50.0) && approx(n.size().y, 0.05));
        let point = Vec3::new(1.0, 2.0, 3.0);
        let slab = normalize_detached(Aabb::new(point, point));
        assert!((slab.center() - point).length() < 1e-5);
        assert!(approx(slab.size().x, 2.0));
        let nan = normalize_detached(Aabb::new(Vec3::splat(f32::NAN), Vec3::ONE));
        assert_eq!(nan.center(), Vec3::ZERO);
    }

    #[test]
    fn far_center_snaps_to_pivot_height() {
        let b = Aabb::from_center_size(Vec3::new(0.0, 8.0, 0.0), Vec3::new(2.0, 0.2, 2.0));
        let n = normalize(b, Vec3::ZERO);
        assert!(approx(n.center().y, 0.0));
    }

    #[test]
    fn padding_never_collapses_footprint() {
        let b = Aabb::from_center_size(Vec3::ZERO, Vec3::new(2.0, 1.0, 2.0));
        assert_eq!(expand_xz(b, 0.00001), b);
        let shrunk = expand_xz(b, -5.0);
        assert!(approx(shrunk.size().x, 0.05));
        assert!(approx(shrunk.size().y, 1.0));
    }

    #[test]
    fn surface_height_prefers_pivot_when_geometry_strays() {
        let near = Aabb::new(Vec3::new(-1.0, -0.2, -1.0), Vec3::new(1.0, 0.0, 1.0));
        assert!(approx(surface_height(&near, 0.0, 0.5), 0.5));
        let far = Aabb::new(Vec3::new(-1.0, 4.8, -1.0), Vec3::new(1.0, 5.0, 1.0));
        assert!(approx(surface_height(&far, 0.0, 0.0), 0.0));
    }

    #[test]
    fn non_volume_roles_are_ignored() {
        let pose = Pose::at(0.0, 0.0, 0.0);
        let mut spec = TileSpec::slab(pose, Vec3::new(2.0, 0.2, 2.0));
        spec.elements.push(TileElement::new(
            Aabb::new(Vec3::splat(-10.0), Vec3::splat(10.0)),
            ElementRole::TriggerCollider,
        ));
        let b = collect_world_bounds(&pose, &spec.elements).unwrap();
        assert!(approx(b.size().x, 2.0));
    }

    #[test]
    fn volume_depth_covers_tall_geometry() {
        let cfg = WaterConfig::default();
        let spec = TileSpec::slab(Pose::at(0.0, 2.0, 0.0), Vec3::new(2.0, 1.0, 2.0));
        let v = VolumeMetrics::measure(&spec.pose, &spec.elements, &cfg);
        assert!(approx(v.surface_y, 2.0));
        assert!(approx(v.depth_below, 4.0));
        assert!(approx(v.above, 1.0));
        // default padding shrinks each side slightly
        assert!(v.bounds.size().x < 2.0 && v.bounds.size().x > 1.97);
    }

    #[test]
    fn snapshot_ignores_jitter() {
        let cfg = WaterConfig::default();
        let spec = TileSpec::slab(Pose::at(0.0, 0.0, 0.0), Vec3::new(2.0, 0.2, 2.0));
        let v = VolumeMetrics::measure(&spec.pose, &spec.elements, &cfg);
        let snap = TransformSnapshot::capture(&spec.pose, &v);
        assert!(!snap.pose_moved(&Pose::at(0.03, 0.0, 0.0)));
        assert!(snap.pose_moved(&Pose::at(0.2, 0.0, 0.0)));
        assert!(snap.pose_moved(&Pose::new(Vec3::ZERO, 5.0)));
        assert!(!snap.pose_moved(&Pose::new(Vec3::ZERO, 360.5)));
    }
}
