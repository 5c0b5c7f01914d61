//! Build-mode outline shown while the observer aims at or stands near a tile.

use waterworks_geom::{Aabb, Vec3};
use waterworks_mesh::{MeshBuild, MeshKind, SyntheticMesh, outline_wireframe};

use crate::bounds::{collect_local_bounds, normalize_detached};
use crate::constants::{HIGHLIGHT_DISTANCE, HIGHLIGHT_INSET, HIGHLIGHT_INTERVAL};
use crate::mesh_store::MeshId;
use crate::tile::TileId;
use crate::world::WaterWorld;

/// The viewer the highlight reacts to.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Observer {
    pub position: Vec3,
    pub build_mode: bool,
    pub hovered: Option<TileId>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct HighlightState {
    pub timer: f32,
    pub visible: bool,
    pub mesh: Option<MeshId>,
}

/// Whether `observer` should see the outline of `id` centered at `center`.
pub fn highlight_wanted(observer: &Observer, id: TileId, center: Vec3) -> bool {
    observer.build_mode
        && (observer.hovered == Some(id) || (observer.position - center).length() <= HIGHLIGHT_DISTANCE)
}

/// Shrinks every face by `amount` when the box stays valid.
fn inset(b: Aabb, amount: f32) -> Aabb {
    let s = b.size();
    if s.x > amount * 2.0 && s.y > amount * 2.0 && s.z > amount * 2.0 {
        Aabb::new(b.min + Vec3::splat(amount), b.max - Vec3::splat(amount))
    } else {
        b
    }
}

impl WaterWorld {
    /// Re-evaluates highlight visibility every tenth of a second per tile.
    pub fn update_highlights(&mut self, dt: f32, observer: &Observer) {
        for id in self.tile_ids() {
            let Some(tile) = self.tiles.get_mut(&id) else {
                continue;
            };
            tile.highlight.timer += dt;
            if tile.highlight.timer < HIGHLIGHT_INTERVAL {
                continue;
            }
            tile.highlight.timer = 0.0;
            let want = highlight_wanted(observer, id, tile.volume.surface_center());
            if want == tile.highlight.visible {
                continue;
            }
            if want {
                self.ensure_outline(id);
            }
            if let Some(tile) = self.tiles.get_mut(&id) {
                tile.highlight.visible = want;
            }
            log::trace!(target: "tiles", "tile {} highlight {}", id, if want { "on" } else { "off" });
        }
    }

    fn outline_build(&self, id: TileId) -> Option<MeshBuild> {
        let tile = self.tiles.get(&id)?;
        let pose = tile.pose;
        match collect_local_bounds(&tile.elements) {
            Some(local) => {
                let sc = |v: Vec3| Vec3::new(v.x * pose.scale.x, v.y * pose.scale.y, v.z * pose.scale.z);
                let scaled = Aabb::from_points([sc(local.min), sc(local.max)])?;
                let mut mb = outline_wireframe(&inset(normalize_detached(scaled), HIGHLIGHT_INSET));
                mb.transform_yaw_translate(pose.yaw_deg, pose.pos);
                Some(mb)
            }
            None => Some(outline_wireframe(&inset(tile.volume.raw, HIGHLIGHT_INSET))),
        }
    }

    /// Builds the outline lazily on first show.
    fn ensure_outline(&mut self, id: TileId) {
        if self.tiles.get(&id).is_none_or(|t| t.highlight.mesh.is_some()) {
            return;
        }
        let Some(build) = self.outline_build(id) else {
            return;
        };
        let mesh = self.meshes.insert(SyntheticMesh::new(MeshKind::Outline, build));
        if let Some(tile) = self.tiles.get_mut(&id) {
            tile.highlight.mesh = Some(mesh);
        }
    }

    /// Drops a stale outline; rebuilt immediately when it is on screen.
    pub(crate) fn invalidate_outline(&mut self, id: TileId) {
        let Some(tile) = self.tiles.get_mut(&id) else {
            return;
        };
        let visible = tile.highlight.visible;
        if let Some(old) = tile.highlight.mesh.take() {
            self.meshes.release(old);
        }
        if visible {
            self.ensure_outline(id);
        }
    }

    pub fn highlight_visible(&self, id: TileId) -> bool {
        self.tiles.get(&id).is_some_and(|t| t.highlight.visible)
    }

    /// Outline mesh of `id` while it is shown.
    pub fn highlight_mesh(&self, id: TileId) -> Option<&SyntheticMesh> {
        let t = self.tiles.get(&id)?;
        if !t.highlight.visible {
            return None;
        }
        self.meshes.get(t.highlight.mesh?)
    }
}
