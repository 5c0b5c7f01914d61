use waterworks_tiles::{
    Aabb, ConnectorKind, LiquidChange, LiquidTracker, MeshKind, Observer, Pose, TileError, TileId, TileSpec,
    Vec3, WaterConfig, WaterWorld,
};

fn world() -> WaterWorld {
    WaterWorld::new(WaterConfig {
        surface_padding: 0.0,
        ..WaterConfig::default()
    })
}

fn slab_at(x: f32, y: f32, z: f32) -> TileSpec {
    TileSpec::slab(Pose::at(x, y, z), Vec3::new(2.0, 0.2, 2.0))
}

fn owners(w: &WaterWorld) -> Vec<TileId> {
    w.tile_ids().into_iter().filter(|&id| w.is_surface_owner(id)).collect()
}

#[test]
fn level_neighbors_share_one_surface_and_a_bridge() {
    let mut w = world();
    let a = w.register_tile(slab_at(0.0, 0.0, 0.0));
    let b = w.register_tile(slab_at(2.3, 0.0, 0.0));
    w.flush();

    let keys: Vec<&str> = w.connectors(a).unwrap().keys().collect();
    assert_eq!(keys, vec!["2:wx:1.15:-1.00:1.00"]);
    assert!(w.connectors(b).unwrap().is_empty());

    assert_eq!(owners(&w), vec![a]);
    assert_eq!(w.meshes().count_kind(MeshKind::ClusterSurface), 1);
    assert!(w.surface_mesh(a).is_some());
    assert!(w.surface_mesh(b).is_none());

    // The merged surface covers both tiles
    let bounds = w.surface_mesh(a).unwrap().build.bounds().unwrap();
    assert!(bounds.min.x <= -1.0 && bounds.max.x >= 3.3);
}

#[test]
fn height_step_keeps_tiles_apart() {
    let mut w = world();
    let a = w.register_tile(slab_at(0.0, 0.0, 0.0));
    let b = w.register_tile(slab_at(2.3, 5.0, 0.0));
    w.flush();

    assert!(w.connectors(a).unwrap().is_empty());
    assert!(w.adjacent_tiles(a).is_empty());
    assert_eq!(owners(&w), vec![a, b]);
    assert_eq!(w.meshes().count_kind(MeshKind::ClusterSurface), 2);
}

#[test]
fn removing_the_middle_tile_splits_the_row() {
    let mut w = world();
    let ids: Vec<TileId> = [0.0, 2.3, 4.6].iter().map(|&x| w.register_tile(slab_at(x, 0.0, 0.0))).collect();
    w.flush();
    assert_eq!(w.scan_cluster(ids[2], None).members, ids);
    assert_eq!(owners(&w), vec![ids[0]]);

    assert!(w.unregister_tile(ids[1]));
    assert!(!w.unregister_tile(ids[1]));
    w.flush();

    assert_eq!(owners(&w), vec![ids[0], ids[2]]);
    assert_eq!(w.meshes().count_kind(MeshKind::ClusterSurface), 2);
    assert!(w.connectors(ids[0]).unwrap().is_empty());
    assert!(w.index().cell_of(ids[1]).is_none());

    let refresh = w.drain_terrain_refresh();
    assert_eq!(refresh.len(), 1);
    assert!((refresh[0].center.x - 2.3).abs() < 1e-4);
    assert!((refresh[0].radius - 5.0).abs() < 1e-4);
    assert!(w.drain_terrain_refresh().is_empty());
}

#[test]
fn immersion_respects_the_allowance_above_the_surface() {
    let mut w = world();
    w.register_tile(slab_at(0.0, 0.0, 0.0));
    assert_eq!(w.is_point_immersed(Vec3::new(0.0, 0.5, 0.0)), Some(0.0));
    assert_eq!(w.is_point_immersed(Vec3::new(0.0, 1.5, 0.0)), None);
    assert_eq!(w.is_point_immersed(Vec3::new(0.0, -3.0, 0.0)), Some(0.0));
    assert_eq!(w.is_point_immersed(Vec3::new(0.0, -3.5, 0.0)), None);
    assert_eq!(w.is_point_immersed(Vec3::new(1.5, 0.0, 0.0)), None);
}

#[test]
fn bridge_collider_counts_as_water() {
    let mut w = world();
    w.register_tile(slab_at(0.0, 0.0, 0.0));
    w.register_tile(slab_at(2.3, 0.0, 0.0));
    let in_gap = Vec3::new(1.15, 0.0, 0.5);
    assert_eq!(w.is_point_immersed(in_gap), None);
    w.flush();
    assert_eq!(w.is_point_immersed(in_gap), Some(0.0));
}

#[test]
fn lenient_lookup_reaches_past_the_footprint() {
    let mut w = world();
    w.register_tile(slab_at(0.0, 2.0, 0.0));
    assert_eq!(w.try_get_surface_height_at(Vec3::new(1.8, 1.0, 0.0)), Some(2.0));
    assert_eq!(w.try_get_surface_height_at(Vec3::new(2.5, 1.0, 0.0)), None);
    assert_eq!(w.try_get_surface_height_at(Vec3::new(0.0, -1.5, 0.0)), None);

    let ground = |_x: f32, _z: f32| Some(0.5_f32);
    let depth = w.water_depth_at(0.0, 0.0, &ground).unwrap();
    assert!((depth - 1.5).abs() < 1e-5);
    let no_ground = |_x: f32, _z: f32| -> Option<f32> { None };
    assert_eq!(w.water_depth_at(0.0, 0.0, &no_ground), None);
}

#[test]
fn moving_a_tile_rebuilds_after_the_debounce() {
    let mut w = world();
    let a = w.register_tile(slab_at(0.0, 0.0, 0.0));
    let b = w.register_tile(slab_at(2.3, 0.0, 0.0));
    w.flush();
    assert_eq!(w.connectors(a).unwrap().len(), 1);

    w.set_pose(b, Pose::at(12.0, 0.0, 0.0)).unwrap();
    w.tick(0.1);
    // Not refreshed yet: the old footprint is still in effect
    assert_eq!(w.connectors(a).unwrap().len(), 1);

    for _ in 0..8 {
        w.tick(0.25);
    }
    assert!(w.connectors(a).unwrap().is_empty());
    assert_eq!(owners(&w), vec![a, b]);
    assert!((w.tile(b).unwrap().bounds().center().x - 12.0).abs() < 1e-4);
    assert!(w.tile(a).unwrap().rebuild_state().is_idle());
}

#[test]
fn ticks_build_a_fresh_tile_without_flush() {
    let mut w = world();
    let a = w.register_tile(slab_at(0.0, 0.0, 0.0));
    w.register_tile(slab_at(0.0, 0.0, 2.3));
    assert!(w.surface_mesh(a).is_none());
    for _ in 0..4 {
        w.tick(0.2);
    }
    assert_eq!(w.connectors(a).unwrap().len(), 1);
    assert!(w.surface_mesh(a).is_some());
    assert!((w.clock() - 0.8).abs() < 1e-6);
}

#[test]
fn unknown_ids_are_reported() {
    let mut w = world();
    let err = w.set_pose(TileId(42), Pose::default()).unwrap_err();
    assert_eq!(err, TileError::UnknownTile(TileId(42)));
    assert!(w.cluster_size(TileId(42), 10).is_err());
    assert!(w.rebuild_connectors_now(TileId(42)).is_err());
}

#[test]
fn per_tile_surfaces_when_clusters_are_off() {
    let mut cfg = WaterConfig {
        surface_padding: 0.0,
        ..WaterConfig::default()
    };
    cfg.features.cluster_surfaces = false;
    let mut w = WaterWorld::new(cfg);
    let a = w.register_tile(slab_at(0.0, 0.0, 0.0));
    let b = w.register_tile(slab_at(2.3, 0.0, 0.0));
    w.flush();

    assert_eq!(owners(&w), vec![a, b]);
    assert_eq!(w.meshes().count_kind(MeshKind::TileSurface), 2);
    let set = w.connectors(a).unwrap();
    assert_eq!(set.len(), 1);
    let bridge = set.iter().next().unwrap();
    assert!(bridge.visual && bridge.key.ends_with(":h"));
    assert_eq!(w.meshes().count_kind(MeshKind::Bridge), 1);

    // Each quad is padded across the gap toward the neighbor
    let sa = w.surface_mesh(a).unwrap().build.bounds().unwrap();
    assert!(sa.max.x > 1.25);
}

#[test]
fn cascades_join_stepped_tiles_when_enabled() {
    let mut cfg = WaterConfig {
        surface_padding: 0.0,
        ..WaterConfig::default()
    };
    cfg.features.cluster_surfaces = false;
    cfg.features.cascades = true;
    let mut w = WaterWorld::new(cfg);
    let a = w.register_tile(slab_at(0.0, 1.0, 0.0));
    w.register_tile(slab_at(2.2, 0.0, 0.0));
    w.flush();
    let set = w.connectors(a).unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.iter().next().unwrap().kind, ConnectorKind::Cascade);
    assert_eq!(w.meshes().count_kind(MeshKind::Cascade), 1);
}

#[test]
fn toggling_modes_swaps_surface_kinds() {
    let mut w = world();
    w.register_tile(slab_at(0.0, 0.0, 0.0));
    w.register_tile(slab_at(2.3, 0.0, 0.0));
    w.flush();
    assert_eq!(w.meshes().count_kind(MeshKind::ClusterSurface), 1);

    let mut cfg = w.config().clone();
    cfg.features.cluster_surfaces = false;
    w.set_config(cfg);
    w.flush();
    assert_eq!(w.meshes().count_kind(MeshKind::ClusterSurface), 0);
    assert_eq!(w.meshes().count_kind(MeshKind::TileSurface), 2);
}

#[test]
fn disabling_water_releases_everything_built() {
    let mut w = world();
    let a = w.register_tile(slab_at(0.0, 0.0, 0.0));
    w.register_tile(slab_at(2.3, 0.0, 0.0));
    w.flush();

    let cfg = WaterConfig {
        enabled: false,
        ..w.config().clone()
    };
    w.set_config(cfg);
    w.flush();
    assert!(w.meshes().is_empty());
    assert!(w.connectors(a).unwrap().is_empty());
    assert_eq!(w.is_point_immersed(Vec3::new(0.0, 0.0, 0.0)), None);
}

#[test]
fn config_changes_reach_existing_tiles() {
    let mut w = world();
    let a = w.register_tile(slab_at(0.0, 0.0, 0.0));
    w.flush();
    let cfg = WaterConfig {
        water_depth: 8.0,
        surface_offset: 0.5,
        ..w.config().clone()
    };
    w.set_config(cfg);
    let t = w.tile(a).unwrap();
    assert!((t.volume().depth_below - 8.0).abs() < 1e-5);
    assert!((t.surface_y() - 0.5).abs() < 1e-5);
    assert!(!t.rebuild_state().is_idle());
}

#[test]
fn support_limit_caps_the_fill() {
    let mut w = world();
    for i in 0..101 {
        w.register_tile(slab_at(i as f32 * 2.3, 0.0, 0.0));
    }
    let first = TileId(1);
    assert!(!w.has_support(first).unwrap());
    w.unregister_tile(TileId(101));
    // The cached saturated count is younger than the cache lifetime
    assert!(!w.has_support(first).unwrap());
    w.tick(1.0);
    assert!(w.has_support(first).unwrap());
}

#[test]
fn cluster_size_rescans_when_a_saturated_cache_is_too_small() {
    let mut w = world();
    for i in 0..10 {
        w.register_tile(slab_at(i as f32 * 2.3, 0.0, 0.0));
    }
    let c = w.cluster_size(TileId(1), 5).unwrap();
    assert_eq!((c.count, c.saturated), (5, true));
    let c = w.cluster_size(TileId(1), 20).unwrap();
    assert_eq!((c.count, c.saturated), (10, false));
    let c = w.cluster_size(TileId(1), 0).unwrap();
    assert_eq!(c.count, 0);
}

#[test]
fn liquid_tracker_reports_transitions() {
    let mut w = world();
    w.register_tile(slab_at(0.0, 0.0, 0.0));
    let mut tracker = LiquidTracker::new();
    let inside = Vec3::new(0.0, -0.5, 0.0);
    assert_eq!(tracker.update(&w, 0.1, inside), None);
    assert_eq!(tracker.update(&w, 0.2, inside), Some(LiquidChange::Entered { surface_y: 0.0 }));
    assert_eq!(tracker.update(&w, 0.3, inside), None);
    assert_eq!(tracker.current(), Some(0.0));
    assert_eq!(tracker.update(&w, 0.3, Vec3::new(0.0, 5.0, 0.0)), Some(LiquidChange::Exited));
    assert_eq!(tracker.current(), None);
}

#[test]
fn highlight_follows_build_mode() {
    let mut w = world();
    let a = w.register_tile(slab_at(0.0, 0.0, 0.0));
    let near = Observer {
        position: Vec3::new(2.0, 1.0, 0.0),
        build_mode: true,
        hovered: None,
    };
    w.update_highlights(0.05, &near);
    assert!(!w.highlight_visible(a));
    w.update_highlights(0.06, &near);
    assert!(w.highlight_visible(a));
    let outline = w.highlight_mesh(a).unwrap();
    assert_eq!(outline.kind, MeshKind::Outline);
    assert_eq!(w.meshes().count_kind(MeshKind::Outline), 1);

    let away = Observer {
        build_mode: false,
        ..near
    };
    w.update_highlights(0.2, &away);
    assert!(!w.highlight_visible(a));
    assert!(w.highlight_mesh(a).is_none());

    w.unregister_tile(a);
    assert_eq!(w.meshes().count_kind(MeshKind::Outline), 0);
}

#[test]
fn higher_bridge_wins_over_the_tile_it_overlaps() {
    let mut w = world();
    w.register_tile(slab_at(0.0, 0.2, 0.0));
    w.register_tile(slab_at(2.3, 0.0, 0.0));
    w.flush();
    // Inside the second tile's footprint and inside the bridge collider
    let p = Vec3::new(1.32, 0.1, 0.0);
    let s = w.is_point_immersed(p).unwrap();
    assert!((s - 0.1).abs() < 1e-5, "surface {}", s);
}

#[test]
fn cascade_surface_wins_over_the_lower_tile() {
    let mut cfg = WaterConfig {
        surface_padding: 0.0,
        ..WaterConfig::default()
    };
    cfg.features.cluster_surfaces = false;
    cfg.features.cascades = true;
    let mut w = WaterWorld::new(cfg);
    let a = w.register_tile(slab_at(0.0, 1.0, 0.0));
    w.register_tile(slab_at(2.1, 0.0, 0.0));
    w.flush();
    assert_eq!(w.connectors(a).unwrap().iter().next().unwrap().kind, ConnectorKind::Cascade);
    // Just past the lower tile's edge: inside its volume and the cascade wall
    assert_eq!(w.is_point_immersed(Vec3::new(1.12, 0.5, 0.0)), Some(1.0));
    assert_eq!(w.is_point_immersed(Vec3::new(2.5, 0.5, 0.0)), Some(0.0));
}

/// Vertex count and bounds of the merged surface for a row of level tiles.
fn cluster_mesh(curtains: bool, xs: &[f32]) -> (usize, Aabb) {
    let mut cfg = WaterConfig {
        surface_padding: 0.0,
        ..WaterConfig::default()
    };
    cfg.features.cluster_curtains = curtains;
    let mut w = WaterWorld::new(cfg);
    let first = xs.iter().map(|&x| w.register_tile(slab_at(x, 0.0, 0.0))).min().unwrap();
    w.flush();
    let mesh = w.surface_mesh(first).unwrap();
    (mesh.build.vertex_count(), mesh.build.bounds().unwrap())
}

// One double-sided ribbon of six segments
const RIBBON_VERTS: usize = 2 * 2 * 7;

#[test]
fn lone_tile_hangs_curtains_on_every_edge() {
    let (flat, _) = cluster_mesh(false, &[0.0]);
    let (curtained, bounds) = cluster_mesh(true, &[0.0]);
    // Four edges plus four corner patches
    assert_eq!(curtained - flat, 8 * RIBBON_VERTS);
    let bottom = -WaterConfig::default().curtain_min_depth;
    assert!((bounds.min.y - bottom).abs() < 1e-4, "min y {}", bounds.min.y);
    assert!(bounds.min.x < -1.0 && bounds.max.x > 1.0);
}

#[test]
fn level_neighbors_leave_the_shared_edge_open() {
    let (flat, _) = cluster_mesh(false, &[0.0, 2.3]);
    let (curtained, _) = cluster_mesh(true, &[0.0, 2.3]);
    // Three open edges and the two outer corners on each tile
    assert_eq!(curtained - flat, 10 * RIBBON_VERTS);
}

#[test]
fn depth_under_takes_the_deepest_corner() {
    let mut w = world();
    let a = w.register_tile(slab_at(0.0, 2.0, 0.0));
    let slope = |x: f32, _z: f32| Some(1.0 + 0.2 * x);
    let footprint = w.tile(a).unwrap().bounds();
    let depth = w.water_depth_under(&footprint, &slope).unwrap();
    assert!((depth - 1.2).abs() < 1e-4, "depth {}", depth);
    let no_ground = |_x: f32, _z: f32| -> Option<f32> { None };
    assert_eq!(w.water_depth_under(&footprint, &no_ground), None);
}

#[test]
fn degenerate_tile_still_gets_a_full_outline() {
    let mut w = world();
    let a = w.register_tile(TileSpec::slab(Pose::at(0.0, 0.0, 0.0), Vec3::ZERO));
    let hover = Observer {
        position: Vec3::ZERO,
        build_mode: true,
        hovered: Some(a),
    };
    w.update_highlights(0.2, &hover);
    let outline = w.highlight_mesh(a).unwrap().build.bounds().unwrap();
    assert!(outline.size().x > 1.9 && outline.size().z > 1.9, "outline {:?}", outline.size());
}
