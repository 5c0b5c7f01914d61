//! Drives a `WaterWorld` through a scenario and reports what it built.

use waterworks_tiles::{
    LiquidChange, LiquidTracker, MeshKind, Observer, Pose, TileId, WaterConfig, WaterWorld,
};

use crate::scenario::{Scenario, vec3};
use crate::terrain::NoiseTerrain;

pub struct Sim {
    pub world: WaterWorld,
    scenario: Scenario,
    /// Ids in scenario file order.
    ids: Vec<TileId>,
    terrain: NoiseTerrain,
    trackers: Vec<LiquidTracker>,
    next_move: usize,
    next_removal: usize,
}

impl Sim {
    pub fn new(config: WaterConfig, mut scenario: Scenario) -> Self {
        let mut world = WaterWorld::new(config);
        let ids = scenario.tiles.iter().map(|t| world.register_tile(t.spec())).collect();
        scenario.moves.sort_by(|a, b| a.at.total_cmp(&b.at));
        scenario.removals.sort_by(|a, b| a.at.total_cmp(&b.at));
        let terrain = NoiseTerrain::new(&scenario.terrain);
        let trackers = scenario.probes.iter().map(|_| LiquidTracker::new()).collect();
        log::info!("scenario loaded: {} tiles, {} probes", world.len(), scenario.probes.len());
        Self {
            world,
            scenario,
            ids,
            terrain,
            trackers,
            next_move: 0,
            next_removal: 0,
        }
    }

    fn apply_due_edits(&mut self) {
        let clock = self.world.clock();
        while let Some(m) = self.scenario.moves.get(self.next_move).filter(|m| m.at <= clock) {
            let id = self.ids[m.tile - 1];
            let yaw = m.yaw.or_else(|| self.world.tile(id).map(|t| t.pose().yaw_deg)).unwrap_or(0.0);
            if let Err(e) = self.world.set_pose(id, Pose::new(vec3(m.pos), yaw)) {
                log::warn!("move skipped: {}", e);
            }
            self.next_move += 1;
        }
        while let Some(r) = self.scenario.removals.get(self.next_removal).filter(|r| r.at <= clock) {
            let id = self.ids[r.tile - 1];
            if !self.world.unregister_tile(id) {
                log::warn!("tile {} already removed", id);
            }
            self.next_removal += 1;
        }
    }

    pub fn step(&mut self, dt: f32) {
        self.apply_due_edits();
        self.world.tick(dt);
        if let Some(o) = &self.scenario.observer {
            let observer = Observer {
                position: vec3(o.pos),
                build_mode: o.build_mode,
                hovered: None,
            };
            self.world.update_highlights(dt, &observer);
        }
        for refresh in self.world.drain_terrain_refresh() {
            log::info!(
                "terrain refresh around ({:.1}, {:.1}) radius {:.1}",
                refresh.center.x,
                refresh.center.z,
                refresh.radius
            );
        }
        for (probe, tracker) in self.scenario.probes.iter().zip(self.trackers.iter_mut()) {
            match tracker.update(&self.world, dt, vec3(probe.pos)) {
                Some(LiquidChange::Entered { surface_y }) => {
                    log::info!("{} entered water (surface {:.2})", probe.name, surface_y)
                }
                Some(LiquidChange::SurfaceMoved { surface_y }) => {
                    log::info!("{} surface now {:.2}", probe.name, surface_y)
                }
                Some(LiquidChange::Exited) => log::info!("{} left the water", probe.name),
                None => {}
            }
        }
    }

    pub fn reload_config(&mut self, config: WaterConfig) {
        self.world.set_config(config);
    }

    pub fn report(&self) -> String {
        let stats = self.world.stats();
        let meshes = self.world.meshes();
        let mut out = format!(
            "t={:.2}s tiles={} cells={} owners={} connectors={} meshes={} (cluster {}, tile {}, bridge {}, cascade {}, outline {})\n",
            self.world.clock(),
            stats.tiles,
            stats.cells,
            stats.surface_owners,
            stats.connectors,
            stats.meshes,
            meshes.count_kind(MeshKind::ClusterSurface),
            meshes.count_kind(MeshKind::TileSurface),
            meshes.count_kind(MeshKind::Bridge),
            meshes.count_kind(MeshKind::Cascade),
            meshes.count_kind(MeshKind::Outline),
        );
        for id in self.world.tile_ids() {
            let Some(tile) = self.world.tile(id) else {
                continue;
            };
            let scan = self.world.scan_cluster(id, None);
            let under = self.world.water_depth_under(&tile.bounds(), &self.terrain);
            out.push_str(&format!(
                "  tile {:>3} surface {:>6.2} cluster {:>3} owner {} depth under {} connectors [{}]\n",
                id,
                tile.surface_y(),
                scan.members.len(),
                if tile.is_surface_owner() { "yes" } else { "no " },
                under.map_or("-".to_owned(), |d| format!("{:.2}", d)),
                tile.connectors().keys().collect::<Vec<_>>().join(", ")
            ));
        }
        for probe in &self.scenario.probes {
            let p = vec3(probe.pos);
            let immersed = self.world.is_point_immersed(p);
            let depth = self.world.water_depth_at(p.x, p.z, &self.terrain);
            out.push_str(&format!(
                "  probe {:<10} immersed {:<8} depth over ground {}\n",
                probe.name,
                immersed.map_or("no".to_owned(), |s| format!("{:.2}", s)),
                depth.map_or("-".to_owned(), |d| format!("{:.2}", d)),
            ));
        }
        out
    }
}
