use hashbrown::HashMap;
use waterworks_mesh::{MeshKind, SyntheticMesh};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u64);

/// Owns every mesh the water system generates. Meshes are replaced, never patched.
#[derive(Debug, Default)]
pub struct MeshStore {
    meshes: HashMap<MeshId, SyntheticMesh>,
    next: u64,
    inserted: u64,
    released: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshStoreStats {
    pub live: usize,
    pub inserted: u64,
    pub released: u64,
}

impl MeshStore {
    pub fn insert(&mut self, mesh: SyntheticMesh) -> MeshId {
        self.next += 1;
        let id = MeshId(self.next);
        self.meshes.insert(id, mesh);
        self.inserted += 1;
        id
    }

    pub fn release(&mut self, id: MeshId) -> Option<SyntheticMesh> {
        let out = self.meshes.remove(&id);
        if out.is_some() {
            self.released += 1;
        }
        out
    }

    /// Releases `old` (if any) and stores `mesh` under a new id.
    pub fn replace(&mut self, old: Option<MeshId>, mesh: SyntheticMesh) -> MeshId {
        if let Some(old) = old {
            self.release(old);
        }
        self.insert(mesh)
    }

    #[inline]
    pub fn get(&self, id: MeshId) -> Option<&SyntheticMesh> {
        self.meshes.get(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn count_kind(&self, kind: MeshKind) -> usize {
        self.meshes.values().filter(|m| m.kind == kind).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MeshId, &SyntheticMesh)> {
        self.meshes.iter().map(|(id, m)| (*id, m))
    }

    pub fn stats(&self) -> MeshStoreStats {
        MeshStoreStats {
            live: self.meshes.len(),
            inserted: self.inserted,
            released: self.released,
        }
    }
}
