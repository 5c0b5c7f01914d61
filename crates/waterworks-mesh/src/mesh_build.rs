use waterworks_geom::{Aabb, Vec3, rotate_yaw};

/// CPU-side triangle buffers for one generated mesh.
#[derive(Default, Clone, Debug)]
pub struct MeshBuild {
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
    pub uv: Vec<f32>,
    pub idx: Vec<u32>,
}

impl MeshBuild {
    /// Clears all arrays but retains capacity for reuse across rebuilds.
    #[inline]
    pub fn clear_keep_capacity(&mut self) {
        self.pos.clear();
        self.norm.clear();
        self.uv.clear();
        self.idx.clear();
    }

    /// Pre-reserve capacity for approximately `n_quads` quads worth of data.
    #[inline]
    pub fn reserve_quads(&mut self, n_quads: usize) {
        // 4 vertices per quad
        self.pos.reserve(n_quads * 4 * 3);
        self.norm.reserve(n_quads * 4 * 3);
        self.uv.reserve(n_quads * 4 * 2);
        self.idx.reserve(n_quads * 6);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.idx.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idx.is_empty()
    }

    #[inline]
    pub fn vertex(&self, i: usize) -> Vec3 {
        Vec3::new(self.pos[i * 3], self.pos[i * 3 + 1], self.pos[i * 3 + 2])
    }

    #[inline]
    pub fn normal(&self, i: usize) -> Vec3 {
        Vec3::new(self.norm[i * 3], self.norm[i * 3 + 1], self.norm[i * 3 + 2])
    }

    /// Appends one vertex and returns its index.
    #[inline]
    pub fn push_vertex(&mut self, p: Vec3, n: Vec3, uv: (f32, f32)) -> u32 {
        let i = self.vertex_count() as u32;
        self.pos.extend_from_slice(&[p.x, p.y, p.z]);
        self.norm.extend_from_slice(&[n.x, n.y, n.z]);
        self.uv.extend_from_slice(&[uv.0, uv.1]);
        i
    }

    /// Appends a triangle wound so its geometric normal points along `n`.
    pub fn push_tri_facing(&mut self, a: u32, b: u32, c: u32, n: Vec3) {
        let (pa, pb, pc) = (
            self.vertex(a as usize),
            self.vertex(b as usize),
            self.vertex(c as usize),
        );
        if (pb - pa).cross(pc - pa).dot(n) < 0.0 {
            self.idx.extend_from_slice(&[a, c, b]);
        } else {
            self.idx.extend_from_slice(&[a, b, c]);
        }
    }

    /// Appends a quad with explicit per-vertex UVs; corners go around the perimeter.
    pub fn add_quad_uv(
        &mut self,
        a: Vec3,
        b: Vec3,
        c: Vec3,
        d: Vec3,
        n: Vec3,
        mut uvs: [(f32, f32); 4],
    ) {
        let base = self.vertex_count() as u32;
        let mut vs = [a, d, c, b];
        let cross = (vs[1] - vs[0]).cross(vs[2] - vs[0]);
        if cross.dot(n) < 0.0 {
            vs.swap(1, 3);
            uvs.swap(1, 3);
        }
        for i in 0..4 {
            self.push_vertex(vs[i], n, uvs[i]);
        }
        self.idx
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Same quad twice: once facing `n`, once facing `-n`.
    pub fn add_double_sided_quad_uv(
        &mut self,
        a: Vec3,
        b: Vec3,
        c: Vec3,
        d: Vec3,
        n: Vec3,
        uvs: [(f32, f32); 4],
    ) {
        self.add_quad_uv(a, b, c, d, n, uvs);
        self.add_quad_uv(a, b, c, d, -n, uvs);
    }

    /// Appends a strip of vertex pairs (one pair per row) facing `n`.
    pub fn add_strip(&mut self, rows: &[(Vec3, Vec3)], uvs: &[((f32, f32), (f32, f32))], n: Vec3) {
        self.add_strip_with_normal(rows, uvs, n, n);
    }

    /// Like `add_strip`, but shades with `shade_n` while winding toward `face_n`.
    pub fn add_strip_with_normal(
        &mut self,
        rows: &[(Vec3, Vec3)],
        uvs: &[((f32, f32), (f32, f32))],
        face_n: Vec3,
        shade_n: Vec3,
    ) {
        if rows.len() < 2 {
            return;
        }
        let base = self.vertex_count() as u32;
        for (i, &(l, r)) in rows.iter().enumerate() {
            let (ul, ur) = uvs.get(i).copied().unwrap_or(((0.0, 0.0), (1.0, 0.0)));
            self.push_vertex(l, shade_n, ul);
            self.push_vertex(r, shade_n, ur);
        }
        for row in 0..rows.len() as u32 - 1 {
            let l0 = base + row * 2;
            let r0 = l0 + 1;
            let l1 = l0 + 2;
            let r1 = l0 + 3;
            self.push_tri_facing(l0, r0, r1, face_n);
            self.push_tri_facing(l0, r1, l1, face_n);
        }
    }

    /// Rotates positions and normals by `yaw_deg`, then moves positions by `offset`.
    pub fn transform_yaw_translate(&mut self, yaw_deg: f32, offset: Vec3) {
        for p in self.pos.chunks_exact_mut(3) {
            let v = rotate_yaw(Vec3::new(p[0], p[1], p[2]), yaw_deg) + offset;
            p.copy_from_slice(&[v.x, v.y, v.z]);
        }
        if yaw_deg != 0.0 {
            for n in self.norm.chunks_exact_mut(3) {
                let v = rotate_yaw(Vec3::new(n[0], n[1], n[2]), yaw_deg);
                n.copy_from_slice(&[v.x, v.y, v.z]);
            }
        }
    }

    /// Tight bounds of all vertices, `None` for an empty build.
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points((0..self.vertex_count()).map(|i| self.vertex(i)))
    }
}
