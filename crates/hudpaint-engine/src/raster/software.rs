use crate::coords::PixelRect;
use crate::surface::Bitmap;

use super::{Mesh, MeshPaint, MeshVertex, RasterParams, Rasterizer};

/// Sample grid edge length when antialiasing (4×4 = 16 samples per pixel).
const GRID: u32 = 4;

/// CPU reference rasterizer.
///
/// Coverage per pixel is the union of the samples hit by any triangle, so
/// overlapping triangles of one mesh (stroke joins, shared fill edges) blend
/// exactly once.
#[derive(Debug, Default)]
pub struct SoftwareRasterizer {
    scratch: Scratch,
}

#[derive(Debug, Default)]
struct Scratch {
    masks: Vec<u16>,
    colors: Vec<[f32; 4]>,
}

impl Scratch {
    fn reset(&mut self, len: usize) {
        self.masks.clear();
        self.masks.resize(len, 0);
        self.colors.clear();
        self.colors.resize(len, [0.0; 4]);
    }
}

impl SoftwareRasterizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Rasterizer for SoftwareRasterizer {
    fn name(&self) -> &'static str {
        "software"
    }

    fn draw_mesh(
        &mut self,
        target: &mut Bitmap,
        region: PixelRect,
        mesh: &Mesh,
        paint: &MeshPaint,
        params: &RasterParams,
    ) {
        if mesh.is_empty() {
            return;
        }
        let Some(clipped) = region.intersect(target.bounds()) else {
            return;
        };
        // Mesh coordinates stay relative to the requested region's origin.
        let shift = (
            (clipped.x as i64 - region.x as i64) as f32,
            (clipped.y as i64 - region.y as i64) as f32,
        );
        let region = clipped;

        let offsets = sample_offsets(params.antialias);
        let w = region.width as usize;
        let h = region.height as usize;
        self.scratch.reset(w * h);

        for tri in mesh.indices.chunks_exact(3) {
            let (Some(a), Some(b), Some(c)) = (
                mesh.vertices.get(tri[0] as usize),
                mesh.vertices.get(tri[1] as usize),
                mesh.vertices.get(tri[2] as usize),
            ) else {
                continue;
            };
            cover_triangle(&mut self.scratch, w, h, shift, [a, b, c], &offsets);
        }

        let samples = offsets.len() as f32;
        for y in 0..h {
            for x in 0..w {
                let i = y * w + x;
                let mask = self.scratch.masks[i];
                if mask == 0 {
                    continue;
                }
                let hits = mask.count_ones() as f32;
                let coverage = hits / samples;
                let vertex_color = self.scratch.colors[i].map(|c| c / hits);

                let px = (region.x as i64 + x as i64) as u32;
                let py = (region.y as i64 + y as i64) as u32;

                let src = match paint {
                    MeshPaint::VertexColor => vertex_color,
                    MeshPaint::Texture { image, origin } => {
                        let t = image.texel(
                            px as i64 - origin.0 as i64,
                            py as i64 - origin.1 as i64,
                        );
                        modulate(t, vertex_color)
                    }
                };

                let dst = target.premul_at(px, py);
                target.store_premul(px, py, params.operator.composite(src, dst, coverage));
            }
        }
    }
}

fn sample_offsets(antialias: bool) -> Vec<(f32, f32)> {
    if !antialias {
        return vec![(0.5, 0.5)];
    }
    let step = 1.0 / GRID as f32;
    (0..GRID)
        .flat_map(|sy| {
            (0..GRID).map(move |sx| ((sx as f32 + 0.5) * step, (sy as f32 + 0.5) * step))
        })
        .collect()
}

#[inline]
fn edge(a: [f32; 2], b: [f32; 2], p: (f32, f32)) -> f32 {
    (b[0] - a[0]) * (p.1 - a[1]) - (b[1] - a[1]) * (p.0 - a[0])
}

#[inline]
fn modulate(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    [a[0] * b[0], a[1] * b[1], a[2] * b[2], a[3] * b[3]]
}

fn cover_triangle(
    scratch: &mut Scratch,
    w: usize,
    h: usize,
    shift: (f32, f32),
    [a, b, c]: [&MeshVertex; 3],
    offsets: &[(f32, f32)],
) {
    let local = |v: &MeshVertex| [v.pos[0] - shift.0, v.pos[1] - shift.1];
    let (pa, pb, pc) = (local(a), local(b), local(c));
    if !pa.iter().chain(&pb).chain(&pc).all(|v| v.is_finite()) {
        return;
    }
    let area = edge(pa, pb, (pc[0], pc[1]));
    if area.abs() < f32::EPSILON {
        return;
    }

    let min_x = pa[0].min(pb[0]).min(pc[0]).floor().max(0.0) as usize;
    let min_y = pa[1].min(pb[1]).min(pc[1]).floor().max(0.0) as usize;
    let max_x = (pa[0].max(pb[0]).max(pc[0]).ceil().max(0.0) as usize).min(w);
    let max_y = (pa[1].max(pb[1]).max(pc[1]).ceil().max(0.0) as usize).min(h);

    for y in min_y..max_y {
        for x in min_x..max_x {
            let i = y * w + x;
            let mut newly = 0u16;
            let mut color = [0.0f32; 4];
            for (s, &(ox, oy)) in offsets.iter().enumerate() {
                let bit = 1u16 << s;
                if scratch.masks[i] & bit != 0 {
                    continue;
                }
                let p = (x as f32 + ox, y as f32 + oy);
                let w0 = edge(pb, pc, p) / area;
                let w1 = edge(pc, pa, p) / area;
                let w2 = edge(pa, pb, p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                newly |= bit;
                for k in 0..4 {
                    color[k] += a.color[k] * w0 + b.color[k] * w1 + c.color[k] * w2;
                }
            }
            if newly != 0 {
                scratch.masks[i] |= newly;
                let acc = &mut scratch.colors[i];
                for k in 0..4 {
                    acc[k] += color[k];
                }
            }
        }
    }
}
