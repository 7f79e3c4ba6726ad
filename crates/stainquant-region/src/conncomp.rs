//! Connected component labelling
//!
//! Two-pass labelling of a 1 bpp mask with a union-find table of
//! provisional labels. Final labels run from 1 to k in the order in which
//! each component's first pixel appears in a row-major scan, so label
//! order is a deterministic function of the mask alone.

use crate::{RegionError, RegionResult};
use stainquant_core::{Box, Pix, PixelDepth};

/// Pixel adjacency used when joining foreground pixels into components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// Edge neighbours only
    Four,
    /// Edge and corner neighbours
    #[default]
    Eight,
}

/// A labelled connected component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Label in the [`LabelMap`], starting at 1
    pub label: u32,
    /// Number of pixels
    pub area: u64,
    /// Bounding box
    pub bounds: Box,
    /// First pixel of the component in row-major order
    pub first: (u32, u32),
}

/// Per-pixel component labels of a mask; 0 is background.
#[derive(Debug, Clone)]
pub struct LabelMap {
    width: u32,
    height: u32,
    labels: Vec<u32>,
    components: Vec<Component>,
}

impl LabelMap {
    /// Image width
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Label at (x, y), or 0 when out of bounds.
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> u32 {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return 0;
        }
        self.labels[(y as usize) * (self.width as usize) + x as usize]
    }

    /// Components in label order.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// True when the mask had no foreground pixel.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new() -> Self {
        // slot 0 is the background
        Self { parent: vec![0] }
    }

    fn make(&mut self) -> u32 {
        let id = self.parent.len() as u32;
        self.parent.push(id);
        id
    }

    fn find(&mut self, mut a: u32) -> u32 {
        let mut root = a;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        while self.parent[a as usize] != root {
            let next = self.parent[a as usize];
            self.parent[a as usize] = root;
            a = next;
        }
        root
    }

    fn union(&mut self, a: u32, b: u32) -> u32 {
        let (ra, rb) = (self.find(a), self.find(b));
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[hi as usize] = lo;
        lo
    }
}

/// Label the connected foreground components of a 1 bpp mask.
///
/// # Errors
///
/// Returns [`RegionError::UnsupportedDepth`] if `mask` is not 1 bpp.
pub fn label_components(mask: &Pix, connectivity: Connectivity) -> RegionResult<LabelMap> {
    if mask.depth() != PixelDepth::Bit1 {
        return Err(RegionError::UnsupportedDepth {
            expected: "1 bpp",
            actual: mask.depth().bits(),
        });
    }

    let w = mask.width() as usize;
    let h = mask.height() as usize;
    let mut labels = vec![0u32; w * h];
    let mut uf = UnionFind::new();

    // First pass: provisional labels from the already-visited neighbours
    for y in 0..h {
        for x in 0..w {
            if mask.get_pixel_unchecked(x as u32, y as u32) == 0 {
                continue;
            }
            let mut neighbours = [0u32; 4];
            if x > 0 {
                neighbours[0] = labels[y * w + x - 1];
            }
            if y > 0 {
                let up = (y - 1) * w;
                neighbours[1] = labels[up + x];
                if connectivity == Connectivity::Eight {
                    if x > 0 {
                        neighbours[2] = labels[up + x - 1];
                    }
                    if x + 1 < w {
                        neighbours[3] = labels[up + x + 1];
                    }
                }
            }

            let mut current = 0;
            for &n in neighbours.iter().filter(|&&n| n != 0) {
                current = if current == 0 { n } else { uf.union(current, n) };
            }
            labels[y * w + x] = if current == 0 { uf.make() } else { current };
        }
    }

    // Second pass: resolve roots and renumber in scan order
    let mut final_of_root = vec![0u32; uf.parent.len()];
    let mut components: Vec<Component> = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let provisional = labels[y * w + x];
            if provisional == 0 {
                continue;
            }
            let root = uf.find(provisional) as usize;
            if final_of_root[root] == 0 {
                let label = components.len() as u32 + 1;
                final_of_root[root] = label;
                components.push(Component {
                    label,
                    area: 0,
                    bounds: Box::default(),
                    first: (x as u32, y as u32),
                });
            }
            let label = final_of_root[root];
            labels[y * w + x] = label;
            let c = &mut components[label as usize - 1];
            c.area += 1;
            c.bounds.include_point(x as i32, y as i32);
        }
    }

    Ok(LabelMap {
        width: mask.width(),
        height: mask.height(),
        labels,
        components,
    })
}
