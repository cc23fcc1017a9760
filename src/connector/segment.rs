use tracing::{debug, error};

use crate::error::{Result, TopologyError};
use crate::math::polygon_2d;
use crate::math::{Containment, Near, Point2, Segment2};

use super::{ClusterId, Connector};

/// An outer loop together with the loops nested directly inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopBoundary {
    pub outer: Vec<Point2>,
    pub inners: Vec<Vec<Point2>>,
}

impl Connector<Segment2> {
    /// Segments of a cluster in walk order, each oriented along the walk.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::EntityNotFound` for a foreign id.
    pub fn segments(&self, cluster: ClusterId) -> Result<Vec<Segment2>> {
        let c = self.cluster(cluster)?;
        c.nodes()
            .iter()
            .enumerate()
            .map(|(k, &id)| {
                let seg = *self.node(id)?.fragment();
                Ok(if c.is_forward(k) { seg } else { seg.reversed() })
            })
            .collect()
    }

    /// Merges runs of consecutive segments running in the same direction.
    ///
    /// Returns the merged segments and, for each, the walk position of the
    /// last node of its run. In a loop, a run that wraps past the last node
    /// is absorbed into the first merged segment.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::EntityNotFound` for a foreign id.
    pub fn regularized_segments(&self, cluster: ClusterId) -> Result<(Vec<Segment2>, Vec<usize>)> {
        let segs = self.segments(cluster)?;
        let n = segs.len();
        if n == 0 {
            return Ok((Vec::new(), Vec::new()));
        }

        let mut tail = n;
        if self.cluster(cluster)?.is_circular() {
            while tail > 1 && same_direction(&segs[tail - 1], &segs[0]) {
                tail -= 1;
            }
        }
        let first_start = if tail < n { segs[tail].p0 } else { segs[0].p0 };

        let mut merged = Vec::new();
        let mut end_indices = Vec::new();
        let mut i = 0;
        while i < tail {
            let mut j = i;
            while j + 1 < tail && same_direction(&segs[j + 1], &segs[i]) {
                j += 1;
            }
            let start = if i == 0 { first_start } else { segs[i].p0 };
            merged.push(Segment2::new(start, segs[j].p1));
            end_indices.push(j);
            i = j + 1;
        }
        Ok((merged, end_indices))
    }

    /// Polygon vertices of a chain of segments. A closed chain gives one
    /// vertex per segment; an open chain also keeps its last endpoint.
    #[must_use]
    pub fn vertices_from_segments(segments: &[Segment2], circular: bool) -> Vec<Point2> {
        let mut vertices: Vec<Point2> = segments.iter().map(|s| s.p0).collect();
        if !circular {
            if let Some(last) = segments.last() {
                vertices.push(last.p1);
            }
        }
        vertices
    }

    /// Regularized vertex loop of a circular cluster.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::OpenLoop` if the cluster is not circular.
    pub fn loop_vertices(&self, cluster: ClusterId) -> Result<Vec<Point2>> {
        if !self.cluster(cluster)?.is_circular() {
            return Err(TopologyError::OpenLoop.into());
        }
        let (segments, _) = self.regularized_segments(cluster)?;
        Ok(Self::vertices_from_segments(&segments, true))
    }

    /// Records which loops nest inside which.
    ///
    /// A loop inside an odd number of other loops is an inner loop of the
    /// smallest of them; every other loop is an outer loop.
    ///
    /// # Errors
    ///
    /// Returns a topology error if a cluster cannot be read.
    pub fn identify_loops(&mut self) -> Result<()> {
        let mut loops = Vec::new();
        for &id in self.cluster_ids() {
            let c = self.cluster(id)?;
            if c.is_circular() && c.nodes().len() > 2 {
                let vertices = self.loop_vertices(id)?;
                let area = polygon_2d::signed_area(&vertices).abs();
                loops.push((id, vertices, area));
            }
        }
        for id in self.cluster_order.clone() {
            let c = self.cluster_mut(id)?;
            c.outer_loop = None;
            c.inner_loops.clear();
        }

        let mut nested = 0;
        for (a, (id, vertices, _)) in loops.iter().enumerate() {
            let containers: Vec<usize> = (0..loops.len())
                .filter(|&b| b != a && loop_inside(vertices, &loops[b].1))
                .collect();
            if containers.len() % 2 == 0 {
                continue;
            }
            let smallest = containers
                .iter()
                .copied()
                .min_by(|&x, &y| loops[x].2.total_cmp(&loops[y].2));
            if let Some(outer) = smallest {
                self.set_outer_loop(*id, loops[outer].0)?;
                nested += 1;
            }
        }
        debug!(loops = loops.len(), nested, "loops identified");
        Ok(())
    }

    /// Records `outer` as the loop containing `inner`.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::InvalidTopology` if `inner` already has an
    /// outer loop or is `outer` itself.
    pub fn set_outer_loop(&mut self, inner: ClusterId, outer: ClusterId) -> Result<()> {
        if inner == outer || self.cluster(inner)?.outer_loop.is_some() {
            error!("outer loop assigned twice");
            return Err(TopologyError::InvalidTopology("outer loop already set".into()).into());
        }
        self.cluster(outer)?;
        self.cluster_mut(inner)?.outer_loop = Some(outer);
        self.cluster_mut(outer)?.inner_loops.push(inner);
        Ok(())
    }

    /// A closed loop of more than two segments that nests in no other loop.
    #[must_use]
    pub fn is_outer_loop(&self, cluster: ClusterId) -> bool {
        self.cluster(cluster)
            .is_ok_and(|c| c.is_circular() && c.nodes().len() > 2 && c.outer_loop().is_none())
    }

    #[must_use]
    pub fn is_inner_loop(&self, cluster: ClusterId) -> bool {
        self.cluster(cluster).is_ok_and(|c| c.outer_loop().is_some())
    }

    #[must_use]
    pub fn outer_loops(&self) -> Vec<ClusterId> {
        self.cluster_ids()
            .iter()
            .copied()
            .filter(|&id| self.is_outer_loop(id))
            .collect()
    }

    /// Vertex loops of every outer loop with its inner loops.
    ///
    /// # Errors
    ///
    /// Returns a topology error if a loop cannot be read.
    pub fn outer_loop_boundaries(&self) -> Result<Vec<LoopBoundary>> {
        self.outer_loops()
            .into_iter()
            .map(|id| {
                let outer = self.loop_vertices(id)?;
                let inners = self
                    .cluster(id)?
                    .inner_loops()
                    .iter()
                    .map(|&inner| self.loop_vertices(inner))
                    .collect::<Result<Vec<_>>>()?;
                Ok(LoopBoundary { outer, inners })
            })
            .collect()
    }
}

fn same_direction(a: &Segment2, b: &Segment2) -> bool {
    match (a.direction(), b.direction()) {
        (Ok(da), Ok(db)) => da.near(&db),
        _ => false,
    }
}

/// Whether loop `a` lies inside loop `b`, judged by the first vertex or edge
/// midpoint of `a` that is not on `b`.
fn loop_inside(a: &[Point2], b: &[Point2]) -> bool {
    let midpoints = polygon_2d::edges(a).map(|e| e.midpoint());
    for p in a.iter().copied().chain(midpoints) {
        match polygon_2d::containment(&p, b) {
            Containment::In => return true,
            Containment::Out => return false,
            Containment::On => {}
        }
    }
    false
}
