use tracing::warn;

use crate::error::{Result, TopologyError};
use crate::math::{Segment2, Triangle2};

use super::{Cluster, ClusterId, Connector, Fragment, Node, NodeId};

impl Connector<Triangle2> {
    /// Boundary of a cluster of triangles as a fully prepared segment
    /// connector: connected, clustered, sorted and with loops identified.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::OpenLoop` if the unshared edges do not form
    /// closed loops, or `TopologyError::AmbiguousConnection` if loops touch.
    pub fn extract_boundary(&self, cluster: ClusterId) -> Result<Connector<Segment2>> {
        self.boundary_of(cluster, false)
    }

    fn boundary_of(
        &self,
        cluster: ClusterId,
        remove_duplicates: bool,
    ) -> Result<Connector<Segment2>> {
        let mut edges = Vec::new();
        for &id in self.cluster(cluster)?.nodes() {
            let node = self.node(id)?;
            for port in 0..node.fragment().port_count() {
                if node.port(port).is_none() {
                    edges.push(node.fragment().endpoint(port));
                }
            }
        }
        if remove_duplicates {
            let kept: Vec<Segment2> = edges
                .iter()
                .enumerate()
                .filter(|&(i, e)| {
                    !edges
                        .iter()
                        .enumerate()
                        .any(|(j, other)| i != j && e.coincides_with(other))
                })
                .map(|(_, e)| *e)
                .collect();
            edges = kept;
        }

        let mut boundary = Connector::new();
        for edge in edges {
            boundary.add_node(edge);
        }
        boundary.connect()?;
        boundary.identify_clusters();
        boundary.sort_clusters()?;
        for &id in boundary.cluster_ids() {
            let c = boundary.cluster(id)?;
            if !c.is_circular() || c.nodes().len() <= 2 {
                warn!(segments = c.nodes().len(), "triangle group boundary is not closed");
                return Err(TopologyError::OpenLoop.into());
            }
        }
        boundary.identify_loops()?;
        Ok(boundary)
    }
}

/// A triangle connector that keeps declared seams as boundaries.
///
/// Triangles are not connected across edges lying on an internal boundary
/// segment. Seam edges that end up on both sides of one cluster are dropped
/// from its boundary.
#[derive(Debug, Clone)]
pub struct NonRegularTriangleConnector {
    connector: Connector<Triangle2>,
    internal_boundaries: Vec<Segment2>,
}

impl NonRegularTriangleConnector {
    #[must_use]
    pub fn new(internal_boundaries: Vec<Segment2>) -> Self {
        Self {
            connector: Connector::new(),
            internal_boundaries,
        }
    }

    pub fn add_node(&mut self, triangle: Triangle2) -> NodeId {
        self.connector.add_node(triangle)
    }

    /// Connects shared edges that do not lie on an internal boundary.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::AmbiguousConnection` if an edge is shared by
    /// more than two triangles.
    pub fn connect(&mut self) -> Result<()> {
        let boundaries = &self.internal_boundaries;
        self.connector.connect_where(|a, port, _, _| {
            let edge = a.edge(port);
            !boundaries
                .iter()
                .any(|b| b.contains(&edge.p0) && b.contains(&edge.p1))
        })
    }

    pub fn identify_clusters(&mut self) {
        self.connector.identify_clusters();
    }

    #[must_use]
    pub fn cluster_ids(&self) -> &[ClusterId] {
        self.connector.cluster_ids()
    }

    /// # Errors
    ///
    /// Returns `TopologyError::EntityNotFound` for a foreign id.
    pub fn cluster(&self, id: ClusterId) -> Result<&Cluster> {
        self.connector.cluster(id)
    }

    /// # Errors
    ///
    /// Returns `TopologyError::EntityNotFound` for a foreign id.
    pub fn node(&self, id: NodeId) -> Result<&Node<Triangle2>> {
        self.connector.node(id)
    }

    /// Boundary loops of a cluster, without seam edges seen from both sides.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::OpenLoop` if the boundary is not closed.
    pub fn extract_boundary(&self, cluster: ClusterId) -> Result<Connector<Segment2>> {
        self.connector.boundary_of(cluster, true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    /// Unit grid squares split along their diagonals.
    fn grid_triangles(cells: &[(f64, f64)]) -> Vec<Triangle2> {
        cells
            .iter()
            .flat_map(|&(x, y)| {
                [
                    Triangle2::new(p(x, y), p(x + 1.0, y), p(x + 1.0, y + 1.0)),
                    Triangle2::new(p(x, y), p(x + 1.0, y + 1.0), p(x, y + 1.0)),
                ]
            })
            .collect()
    }

    #[test]
    fn boundary_of_a_square_is_one_loop() {
        let mut c = Connector::new();
        for t in grid_triangles(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]) {
            c.add_node(t);
        }
        c.connect().unwrap();
        c.identify_clusters();
        assert_eq!(c.cluster_ids().len(), 1);
        let boundary = c.extract_boundary(c.cluster_ids()[0]).unwrap();
        let outer = boundary.outer_loops();
        assert_eq!(outer.len(), 1);
        assert_eq!(boundary.loop_vertices(outer[0]).unwrap().len(), 4);
    }

    #[test]
    fn ring_boundary_has_a_hole() {
        let cells: Vec<(f64, f64)> = (0..3)
            .flat_map(|i| (0..3).map(move |j| (f64::from(i), f64::from(j))))
            .filter(|&(x, y)| !(x == 1.0 && y == 1.0))
            .collect();
        let mut c = Connector::new();
        for t in grid_triangles(&cells) {
            c.add_node(t);
        }
        c.connect().unwrap();
        c.identify_clusters();
        let boundary = c.extract_boundary(c.cluster_ids()[0]).unwrap();
        let loops = boundary.outer_loop_boundaries().unwrap();
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].outer.len(), 4);
        assert_eq!(loops[0].inners.len(), 1);
        assert_eq!(loops[0].inners[0].len(), 4);
    }

    #[test]
    fn seam_splits_the_group() {
        let seam = Segment2::new(p(1.0, 0.0), p(1.0, 1.0));
        let mut c = NonRegularTriangleConnector::new(vec![seam]);
        for t in grid_triangles(&[(0.0, 0.0), (1.0, 0.0)]) {
            c.add_node(t);
        }
        c.connect().unwrap();
        c.identify_clusters();
        assert_eq!(c.cluster_ids().len(), 2);
        for &id in c.cluster_ids() {
            let boundary = c.extract_boundary(id).unwrap();
            assert_eq!(boundary.outer_loops().len(), 1);
        }
    }

    #[test]
    fn dangling_seam_is_dropped_from_the_boundary() {
        // The seam runs from the middle of the square's left side to its
        // center; triangles on both sides of it stay in one cluster.
        let seam = Segment2::new(p(0.0, 1.0), p(1.0, 1.0));
        let mut c = NonRegularTriangleConnector::new(vec![seam]);
        let center = p(1.0, 1.0);
        let ring = [p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0), p(0.0, 2.0), p(0.0, 1.0)];
        for i in 0..ring.len() {
            c.add_node(Triangle2::new(ring[i], ring[(i + 1) % ring.len()], center));
        }
        c.connect().unwrap();
        c.identify_clusters();
        assert_eq!(c.cluster_ids().len(), 1);
        let boundary = c.extract_boundary(c.cluster_ids()[0]).unwrap();
        let outer = boundary.outer_loops();
        assert_eq!(outer.len(), 1);
        assert_eq!(boundary.loop_vertices(outer[0]).unwrap().len(), 4);
    }
}
