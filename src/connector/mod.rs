//! Reassembly of loose fragments into chains and loops.
//!
//! A [`Connector`] owns one node per fragment. Each node exposes a fixed
//! number of ports (segment endpoints, triangle edges); ports of different
//! nodes whose geometry coincides are connected. Connected components become
//! clusters, which can then be ordered into open chains or closed loops.
//!
//! A connector is built, queried and discarded within one regularization
//! step; nothing in it is persisted.

pub mod segment;
pub mod triangle;

use std::collections::VecDeque;

use slotmap::{new_key_type, SlotMap};
use tracing::{error, trace};

use crate::error::{Result, TopologyError};
use crate::math::{Near, Point2, Segment2, Triangle2};

pub use segment::LoopBoundary;
pub use triangle::NonRegularTriangleConnector;

new_key_type! {
    /// Handle of a node within its connector.
    pub struct NodeId;
    /// Handle of a cluster within its connector.
    pub struct ClusterId;
}

/// Port geometry that can be matched against another port.
pub trait Coincident {
    fn coincides_with(&self, other: &Self) -> bool;
}

impl Coincident for Point2 {
    fn coincides_with(&self, other: &Self) -> bool {
        self.near(other)
    }
}

impl Coincident for Segment2 {
    fn coincides_with(&self, other: &Self) -> bool {
        Segment2::coincides_with(self, other)
    }
}

/// A piece of geometry that a connector can link by its ports.
pub trait Fragment {
    type Port: Coincident;

    fn port_count(&self) -> usize;

    /// Geometry of port `port`.
    fn endpoint(&self, port: usize) -> Self::Port;
}

impl Fragment for Segment2 {
    type Port = Point2;

    fn port_count(&self) -> usize {
        2
    }

    fn endpoint(&self, port: usize) -> Point2 {
        if port == 0 {
            self.p0
        } else {
            self.p1
        }
    }
}

impl Fragment for Triangle2 {
    type Port = Segment2;

    fn port_count(&self) -> usize {
        3
    }

    fn endpoint(&self, port: usize) -> Segment2 {
        self.edge(port)
    }
}

/// The far side of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRef {
    pub node: NodeId,
    pub port: usize,
}

/// One fragment and its port connections.
#[derive(Debug, Clone)]
pub struct Node<F> {
    fragment: F,
    index: usize,
    cluster: Option<ClusterId>,
    ports: Vec<Option<PortRef>>,
}

impl<F> Node<F> {
    #[must_use]
    pub fn fragment(&self) -> &F {
        &self.fragment
    }

    /// Position of the node in insertion order, used to map a node back to
    /// the facet it was built from.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn cluster(&self) -> Option<ClusterId> {
        self.cluster
    }

    #[must_use]
    pub fn port(&self, port: usize) -> Option<PortRef> {
        self.ports.get(port).copied().flatten()
    }

    /// Number of connected ports.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.ports.iter().filter(|p| p.is_some()).count()
    }
}

/// Result of ordering a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterShape {
    Unsorted,
    /// An open chain with two free ends.
    Sequential,
    /// A closed loop.
    Circular,
}

/// A maximal set of connected nodes.
///
/// Loop nesting is a relation between clusters of the same connector:
/// `outer_loop` and `inner_loops` hold handles, not ownership.
#[derive(Debug, Clone)]
pub struct Cluster {
    nodes: Vec<NodeId>,
    forward: Vec<bool>,
    shape: ClusterShape,
    outer_loop: Option<ClusterId>,
    inner_loops: Vec<ClusterId>,
}

impl Cluster {
    fn new(nodes: Vec<NodeId>) -> Self {
        Self {
            nodes,
            forward: Vec::new(),
            shape: ClusterShape::Unsorted,
            outer_loop: None,
            inner_loops: Vec::new(),
        }
    }

    /// Nodes in discovery order, or in walk order once sorted.
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    #[must_use]
    pub fn shape(&self) -> ClusterShape {
        self.shape
    }

    #[must_use]
    pub fn is_circular(&self) -> bool {
        self.shape == ClusterShape::Circular
    }

    /// Whether the `k`-th node of a sorted cluster is walked from port 0 to
    /// port 1.
    #[must_use]
    pub fn is_forward(&self, k: usize) -> bool {
        self.forward.get(k).copied().unwrap_or(true)
    }

    #[must_use]
    pub fn outer_loop(&self) -> Option<ClusterId> {
        self.outer_loop
    }

    #[must_use]
    pub fn inner_loops(&self) -> &[ClusterId] {
        &self.inner_loops
    }
}

/// Graph of fragments connected at coincident ports.
#[derive(Debug, Clone)]
pub struct Connector<F: Fragment> {
    nodes: SlotMap<NodeId, Node<F>>,
    node_order: Vec<NodeId>,
    clusters: SlotMap<ClusterId, Cluster>,
    cluster_order: Vec<ClusterId>,
}

impl<F: Fragment> Default for Connector<F> {
    fn default() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            node_order: Vec::new(),
            clusters: SlotMap::with_key(),
            cluster_order: Vec::new(),
        }
    }
}

impl<F: Fragment> Connector<F> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a fragment with all ports free.
    pub fn add_node(&mut self, fragment: F) -> NodeId {
        let ports = vec![None; fragment.port_count()];
        let index = self.node_order.len();
        let id = self.nodes.insert(Node {
            fragment,
            index,
            cluster: None,
            ports,
        });
        self.node_order.push(id);
        id
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_order.len()
    }

    /// Node ids in insertion order.
    #[must_use]
    pub fn node_ids(&self) -> &[NodeId] {
        &self.node_order
    }

    /// # Errors
    ///
    /// Returns `TopologyError::EntityNotFound` for a foreign id.
    pub fn node(&self, id: NodeId) -> Result<&Node<F>> {
        self.nodes
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("connector node".into()).into())
    }

    /// Cluster ids in discovery order.
    #[must_use]
    pub fn cluster_ids(&self) -> &[ClusterId] {
        &self.cluster_order
    }

    /// # Errors
    ///
    /// Returns `TopologyError::EntityNotFound` for a foreign id.
    pub fn cluster(&self, id: ClusterId) -> Result<&Cluster> {
        self.clusters
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("connector cluster".into()).into())
    }

    fn cluster_mut(&mut self, id: ClusterId) -> Result<&mut Cluster> {
        self.clusters
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("connector cluster".into()).into())
    }

    /// Fragments of a cluster in its node order.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::EntityNotFound` for a foreign id.
    pub fn fragments(&self, cluster: ClusterId) -> Result<Vec<&F>> {
        self.cluster(cluster)?
            .nodes
            .iter()
            .map(|&id| self.node(id).map(Node::fragment))
            .collect()
    }

    /// Connects every pair of coincident ports.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::AmbiguousConnection` if a port coincides with
    /// more than one other port.
    pub fn connect(&mut self) -> Result<()> {
        self.connect_where(|_, _, _, _| true)
    }

    /// Connects coincident ports for which `accept(a, port_a, b, port_b)`
    /// holds. Existing connections are discarded first.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::AmbiguousConnection` if an accepted port
    /// coincides with more than one other port.
    pub fn connect_where<P>(&mut self, accept: P) -> Result<()>
    where
        P: Fn(&F, usize, &F, usize) -> bool,
    {
        let mut links = Vec::new();
        for (i, &a) in self.node_order.iter().enumerate() {
            let node_a = &self.nodes[a];
            for port_a in 0..node_a.ports.len() {
                let end_a = node_a.fragment.endpoint(port_a);
                for &b in &self.node_order[i + 1..] {
                    let node_b = &self.nodes[b];
                    for port_b in 0..node_b.ports.len() {
                        if end_a.coincides_with(&node_b.fragment.endpoint(port_b))
                            && accept(&node_a.fragment, port_a, &node_b.fragment, port_b)
                        {
                            links.push((
                                PortRef { node: a, port: port_a },
                                PortRef { node: b, port: port_b },
                            ));
                        }
                    }
                }
            }
        }

        for node in self.nodes.values_mut() {
            node.ports.fill(None);
        }
        let link_count = links.len();
        for (x, y) in links {
            for (from, to) in [(x, y), (y, x)] {
                let node = &mut self.nodes[from.node];
                if node.ports[from.port].is_some() {
                    error!(
                        node = node.index,
                        port = from.port,
                        "port matches more than one partner"
                    );
                    return Err(TopologyError::AmbiguousConnection {
                        node: node.index,
                        port: from.port,
                    }
                    .into());
                }
                node.ports[from.port] = Some(to);
            }
        }
        trace!(nodes = self.node_order.len(), links = link_count, "connector linked");
        Ok(())
    }

    /// Groups nodes into connected components, each a new unsorted cluster.
    pub fn identify_clusters(&mut self) {
        self.clusters.clear();
        self.cluster_order.clear();
        for node in self.nodes.values_mut() {
            node.cluster = None;
        }

        for i in 0..self.node_order.len() {
            let seed = self.node_order[i];
            if self.nodes[seed].cluster.is_some() {
                continue;
            }
            let cluster = self.clusters.insert(Cluster::new(Vec::new()));
            let mut members = Vec::new();
            let mut queue = VecDeque::from([seed]);
            self.nodes[seed].cluster = Some(cluster);
            while let Some(id) = queue.pop_front() {
                members.push(id);
                let neighbors: Vec<NodeId> =
                    self.nodes[id].ports.iter().flatten().map(|p| p.node).collect();
                for next in neighbors {
                    let node = &mut self.nodes[next];
                    if node.cluster.is_none() {
                        node.cluster = Some(cluster);
                        queue.push_back(next);
                    }
                }
            }
            self.clusters[cluster].nodes = members;
            self.cluster_order.push(cluster);
        }
    }

    /// Orders the nodes of every two-port cluster into a walk.
    ///
    /// Open chains start at a free end; closed loops start at their first
    /// discovered node. Clusters of other fragments stay unsorted.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::InvalidTopology` if a walk does not visit
    /// every node of its cluster exactly once.
    pub fn sort_clusters(&mut self) -> Result<()> {
        for k in 0..self.cluster_order.len() {
            let id = self.cluster_order[k];
            let members = self.cluster(id)?.nodes.clone();
            if members.is_empty() || members.iter().any(|&n| self.nodes[n].ports.len() != 2) {
                continue;
            }
            let (walk, forward, shape) = self.walk(&members)?;
            let cluster = self.cluster_mut(id)?;
            cluster.nodes = walk;
            cluster.forward = forward;
            cluster.shape = shape;
        }
        Ok(())
    }

    fn walk(&self, members: &[NodeId]) -> Result<(Vec<NodeId>, Vec<bool>, ClusterShape)> {
        let start = members[0];
        let limit = members.len();
        let overrun = || -> crate::error::GeofacetError {
            error!(nodes = limit, "cluster walk does not close");
            TopologyError::InvalidTopology("cluster walk visits a node twice".into()).into()
        };

        let mut walk = vec![start];
        let mut forward = vec![true];
        let mut current = start;
        let mut out_port = 1;
        let mut shape = ClusterShape::Sequential;
        while let Some(next) = self.nodes[current].ports[out_port] {
            if next.node == start {
                shape = ClusterShape::Circular;
                break;
            }
            if walk.len() >= limit {
                return Err(overrun());
            }
            walk.push(next.node);
            forward.push(next.port == 0);
            current = next.node;
            out_port = 1 - next.port;
        }

        if shape == ClusterShape::Sequential {
            let mut prefix = Vec::new();
            let mut prefix_forward = Vec::new();
            current = start;
            out_port = 0;
            while let Some(prev) = self.nodes[current].ports[out_port] {
                if walk.len() + prefix.len() >= limit {
                    return Err(overrun());
                }
                prefix.push(prev.node);
                prefix_forward.push(prev.port == 1);
                current = prev.node;
                out_port = 1 - prev.port;
            }
            prefix.reverse();
            prefix_forward.reverse();
            prefix.extend(walk);
            prefix_forward.extend(forward);
            walk = prefix;
            forward = prefix_forward;
        }

        if walk.len() != limit {
            error!(walked = walk.len(), nodes = limit, "cluster walk is incomplete");
            let reason = "cluster is not a simple chain".to_owned();
            return Err(TopologyError::InvalidTopology(reason).into());
        }
        Ok((walk, forward, shape))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn s(x0: f64, y0: f64, x1: f64, y1: f64) -> Segment2 {
        Segment2::new(Point2::new(x0, y0), Point2::new(x1, y1))
    }

    #[test]
    fn open_chain_is_sorted_from_its_free_end() {
        let mut c = Connector::new();
        c.add_node(s(1.0, 0.0, 2.0, 0.0));
        c.add_node(s(2.0, 0.0, 3.0, 0.0));
        c.add_node(s(0.0, 0.0, 1.0, 0.0));
        c.connect().unwrap();
        c.identify_clusters();
        c.sort_clusters().unwrap();
        assert_eq!(c.cluster_ids().len(), 1);
        let id = c.cluster_ids()[0];
        let cluster = c.cluster(id).unwrap();
        assert_eq!(cluster.shape(), ClusterShape::Sequential);
        let order: Vec<usize> =
            cluster.nodes().iter().map(|&n| c.node(n).unwrap().index()).collect();
        assert_eq!(order, vec![2, 0, 1]);
    }

    #[test]
    fn closed_loop_is_circular() {
        let mut c = Connector::new();
        c.add_node(s(0.0, 0.0, 1.0, 0.0));
        c.add_node(s(1.0, 1.0, 0.0, 0.0));
        c.add_node(s(1.0, 0.0, 1.0, 1.0));
        c.connect().unwrap();
        c.identify_clusters();
        c.sort_clusters().unwrap();
        let cluster = c.cluster(c.cluster_ids()[0]).unwrap();
        assert!(cluster.is_circular());
        assert_eq!(cluster.nodes().len(), 3);
        assert!((0..3).all(|k| cluster.is_forward(k)));
    }

    #[test]
    fn reversed_fragment_is_walked_backward() {
        let mut c = Connector::new();
        c.add_node(s(0.0, 0.0, 1.0, 0.0));
        c.add_node(s(2.0, 0.0, 1.0, 0.0));
        c.connect().unwrap();
        c.identify_clusters();
        c.sort_clusters().unwrap();
        let cluster = c.cluster(c.cluster_ids()[0]).unwrap();
        assert!(cluster.is_forward(0));
        assert!(!cluster.is_forward(1));
    }

    #[test]
    fn disjoint_fragments_form_separate_clusters() {
        let mut c = Connector::new();
        c.add_node(s(0.0, 0.0, 1.0, 0.0));
        c.add_node(s(5.0, 0.0, 6.0, 0.0));
        c.connect().unwrap();
        c.identify_clusters();
        assert_eq!(c.cluster_ids().len(), 2);
        for &id in c.node_ids() {
            assert_eq!(c.node(id).unwrap().degree(), 0);
        }
    }

    #[test]
    fn three_way_junction_is_ambiguous() {
        let mut c = Connector::new();
        c.add_node(s(0.0, 0.0, 1.0, 0.0));
        c.add_node(s(1.0, 0.0, 2.0, 0.0));
        c.add_node(s(1.0, 0.0, 1.0, 1.0));
        let err = c.connect().unwrap_err();
        assert!(matches!(
            err,
            crate::error::GeofacetError::Topology(TopologyError::AmbiguousConnection { .. })
        ));
    }

    #[test]
    fn triangles_connect_on_shared_edges() {
        let a = Triangle2::new(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(1.0, 1.0));
        let b = Triangle2::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), Point2::new(0.0, 1.0));
        let far =
            Triangle2::new(Point2::new(5.0, 0.0), Point2::new(6.0, 0.0), Point2::new(6.0, 1.0));
        let mut c = Connector::new();
        let na = c.add_node(a);
        c.add_node(b);
        c.add_node(far);
        c.connect().unwrap();
        c.identify_clusters();
        c.sort_clusters().unwrap();
        assert_eq!(c.cluster_ids().len(), 2);
        assert_eq!(c.node(na).unwrap().degree(), 1);
        assert_eq!(c.cluster(c.cluster_ids()[0]).unwrap().shape(), ClusterShape::Unsorted);
    }
}
