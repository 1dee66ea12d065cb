//! Multi-resolution cluster index using one R*-tree per zoom level.
//!
//! Points are projected to the Web-Mercator unit square. The level above
//! `max_zoom` holds the raw points; every lower level is derived from the one
//! above by greedily merging nodes whose centers lie within the cluster radius
//! at that zoom. A node also records the envelope of all the leaves it covers,
//! so a viewport query returns every node with at least one leaf in frame.
//!
//! The index is built at most once. Building is guarded by a
//! `once_cell::sync::OnceCell`, so repeated `build` calls are no-ops rather
//! than rebuilds.
//!
//! # Example
//!
//! ```rust
//! use cartography::spatial_index::{IndexEntry, SpatialIndex};
//! use cartography::{BoundingBox, ClusterOptions, GeoPoint, PointOfInterest};
//!
//! let index = SpatialIndex::new(ClusterOptions::default().with_radius(40.0)).unwrap();
//! index.build(vec![
//!     PointOfInterest::new(GeoPoint::new(45.7640, 4.8357).unwrap(), "lyon-1"),
//!     PointOfInterest::new(GeoPoint::new(45.7641, 4.8358).unwrap(), "lyon-2"),
//! ]);
//!
//! let france = BoundingBox::new(-5.0, 41.0, 10.0, 51.5);
//! let entries = index.query(&france, 5);
//! assert!(matches!(entries.as_slice(), [IndexEntry::Cluster(c)] if c.count == 2));
//! ```

use crate::compute::projection::{lat_y, lng_x, pixel_radius, x_lng, y_lat};
use crate::config::ClusterOptions;
use crate::error::{CartographyError, Result};
use crate::model::PointOfInterest;
use cartography_types::{BoundingBox, GeoPoint};
use once_cell::sync::OnceCell;
use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree, RTreeObject};
use serde::{Deserialize, Serialize};

/// Identifies a cluster by the zoom level that created it and its slot there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClusterId {
    zoom: u8,
    slot: u32,
}

impl ClusterId {
    /// Zoom level at which the cluster first appears.
    pub fn zoom(&self) -> u8 {
        self.zoom
    }
}

impl std::fmt::Display for ClusterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "z{}/{}", self.zoom, self.slot)
    }
}

/// Synthetic node standing for several nearby points.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterNode {
    pub id: ClusterId,
    /// Count-weighted center of the merged points
    pub position: GeoPoint,
    /// Number of leaves under this cluster
    pub count: usize,
}

/// What a viewport query yields: an individual point or a cluster of points.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexEntry<P> {
    Point(PointOfInterest<P>),
    Cluster(ClusterNode),
}

impl<P> IndexEntry<P> {
    /// Number of leaves this entry stands for.
    pub fn count(&self) -> usize {
        match self {
            Self::Point(_) => 1,
            Self::Cluster(cluster) => cluster.count,
        }
    }

    pub fn position(&self) -> &GeoPoint {
        match self {
            Self::Point(point) => point.position(),
            Self::Cluster(cluster) => &cluster.position,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum NodeKind {
    Leaf(usize),
    Cluster(ClusterId),
}

#[derive(Debug, Clone)]
struct Node {
    x: f64,
    y: f64,
    count: usize,
    position: GeoPoint,
    /// Projected envelope of every leaf under this node
    min: [f64; 2],
    max: [f64; 2],
    kind: NodeKind,
}

/// Leaf envelope of a node, for R*-tree indexing.
#[derive(Debug, Clone, PartialEq)]
struct NodeEnvelope {
    min: [f64; 2],
    max: [f64; 2],
    slot: usize,
}

impl RTreeObject for NodeEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

struct Level {
    nodes: Vec<Node>,
    /// Slots in the level above, for clusters created at this level
    children: Vec<Vec<usize>>,
    envelopes: RTree<NodeEnvelope>,
}

impl Level {
    fn new(nodes: Vec<Node>, children: Vec<Vec<usize>>) -> Self {
        let envelopes = RTree::bulk_load(
            nodes
                .iter()
                .enumerate()
                .map(|(slot, node)| NodeEnvelope {
                    min: node.min,
                    max: node.max,
                    slot,
                })
                .collect(),
        );
        Self {
            nodes,
            children,
            envelopes,
        }
    }
}

struct Levels<P> {
    points: Vec<PointOfInterest<P>>,
    /// Indexed by `zoom - min_zoom`, the last level holds the raw points
    levels: Vec<Level>,
}

/// Point clustering index queried by bounding box and zoom.
pub struct SpatialIndex<P> {
    options: ClusterOptions,
    built: OnceCell<Levels<P>>,
}

impl<P> SpatialIndex<P> {
    /// Create an empty, unbuilt index.
    ///
    /// Fails when `options` does not pass [`ClusterOptions::validate`].
    pub fn new(options: ClusterOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::with_validated(options))
    }

    /// Options must already have been validated.
    pub(crate) fn with_validated(options: ClusterOptions) -> Self {
        Self {
            options,
            built: OnceCell::new(),
        }
    }

    pub fn options(&self) -> &ClusterOptions {
        &self.options
    }

    pub fn is_built(&self) -> bool {
        self.built.get().is_some()
    }

    /// Number of indexed points, zero while unbuilt.
    pub fn len(&self) -> usize {
        self.built.get().map_or(0, |built| built.points.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build the index from `points`.
    ///
    /// Only the first call builds. Later calls leave the index untouched and
    /// return `false`.
    pub fn build(&self, points: Vec<PointOfInterest<P>>) -> bool {
        self.build_with(move || points)
    }

    /// Like [`build`](Self::build), but only produces the points when the
    /// index is actually going to be built.
    pub fn build_with<F>(&self, points: F) -> bool
    where
        F: FnOnce() -> Vec<PointOfInterest<P>>,
    {
        let mut built_now = false;
        self.built.get_or_init(|| {
            built_now = true;
            let points = points();
            let levels = build_levels(&points, &self.options);
            log::debug!(
                "Built cluster index over {} points, zoom {}..={}",
                points.len(),
                self.options.min_zoom,
                self.options.max_zoom
            );
            Levels { points, levels }
        });

        if !built_now {
            log::debug!("Cluster index already built, ignoring rebuild request");
        }
        built_now
    }

    fn level_for_zoom(&self, zoom: i32) -> Option<&Level> {
        let built = self.built.get()?;
        let min = i32::from(self.options.min_zoom);
        let max = i32::from(self.options.max_zoom) + 1;
        let idx = (zoom.clamp(min, max) - min) as usize;
        built.levels.get(idx)
    }

    /// Slots of nodes at `zoom` whose leaf envelope meets `bbox`, edges included.
    fn slots_in_frame(&self, bbox: &BoundingBox, zoom: i32) -> (Option<&Level>, Vec<usize>) {
        let Some(level) = self.level_for_zoom(zoom) else {
            return (None, Vec::new());
        };

        if !bbox.is_finite() {
            log::warn!("Rejecting cluster query with non-finite bounding box");
            return (Some(level), Vec::new());
        }

        let bbox = bbox.normalized();
        let mut slots = if bbox.crosses_antimeridian() {
            let mut slots = envelope_slots(level, bbox.west, bbox.south, 180.0, bbox.north);
            slots.extend(envelope_slots(level, -180.0, bbox.south, bbox.east, bbox.north));
            slots
        } else {
            envelope_slots(level, bbox.west, bbox.south, bbox.east, bbox.north)
        };

        slots.sort_unstable();
        slots.dedup();
        (Some(level), slots)
    }

    fn cluster_slot(&self, id: ClusterId) -> Result<(&Levels<P>, usize)> {
        let built = self
            .built
            .get()
            .ok_or(CartographyError::UnknownCluster(id))?;

        if id.zoom < self.options.min_zoom || id.zoom > self.options.max_zoom {
            return Err(CartographyError::UnknownCluster(id));
        }
        let idx = usize::from(id.zoom - self.options.min_zoom);
        let slot = id.slot as usize;

        match built.levels[idx].nodes.get(slot).map(|node| node.kind) {
            Some(NodeKind::Cluster(found)) if found == id => Ok((built, idx)),
            _ => Err(CartographyError::UnknownCluster(id)),
        }
    }

    /// Zoom level at which a cluster splits into its children.
    pub fn expansion_zoom(&self, id: ClusterId) -> Result<u8> {
        self.cluster_slot(id)?;
        Ok(id.zoom.saturating_add(1))
    }
}

impl<P: Clone> SpatialIndex<P> {
    /// Individual points and clusters visible in `bbox` at `zoom`.
    ///
    /// `zoom` is clamped to the index range. The result order is stable for a
    /// given index, box and zoom. An unbuilt index yields nothing.
    pub fn query(&self, bbox: &BoundingBox, zoom: i32) -> Vec<IndexEntry<P>> {
        let (level, slots) = self.slots_in_frame(bbox, zoom);
        let (Some(level), Some(built)) = (level, self.built.get()) else {
            return Vec::new();
        };

        slots
            .into_iter()
            .map(|slot| entry_for(built, &level.nodes[slot]))
            .collect()
    }

    /// Every leaf under a cluster, in the order the points were indexed.
    pub fn expand_cluster(&self, id: ClusterId) -> Result<Vec<PointOfInterest<P>>> {
        let (built, idx) = self.cluster_slot(id)?;

        let mut leaves = Vec::new();
        let mut pending: Vec<(usize, usize)> = built.levels[idx].children[id.slot as usize]
            .iter()
            .map(|&child| (idx + 1, child))
            .collect();

        while let Some((level_idx, slot)) = pending.pop() {
            match built.levels[level_idx].nodes[slot].kind {
                NodeKind::Leaf(point) => leaves.push(point),
                NodeKind::Cluster(child) => {
                    let child_idx = usize::from(child.zoom - self.options.min_zoom);
                    pending.extend(
                        built.levels[child_idx].children[child.slot as usize]
                            .iter()
                            .map(|&grandchild| (child_idx + 1, grandchild)),
                    );
                }
            }
        }

        leaves.sort_unstable();
        Ok(leaves
            .into_iter()
            .map(|point| built.points[point].clone())
            .collect())
    }

    /// The nodes a cluster splits into one zoom level further in.
    pub fn children(&self, id: ClusterId) -> Result<Vec<IndexEntry<P>>> {
        let (built, idx) = self.cluster_slot(id)?;
        let above = &built.levels[idx + 1];

        Ok(built.levels[idx].children[id.slot as usize]
            .iter()
            .map(|&slot| entry_for(built, &above.nodes[slot]))
            .collect())
    }
}

fn entry_for<P: Clone>(built: &Levels<P>, node: &Node) -> IndexEntry<P> {
    match node.kind {
        NodeKind::Leaf(point) => IndexEntry::Point(built.points[point].clone()),
        NodeKind::Cluster(id) => IndexEntry::Cluster(ClusterNode {
            id,
            position: node.position,
            count: node.count,
        }),
    }
}

fn envelope_slots(level: &Level, west: f64, south: f64, east: f64, north: f64) -> Vec<usize> {
    // y grows southward in projected space
    let envelope = AABB::from_corners([lng_x(west), lat_y(north)], [lng_x(east), lat_y(south)]);
    level
        .envelopes
        .locate_in_envelope_intersecting(&envelope)
        .map(|node| node.slot)
        .collect()
}

fn build_levels<P>(points: &[PointOfInterest<P>], options: &ClusterOptions) -> Vec<Level> {
    let leaves: Vec<Node> = points
        .iter()
        .enumerate()
        .map(|(idx, point)| {
            let position = *point.position();
            let x = lng_x(position.longitude());
            let y = lat_y(position.latitude());
            Node {
                x,
                y,
                count: 1,
                position,
                min: [x, y],
                max: [x, y],
                kind: NodeKind::Leaf(idx),
            }
        })
        .collect();

    let leaf_children = vec![Vec::new(); leaves.len()];
    let mut levels = vec![Level::new(leaves, leaf_children)];

    for zoom in (options.min_zoom..=options.max_zoom).rev() {
        let above = levels.last().map_or(&[][..], |level| level.nodes.as_slice());
        let (nodes, children) = cluster_level(above, zoom, options);
        levels.push(Level::new(nodes, children));
    }

    levels.reverse();
    levels
}

/// Derive the nodes of `zoom` from the nodes of `zoom + 1`.
fn cluster_level(
    above: &[Node],
    zoom: u8,
    options: &ClusterOptions,
) -> (Vec<Node>, Vec<Vec<usize>>) {
    let radius = pixel_radius(options.radius, options.extent, zoom);
    let centers: RTree<GeomWithData<[f64; 2], usize>> = RTree::bulk_load(
        above
            .iter()
            .enumerate()
            .map(|(slot, node)| GeomWithData::new([node.x, node.y], slot))
            .collect(),
    );

    let mut visited = vec![false; above.len()];
    let mut nodes = Vec::with_capacity(above.len());
    let mut children = Vec::with_capacity(above.len());

    for (slot, node) in above.iter().enumerate() {
        if visited[slot] {
            continue;
        }
        visited[slot] = true;

        let mut neighbors: Vec<usize> = centers
            .locate_within_distance([node.x, node.y], radius * radius)
            .map(|candidate| candidate.data)
            .filter(|&other| !visited[other])
            .collect();
        neighbors.sort_unstable();

        let total: usize = node.count + neighbors.iter().map(|&n| above[n].count).sum::<usize>();

        if neighbors.is_empty() || total < options.min_points {
            nodes.push(node.clone());
            children.push(Vec::new());
            for other in neighbors {
                visited[other] = true;
                nodes.push(above[other].clone());
                children.push(Vec::new());
            }
            continue;
        }

        let id = ClusterId {
            zoom,
            slot: nodes.len() as u32,
        };
        let members: Vec<usize> = std::iter::once(slot).chain(neighbors).collect();
        nodes.push(merge(above, &members, id));
        for &member in &members {
            visited[member] = true;
        }
        children.push(members);
    }

    (nodes, children)
}

fn merge(above: &[Node], members: &[usize], id: ClusterId) -> Node {
    let mut wx = 0.0;
    let mut wy = 0.0;
    let mut count = 0;
    let mut min = [f64::INFINITY; 2];
    let mut max = [f64::NEG_INFINITY; 2];

    for &member in members {
        let node = &above[member];
        wx += node.x * node.count as f64;
        wy += node.y * node.count as f64;
        count += node.count;
        min = [min[0].min(node.min[0]), min[1].min(node.min[1])];
        max = [max[0].max(node.max[0]), max[1].max(node.max[1])];
    }

    let x = wx / count as f64;
    let y = wy / count as f64;
    let position = GeoPoint::new(y_lat(y).clamp(-90.0, 90.0), x_lng(x).clamp(-180.0, 180.0))
        .unwrap_or(above[members[0]].position);

    Node {
        x,
        y,
        count,
        position,
        min,
        max,
        kind: NodeKind::Cluster(id),
    }
}
