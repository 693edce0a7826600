use serde::Serialize;

use crate::clustering::cluster;
use crate::marker::{Marker, Position};

/// What the front end draws for one cluster group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClusterView {
    Single {
        marker: Marker,
    },
    Group {
        id: String,
        x: f64,
        y: f64,
        count: usize,
        members: Vec<Marker>,
    },
}

impl ClusterView {
    pub fn member_count(&self) -> usize {
        match self {
            ClusterView::Single { .. } => 1,
            ClusterView::Group { count, .. } => *count,
        }
    }
}

/// Turns cluster groups into render views. Groups must be non-empty.
pub fn build_views(groups: &[Vec<&Marker>]) -> Vec<ClusterView> {
    groups.iter().filter_map(|group| view_for_group(group)).collect()
}

/// Clusters `markers` and builds views in one step.
pub fn cluster_views(markers: &[Marker], threshold: f64) -> Vec<ClusterView> {
    build_views(&cluster(markers, threshold))
}

fn view_for_group(group: &[&Marker]) -> Option<ClusterView> {
    match group {
        [] => None,
        [single] => Some(ClusterView::Single {
            marker: (*single).clone(),
        }),
        [anchor, ..] => {
            let center = centroid(group);
            Some(ClusterView::Group {
                id: format!("cluster-{}", anchor.id),
                x: center.x,
                y: center.y,
                count: group.len(),
                members: group.iter().map(|m| (*m).clone()).collect(),
            })
        }
    }
}

fn centroid(group: &[&Marker]) -> Position {
    let n = group.len() as f64;
    let (sx, sy) = group
        .iter()
        .fold((0.0, 0.0), |(sx, sy), m| (sx + m.position.x, sy + m.position.y));
    Position::new(sx / n, sy / n)
}
