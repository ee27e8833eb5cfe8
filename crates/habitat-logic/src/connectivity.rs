//! Connected footprint of a module instance.
//!
//! A module may span several cells. Before moving it as a group the editor
//! needs every cell of that instance reachable from the grabbed cell through
//! 4-connected neighbours.

use std::collections::{HashSet, VecDeque};

use crate::grid::{CellCoord, FloorGrid, InstanceId};

/// BFS flood fill from `start` over cells belonging to `target`.
///
/// Returns the cells sorted row-major, so the result does not depend on
/// which cell of the cluster the fill started from. Empty if `start` itself
/// does not belong to `target`.
pub fn connected_cells(start: CellCoord, target: InstanceId, floor: &FloorGrid) -> Vec<CellCoord> {
    let belongs = |c: CellCoord| floor.get(c).is_some_and(|d| d.instance == target);
    if !belongs(start) {
        return Vec::new();
    }

    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        for next in floor.neighbors(current) {
            if belongs(next) && visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    let mut cells: Vec<CellCoord> = visited.into_iter().collect();
    cells.sort_by_key(|c| (c.y, c.x));
    cells
}

/// Restrict a requested translation so the cluster's bounding box stays on
/// a `width × height` floor. An empty cluster is never moved.
pub fn clamp_offset(cluster: &[CellCoord], dx: i32, dy: i32, width: u32, height: u32) -> (i32, i32) {
    let (Some(min_x), Some(max_x)) = (
        cluster.iter().map(|c| c.x).min(),
        cluster.iter().map(|c| c.x).max(),
    ) else {
        return (0, 0);
    };
    let min_y = cluster.iter().map(|c| c.y).min().unwrap_or(0);
    let max_y = cluster.iter().map(|c| c.y).max().unwrap_or(0);

    (
        clamp_axis(dx, min_x, max_x, width),
        clamp_axis(dy, min_y, max_y, height),
    )
}

fn clamp_axis(delta: i32, min: u32, max: u32, extent: u32) -> i32 {
    let lowest = -(min as i64);
    let highest = extent as i64 - 1 - max as i64;
    if highest < lowest {
        // Cluster wider than the floor; leave it where it is.
        return 0;
    }
    (delta as i64).clamp(lowest, highest) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellData;
    use crate::module_type::ModuleType;

    fn floor_with(cells: &[(u32, u32, u32)]) -> FloorGrid {
        let mut floor = FloorGrid::new(1, 6, 6).unwrap();
        for &(id, x, y) in cells {
            floor
                .insert(
                    CellCoord::new(x, y),
                    CellData::new(InstanceId(id), ModuleType::Laboratory),
                )
                .unwrap();
        }
        floor
    }

    fn coords(cells: &[(u32, u32)]) -> Vec<CellCoord> {
        cells.iter().map(|&(x, y)| CellCoord::new(x, y)).collect()
    }

    #[test]
    fn test_l_shape_from_any_start() {
        // L: (1,1) (1,2) (1,3) (2,3), plus an unrelated neighbour.
        let floor = floor_with(&[(4, 1, 1), (4, 1, 2), (4, 1, 3), (4, 2, 3), (5, 2, 2)]);
        let expected = coords(&[(1, 1), (1, 2), (1, 3), (2, 3)]);
        for start in &expected {
            assert_eq!(connected_cells(*start, InstanceId(4), &floor), expected);
        }
    }

    #[test]
    fn test_diagonal_not_connected() {
        let floor = floor_with(&[(1, 0, 0), (1, 1, 1)]);
        assert_eq!(
            connected_cells(CellCoord::new(0, 0), InstanceId(1), &floor),
            coords(&[(0, 0)])
        );
    }

    #[test]
    fn test_start_not_in_instance() {
        let floor = floor_with(&[(1, 0, 0)]);
        assert!(connected_cells(CellCoord::new(0, 0), InstanceId(2), &floor).is_empty());
        assert!(connected_cells(CellCoord::new(3, 3), InstanceId(1), &floor).is_empty());
    }

    #[test]
    fn test_split_instance_only_reaches_own_part() {
        let floor = floor_with(&[(1, 0, 0), (1, 1, 0), (1, 4, 0)]);
        assert_eq!(
            connected_cells(CellCoord::new(4, 0), InstanceId(1), &floor),
            coords(&[(4, 0)])
        );
    }

    #[test]
    fn test_clamp_offset() {
        let cluster = coords(&[(1, 1), (2, 1), (2, 2)]);
        assert_eq!(clamp_offset(&cluster, 2, 1, 6, 6), (2, 1));
        assert_eq!(clamp_offset(&cluster, 10, 10, 6, 6), (3, 3));
        assert_eq!(clamp_offset(&cluster, -5, -5, 6, 6), (-1, -1));
        assert_eq!(clamp_offset(&[], 3, 3, 6, 6), (0, 0));
    }

    #[test]
    fn test_clamp_offset_cluster_wider_than_floor() {
        let cluster = coords(&[(0, 0), (7, 0)]);
        assert_eq!(clamp_offset(&cluster, 1, 0, 4, 4), (0, 0));
    }
}
