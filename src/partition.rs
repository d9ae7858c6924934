//! Splitting a zoom level's tile columns across concurrent workers.

use std::ops::RangeInclusive;

use crate::tile::{tiles_per_axis, Tile};

/// Upper bound on workers per zoom level.
pub const MAX_WORKERS: u32 = 32;

/// The tiles a job should download.
///
/// A bound of `0` means "unbounded". Start bounds only apply on `zoom_start`,
/// end bounds only on `zoom_end`; every zoom level in between is downloaded in
/// full.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DownloadRange {
    pub zoom_start: u8,
    pub zoom_end: u8,
    pub x_start: u32,
    pub y_start: u32,
    pub x_end: u32,
    pub y_end: u32,
}

impl DownloadRange {
    /// A range covering every tile of the given zoom levels.
    pub fn full(zoom_start: u8, zoom_end: u8) -> Self {
        Self {
            zoom_start,
            zoom_end,
            ..Self::default()
        }
    }

    pub fn zooms(&self) -> RangeInclusive<u8> {
        self.zoom_start..=self.zoom_end
    }

    /// Work units for one zoom level. With `sequential` set, the level is
    /// handed to a single worker.
    pub fn units_at(&self, zoom: u8, sequential: bool) -> Vec<WorkUnit> {
        let units = partition(
            zoom,
            self,
            zoom == self.zoom_start,
            zoom == self.zoom_end,
        );

        if sequential {
            merge(&units).into_iter().collect()
        } else {
            units
        }
    }

    /// Work units for every zoom level of the range, in download order.
    ///
    /// # Panics
    /// Panics on reaching a zoom level above [`MAX_ZOOM`](crate::MAX_ZOOM).
    pub fn plan(
        &self,
        sequential: bool,
    ) -> impl Iterator<Item = (u8, Vec<WorkUnit>)> + '_ {
        self.zooms()
            .map(move |zoom| (zoom, self.units_at(zoom, sequential)))
    }

    /// Total number of tiles the range addresses.
    pub fn tile_count(&self) -> u64 {
        self.plan(false)
            .flat_map(|(_, units)| units)
            .map(|unit| unit.tile_count())
            .sum()
    }
}

/// A contiguous slice of columns at one zoom level, owned by one worker.
///
/// The worker sweeps every row of every column, except that `y_start` limits
/// only the first column and `y_end` only the last one.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WorkUnit {
    pub z: u8,
    pub x_start: u32,
    pub x_end: u32,
    pub y_start: u32,
    pub y_end: u32,
}

impl WorkUnit {
    /// Rows to visit in column `x`.
    pub fn rows(&self, x: u32) -> RangeInclusive<u32> {
        let max = tiles_per_axis(self.z) - 1;
        let start = if x == self.x_start { self.y_start } else { 0 };
        let end = if x == self.x_end { self.y_end } else { max };

        start..=end
    }

    /// The unit's tiles in sweep order: x ascending, every y of a column
    /// before the next column.
    pub fn tiles(&self) -> impl Iterator<Item = Tile> {
        let unit = *self;

        (unit.x_start..=unit.x_end)
            .flat_map(move |x| unit.rows(x).map(move |y| Tile::new(x, y, unit.z)))
    }

    pub fn tile_count(&self) -> u64 {
        (self.x_start..=self.x_end)
            .map(|x| {
                let rows = self.rows(x);
                (u64::from(*rows.end()) + 1).saturating_sub(u64::from(*rows.start()))
            })
            .sum()
    }
}

/// Number of workers to spread a zoom level across.
///
/// ZOOM 0, 1, 2: 1; ZOOM 3..=5: `2^(z-1) - 1`; ZOOM 6 and up: 32.
pub fn worker_count(zoom: u8) -> u32 {
    match zoom {
        0..=2 => 1,
        3..=5 => (1 << (zoom - 1)) - 1,
        _ => MAX_WORKERS,
    }
}

/// Splits the columns of `zoom` into ordered, disjoint, gap-free work units.
///
/// Each unit gets `span / workers` columns and the last one absorbs the
/// remainder. When that would leave a worker with a single column or less,
/// the whole span becomes one unit instead.
///
/// # Panics
/// Panics if `zoom` exceeds [`MAX_ZOOM`](crate::MAX_ZOOM).
pub fn partition(
    zoom: u8,
    bounds: &DownloadRange,
    is_first_zoom: bool,
    is_last_zoom: bool,
) -> Vec<WorkUnit> {
    let max = tiles_per_axis(zoom) - 1;

    let x_start = if is_first_zoom && bounds.x_start != 0 {
        bounds.x_start
    } else {
        0
    };
    let x_end = if is_last_zoom && bounds.x_end != 0 {
        bounds.x_end.min(max)
    } else {
        max
    };
    let y_start = if is_first_zoom && bounds.y_start != 0 {
        bounds.y_start
    } else {
        0
    };
    let y_end = if is_last_zoom && bounds.y_end != 0 {
        bounds.y_end.min(max)
    } else {
        max
    };

    if x_start > x_end {
        return Vec::new();
    }

    let span = x_end - x_start + 1;
    let workers = worker_count(zoom);
    let step = span / workers;

    let unit = |from: u32, to: u32| WorkUnit {
        z: zoom,
        x_start: from,
        x_end: to,
        y_start: 0,
        y_end: max,
    };

    let mut units: Vec<WorkUnit> = if step > 1 {
        (0..workers)
            .map(|i| {
                let from = x_start + i * step;
                let to = if i == workers - 1 {
                    x_end
                } else {
                    from + step - 1
                };
                unit(from, to.min(max))
            })
            .collect()
    } else {
        vec![unit(x_start, x_end)]
    };

    if let Some(first) = units.first_mut() {
        first.y_start = y_start;
    }
    if let Some(last) = units.last_mut() {
        last.y_end = y_end;
    }

    units
}

fn merge(units: &[WorkUnit]) -> Option<WorkUnit> {
    let (first, last) = (units.first()?, units.last()?);

    Some(WorkUnit {
        z: first.z,
        x_start: first.x_start,
        x_end: last.x_end,
        y_start: first.y_start,
        y_end: last.y_end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers(units: &[WorkUnit], x_start: u32, x_end: u32) {
        assert!(!units.is_empty());
        assert_eq!(units[0].x_start, x_start);
        assert_eq!(units[units.len() - 1].x_end, x_end);

        for unit in units {
            assert!(unit.x_start <= unit.x_end, "empty unit {:?}", unit);
        }
        for pair in units.windows(2) {
            assert_eq!(pair[0].x_end + 1, pair[1].x_start, "gap or overlap in {:?}", pair);
        }
    }

    fn columns(units: &[WorkUnit]) -> Vec<(u32, u32)> {
        units.iter().map(|u| (u.x_start, u.x_end)).collect()
    }

    #[test]
    fn worker_count_policy() {
        let counts: Vec<_> = (0..=9).map(worker_count).collect();
        assert_eq!(counts, [1, 1, 1, 3, 7, 15, 32, 32, 32, 32]);
    }

    #[test]
    fn unit_count_follows_worker_count() {
        for zoom in 0..=12 {
            let units = partition(zoom, &DownloadRange::full(zoom, zoom), true, true);
            let expected = if zoom < 3 { 1 } else { worker_count(zoom) as usize };

            assert_eq!(units.len(), expected, "zoom {}", zoom);
            assert_covers(&units, 0, tiles_per_axis(zoom) - 1);
        }
    }

    #[test]
    fn last_unit_absorbs_remainder() {
        let range = DownloadRange::full(3, 5);

        assert_eq!(columns(&partition(3, &range, false, false)), [(0, 1), (2, 3), (4, 7)]);

        let units = partition(4, &range, false, false);
        assert_eq!(units.len(), 7);
        assert_eq!(units[5], WorkUnit { z: 4, x_start: 10, x_end: 11, y_start: 0, y_end: 15 });
        assert_eq!((units[6].x_start, units[6].x_end), (12, 15));

        let units = partition(5, &range, false, false);
        assert_eq!(units.len(), 15);
        assert_eq!((units[14].x_start, units[14].x_end), (28, 31));
    }

    #[test]
    fn small_span_collapses_to_one_unit() {
        let range = DownloadRange {
            x_start: 2,
            x_end: 5,
            ..DownloadRange::full(6, 6)
        };

        let units = partition(6, &range, true, true);
        assert_eq!(columns(&units), [(2, 5)]);
    }

    #[test]
    fn bounded_span_is_split_and_covered() {
        let range = DownloadRange {
            x_start: 100,
            x_end: 900,
            ..DownloadRange::full(10, 10)
        };

        let units = partition(10, &range, true, true);
        assert_eq!(units.len(), 32);
        assert_covers(&units, 100, 900);
    }

    #[test]
    fn x_bounds_only_apply_at_outer_zoom_levels() {
        let range = DownloadRange {
            x_start: 1,
            x_end: 1,
            ..DownloadRange::full(2, 4)
        };

        let plan: Vec<_> = range.plan(false).collect();
        assert_eq!(plan.len(), 3);

        assert_eq!(plan[0].0, 2);
        assert_eq!(columns(&plan[0].1), [(1, 3)]);

        assert_eq!(plan[1].0, 3);
        assert_covers(&plan[1].1, 0, 7);

        assert_eq!(plan[2].0, 4);
        assert_eq!(columns(&plan[2].1), [(0, 1)]);
    }

    #[test]
    fn y_bounds_restrict_first_and_last_column_only() {
        let range = DownloadRange {
            zoom_start: 3,
            zoom_end: 3,
            x_start: 1,
            y_start: 5,
            x_end: 6,
            y_end: 2,
        };

        let units = partition(3, &range, true, true);
        assert_eq!(columns(&units), [(1, 2), (3, 4), (5, 6)]);

        assert_eq!(units[0].rows(1), 5..=7);
        assert_eq!(units[0].rows(2), 0..=7);
        assert_eq!(units[1].rows(3), 0..=7);
        assert_eq!(units[1].rows(4), 0..=7);
        assert_eq!(units[2].rows(5), 0..=7);
        assert_eq!(units[2].rows(6), 0..=2);
    }

    #[test]
    fn y_bounds_ignored_at_inner_zoom_levels() {
        let range = DownloadRange {
            y_start: 3,
            y_end: 3,
            ..DownloadRange::full(1, 3)
        };

        let units = partition(2, &range, false, false);
        assert_eq!(units, [WorkUnit { z: 2, x_start: 0, x_end: 3, y_start: 0, y_end: 3 }]);
    }

    #[test]
    fn sweep_order_is_column_major() {
        let unit = WorkUnit { z: 2, x_start: 1, x_end: 2, y_start: 2, y_end: 1 };
        let tiles: Vec<_> = unit.tiles().map(|t| (t.x, t.y)).collect();

        assert_eq!(tiles, [(1, 2), (1, 3), (2, 0), (2, 1)]);
        assert_eq!(unit.tile_count(), 4);
    }

    #[test]
    fn sequential_plan_uses_one_unit() {
        let range = DownloadRange {
            x_start: 2,
            y_start: 1,
            ..DownloadRange::full(4, 4)
        };

        let units = range.units_at(4, true);
        assert_eq!(units, [WorkUnit { z: 4, x_start: 2, x_end: 15, y_start: 1, y_end: 15 }]);
        assert_eq!(
            units[0].tile_count(),
            range.units_at(4, false).iter().map(WorkUnit::tile_count).sum::<u64>()
        );
    }

    #[test]
    fn counts_tiles() {
        assert_eq!(DownloadRange::full(0, 2).tile_count(), 1 + 4 + 16);

        let range = DownloadRange {
            x_start: 1,
            y_start: 1,
            x_end: 1,
            y_end: 1,
            ..DownloadRange::full(1, 1)
        };
        assert_eq!(range.tile_count(), 1);
    }

    #[test]
    fn inverted_bounds_produce_no_work() {
        let range = DownloadRange {
            x_start: 3,
            x_end: 1,
            ..DownloadRange::full(2, 2)
        };

        assert!(partition(2, &range, true, true).is_empty());
        assert_eq!(range.tile_count(), 0);
    }

    #[test]
    #[should_panic(expected = "zoom level 31 out of range")]
    fn zoom_beyond_grid_panics() {
        partition(31, &DownloadRange::full(31, 31), true, true);
    }
}
