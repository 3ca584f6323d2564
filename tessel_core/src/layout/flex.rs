// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! A grid layout with spanning, per-cell alignment and grab distribution.

use kurbo::{Axis, Point, Rect, Size};
use smallvec::SmallVec;
use tracing::trace_span;

use crate::core::{PanelId, PanelTree, Sizes, max_size};
use crate::layout::{Layout, SizesCache};

/// Where something is placed within the space available to it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Alignment {
    /// Left or top.
    #[default]
    Start,
    /// Centered.
    Middle,
    /// Right or bottom.
    End,
    /// Stretched over all the available space.
    Fill,
}

impl Alignment {
    // Offset of an item of `len` inside `available`.
    fn offset(self, available: f64, len: f64) -> f64 {
        match self {
            Self::Start | Self::Fill => 0.,
            Self::Middle => ((available - len) / 2.).max(0.).floor(),
            Self::End => (available - len).max(0.),
        }
    }
}

/// Per-child configuration for [`FlexLayout`], stored with [`PanelTree::set_layout_data`].
///
/// Children without it are laid out as if they had [`FlexLayoutData::default`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlexLayoutData {
    /// Number of columns the child occupies, clamped to `1..=columns`.
    pub h_span: usize,
    /// Number of rows the child occupies, at least 1.
    pub v_span: usize,
    /// Overrides the child's own sizes on each non-zero axis.
    pub size_hint: Size,
    /// Overrides the child's minimum size on each non-zero axis.
    pub min_size: Size,
    /// Horizontal placement within the cell.
    pub h_align: Alignment,
    /// Vertical placement within the cell.
    pub v_align: Alignment,
    /// Take part in distributing extra horizontal space.
    pub h_grab: bool,
    /// Take part in distributing extra vertical space.
    pub v_grab: bool,
}

impl Default for FlexLayoutData {
    fn default() -> Self {
        Self {
            h_span: 1,
            v_span: 1,
            size_hint: Size::ZERO,
            min_size: Size::ZERO,
            h_align: Alignment::Start,
            v_align: Alignment::Start,
            h_grab: false,
            v_grab: false,
        }
    }
}

impl FlexLayoutData {
    /// Data for a single cell with default alignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style method for the number of columns and rows spanned.
    pub fn span(mut self, h_span: usize, v_span: usize) -> Self {
        self.h_span = h_span;
        self.v_span = v_span;
        self
    }

    /// Builder-style method for the explicit size hint.
    pub fn size_hint(mut self, size_hint: Size) -> Self {
        self.size_hint = size_hint;
        self
    }

    /// Builder-style method for the explicit minimum size.
    pub fn min_size(mut self, min_size: Size) -> Self {
        self.min_size = min_size;
        self
    }

    /// Builder-style method for the alignment within the cell.
    pub fn align(mut self, h_align: Alignment, v_align: Alignment) -> Self {
        self.h_align = h_align;
        self.v_align = v_align;
        self
    }

    /// Builder-style method for the grab flags.
    pub fn grab(mut self, h_grab: bool, v_grab: bool) -> Self {
        self.h_grab = h_grab;
        self.v_grab = v_grab;
        self
    }

    /// Fill the cell and grab extra space on both axes.
    pub fn fill(self) -> Self {
        self.align(Alignment::Fill, Alignment::Fill).grab(true, true)
    }

    /// Fill the cell horizontally and grab extra horizontal space.
    pub fn fill_horizontal(mut self) -> Self {
        self.h_align = Alignment::Fill;
        self.h_grab = true;
        self
    }

    fn span_along(&self, axis: Axis, columns: usize) -> usize {
        match axis {
            Axis::Horizontal => self.h_span.clamp(1, columns),
            Axis::Vertical => self.v_span.max(1),
        }
    }

    fn grab_along(&self, axis: Axis) -> bool {
        match axis {
            Axis::Horizontal => self.h_grab,
            Axis::Vertical => self.v_grab,
        }
    }

    fn align_along(&self, axis: Axis) -> Alignment {
        match axis {
            Axis::Horizontal => self.h_align,
            Axis::Vertical => self.v_align,
        }
    }
}

/// A layout that arranges children in a grid with a fixed number of columns.
///
/// Children are placed row by row in the first free block of cells that fits their span.
/// Each column is as wide as its widest single-column occupant; spanning children that
/// need more space than their columns provide push the shortfall into those columns.
/// Extra space from the sizing hint goes to columns holding a child with
/// [`h_grab`](FlexLayoutData::h_grab) set, and rows are resolved the same way.
///
/// Columns are never shrunk below the minimum their occupants need, so the result
/// can exceed the hint.
///
/// ```
/// use tessel_core::layout::{Alignment, FlexLayout};
///
/// let layout = FlexLayout::new()
///     .columns(2)
///     .spacing(4., 4.)
///     .h_align(Alignment::Middle);
/// assert_eq!(layout.column_count(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct FlexLayout {
    columns: usize,
    h_spacing: f64,
    v_spacing: f64,
    h_align: Alignment,
    v_align: Alignment,
    equal_columns: bool,
    cache: SizesCache,
}

impl Default for FlexLayout {
    fn default() -> Self {
        Self::new()
    }
}

// --- MARK: BUILDERS
impl FlexLayout {
    /// A single column with no spacing.
    pub fn new() -> Self {
        Self {
            columns: 1,
            h_spacing: 0.,
            v_spacing: 0.,
            h_align: Alignment::Start,
            v_align: Alignment::Start,
            equal_columns: false,
            cache: SizesCache::new(),
        }
    }

    /// Builder-style method for the number of columns. Zero is treated as one.
    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = columns.max(1);
        self
    }

    /// Builder-style method for the space between columns and between rows.
    pub fn spacing(mut self, h_spacing: f64, v_spacing: f64) -> Self {
        self.h_spacing = h_spacing.max(0.);
        self.v_spacing = v_spacing.max(0.);
        self
    }

    /// Builder-style method for the horizontal placement of the whole grid.
    pub fn h_align(mut self, align: Alignment) -> Self {
        self.h_align = align;
        self
    }

    /// Builder-style method for the vertical placement of the whole grid.
    pub fn v_align(mut self, align: Alignment) -> Self {
        self.v_align = align;
        self
    }

    /// Builder-style method to force all columns to the same width.
    pub fn equal_columns(mut self, equal: bool) -> Self {
        self.equal_columns = equal;
        self
    }

    /// The number of columns.
    pub fn column_count(&self) -> usize {
        self.columns
    }
}

// --- MARK: GRID
struct Cell {
    id: PanelId,
    data: FlexLayoutData,
    cache: Size,
    min_cache: Size,
}

impl Cell {
    fn along(size: Size, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => size.width,
            Axis::Vertical => size.height,
        }
    }

    fn cache_along(&self, axis: Axis) -> f64 {
        Self::along(self.cache, axis)
    }

    // What the child needs at the very least along `axis`.
    fn min_along(&self, axis: Axis) -> f64 {
        if self.data.grab_along(axis) {
            Self::along(self.min_cache, axis)
        } else {
            self.cache_along(axis)
        }
    }
}

// Rows of columns holding indices into the cell list.
struct Grid {
    rows: Vec<SmallVec<[Option<usize>; 8]>>,
    columns: usize,
}

impl Grid {
    fn build(cells: &[Cell], columns: usize) -> Self {
        let mut grid = Self {
            rows: Vec::new(),
            columns,
        };
        let mut row = 0;
        let mut column = 0;
        for (index, cell) in cells.iter().enumerate() {
            let h_span = cell.data.span_along(Axis::Horizontal, columns);
            let v_span = cell.data.span_along(Axis::Vertical, columns);
            loop {
                if column + h_span > columns {
                    column = 0;
                    row += 1;
                }
                grid.ensure_rows(row + v_span);
                if grid.is_free(row, column, h_span, v_span) {
                    break;
                }
                column += 1;
            }
            for cells_row in &mut grid.rows[row..row + v_span] {
                for slot in &mut cells_row[column..column + h_span] {
                    *slot = Some(index);
                }
            }
            column += h_span;
        }
        grid
    }

    fn ensure_rows(&mut self, count: usize) {
        while self.rows.len() < count {
            self.rows.push(SmallVec::from_elem(None, self.columns));
        }
    }

    fn is_free(&self, row: usize, column: usize, h_span: usize, v_span: usize) -> bool {
        self.rows[row..row + v_span]
            .iter()
            .all(|cells| cells[column..column + h_span].iter().all(Option::is_none))
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn track_count(&self, axis: Axis) -> usize {
        match axis {
            Axis::Horizontal => self.columns,
            Axis::Vertical => self.rows.len(),
        }
    }

    /// The cell at `row`/`column` if it is the first (top-left) or last (bottom-right)
    /// cell of its child's block.
    fn get(&self, cells: &[Cell], row: usize, column: usize, first: bool) -> Option<usize> {
        let index = self.rows.get(row)?.get(column).copied().flatten()?;
        let data = &cells[index].data;
        let h_span = data.span_along(Axis::Horizontal, self.columns);
        let v_span = data.span_along(Axis::Vertical, self.columns);
        let (other_row, other_column) = if first {
            (row + v_span - 1, column + h_span - 1)
        } else {
            (row.checked_sub(v_span - 1)?, column.checked_sub(h_span - 1)?)
        };
        let other = self.rows.get(other_row)?.get(other_column).copied().flatten();
        (other == Some(index)).then_some(index)
    }

    /// Like [`get`](Self::get), with `track` along `axis` and `lane` across it.
    fn get_along(
        &self,
        cells: &[Cell],
        axis: Axis,
        track: usize,
        lane: usize,
        first: bool,
    ) -> Option<usize> {
        match axis {
            Axis::Horizontal => self.get(cells, lane, track, first),
            Axis::Vertical => self.get(cells, track, lane, first),
        }
    }

    fn lane_count(&self, axis: Axis) -> usize {
        self.track_count(axis.cross())
    }
}

/// Split `extra` into `count` shares that add up to exactly `extra`.
///
/// Each share is the floored quotient; the remainder is handed out
/// one unit at a time starting with the first share.
pub(crate) fn apportion_extra(extra: f64, count: usize) -> impl Iterator<Item = f64> {
    let count = count.max(1);
    let per = (extra / count as f64).floor();
    let mut remaining = extra - per * count as f64;
    (0..count).map(move |_| {
        let unit = remaining.min(1.).max(0.);
        remaining -= unit;
        per + unit
    })
}

// Add `extra` to the tracks in `range`.
//
// With `expand`, only the expanding tracks of the range receive a share, unless none do.
fn distribute(
    tracks: &mut [f64],
    expand: Option<&[bool]>,
    range: std::ops::Range<usize>,
    extra: f64,
) {
    let expand = expand.filter(|expand| expand[range.clone()].iter().any(|&e| e));
    match expand {
        None => {
            let shares = apportion_extra(extra, range.len());
            for (track, share) in tracks[range].iter_mut().zip(shares) {
                *track += share;
            }
        }
        Some(expand) => {
            let expanding = expand[range.clone()].iter().filter(|&&e| e).count();
            let mut shares = apportion_extra(extra, expanding);
            for index in range {
                if expand[index] {
                    tracks[index] += shares.next().unwrap_or(0.);
                }
            }
        }
    }
}

// --- MARK: ALGORITHM
impl FlexLayout {
    fn spacing_along(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.h_spacing,
            Axis::Vertical => self.v_spacing,
        }
    }

    fn collect_cells(&mut self, tree: &mut PanelTree, target: PanelId, use_min: bool) -> Vec<Cell> {
        let children: SmallVec<[PanelId; 16]> = tree.children(target).iter().copied().collect();
        children
            .into_iter()
            .map(|id| {
                let data = tree.layout_data::<FlexLayoutData>(id).copied().unwrap_or_default();
                let sizes = self.cache.sizes(tree, id, data.size_hint);
                let (cache, min_cache) = compute_cache(&data, sizes, use_min);
                Cell {
                    id,
                    data,
                    cache,
                    min_cache,
                }
            })
            .collect()
    }

    /// Lay out the children inside `hint`, placing them at `origin` if `move_children` is set.
    ///
    /// Returns the size of the whole grid, without insets.
    fn layout(
        &mut self,
        tree: &mut PanelTree,
        target: PanelId,
        origin: Point,
        hint: Size,
        use_min: bool,
        move_children: bool,
    ) -> Size {
        let mut cells = self.collect_cells(tree, target, use_min);
        if cells.is_empty() {
            return Size::ZERO;
        }
        let grid = Grid::build(&cells, self.columns);
        let widths = self.resolve_tracks(&grid, &cells, Axis::Horizontal, hint.width);
        self.wrap(tree, &grid, &mut cells, &widths, hint.width, use_min);
        let heights = self.resolve_tracks(&grid, &cells, Axis::Vertical, hint.height);

        let size = Size::new(
            widths.iter().sum::<f64>() + self.h_spacing * (widths.len() - 1) as f64,
            heights.iter().sum::<f64>() + self.v_spacing * (heights.len() - 1) as f64,
        );
        if move_children {
            let origin = Point::new(
                origin.x + self.h_align.offset(hint.width, size.width),
                origin.y + self.v_align.offset(hint.height, size.height),
            );
            self.position_children(tree, &grid, &cells, &widths, &heights, origin);
        }
        size
    }

    /// Column widths (or row heights), honouring spans, grab flags and the hint.
    fn resolve_tracks(&self, grid: &Grid, cells: &[Cell], axis: Axis, hint: f64) -> Vec<f64> {
        let count = grid.track_count(axis);
        let lanes = grid.lane_count(axis);
        let spacing = self.spacing_along(axis);
        let available = hint - spacing * (count - 1) as f64;
        let mut sizes = vec![0.; count];
        let mut mins = vec![0.; count];
        let mut expand = vec![false; count];
        let mut expand_count = 0;

        for track in 0..count {
            for lane in 0..lanes {
                let Some(index) = grid.get_along(cells, axis, track, lane, true) else {
                    continue;
                };
                let cell = &cells[index];
                if cell.data.span_along(axis, grid.columns) != 1 {
                    continue;
                }
                sizes[track] = f64::max(sizes[track], cell.cache_along(axis));
                mins[track] = f64::max(mins[track], cell.min_along(axis));
                if cell.data.grab_along(axis) {
                    if !expand[track] {
                        expand_count += 1;
                    }
                    expand[track] = true;
                }
            }
            for lane in 0..lanes {
                let Some(index) = grid.get_along(cells, axis, track, lane, false) else {
                    continue;
                };
                let cell = &cells[index];
                let span = cell.data.span_along(axis, grid.columns);
                if span == 1 {
                    continue;
                }
                let range = track + 1 - span..track + 1;
                let span_size: f64 = sizes[range.clone()].iter().sum();
                let span_min: f64 = mins[range.clone()].iter().sum();
                let span_expanding = expand[range.clone()].iter().any(|&e| e);
                if cell.data.grab_along(axis) && !span_expanding {
                    expand_count += 1;
                    expand[track] = true;
                }
                let inner_spacing = spacing * (span - 1) as f64;
                let extra = cell.cache_along(axis) - span_size - inner_spacing;
                if extra > 0. {
                    if self.equal_columns && axis == Axis::Horizontal {
                        let shares = apportion_extra(span_size + extra, span);
                        for (size, share) in sizes[range.clone()].iter_mut().zip(shares) {
                            *size = f64::max(*size, share);
                        }
                    } else {
                        let only = span_expanding.then_some(expand.as_slice());
                        distribute(&mut sizes, only, range.clone(), extra);
                    }
                }
                let min_extra = cell.min_along(axis) - span_min - inner_spacing;
                if min_extra > 0. {
                    let only = span_expanding.then_some(expand.as_slice());
                    distribute(&mut mins, only, range, min_extra);
                }
            }
        }

        if self.equal_columns && axis == Axis::Horizontal {
            let min_width = mins.iter().copied().fold(0., f64::max);
            let mut width = sizes.iter().copied().fold(0., f64::max);
            if hint > 0. && expand_count > 0 {
                width = f64::max(min_width, (available / count as f64).floor());
            }
            sizes.fill(width);
            return sizes;
        }

        if hint > 0. && expand_count > 0 {
            self.relax(grid, cells, axis, available, &mut sizes, &mins, &mut expand, expand_count);
        }
        sizes
    }

    /// Spread the difference between the hint and the natural total over expanding tracks.
    ///
    /// A track that would drop below its minimum is pinned there and stops expanding.
    /// This repeats until the total matches, nothing expands anymore, or a round
    /// changes nothing.
    fn relax(
        &self,
        grid: &Grid,
        cells: &[Cell],
        axis: Axis,
        available: f64,
        sizes: &mut [f64],
        mins: &[f64],
        expand: &mut [bool],
        mut expand_count: usize,
    ) {
        let spacing = self.spacing_along(axis);
        let mut total: f64 = sizes.iter().sum();
        while (total - available).abs() > 0.01 {
            let previous_count = expand_count;
            let delta = (available - total) / expand_count as f64;
            for (index, size) in sizes.iter_mut().enumerate() {
                if !expand[index] {
                    continue;
                }
                if *size + delta > mins[index] {
                    *size += delta;
                } else {
                    *size = mins[index];
                    expand[index] = false;
                    expand_count -= 1;
                }
            }
            // Spanning children must still fit into the tracks they cover.
            for track in 0..sizes.len() {
                for lane in 0..grid.lane_count(axis) {
                    let Some(index) = grid.get_along(cells, axis, track, lane, false) else {
                        continue;
                    };
                    let cell = &cells[index];
                    let span = cell.data.span_along(axis, grid.columns);
                    if span == 1 {
                        continue;
                    }
                    let range = track + 1 - span..track + 1;
                    let span_size: f64 = sizes[range.clone()].iter().sum();
                    let need = cell.min_along(axis) - span_size - spacing * (span - 1) as f64;
                    if need > 0. {
                        distribute(sizes, Some(&*expand), range, need);
                    }
                }
            }
            if expand_count == 0 {
                break;
            }
            let new_total: f64 = sizes.iter().sum();
            if new_total == total && expand_count == previous_count {
                break;
            }
            total = new_total;
        }
    }

    /// Recompute heights of children whose resolved width differs from their natural one.
    fn wrap(
        &mut self,
        tree: &mut PanelTree,
        grid: &Grid,
        cells: &mut [Cell],
        widths: &[f64],
        width_hint: f64,
        use_min: bool,
    ) {
        if width_hint <= 0. {
            return;
        }
        for column in 0..grid.columns {
            for row in 0..grid.row_count() {
                let Some(index) = grid.get(cells, row, column, false) else {
                    continue;
                };
                let cell = &mut cells[index];
                if cell.data.size_hint.height > 0. {
                    continue;
                }
                let span = cell.data.span_along(Axis::Horizontal, grid.columns);
                let current = widths[column + 1 - span..=column].iter().sum::<f64>()
                    + self.h_spacing * (span - 1) as f64;
                let filling = cell.data.h_align == Alignment::Fill && current != cell.cache.width;
                if filling || cell.cache.width > current {
                    let sizes = self
                        .cache
                        .sizes(tree, cell.id, Size::new(current.max(0.), 0.));
                    let base = if use_min { sizes.min.height } else { sizes.pref.height };
                    cell.cache.height = f64::max(cell.min_cache.height, base.min(sizes.max.height));
                }
            }
        }
    }

    fn position_children(
        &self,
        tree: &mut PanelTree,
        grid: &Grid,
        cells: &[Cell],
        widths: &[f64],
        heights: &[f64],
        origin: Point,
    ) {
        let mut y = origin.y;
        for (row, &row_height) in heights.iter().enumerate() {
            let mut x = origin.x;
            for (column, &column_width) in widths.iter().enumerate() {
                if let Some(index) = grid.get(cells, row, column, true) {
                    let cell = &cells[index];
                    let h_span = cell.data.span_along(Axis::Horizontal, grid.columns);
                    let v_span = cell.data.span_along(Axis::Vertical, grid.columns);
                    let cell_width = widths[column..column + h_span].iter().sum::<f64>()
                        + self.h_spacing * (h_span - 1) as f64;
                    let cell_height = heights[row..row + v_span].iter().sum::<f64>()
                        + self.v_spacing * (v_span - 1) as f64;
                    let width = fit(cell.data.align_along(Axis::Horizontal), cell.cache.width, cell_width);
                    let height = fit(cell.data.align_along(Axis::Vertical), cell.cache.height, cell_height);
                    let child_x = x + cell.data.h_align.offset(cell_width, width);
                    let child_y = y + cell.data.v_align.offset(cell_height, height);
                    tree.set_frame_rect(
                        cell.id,
                        Rect::from_origin_size((child_x, child_y), (width, height)),
                    );
                }
                x += column_width + self.h_spacing;
            }
            y += row_height + self.v_spacing;
        }
    }
}

fn fit(align: Alignment, natural: f64, available: f64) -> f64 {
    if align == Alignment::Fill {
        available
    } else {
        natural.min(available)
    }
}

/// The size a child asks for in this pass, and the least it can live with.
fn compute_cache(data: &FlexLayoutData, sizes: Sizes, use_min: bool) -> (Size, Size) {
    let pick = |explicit: f64, fallback: f64| if explicit > 0. { explicit } else { fallback };
    let min_cache = Size::new(
        pick(data.min_size.width, sizes.min.width),
        pick(data.min_size.height, sizes.min.height),
    );
    let base = if use_min { sizes.min } else { sizes.pref };
    let width = pick(data.size_hint.width, base.width).min(sizes.max.width);
    let height = pick(data.size_hint.height, base.height).min(sizes.max.height);
    let cache = Size::new(width.max(min_cache.width), height.max(min_cache.height));
    (cache, min_cache)
}

// --- MARK: IMPL LAYOUT
impl Layout for FlexLayout {
    fn layout_sizes(&mut self, tree: &mut PanelTree, target: PanelId, hint: Size) -> Sizes {
        let _span = trace_span!("FlexLayout::layout_sizes", target = target.trace()).entered();
        self.cache.clear();
        let insets = tree.insets(target);
        let inset_size = Size::new(insets.x_value(), insets.y_value());
        let inner_hint = Size::new(
            if hint.width > 0. { (hint.width - inset_size.width).max(0.) } else { 0. },
            if hint.height > 0. { (hint.height - inset_size.height).max(0.) } else { 0. },
        );
        let min = self.layout(tree, target, Point::ORIGIN, Size::ZERO, true, false) + inset_size;
        let pref = self.layout(tree, target, Point::ORIGIN, inner_hint, false, false) + inset_size;
        Sizes::new(min, pref, max_size())
    }

    fn perform_layout(&mut self, tree: &mut PanelTree, target: PanelId) {
        let _span = trace_span!("FlexLayout::perform_layout", target = target.trace()).entered();
        self.cache.clear();
        let content = tree.content_rect(target);
        self.layout(tree, target, content.origin(), content.size(), false, true);
    }
}

// --- MARK: TESTS
#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use float_cmp::assert_approx_eq;
    use kurbo::Insets;

    use super::*;
    use crate::core::{EmptyBorder, Widget};

    struct Leaf;
    impl Widget for Leaf {}

    struct Fixture {
        tree: PanelTree,
        target: PanelId,
    }

    impl Fixture {
        fn new(layout: FlexLayout) -> Self {
            let mut tree = PanelTree::new();
            let target = tree.create(Leaf);
            tree.set_layout(target, Some(Box::new(layout)));
            Self { tree, target }
        }

        fn child(&mut self, min: Size, pref: Size, data: FlexLayoutData) -> PanelId {
            let id = self.tree.create(Leaf);
            self.tree
                .set_sizer(id, Some(Rc::new(move |_: Size| Sizes::new(min, pref, max_size()))));
            self.tree.set_layout_data(id, data);
            self.tree.add_child(self.target, id);
            id
        }

        fn fixed(&mut self, width: f64, height: f64, data: FlexLayoutData) -> PanelId {
            let size = Size::new(width, height);
            self.child(size, size, data)
        }

        fn layout(&mut self, size: Size) {
            self.tree
                .set_frame_rect(self.target, Rect::from_origin_size(Point::ORIGIN, size));
            self.tree.validate_layout(self.target);
        }

        fn frame(&self, id: PanelId) -> Rect {
            self.tree.frame_rect(id)
        }
    }

    #[test]
    fn apportion_adds_up_exactly() {
        for extra in 0..60 {
            for count in 1..8 {
                let total: f64 = apportion_extra(f64::from(extra), count).sum();
                assert_eq!(total, f64::from(extra), "extra {extra}, count {count}");
            }
        }
        let shares: Vec<f64> = apportion_extra(10.5, 4).collect();
        assert_eq!(shares, vec![3., 3., 2.5, 2.]);
    }

    #[test]
    fn natural_widths_without_grab() {
        let mut grid = Fixture::new(FlexLayout::new().columns(2));
        let data = FlexLayoutData::new().align(Alignment::Fill, Alignment::Fill);
        let a = grid.fixed(40., 10., data);
        let b = grid.fixed(60., 10., data);

        let sizes = grid.tree.sizes(grid.target, Size::new(200., 0.));
        assert_eq!(sizes.pref, Size::new(100., 10.));
        assert_eq!(sizes.max, max_size());

        grid.layout(Size::new(200., 50.));
        assert_eq!(grid.frame(a), Rect::new(0., 0., 40., 10.));
        assert_eq!(grid.frame(b), Rect::new(40., 0., 100., 10.));
    }

    #[test]
    fn grabbing_column_takes_remaining_width() {
        let mut grid = Fixture::new(FlexLayout::new().columns(2).spacing(10., 0.));
        let a = grid.fixed(40., 10., FlexLayoutData::new());
        let b = grid.fixed(60., 10., FlexLayoutData::new().fill_horizontal());

        grid.layout(Size::new(200., 50.));
        assert_eq!(grid.frame(a), Rect::new(0., 0., 40., 10.));
        assert_eq!(grid.frame(b), Rect::new(50., 0., 200., 10.));

        let sizes = grid.tree.sizes(grid.target, Size::new(200., 0.));
        assert_eq!(sizes.pref.width, 200.);
        assert_eq!(sizes.min.width, 110.);
    }

    #[test]
    fn spanning_shortfall_is_spread_over_columns() {
        let mut grid = Fixture::new(FlexLayout::new().columns(3));
        let fill = FlexLayoutData::new().align(Alignment::Fill, Alignment::Start);
        let wide = grid.fixed(300., 10., fill.span(3, 1));
        let cells = [
            grid.fixed(50., 10., fill),
            grid.fixed(50., 10., fill),
            grid.fixed(50., 10., fill),
        ];

        grid.layout(Size::new(300., 100.));
        assert_eq!(grid.frame(wide), Rect::new(0., 0., 300., 10.));
        let widths: Vec<f64> = cells.iter().map(|&id| grid.frame(id).width()).collect();
        assert_eq!(widths, vec![100., 100., 100.]);
        assert_eq!(grid.frame(cells[2]).x0, 200.);
    }

    #[test]
    fn spanning_shortfall_remainder_goes_to_first_columns() {
        let mut grid = Fixture::new(FlexLayout::new().columns(3).spacing(5., 0.));
        let fill = FlexLayoutData::new().align(Alignment::Fill, Alignment::Start);
        grid.fixed(300., 10., fill.span(3, 1));
        let cells = [
            grid.fixed(50., 10., fill),
            grid.fixed(50., 10., fill),
            grid.fixed(50., 10., fill),
        ];

        grid.layout(Size::new(300., 100.));
        let widths: Vec<f64> = cells.iter().map(|&id| grid.frame(id).width()).collect();
        assert_eq!(widths, vec![97., 97., 96.]);
        assert_eq!(widths.iter().sum::<f64>() + 10., 300.);
    }

    #[test]
    fn spanning_shortfall_prefers_expanding_columns() {
        let mut grid = Fixture::new(FlexLayout::new().columns(2));
        let fill = FlexLayoutData::new().align(Alignment::Fill, Alignment::Start);
        let a = grid.fixed(20., 10., fill);
        let b = grid.fixed(20., 10., fill.grab(true, false));
        grid.fixed(100., 10., fill.span(2, 1));

        let sizes = grid.tree.sizes(grid.target, Size::ZERO);
        assert_eq!(sizes.pref.width, 100.);
        grid.layout(Size::new(100., 100.));
        assert_eq!(grid.frame(a).width(), 20.);
        assert_eq!(grid.frame(b).width(), 80.);
    }

    #[test]
    fn spans_are_clamped() {
        let mut grid = Fixture::new(FlexLayout::new().columns(2));
        let too_wide = grid.fixed(10., 10., FlexLayoutData::new().span(5, 1));
        let zero = grid.fixed(10., 10., FlexLayoutData::new().span(0, 0));
        let next = grid.fixed(10., 10., FlexLayoutData::new());
        let wrapped = grid.fixed(10., 10., FlexLayoutData::new());

        grid.layout(Size::new(100., 100.));
        assert_eq!(grid.frame(too_wide).origin(), Point::new(0., 0.));
        assert_eq!(grid.frame(zero).origin(), Point::new(0., 10.));
        assert_eq!(grid.frame(next).origin(), Point::new(10., 10.));
        assert_eq!(grid.frame(wrapped).origin(), Point::new(0., 20.));
    }

    #[test]
    fn vertical_spans_skip_occupied_cells() {
        let mut grid = Fixture::new(FlexLayout::new().columns(2));
        let fill = FlexLayoutData::new().align(Alignment::Fill, Alignment::Fill);
        let tall = grid.fixed(10., 30., fill.span(1, 2));
        let top = grid.fixed(10., 10., fill);
        let bottom = grid.fixed(10., 10., fill);

        grid.layout(Size::new(100., 100.));
        assert_eq!(grid.frame(tall), Rect::new(0., 0., 10., 30.));
        assert_eq!(grid.frame(top).origin(), Point::new(10., 0.));
        assert_eq!(grid.frame(bottom).origin(), Point::new(10., 15.));
        assert_eq!(grid.frame(top).height() + grid.frame(bottom).height(), 30.);
    }

    #[test]
    fn equal_columns_share_one_width() {
        let mut grid = Fixture::new(FlexLayout::new().columns(3).equal_columns(true));
        let fill = FlexLayoutData::new().align(Alignment::Fill, Alignment::Start);
        let ids = [
            grid.fixed(10., 10., fill),
            grid.fixed(30., 10., fill),
            grid.fixed(20., 10., fill),
        ];

        grid.layout(Size::new(300., 100.));
        for id in ids {
            assert_eq!(grid.frame(id).width(), 30.);
        }

        let mut grid = Fixture::new(FlexLayout::new().columns(3).equal_columns(true).spacing(5., 0.));
        let ids = [
            grid.fixed(10., 10., fill.grab(true, false)),
            grid.fixed(30., 10., fill),
            grid.fixed(20., 10., fill),
        ];
        grid.layout(Size::new(302., 100.));
        for id in ids {
            assert_eq!(grid.frame(id).width(), 97.);
        }
    }

    #[test]
    fn columns_never_shrink_below_minimum() {
        let mut grid = Fixture::new(FlexLayout::new().columns(2));
        let fill = FlexLayoutData::new().fill_horizontal();
        let a = grid.child(Size::new(50., 10.), Size::new(80., 10.), fill);
        let b = grid.child(Size::new(30., 10.), Size::new(40., 10.), fill);
        let rigid = grid.fixed(70., 10., FlexLayoutData::new());

        grid.layout(Size::new(20., 100.));
        assert_eq!(grid.frame(a).width(), 70.);
        assert_eq!(grid.frame(b).width(), 30.);
        assert_eq!(grid.frame(rigid).width(), 70.);

        let sizes = grid.tree.sizes(grid.target, Size::new(20., 0.));
        assert_eq!(sizes.pref.width, 100.);
    }

    #[test]
    fn filled_child_wraps_to_its_column() {
        let mut grid = Fixture::new(FlexLayout::new());
        let label = grid.tree.create(Leaf);
        grid.tree.set_sizer(
            label,
            Some(Rc::new(|hint: Size| {
                let width = if hint.width > 0. { hint.width } else { 100. };
                let lines = (100. / width).ceil();
                Sizes::new(Size::new(20., 10.), Size::new(width.min(100.), 10. * lines), max_size())
            })),
        );
        grid.tree
            .set_layout_data(label, FlexLayoutData::new().fill_horizontal());
        grid.tree.add_child(grid.target, label);

        grid.layout(Size::new(50., 100.));
        assert_eq!(grid.frame(label), Rect::new(0., 0., 50., 20.));
    }

    #[test]
    fn insets_and_grid_alignment() {
        let mut grid = Fixture::new(FlexLayout::new().h_align(Alignment::Middle).v_align(Alignment::End));
        grid.tree
            .set_border(grid.target, Some(Box::new(EmptyBorder(Insets::uniform(5.)))));
        let child = grid.fixed(20., 10., FlexLayoutData::new());

        let sizes = grid.tree.sizes(grid.target, Size::ZERO);
        assert_eq!(sizes.pref, Size::new(30., 20.));

        grid.layout(Size::new(110., 110.));
        assert_eq!(grid.frame(child), Rect::new(45., 95., 65., 105.));
    }

    #[test]
    fn no_children_gives_insets_only() {
        let mut grid = Fixture::new(FlexLayout::new().columns(4));
        assert_eq!(grid.tree.sizes(grid.target, Size::new(100., 100.)), Sizes::default());

        grid.tree
            .set_border(grid.target, Some(Box::new(EmptyBorder::uniform(2.))));
        let sizes = grid.tree.sizes(grid.target, Size::ZERO);
        assert_eq!(sizes.min, Size::new(4., 4.));
        assert_eq!(sizes.pref, Size::new(4., 4.));
    }

    #[test]
    fn cell_alignment_within_block() {
        let mut grid = Fixture::new(FlexLayout::new().columns(2));
        grid.fixed(100., 40., FlexLayoutData::new());
        let centered = grid.fixed(
            20.,
            10.,
            FlexLayoutData::new().align(Alignment::Middle, Alignment::End),
        );
        grid.fixed(60., 10., FlexLayoutData::new().span(2, 1).size_hint(Size::new(60., 0.)));
        let under = grid.fixed(
            20.,
            10.,
            FlexLayoutData::new().align(Alignment::End, Alignment::Middle),
        );

        grid.layout(Size::new(200., 200.));
        assert_eq!(grid.frame(centered), Rect::new(100., 30., 120., 40.));
        assert_eq!(grid.frame(under), Rect::new(80., 50., 100., 60.));
    }

    #[test]
    fn layout_is_deterministic() {
        let mut grid = Fixture::new(FlexLayout::new().columns(3).spacing(3., 2.));
        let mut ids = Vec::new();
        for i in 0_u32..7 {
            let data = FlexLayoutData::new()
                .span(1 + i as usize % 2, 1)
                .grab(i % 3 == 0, false)
                .align(Alignment::Fill, Alignment::Middle);
            ids.push(grid.child(
                Size::new(5., 5.),
                Size::new(10. + f64::from(i) * 7., 12.),
                data,
            ));
        }
        let hint = Size::new(173., 0.);
        let first = grid.tree.sizes(grid.target, hint);
        let second = grid.tree.sizes(grid.target, hint);
        assert_eq!(first, second);

        grid.layout(Size::new(173., 90.));
        let frames: Vec<Rect> = ids.iter().map(|&id| grid.frame(id)).collect();
        grid.tree.mark_for_layout(grid.target);
        grid.tree.validate_layout(grid.target);
        let again: Vec<Rect> = ids.iter().map(|&id| grid.frame(id)).collect();
        assert_eq!(frames, again);
        let right_edge = frames.iter().map(|frame| frame.x1).fold(0., f64::max);
        assert_approx_eq!(f64, right_edge, 173., epsilon = 0.02);
    }
}
