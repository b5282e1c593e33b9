//! Uniform XZ grid over a static triangle mesh
//!
//! The grid splits the XZ footprint of a bounding box into `max_x * max_z`
//! equal cells. Each cell keeps a [`TriIndexList`] of every triangle whose
//! footprint touches it, so ground and range queries only look at the
//! triangles near the query point instead of the whole mesh.
//!
//! Cells are stored row-major: cell `(x, z)` lives at `x * max_z + z`.

use std::io::{Read, Write};

use crate::collision::{Sphere, Triangle, TriangleId, TriangleTable, VertexTable};
use crate::config::GridConfig;
use crate::foundation::math::{BoundBox, Mat4, Vec3};
use crate::io::{capacity_hint, StreamError, StreamReader, StreamWriter};

use super::query::{CreateTriangleArg, CurrTriInfo, RayHit, RayIntersectInfo};
use super::tri_index_list::TriIndexList;
use super::GridError;

/// Start value for the running minimum in [`GridDivider::get_curr_tri`]
const CURR_TRI_MIN_START: f32 = 328_000.0;
/// Start value for the running maximum in [`GridDivider::get_curr_tri`]
const CURR_TRI_MAX_START: f32 = -328_000.0;

/// Validated cell counts and sizes for a bounding box
struct Layout {
    max_x: usize,
    max_z: usize,
    cell_count: usize,
    scale_x: f32,
    scale_z: f32,
}

impl Layout {
    fn new(bounds: &BoundBox, max_x: usize, max_z: usize) -> Result<Self, GridError> {
        let cell_count = max_x
            .checked_mul(max_z)
            .filter(|&count| count > 0)
            .ok_or(GridError::InvalidDimensions {
                cells_x: max_x,
                cells_z: max_z,
            })?;

        let scale_x = (bounds.max.x - bounds.min.x).abs() / max_x as f32;
        let scale_z = (bounds.max.z - bounds.min.z).abs() / max_z as f32;
        let usable = |scale: f32| scale.is_finite() && scale > 0.0;
        if bounds.is_empty() || !usable(scale_x) || !usable(scale_z) {
            return Err(GridError::EmptyBounds {
                min: bounds.min,
                max: bounds.max,
            });
        }

        Ok(Self {
            max_x,
            max_z,
            cell_count,
            scale_x,
            scale_z,
        })
    }
}

/// Broad-phase grid owning a mesh and one candidate list per cell
#[derive(Debug, Clone)]
pub struct GridDivider {
    vertices: VertexTable,
    triangles: TriangleTable,
    bound_box: BoundBox,
    max_x: usize,
    max_z: usize,
    scale_x: f32,
    scale_z: f32,
    cells: Vec<TriIndexList>,
    config: GridConfig,
}

impl GridDivider {
    /// Builds a `count_x * count_z` grid over `bounds` with default caps
    pub fn create(
        bounds: BoundBox,
        count_x: usize,
        count_z: usize,
        vertices: VertexTable,
        triangles: TriangleTable,
    ) -> Result<Self, GridError> {
        Self::create_with_config(bounds, GridConfig::new(count_x, count_z), vertices, triangles)
    }

    /// Builds a grid over `bounds` using the cell counts and caps in `config`
    ///
    /// Each triangle goes into every cell its vertex bounding rectangle
    /// (grown by `footprint_margin`) touches. Triangles entirely outside
    /// `bounds` are left out. A cell stops accepting triangles once it holds
    /// `cell_candidate_limit` of them.
    pub fn create_with_config(
        bounds: BoundBox,
        config: GridConfig,
        vertices: VertexTable,
        triangles: TriangleTable,
    ) -> Result<Self, GridError> {
        let mut grid = Self::empty(bounds, config, vertices, triangles)?;
        grid.populate();

        let entries: usize = grid.cells.iter().map(TriIndexList::len).sum();
        log::info!(
            "Built {}x{} grid over {} triangles ({} cell entries)",
            grid.max_x,
            grid.max_z,
            grid.triangles.len(),
            entries
        );
        Ok(grid)
    }

    /// Validates the layout and allocates empty cells
    fn empty(
        bounds: BoundBox,
        config: GridConfig,
        vertices: VertexTable,
        triangles: TriangleTable,
    ) -> Result<Self, GridError> {
        let layout = Layout::new(&bounds, config.cells_x, config.cells_z)?;
        let cells = vec![TriIndexList::new(); layout.cell_count];
        Ok(Self::assemble(bounds, layout, cells, config, vertices, triangles))
    }

    fn assemble(
        bounds: BoundBox,
        layout: Layout,
        cells: Vec<TriIndexList>,
        config: GridConfig,
        vertices: VertexTable,
        triangles: TriangleTable,
    ) -> Self {
        Self {
            vertices,
            triangles,
            bound_box: bounds,
            max_x: layout.max_x,
            max_z: layout.max_z,
            scale_x: layout.scale_x,
            scale_z: layout.scale_z,
            cells,
            config,
        }
    }

    fn populate(&mut self) {
        let limit = self.config.cell_candidate_limit;
        let margin = self.config.footprint_margin;
        let mut saturated = vec![false; self.cells.len()];

        for (id, triangle) in self.triangles.iter() {
            let mut footprint = BoundBox::empty();
            for corner in triangle.corners(&self.vertices) {
                footprint.include(&corner);
            }
            footprint.min -= Vec3::new(margin, 0.0, margin);
            footprint.max += Vec3::new(margin, 0.0, margin);

            if !footprint.intersects_xz(&self.bound_box) {
                continue;
            }

            let (x0, z0) = self.clamped_cell(footprint.min.x, footprint.min.z);
            let (x1, z1) = self.clamped_cell(footprint.max.x, footprint.max.z);
            for x in x0..=x1 {
                for z in z0..=z1 {
                    let index = x * self.max_z + z;
                    let cell = &mut self.cells[index];
                    if cell.len() < limit {
                        cell.push(id);
                    } else if !saturated[index] {
                        saturated[index] = true;
                        log::warn!(
                            "Grid cell ({}, {}) reached its cap of {} triangles; dropping the rest",
                            x,
                            z,
                            limit
                        );
                    }
                }
            }
        }
    }

    /// Reads a grid and its mesh written by [`GridDivider::write`]
    ///
    /// Stored cell sizes are ignored and recomputed from the bounding box.
    /// Every triangle's planes and bounding sphere are rebuilt.
    pub fn read<R: Read>(reader: &mut StreamReader<R>) -> Result<Self, GridError> {
        let vertices = VertexTable::read(reader)?;
        let triangles = TriangleTable::read(reader, &vertices)?;
        let bounds = BoundBox::new(reader.read_vec3()?, reader.read_vec3()?);

        let max_x = reader.read_count("grid column")?;
        let max_z = reader.read_count("grid row")?;
        let _stored_scale_x = reader.read_f32()?;
        let _stored_scale_z = reader.read_f32()?;

        let layout = Layout::new(&bounds, max_x, max_z)?;
        let mut cells = Vec::with_capacity(capacity_hint(layout.cell_count));
        for _ in 0..layout.cell_count {
            cells.push(TriIndexList::read(reader, triangles.len())?);
        }

        let config = GridConfig::new(max_x, max_z);
        let grid = Self::assemble(bounds, layout, cells, config, vertices, triangles);

        log::debug!(
            "Read {}x{} grid with {} vertices and {} triangles",
            grid.max_x,
            grid.max_z,
            grid.vertices.len(),
            grid.triangles.len()
        );
        Ok(grid)
    }

    /// Writes the mesh tables, bounds, layout and every cell list
    pub fn write<W: Write>(&self, writer: &mut StreamWriter<W>) -> Result<(), StreamError> {
        self.vertices.write(writer)?;
        self.triangles.write(writer)?;
        writer.write_vec3(&self.bound_box.min)?;
        writer.write_vec3(&self.bound_box.max)?;
        writer.write_count(self.max_x)?;
        writer.write_count(self.max_z)?;
        writer.write_f32(self.scale_x)?;
        writer.write_f32(self.scale_z)?;
        for cell in &self.cells {
            cell.write(writer)?;
        }
        Ok(())
    }

    /// Unclamped cell coordinates of an XZ position
    fn cell_coords(&self, x: f32, z: f32) -> (i64, i64) {
        let cx = ((x - self.bound_box.min.x) / self.scale_x).floor() as i64;
        let cz = ((z - self.bound_box.min.z) / self.scale_z).floor() as i64;
        (cx, cz)
    }

    fn clamped_cell(&self, x: f32, z: f32) -> (usize, usize) {
        let (cx, cz) = self.cell_coords(x, z);
        (
            cx.clamp(0, self.max_x as i64 - 1) as usize,
            cz.clamp(0, self.max_z as i64 - 1) as usize,
        )
    }

    /// Cell `(x, z)` holding `point`, or `None` outside the grid
    pub fn cell_of(&self, point: &Vec3) -> Option<(usize, usize)> {
        let (cx, cz) = self.cell_coords(point.x, point.z);
        let x = usize::try_from(cx).ok().filter(|&x| x < self.max_x)?;
        let z = usize::try_from(cz).ok().filter(|&z| z < self.max_z)?;
        Some((x, z))
    }

    /// Row-major index of the cell holding `point`, or `None` outside the grid
    pub fn cell_index(&self, point: &Vec3) -> Option<usize> {
        self.cell_of(point).map(|(x, z)| x * self.max_z + z)
    }

    /// Candidate list of cell `(x, z)`
    pub fn cell(&self, x: usize, z: usize) -> Option<&TriIndexList> {
        if x < self.max_x && z < self.max_z {
            self.cells.get(x * self.max_z + z)
        } else {
            None
        }
    }

    fn cell_at(&self, point: &Vec3) -> Option<&TriIndexList> {
        self.cell_index(point).map(|index| &self.cells[index])
    }

    /// Lowest ground height under `point`
    ///
    /// Looks at every upward-facing triangle in the point's cell whose XZ
    /// footprint contains the point. Returns `0.0` outside the grid or when no
    /// triangle lies under the point.
    pub fn get_min_y(&self, point: &Vec3) -> f32 {
        let Some(cell) = self.cell_at(point) else {
            return 0.0;
        };

        cell.iter()
            .filter_map(|id| self.triangles[id].height_at(point.x, point.z))
            .reduce(f32::min)
            .unwrap_or(0.0)
    }

    /// Finds the triangles above and below `info.position`
    ///
    /// Writes `min_y`/`max_y` and the reported triangle only if some triangle
    /// lies under the position. Returns whether one did.
    pub fn get_curr_tri(&self, info: &mut CurrTriInfo) -> bool {
        let Some(cell) = self.cell_at(&info.position) else {
            return false;
        };

        let mut found = false;
        let mut min_y = CURR_TRI_MIN_START;
        let mut max_y = CURR_TRI_MAX_START;
        for id in cell {
            let triangle = &self.triangles[id];
            let Some(y) = triangle.height_at(info.position.x, info.position.z) else {
                continue;
            };

            if y < min_y {
                min_y = y;
                if info.update_on_new_max_y {
                    found = true;
                    info.normal = triangle.plane.normal;
                    info.triangle = Some(id);
                }
            }
            if y > max_y {
                max_y = y;
                if !info.update_on_new_max_y {
                    found = true;
                    info.normal = triangle.plane.normal;
                    info.triangle = Some(id);
                }
            }
        }

        if found {
            info.min_y = min_y;
            info.max_y = max_y;
        }
        found
    }

    /// Candidate triangles for `ball`, merged from every cell its XZ
    /// footprint covers
    ///
    /// The cell range is clamped into the grid, so a ball beyond the edge
    /// still sees the border cells. Returns `None` when no candidate was found.
    pub fn find_tri_lists(&self, ball: &Sphere) -> Option<TriIndexList> {
        let mut merged = TriIndexList::new();
        self.find_tri_lists_into(ball, &mut merged).then_some(merged)
    }

    /// Like [`GridDivider::find_tri_lists`], filling a caller-owned list
    ///
    /// `out` is cleared first. Returns `false` if it stays empty.
    pub fn find_tri_lists_into(&self, ball: &Sphere, out: &mut TriIndexList) -> bool {
        out.clear();

        let (x0, z0) = self.clamped_cell(ball.position.x - ball.radius, ball.position.z - ball.radius);
        let (x1, z1) = self.clamped_cell(ball.position.x + ball.radius, ball.position.z + ball.radius);

        let mut visited = 0;
        for x in x0..=x1 {
            for z in z0..=z1 {
                out.concat(&self.cells[x * self.max_z + z]);
                visited += 1;
            }
        }

        if visited > self.config.merge_hint_threshold {
            out.calc_next_count();
        }

        log::trace!(
            "Range query over {} cells gathered {} candidates",
            visited,
            out.len()
        );
        !out.is_empty()
    }

    /// Copies the triangles in the cell under `arg.bounding_sphere`'s center,
    /// pushed out along their normals by `arg.scale`
    ///
    /// Only triangles with `normal.y > arg.scale_limit` are copied, each at
    /// most once, up to `create_triangles_limit`. Outputs are replaced; they
    /// stay empty when the center is outside the grid.
    pub fn create_triangles(&self, arg: &mut CreateTriangleArg) {
        arg.vertices.clear();
        arg.triangles.clear();

        let Some(cell) = self.cell_at(&arg.bounding_sphere.position) else {
            return;
        };

        let limit = self.config.create_triangles_limit;
        for id in cell {
            if arg.triangles.contains(&id) {
                continue;
            }
            if arg.triangles.len() >= limit {
                log::debug!("create_triangles stopped at its cap of {} triangles", limit);
                break;
            }

            let triangle = &self.triangles[id];
            if triangle.plane.normal.y <= arg.scale_limit {
                continue;
            }

            let offset = triangle.plane.normal * arg.scale;
            arg.vertices
                .extend(triangle.corners(&self.vertices).map(|corner| corner + offset));
            arg.triangles.push(id);
        }
    }

    /// Casts `info.edge` against the mesh and returns the crossing nearest the
    /// edge start
    pub fn intersect_ray(&self, info: &RayIntersectInfo) -> Option<RayHit> {
        let candidates = self.find_tri_lists(&info.bounding_sphere())?;

        candidates
            .iter()
            .filter(|&id| info.condition(&self.triangles[id]))
            .filter_map(|id| {
                self.triangles[id]
                    .intersect_edge_with_depth(&info.edge, info.cutoff)
                    .map(|crossing| RayHit {
                        triangle: id,
                        point: crossing.point,
                        dist_from_cutoff: crossing.dist_from_cutoff,
                    })
            })
            .min_by(|a, b| {
                let da = (a.point - info.edge.start).norm_squared();
                let db = (b.point - info.edge.start).norm_squared();
                da.total_cmp(&db)
            })
    }

    /// Moves the mesh by `matrix` and rebuilds every triangle's planes and
    /// bounding sphere
    ///
    /// Cell lists and the bounding box are left as they are, so a transform
    /// that carries triangles into other cells needs a fresh grid.
    pub fn transform(&mut self, matrix: &Mat4) {
        self.vertices.transform(matrix);
        self.triangles.make_planes(&self.vertices);
        self.triangles.create_triangle_sphere(&self.vertices);
        log::debug!("Transformed {} grid vertices", self.vertices.len());
    }

    /// Vertex table the triangles index into
    pub fn vertices(&self) -> &VertexTable {
        &self.vertices
    }

    /// Triangle table the cells index into
    pub fn triangles(&self) -> &TriangleTable {
        &self.triangles
    }

    /// Triangle by handle
    pub fn triangle(&self, id: TriangleId) -> Option<&Triangle> {
        self.triangles.get(id)
    }

    /// Box the grid covers
    pub fn bound_box(&self) -> &BoundBox {
        &self.bound_box
    }

    /// Number of cells along X
    pub const fn max_x(&self) -> usize {
        self.max_x
    }

    /// Number of cells along Z
    pub const fn max_z(&self) -> usize {
        self.max_z
    }

    /// Cell width along X
    pub const fn scale_x(&self) -> f32 {
        self.scale_x
    }

    /// Cell width along Z
    pub const fn scale_z(&self) -> f32 {
        self.scale_z
    }

    /// All cell lists, row-major
    pub fn cells(&self) -> &[TriIndexList] {
        &self.cells
    }

    /// Configuration the grid was built with
    pub fn config(&self) -> &GridConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{Edge, VertexId};
    use approx::assert_relative_eq;

    const GROUND_Y: f32 = 2.0;
    const PLATFORM_Y: f32 = 10.0;
    const PLATFORM: TriangleId = TriangleId(32);

    /// 4x4 quads of 25 units at `GROUND_Y`, plus one platform triangle at
    /// `PLATFORM_Y` over x, z in 10..20
    fn terrain() -> (VertexTable, TriangleTable) {
        let mut vertices = VertexTable::new("terrain");
        for i in 0..5 {
            for j in 0..5 {
                vertices.push(Vec3::new(i as f32 * 25.0, GROUND_Y, j as f32 * 25.0));
            }
        }
        let p0 = vertices.push(Vec3::new(10.0, PLATFORM_Y, 10.0));
        let p1 = vertices.push(Vec3::new(20.0, PLATFORM_Y, 10.0));
        let p2 = vertices.push(Vec3::new(10.0, PLATFORM_Y, 20.0));

        let v = |i: u32, j: u32| VertexId(i * 5 + j);
        let mut triangles = TriangleTable::new();
        for i in 0..4 {
            for j in 0..4 {
                triangles.push(Triangle::new([v(i, j), v(i + 1, j), v(i, j + 1)]), &vertices);
                triangles.push(Triangle::new([v(i + 1, j), v(i + 1, j + 1), v(i, j + 1)]), &vertices);
            }
        }
        triangles.push(Triangle::new([p0, p1, p2]), &vertices);
        (vertices, triangles)
    }

    fn grid_with(config: GridConfig) -> GridDivider {
        let (vertices, triangles) = terrain();
        let bounds = BoundBox::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(100.0, PLATFORM_Y, 100.0));
        GridDivider::create_with_config(bounds, config, vertices, triangles).unwrap()
    }

    fn grid() -> GridDivider {
        grid_with(GridConfig::new(4, 4))
    }

    #[test]
    fn test_create_derives_cell_sizes() {
        let grid = grid();
        assert_eq!(grid.max_x(), 4);
        assert_eq!(grid.max_z(), 4);
        assert_eq!(grid.cells().len(), 16);
        assert_relative_eq!(grid.scale_x(), 25.0);
        assert_relative_eq!(grid.scale_z(), 25.0);
    }

    #[test]
    fn test_create_rejects_bad_layouts() {
        let (vertices, triangles) = terrain();
        let bounds = *vertices.bound_box();
        let err = GridDivider::create(bounds, 0, 4, vertices.clone(), triangles.clone()).unwrap_err();
        assert!(matches!(err, GridError::InvalidDimensions { cells_x: 0, cells_z: 4 }));

        let flat = BoundBox::new(Vec3::zeros(), Vec3::new(100.0, 5.0, 0.0));
        let err = GridDivider::create(flat, 4, 4, vertices.clone(), triangles.clone()).unwrap_err();
        assert!(matches!(err, GridError::EmptyBounds { .. }));

        let err = GridDivider::create(BoundBox::empty(), 4, 4, vertices, triangles).unwrap_err();
        assert!(matches!(err, GridError::EmptyBounds { .. }));
    }

    #[test]
    fn test_cell_mapping() {
        let grid = grid();
        assert_eq!(grid.cell_of(&Vec3::new(0.0, 0.0, 0.0)), Some((0, 0)));
        assert_eq!(grid.cell_of(&Vec3::new(60.0, 0.0, 30.0)), Some((2, 1)));
        assert_eq!(grid.cell_index(&Vec3::new(60.0, 0.0, 30.0)), Some(9));
        assert_eq!(grid.cell_of(&Vec3::new(-0.5, 0.0, 10.0)), None);
        assert_eq!(grid.cell_of(&Vec3::new(10.0, 0.0, 100.0)), None);
    }

    #[test]
    fn test_populate_places_triangles_in_touched_cells() {
        let grid = grid();
        let first = grid.cell(0, 0).unwrap();
        assert!(first.contains(TriangleId(0)));
        assert!(first.contains(PLATFORM));

        let far = grid.cell(3, 3).unwrap();
        assert!(far.contains(TriangleId(30)));
        assert!(!far.contains(TriangleId(0)));
        assert!(!far.contains(PLATFORM));
    }

    #[test]
    fn test_populate_respects_cell_cap() {
        let grid = grid_with(GridConfig::new(1, 1).with_cell_candidate_limit(5));
        assert_eq!(grid.cell(0, 0).unwrap().len(), 5);
    }

    #[test]
    fn test_footprint_margin_reaches_neighbours() {
        let (vertices, all) = terrain();
        let mut triangles = TriangleTable::new();
        triangles.push(all[PLATFORM], &vertices);
        let bounds = BoundBox::new(Vec3::zeros(), Vec3::new(100.0, PLATFORM_Y, 100.0));

        let tight = GridDivider::create_with_config(
            bounds,
            GridConfig::new(10, 10),
            vertices.clone(),
            triangles.clone(),
        )
        .unwrap();
        assert!(tight.cell(0, 0).unwrap().is_empty());
        assert_eq!(tight.cell(1, 1).unwrap().len(), 1);

        let padded = GridDivider::create_with_config(
            bounds,
            GridConfig::new(10, 10).with_footprint_margin(1.0),
            vertices,
            triangles,
        )
        .unwrap();
        assert_eq!(padded.cell(0, 0).unwrap().len(), 1);
    }

    #[test]
    fn test_get_min_y() {
        let grid = grid();
        assert_relative_eq!(grid.get_min_y(&Vec3::new(12.0, 50.0, 12.0)), GROUND_Y);
        assert_relative_eq!(grid.get_min_y(&Vec3::new(70.0, 0.0, 70.0)), GROUND_Y);
        assert_eq!(grid.get_min_y(&Vec3::new(-10.0, 0.0, 12.0)), 0.0);
    }

    #[test]
    fn test_get_curr_tri_lowest_and_highest() {
        let grid = grid();

        let mut lowest = CurrTriInfo::new(Vec3::new(12.0, 0.0, 12.0), true);
        assert!(grid.get_curr_tri(&mut lowest));
        assert_eq!(lowest.triangle, Some(TriangleId(0)));
        assert_relative_eq!(lowest.min_y, GROUND_Y);
        assert_relative_eq!(lowest.max_y, PLATFORM_Y);
        assert_relative_eq!(lowest.normal, Vec3::y());

        let mut highest = CurrTriInfo::new(Vec3::new(12.0, 0.0, 12.0), false);
        assert!(grid.get_curr_tri(&mut highest));
        assert_eq!(highest.triangle, Some(PLATFORM));
        assert_relative_eq!(highest.max_y, PLATFORM_Y);
    }

    #[test]
    fn test_get_curr_tri_outside_leaves_info_untouched() {
        let grid = grid();
        let mut info = CurrTriInfo::new(Vec3::new(150.0, 0.0, 12.0), true);
        info.max_y = 7.0;
        let before = info;

        assert!(!grid.get_curr_tri(&mut info));
        assert_eq!(info, before);
    }

    #[test]
    fn test_transform_moves_ground_and_keeps_cells() {
        let mut grid = grid();
        let before = grid.cells().to_vec();
        grid.transform(&Mat4::new_translation(&Vec3::new(0.0, 3.0, 0.0)));

        assert_relative_eq!(grid.get_min_y(&Vec3::new(12.0, 50.0, 12.0)), GROUND_Y + 3.0);
        assert_relative_eq!(grid.get_min_y(&Vec3::new(70.0, 0.0, 70.0)), GROUND_Y + 3.0);

        let mut highest = CurrTriInfo::new(Vec3::new(12.0, 0.0, 12.0), false);
        assert!(grid.get_curr_tri(&mut highest));
        assert_eq!(highest.triangle, Some(PLATFORM));
        assert_relative_eq!(highest.max_y, PLATFORM_Y + 3.0);

        let platform = grid.triangle(PLATFORM).unwrap();
        assert_relative_eq!(platform.sphere.position.y, PLATFORM_Y + 3.0, epsilon = 1e-4);
        assert_relative_eq!(platform.plane.normal, Vec3::y());
        assert_eq!(grid.cells(), before.as_slice());
    }

    #[test]
    fn test_find_tri_lists_merges_covered_cells() {
        let grid = grid();

        let single = grid
            .find_tri_lists(&Sphere::new(Vec3::new(60.0, 0.0, 60.0), 5.0))
            .expect("candidates");
        assert_eq!(&single, grid.cell(2, 2).unwrap());

        let quad = grid
            .find_tri_lists(&Sphere::new(Vec3::new(50.0, 0.0, 50.0), 5.0))
            .expect("candidates");
        let expected: usize = [(1, 1), (1, 2), (2, 1), (2, 2)]
            .iter()
            .map(|&(x, z)| grid.cell(x, z).unwrap().len())
            .sum();
        assert_eq!(quad.len(), expected);
    }

    #[test]
    fn test_find_tri_lists_clamps_outside_balls() {
        let grid = grid();
        let beyond = grid
            .find_tri_lists(&Sphere::new(Vec3::new(-40.0, 0.0, 12.0), 1.0))
            .expect("border cell");
        assert_eq!(&beyond, grid.cell(0, 0).unwrap());
    }

    #[test]
    fn test_find_tri_lists_into_reuses_scratch() {
        let grid = grid();
        let mut scratch = TriIndexList::new();
        assert!(grid.find_tri_lists_into(&Sphere::new(Vec3::new(60.0, 0.0, 60.0), 5.0), &mut scratch));
        assert_eq!(&scratch, grid.cell(2, 2).unwrap());

        // Ball covering the whole grid merges every cell
        assert!(grid.find_tri_lists_into(&Sphere::new(Vec3::new(50.0, 0.0, 50.0), 80.0), &mut scratch));
        let total: usize = grid.cells().iter().map(TriIndexList::len).sum();
        assert_eq!(scratch.len(), total);
    }

    #[test]
    fn test_find_tri_lists_sets_hint_past_threshold() {
        let grid = grid_with(GridConfig::new(10, 10));
        let merged = grid
            .find_tri_lists(&Sphere::new(Vec3::new(50.0, 0.0, 50.0), 50.0))
            .expect("candidates");
        assert!(merged.next_count() >= merged.len());
        assert!(merged.next_count() > 0);

        let small = grid
            .find_tri_lists(&Sphere::new(Vec3::new(55.0, 0.0, 55.0), 1.0))
            .expect("candidates");
        assert_eq!(small.next_count(), 0);
    }

    #[test]
    fn test_create_triangles_copies_cell_along_normals() {
        let grid = grid();
        let mut arg = CreateTriangleArg::new(Sphere::new(Vec3::new(12.0, 0.0, 12.0), 1.0), 0.5, 0.5);
        grid.create_triangles(&mut arg);

        assert_eq!(arg.count(), grid.cell(0, 0).unwrap().len());
        assert_eq!(arg.vertices.len(), arg.count() * 3);
        assert!(arg.triangles.contains(&PLATFORM));
        for vertex in &arg.vertices {
            let y = vertex.y;
            assert!(
                (y - (GROUND_Y + 0.5)).abs() < 1e-5 || (y - (PLATFORM_Y + 0.5)).abs() < 1e-5,
                "unexpected height {y}"
            );
        }
    }

    #[test]
    fn test_create_triangles_filters_caps_and_dedupes() {
        let mut grid = grid_with(GridConfig::new(4, 4).with_create_triangles_limit(2));
        let center = Sphere::new(Vec3::new(12.0, 0.0, 12.0), 1.0);
        assert_eq!(grid.cell(0, 0).unwrap().len(), 3);

        let mut arg = CreateTriangleArg::new(center, 0.5, 0.5);
        grid.create_triangles(&mut arg);
        assert_eq!(arg.count(), 2);
        assert_eq!(arg.vertices.len(), 6);

        let mut steep_only = CreateTriangleArg::new(center, 0.5, 1.0);
        grid.create_triangles(&mut steep_only);
        assert_eq!(steep_only.count(), 0);

        grid.config.create_triangles_limit = 128;
        let first = grid.cells[0].as_slice()[0];
        grid.cells[0].push(first);
        grid.create_triangles(&mut arg);
        assert_eq!(arg.count(), grid.cells[0].len() - 1);

        let mut outside = CreateTriangleArg::new(Sphere::new(Vec3::new(-5.0, 0.0, 12.0), 50.0), 0.5, 0.0);
        grid.create_triangles(&mut outside);
        assert_eq!(outside.count(), 0);
        assert!(outside.vertices.is_empty());
    }

    #[test]
    fn test_intersect_ray_returns_nearest_crossing() {
        let grid = grid();
        let drop = Edge::new(Vec3::new(12.0, 20.0, 12.0), Vec3::new(12.0, -5.0, 12.0));

        let hit = grid
            .intersect_ray(&RayIntersectInfo::new(drop, 0.0))
            .expect("hits the platform");
        assert_eq!(hit.triangle, PLATFORM);
        assert_relative_eq!(hit.point, Vec3::new(12.0, PLATFORM_Y, 12.0), epsilon = 1e-4);

        let rising = Edge::new(drop.end, drop.start);
        let hit = grid
            .intersect_ray(&RayIntersectInfo::new(rising, 0.0))
            .expect("hits the ground");
        assert_eq!(hit.triangle, TriangleId(0));
        assert_relative_eq!(hit.point.y, GROUND_Y, epsilon = 1e-4);

        assert!(grid
            .intersect_ray(&RayIntersectInfo::new(drop, 0.0).walls_only())
            .is_none());
    }

    #[test]
    fn test_write_read_round_trip() {
        let grid = grid();
        let mut writer = StreamWriter::new(Vec::new());
        grid.write(&mut writer).unwrap();
        let bytes = writer.into_inner();

        let mut reader = StreamReader::new(bytes.as_slice());
        let loaded = GridDivider::read(&mut reader).unwrap();

        assert_eq!(loaded.vertices(), grid.vertices());
        assert_eq!(loaded.triangles(), grid.triangles());
        assert_eq!(loaded.bound_box(), grid.bound_box());
        assert_eq!(loaded.cells(), grid.cells());
        assert_eq!((loaded.max_x(), loaded.max_z()), (4, 4));
        assert_relative_eq!(loaded.scale_x(), grid.scale_x());
        assert_relative_eq!(loaded.get_min_y(&Vec3::new(12.0, 0.0, 12.0)), GROUND_Y);
    }

    #[test]
    fn test_read_rejects_truncated_stream() {
        let grid = grid();
        let mut writer = StreamWriter::new(Vec::new());
        grid.write(&mut writer).unwrap();
        let mut bytes = writer.into_inner();
        bytes.truncate(bytes.len() - 2);

        let mut reader = StreamReader::new(bytes.as_slice());
        let err = GridDivider::read(&mut reader).unwrap_err();
        assert!(matches!(err, GridError::Stream(StreamError::Io(_))));
    }
}
