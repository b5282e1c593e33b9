//! Mesh tables for collision geometry
//!
//! Vertices live in a [`VertexTable`]; triangles in a [`TriangleTable`] refer to
//! them through [`VertexId`] handles rather than owning copies, so moving the
//! vertices (see [`VertexTable::transform`]) moves every triangle that uses them.

use std::io::{Read, Write};
use std::ops::Index;

use crate::foundation::math::{BoundBox, Mat4, Point3, Vec3};
use crate::io::{capacity_hint, StreamError, StreamReader, StreamWriter};
use super::triangle::Triangle;

/// Handle to a vertex in a [`VertexTable`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId(pub u32);

impl VertexId {
    /// Position of the vertex in its table
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a triangle in a [`TriangleTable`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TriangleId(pub u32);

impl TriangleId {
    /// Position of the triangle in its table
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Named table of vertex positions with a bounding box over all of them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexTable {
    name: String,
    vertices: Vec<Vec3>,
    bound_box: BoundBox,
}

impl VertexTable {
    /// Creates an empty table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertices: Vec::new(),
            bound_box: BoundBox::empty(),
        }
    }

    /// Creates a table from a list of positions
    pub fn from_vertices(name: impl Into<String>, vertices: Vec<Vec3>) -> Self {
        let mut table = Self {
            name: name.into(),
            vertices,
            bound_box: BoundBox::empty(),
        };
        table.include_vertices();
        table
    }

    /// Appends a vertex and returns its handle
    pub fn push(&mut self, vertex: Vec3) -> VertexId {
        let id = VertexId(self.vertices.len() as u32);
        self.bound_box.include(&vertex);
        self.vertices.push(vertex);
        id
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of vertices
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// True if the table has no vertices
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertex position by handle
    pub fn get(&self, id: VertexId) -> Option<&Vec3> {
        self.vertices.get(id.index())
    }

    /// All vertex positions in table order
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Bounding box of every vertex
    pub fn bound_box(&self) -> &BoundBox {
        &self.bound_box
    }

    /// Applies `matrix` to every vertex in place and recomputes the bounding box
    ///
    /// Triangle planes and spheres built from this table are stale afterwards;
    /// call [`TriangleTable::make_planes`] and [`TriangleTable::create_triangle_sphere`].
    pub fn transform(&mut self, matrix: &Mat4) {
        for vertex in &mut self.vertices {
            let moved = matrix.transform_point(&Point3::from(*vertex));
            *vertex = moved.coords;
        }
        self.include_vertices();
    }

    fn include_vertices(&mut self) {
        self.bound_box = BoundBox::empty();
        for vertex in &self.vertices {
            self.bound_box.include(vertex);
        }
    }

    /// Reads a table written by [`VertexTable::write`]
    pub fn read<R: Read>(reader: &mut StreamReader<R>) -> Result<Self, StreamError> {
        let name = reader.read_string()?;
        let count = reader.read_count("vertex")?;
        let mut vertices = Vec::with_capacity(capacity_hint(count));
        for _ in 0..count {
            vertices.push(reader.read_vec3()?);
        }
        Ok(Self::from_vertices(name, vertices))
    }

    /// Writes the name, the vertex count and every position
    pub fn write<W: Write>(&self, writer: &mut StreamWriter<W>) -> Result<(), StreamError> {
        writer.write_string(&self.name)?;
        writer.write_count(self.vertices.len())?;
        for vertex in &self.vertices {
            writer.write_vec3(vertex)?;
        }
        Ok(())
    }
}

impl Index<VertexId> for VertexTable {
    type Output = Vec3;

    fn index(&self, id: VertexId) -> &Vec3 {
        &self.vertices[id.index()]
    }
}

/// Ordered table of triangles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleTable {
    triangles: Vec<Triangle>,
}

impl TriangleTable {
    /// Creates an empty table
    pub const fn new() -> Self {
        Self { triangles: Vec::new() }
    }

    /// Creates an empty table with room for `capacity` triangles
    pub fn with_capacity(capacity: usize) -> Self {
        Self { triangles: Vec::with_capacity(capacity) }
    }

    /// Appends a triangle, computing its planes and bounding sphere, and returns its handle
    pub fn push(&mut self, mut triangle: Triangle, vertices: &VertexTable) -> TriangleId {
        triangle.make_planes(vertices);
        triangle.create_sphere(vertices);
        let id = TriangleId(self.triangles.len() as u32);
        self.triangles.push(triangle);
        id
    }

    /// Appends a triangle exactly as given, without recomputing derived data
    pub fn push_raw(&mut self, triangle: Triangle) -> TriangleId {
        let id = TriangleId(self.triangles.len() as u32);
        self.triangles.push(triangle);
        id
    }

    /// Number of triangles
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    /// True if the table has no triangles
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Triangle by handle
    pub fn get(&self, id: TriangleId) -> Option<&Triangle> {
        self.triangles.get(id.index())
    }

    /// Iterate triangles with their handles
    pub fn iter(&self) -> impl Iterator<Item = (TriangleId, &Triangle)> {
        self.triangles
            .iter()
            .enumerate()
            .map(|(i, tri)| (TriangleId(i as u32), tri))
    }

    /// All triangles in table order
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Recomputes every triangle's face and edge planes
    pub fn make_planes(&mut self, vertices: &VertexTable) {
        for triangle in &mut self.triangles {
            triangle.make_planes(vertices);
        }
    }

    /// Recomputes every triangle's bounding sphere
    pub fn create_triangle_sphere(&mut self, vertices: &VertexTable) {
        for triangle in &mut self.triangles {
            triangle.create_sphere(vertices);
        }
    }

    /// Largest vertex index referenced by any triangle
    pub fn find_max_vertex_index(&self) -> Option<VertexId> {
        self.triangles
            .iter()
            .flat_map(|tri| tri.vertices)
            .max()
    }

    /// Reads a table written by [`TriangleTable::write`]
    ///
    /// Every vertex index is checked against `vertices`, and planes and
    /// bounding spheres are rebuilt from it.
    pub fn read<R: Read>(
        reader: &mut StreamReader<R>,
        vertices: &VertexTable,
    ) -> Result<Self, StreamError> {
        let count = reader.read_count("triangle")?;
        let mut table = Self::with_capacity(capacity_hint(count));
        for _ in 0..count {
            let mut ids = [VertexId::default(); 3];
            for id in &mut ids {
                let raw = reader.read_i32()?;
                *id = usize::try_from(raw)
                    .ok()
                    .filter(|&i| i < vertices.len())
                    .map(|i| VertexId(i as u32))
                    .ok_or(StreamError::IndexOutOfRange {
                        kind: "vertex",
                        index: i64::from(raw),
                        len: vertices.len(),
                    })?;
            }
            let code = reader.read_u8()?;
            table.push(Triangle::with_code(ids, code), vertices);
        }
        Ok(table)
    }

    /// Writes the triangle count, then three vertex indices and the code byte per triangle
    pub fn write<W: Write>(&self, writer: &mut StreamWriter<W>) -> Result<(), StreamError> {
        writer.write_count(self.triangles.len())?;
        for triangle in &self.triangles {
            for id in triangle.vertices {
                writer.write_count(id.index())?;
            }
            writer.write_u8(triangle.code)?;
        }
        Ok(())
    }
}

impl Index<TriangleId> for TriangleTable {
    type Output = Triangle;

    fn index(&self, id: TriangleId) -> &Triangle {
        &self.triangles[id.index()]
    }
}
