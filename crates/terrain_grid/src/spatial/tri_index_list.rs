//! Growable list of triangle handles

use std::io::{Read, Write};

use crate::collision::{TriangleId, TriangleTable, VertexTable};
use crate::foundation::math::{Mat3, Vec3};
use crate::io::{capacity_hint, StreamError, StreamReader, StreamWriter};

/// Triangle handles gathered for one grid cell or one query
///
/// Duplicates are allowed: merging neighbouring cells does not dedupe, since
/// testing a candidate twice is harmless.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriIndexList {
    indices: Vec<TriangleId>,
    next_count: usize,
}

impl TriIndexList {
    /// Creates an empty list
    pub const fn new() -> Self {
        Self {
            indices: Vec::new(),
            next_count: 0,
        }
    }

    /// Creates an empty list with room for `capacity` handles
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            indices: Vec::with_capacity(capacity),
            next_count: 0,
        }
    }

    /// Clears the list and reserves room for `capacity` handles
    pub fn alloc(&mut self, capacity: usize) {
        self.indices.clear();
        self.indices.reserve(capacity);
        self.next_count = 0;
    }

    /// A list holding every triangle of `table`, in order
    pub fn from_table(table: &TriangleTable) -> Self {
        let mut list = Self::new();
        list.construct_clone(table);
        list
    }

    /// Replaces the contents with every handle `0..table.len()`
    pub fn construct_clone(&mut self, table: &TriangleTable) {
        self.alloc(table.len());
        self.indices.extend(table.iter().map(|(id, _)| id));
    }

    /// Appends one handle
    #[inline]
    pub fn push(&mut self, id: TriangleId) {
        self.indices.push(id);
    }

    /// Appends every handle of `other`
    pub fn concat(&mut self, other: &Self) {
        self.indices.extend_from_slice(&other.indices);
    }

    /// Empties the list, keeping its allocation
    pub fn clear(&mut self) {
        self.indices.clear();
        self.next_count = 0;
    }

    /// Number of handles
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// True if the list holds no handles
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Handles in insertion order
    pub fn as_slice(&self) -> &[TriangleId] {
        &self.indices
    }

    /// Iterate handles in insertion order
    pub fn iter(&self) -> impl Iterator<Item = TriangleId> + '_ {
        self.indices.iter().copied()
    }

    /// True if `id` is in the list
    pub fn contains(&self, id: TriangleId) -> bool {
        self.indices.contains(&id)
    }

    /// Capacity hint computed by the last [`TriIndexList::calc_next_count`]
    pub const fn next_count(&self) -> usize {
        self.next_count
    }

    /// Computes the capacity hint for the next merge of this size and reserves it
    ///
    /// The hint is the current length rounded up to a power of two.
    pub fn calc_next_count(&mut self) -> usize {
        self.next_count = self.indices.len().next_power_of_two();
        self.indices
            .reserve(self.next_count.saturating_sub(self.indices.len()));
        self.next_count
    }

    /// Smallest and largest projection of every referenced vertex onto `axis`,
    /// measured from `origin`. `None` for an empty list.
    pub fn get_min_max(
        &self,
        vertices: &VertexTable,
        triangles: &TriangleTable,
        axis: &Vec3,
        origin: &Vec3,
    ) -> Option<(f32, f32)> {
        if self.is_empty() {
            return None;
        }

        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for corner in self.corners(vertices, triangles) {
            let proj = axis.dot(&(corner - origin));
            min = min.min(proj);
            max = max.max(proj);
        }
        Some((min, max))
    }

    /// Covariance matrix and mean of every referenced vertex position
    ///
    /// Each triangle contributes its three corners equally, so shared vertices
    /// count once per triangle. `None` for an empty list.
    pub fn make_covariance_matrix(
        &self,
        vertices: &VertexTable,
        triangles: &TriangleTable,
    ) -> Option<(Mat3, Vec3)> {
        if self.is_empty() {
            return None;
        }

        let norm = 1.0 / (3.0 * self.len() as f32);
        let mean = self
            .corners(vertices, triangles)
            .fold(Vec3::zeros(), |acc, corner| acc + corner)
            * norm;

        let covariance = self
            .corners(vertices, triangles)
            .fold(Mat3::zeros(), |acc, corner| {
                let dev = corner - mean;
                acc + dev * dev.transpose()
            })
            * norm;

        Some((covariance, mean))
    }

    fn corners<'a>(
        &'a self,
        vertices: &'a VertexTable,
        triangles: &'a TriangleTable,
    ) -> impl Iterator<Item = Vec3> + 'a {
        self.indices
            .iter()
            .flat_map(move |&id| triangles[id].corners(vertices))
    }

    /// Reads a list written by [`TriIndexList::write`], checking every handle
    /// against a table of `triangle_count` triangles
    pub fn read<R: Read>(
        reader: &mut StreamReader<R>,
        triangle_count: usize,
    ) -> Result<Self, StreamError> {
        let count = reader.read_count("index list")?;
        let mut list = Self::with_capacity(capacity_hint(count));
        for _ in 0..count {
            let raw = reader.read_i32()?;
            let index = usize::try_from(raw)
                .ok()
                .filter(|&i| i < triangle_count)
                .ok_or(StreamError::IndexOutOfRange {
                    kind: "triangle",
                    index: i64::from(raw),
                    len: triangle_count,
                })?;
            list.push(TriangleId(index as u32));
        }
        Ok(list)
    }

    /// Writes the count followed by each handle as i32
    pub fn write<W: Write>(&self, writer: &mut StreamWriter<W>) -> Result<(), StreamError> {
        writer.write_count(self.len())?;
        for id in &self.indices {
            writer.write_count(id.index())?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a TriIndexList {
    type Item = TriangleId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, TriangleId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.indices.iter().copied()
    }
}

impl FromIterator<TriangleId> for TriIndexList {
    fn from_iter<I: IntoIterator<Item = TriangleId>>(iter: I) -> Self {
        Self {
            indices: iter.into_iter().collect(),
            next_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{Triangle, VertexId};
    use approx::assert_relative_eq;

    fn single() -> (VertexTable, TriangleTable) {
        let vertices = VertexTable::from_vertices(
            "single",
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(3.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 3.0),
            ],
        );
        let mut triangles = TriangleTable::new();
        triangles.push(Triangle::new([VertexId(0), VertexId(1), VertexId(2)]), &vertices);
        (vertices, triangles)
    }

    #[test]
    fn test_construct_clone_lists_every_triangle() {
        let (vertices, mut triangles) = single();
        triangles.push(Triangle::new([VertexId(2), VertexId(1), VertexId(0)]), &vertices);

        let list = TriIndexList::from_table(&triangles);
        assert_eq!(list.as_slice(), &[TriangleId(0), TriangleId(1)]);
    }

    #[test]
    fn test_concat_keeps_duplicates() {
        let mut a: TriIndexList = [TriangleId(0), TriangleId(1)].into_iter().collect();
        let b: TriIndexList = [TriangleId(1), TriangleId(2)].into_iter().collect();
        a.concat(&b);

        assert_eq!(a.len(), 4);
        assert_eq!(b.len(), 2);
        assert!(a.contains(TriangleId(2)));
    }

    #[test]
    fn test_calc_next_count_rounds_up() {
        let mut list: TriIndexList = (0..5).map(TriangleId).collect();
        assert_eq!(list.calc_next_count(), 8);
        assert_eq!(list.next_count(), 8);

        list.alloc(4);
        assert!(list.is_empty());
        assert_eq!(list.next_count(), 0);
    }

    #[test]
    fn test_get_min_max_projects_onto_axis() {
        let (vertices, triangles) = single();
        let list = TriIndexList::from_table(&triangles);

        let (min, max) = list
            .get_min_max(&vertices, &triangles, &Vec3::x(), &Vec3::new(1.0, 0.0, 0.0))
            .expect("non-empty");
        assert_relative_eq!(min, -1.0);
        assert_relative_eq!(max, 2.0);

        assert!(TriIndexList::new()
            .get_min_max(&vertices, &triangles, &Vec3::x(), &Vec3::zeros())
            .is_none());
    }

    #[test]
    fn test_make_covariance_matrix() {
        let (vertices, triangles) = single();
        let list = TriIndexList::from_table(&triangles);

        let (cov, mean) = list.make_covariance_matrix(&vertices, &triangles).expect("non-empty");
        assert_relative_eq!(mean, Vec3::new(1.0, 0.0, 1.0), epsilon = 1e-5);

        let expected = Mat3::new(
            2.0, 0.0, -1.0,
            0.0, 0.0, 0.0,
            -1.0, 0.0, 2.0,
        );
        assert_relative_eq!(cov, expected, epsilon = 1e-5);
        assert_relative_eq!(cov, cov.transpose());
    }

    #[test]
    fn test_read_write() {
        let list: TriIndexList = [TriangleId(3), TriangleId(0), TriangleId(3)].into_iter().collect();
        let mut writer = StreamWriter::new(Vec::new());
        list.write(&mut writer).unwrap();
        let bytes = writer.into_inner();
        assert_eq!(bytes.len(), 16);

        let mut reader = StreamReader::new(bytes.as_slice());
        assert_eq!(TriIndexList::read(&mut reader, 4).unwrap(), list);
    }

    #[test]
    fn test_read_rejects_out_of_range_handle() {
        let mut writer = StreamWriter::new(Vec::new());
        writer.write_i32(1).unwrap();
        writer.write_i32(9).unwrap();
        let bytes = writer.into_inner();

        let mut reader = StreamReader::new(bytes.as_slice());
        let err = TriIndexList::read(&mut reader, 4).unwrap_err();
        assert!(matches!(err, StreamError::IndexOutOfRange { index: 9, len: 4, .. }));
    }
}
