use super::{Point3, Vector3};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Creates a box that contains nothing; the first included point defines it.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point3::from(Vector3::repeat(f64::MAX)),
            max: Point3::from(Vector3::repeat(f64::MIN)),
        }
    }

    /// Creates a degenerate box at the origin.
    #[must_use]
    pub fn at_origin() -> Self {
        Self {
            min: Point3::origin(),
            max: Point3::origin(),
        }
    }

    /// Grows the box to contain `point`.
    pub fn include_point(&mut self, point: &Point3) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Grows the box to contain a box given by its center and full size.
    pub fn include_box(&mut self, center: &Point3, size: &Vector3) {
        let half = size / 2.0;
        self.include_point(&(center - half));
        self.include_point(&(center + half));
    }

    /// Returns the full size of the smallest box centered at `center` that
    /// contains this box.
    #[must_use]
    pub fn symmetric_size(&self, center: &Point3) -> Vector3 {
        let above = self.max - center;
        let below = center - self.min;
        above.sup(&below) * 2.0
    }

    /// Returns the eight corners of a box given by its center and full size.
    #[must_use]
    pub fn corners(center: &Point3, size: &Vector3) -> [Point3; 8] {
        let half = size / 2.0;
        let mut corners = [*center; 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            let sign = |bit: usize| if i & bit == 0 { 1.0 } else { -1.0 };
            *corner += Vector3::new(sign(4) * half.x, sign(2) * half.y, sign(1) * half.z);
        }
        corners
    }
}
