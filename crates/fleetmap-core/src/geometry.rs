//! Geometric primitives for topology layout.
//!
//! This module provides the small set of geometric types the layout engine
//! works with.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate or displacement vector in world space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - An axis-aligned box defined by minimum and maximum corners
//! - [`Circle`] - A ring used to place siblings, with two reserved gaps
//! - [`PolarVector`] - An angle/distance pair convertible to and from a [`Point`]
//!
//! # Coordinate System
//!
//! World coordinates follow the usual screen convention:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! Angles are measured from +X towards +Y, so `π/2` points *down* the screen.

use std::f32::consts::TAU;

use serde::Serialize;

/// Default number of unit steps reserved on either side of each ring gap.
pub const RING_GAP_SKIP: usize = 2;

/// A 2D point, also used as a displacement vector.
///
/// # Examples
///
/// ```
/// # use fleetmap_core::geometry::Point;
/// let p = Point::new(3.0, 4.0);
/// assert_eq!(p.hypot(), 5.0);
///
/// let moved = p.add_point(Point::new(1.0, 1.0)).scale(2.0);
/// assert_eq!(moved, Point::new(8.0, 10.0));
/// ```
#[doc(alias = "Vector")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Checks if both x and y coordinates are zero
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Adds another point to this point, returning a new point
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Calculates the hypotenuse (Euclidean distance from origin)
    pub fn hypot(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance between two points
    pub fn distance(self, other: Point) -> f32 {
        self.sub_point(other).hypot()
    }

    /// Multiplies both coordinates by the given factor
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Returns the unit vector pointing the same way, or zero for the zero vector
    pub fn normalize(self) -> Self {
        let length = self.hypot();
        if length == 0.0 {
            Self::default()
        } else {
            self.scale(1.0 / length)
        }
    }
}

/// Represents the dimensions of an element with width and height
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns the larger of the two dimensions
    pub fn largest_side(self) -> f32 {
        self.width.max(self.height)
    }
}

/// An axis-aligned box defined by its minimum and maximum corners.
///
/// A `Bounds` value is always fully formed; code that has not placed a node
/// yet holds `Option<Bounds>` rather than a partially populated box.
#[doc(alias = "Rectangle")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates bounds from two opposite corners, in any order
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    /// Creates a `width` x `height` box centered on the coordinate origin.
    ///
    /// ```
    /// # use fleetmap_core::geometry::{Bounds, Point};
    /// let node_box = Bounds::from_center(240.0, 80.0);
    /// assert_eq!(node_box.center(), Point::new(0.0, 0.0));
    /// assert_eq!(node_box.min_x(), -120.0);
    /// ```
    pub fn from_center(width: f32, height: f32) -> Self {
        Self::new_from_center(Point::default(), Size::new(width, height))
    }

    /// Creates a new bounds from a center point and a size
    pub fn new_from_center(center: Point, size: Size) -> Self {
        let half_width = size.width / 2.0;
        let half_height = size.height / 2.0;
        Self {
            min_x: center.x - half_width,
            min_y: center.y - half_height,
            max_x: center.x + half_width,
            max_y: center.y + half_height,
        }
    }

    /// Returns the minimum x-coordinate of the bounds
    pub fn min_x(self) -> f32 {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> f32 {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> f32 {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
    pub fn max_y(self) -> f32 {
        self.max_y
    }

    /// Returns the top-left corner
    pub fn min_point(self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    /// Returns the bottom-right corner
    pub fn max_point(self) -> Point {
        Point::new(self.max_x, self.max_y)
    }

    /// Returns the width of the bounds
    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Returns the larger of width and height
    pub fn largest_side(self) -> f32 {
        self.width().max(self.height())
    }

    /// Returns the center point of the bounds
    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Converts bounds to a Size object
    pub fn to_size(self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// Moves the bounds by the specified offset
    pub fn translate(&self, offset: Point) -> Self {
        Self {
            min_x: self.min_x + offset.x,
            min_y: self.min_y + offset.y,
            max_x: self.max_x + offset.x,
            max_y: self.max_y + offset.y,
        }
    }

    /// Returns true when the two boxes share any interior area
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }
}

/// A direction and distance, convertible to a cartesian [`Point`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PolarVector {
    radians: f32,
    distance: f32,
}

impl PolarVector {
    pub fn new(radians: f32, distance: f32) -> Self {
        Self { radians, distance }
    }

    /// Converts a cartesian vector into its polar form.
    ///
    /// The angle is in `(-π, π]`, as returned by `atan2`.
    pub fn from_cartesian(vector: Point) -> Self {
        Self {
            radians: vector.y.atan2(vector.x),
            distance: vector.hypot(),
        }
    }

    pub fn radians(self) -> f32 {
        self.radians
    }

    pub fn distance(self) -> f32 {
        self.distance
    }

    /// The angle converted to degrees
    pub fn degrees(self) -> f32 {
        self.radians.to_degrees()
    }

    pub fn to_cartesian(self) -> Point {
        Point::new(
            self.distance * self.radians.cos(),
            self.distance * self.radians.sin(),
        )
    }
}

/// A ring used to distribute siblings around a common center.
///
/// Besides plain evenly spaced steps ([`Circle::step`]), the ring can hand
/// out positions that keep two angular gaps free, one around the bottom
/// (`π/2`) and one around the top (`3π/2`), see [`Circle::steps`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    center: Point,
    radius: f32,
    gap_skip: usize,
}

impl Circle {
    pub fn new(center: Point, radius: f32) -> Self {
        Self {
            center,
            radius,
            gap_skip: RING_GAP_SKIP,
        }
    }

    /// Returns a copy reserving `gap_skip` raw steps on either side of each gap.
    pub fn with_gap_skip(mut self, gap_skip: usize) -> Self {
        self.gap_skip = gap_skip;
        self
    }

    /// A ring around the coordinate origin
    pub fn from_radius(radius: f32) -> Self {
        Self::new(Point::default(), radius)
    }

    /// The ring centered on `bounds` whose radius is the box's largest side
    pub fn from_bounds(bounds: Bounds) -> Self {
        Self::new(bounds.center(), bounds.largest_side())
    }

    pub fn center(self) -> Point {
        self.center
    }

    pub fn radius(self) -> f32 {
        self.radius
    }

    pub fn gap_skip(self) -> usize {
        self.gap_skip
    }

    pub fn diameter(self) -> f32 {
        self.radius * 2.0
    }

    pub fn circumference(self) -> f32 {
        std::f32::consts::PI * self.diameter()
    }

    /// Point on the ring at angle `2π * index / length`.
    ///
    /// A `length` of zero is treated as one.
    pub fn step(self, index: usize, length: usize) -> Point {
        let angle = TAU * index as f32 / length.max(1) as f32;
        self.center
            .add_point(PolarVector::new(angle, self.radius).to_cartesian())
    }

    /// Positions for `length` items around the ring, leaving two gaps free.
    ///
    /// The ring is over-sampled into `length + 4 * gap_skip` raw steps.
    /// Steps within `gap_skip` of either gap center are dropped, which leaves
    /// exactly `length` points once the ring is large enough (and a couple
    /// of spare points for tiny inputs). A skip of zero disables the gaps.
    /// Points come back in angular order.
    ///
    /// ```
    /// # use fleetmap_core::geometry::Circle;
    /// let ring = Circle::from_radius(100.0);
    /// let steps = ring.steps(6);
    /// assert_eq!(steps.len(), 6);
    /// ```
    pub fn steps(self, length: usize) -> Vec<Point> {
        let count = self.raw_step_count(length);
        let (quarter, subquarter) = Self::gap_indices(count);
        let skip = self.gap_skip;

        (0..count)
            .filter(|&index| !(index + skip >= quarter && index < quarter + skip))
            .filter(|&index| !(index + skip > subquarter && index <= subquarter + skip))
            .map(|index| self.step(index, count))
            .collect()
    }

    /// Angles, in radians, of the two gap centers [`Circle::steps`] keeps clear for `length` items
    pub fn gap_angles(self, length: usize) -> [f32; 2] {
        let count = self.raw_step_count(length);
        let (quarter, subquarter) = Self::gap_indices(count);
        [
            TAU * quarter as f32 / count as f32,
            TAU * subquarter as f32 / count as f32,
        ]
    }

    /// Angle between two neighbouring raw steps for `length` items
    pub fn angular_step(self, length: usize) -> f32 {
        TAU / self.raw_step_count(length) as f32
    }

    fn raw_step_count(self, length: usize) -> usize {
        length + self.gap_skip * 4
    }

    fn gap_indices(count: usize) -> (usize, usize) {
        let quarter = (count as f32 / 4.0).round() as usize;
        (quarter, count - quarter)
    }
}
