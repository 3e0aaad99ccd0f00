//! Vertex and triangle storage for stroke geometry.
//!
//! ## Overview
//!
//! A [`Mesh`](struct.Mesh.html) is a pair of growable buffers: vertices, and
//! triangles referencing vertices by their position in the vertex buffer. It is
//! the only output of the extruder and is meant to be uploaded to the GPU as is,
//! which is why the extruder reports which region of the buffers changed after
//! each update (see [`StrokeShapeUpdate`](../struct.StrokeShapeUpdate.html)).
//!
//! The buffers only grow, except when the extruder discards geometry it produced
//! speculatively.

use crate::brush::BrushTipState;
use crate::geom::Envelope;
use crate::math::Point;
use alloc::vec::Vec;

/// A vertex of the stroke mesh.
///
/// Besides the position, vertices carry the color and texture modifiers of the
/// brush tip pose they were generated from.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct StrokeVertex {
    pub position: Point,
    /// Added to the opacity of the brush color, in [-1, 1].
    pub opacity_shift: f32,
    /// Hue (in full turns), saturation and luminosity shifts.
    pub hsl_shift: [f32; 3],
    pub texture_animation_progress_offset: f32,
}

impl StrokeVertex {
    pub fn new(position: Point, tip_state: &BrushTipState) -> Self {
        StrokeVertex {
            position,
            opacity_shift: tip_state.opacity_multiplier - 1.0,
            hsl_shift: [
                tip_state.hue_offset_in_full_turns,
                tip_state.saturation_multiplier - 1.0,
                tip_state.luminosity_shift,
            ],
            texture_animation_progress_offset: tip_state.texture_animation_progress_offset,
        }
    }

    /// A vertex without any modifier.
    pub fn at(position: Point) -> Self {
        StrokeVertex {
            position,
            opacity_shift: 0.0,
            hsl_shift: [0.0; 3],
            texture_animation_progress_offset: 0.0,
        }
    }
}

/// Vertex and triangle buffers.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Mesh {
    vertices: Vec<StrokeVertex>,
    triangles: Vec<[u32; 3]>,
}

impl Mesh {
    /// Constructor
    pub fn new() -> Self {
        Mesh::with_capacity(512, 1024)
    }

    /// Constructor
    pub fn with_capacity(num_vertices: usize, num_triangles: usize) -> Self {
        Mesh {
            vertices: Vec::with_capacity(num_vertices),
            triangles: Vec::with_capacity(num_triangles),
        }
    }

    /// Empty the buffers without freeing memory, for reuse without reallocation.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.triangles.clear();
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    #[inline]
    pub fn triangle_count(&self) -> u32 {
        self.triangles.len() as u32
    }

    #[inline]
    pub fn vertices(&self) -> &[StrokeVertex] {
        &self.vertices
    }

    #[inline]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    #[inline]
    pub fn vertex(&self, index: u32) -> &StrokeVertex {
        &self.vertices[index as usize]
    }

    #[inline]
    pub fn position(&self, index: u32) -> Point {
        self.vertices[index as usize].position
    }

    #[inline]
    pub fn triangle(&self, index: u32) -> [u32; 3] {
        self.triangles[index as usize]
    }

    /// Adds a vertex and returns its index.
    pub fn append_vertex(&mut self, vertex: StrokeVertex) -> u32 {
        self.vertices.push(vertex);
        self.vertices.len() as u32 - 1
    }

    pub fn set_vertex(&mut self, index: u32, vertex: StrokeVertex) {
        self.vertices[index as usize] = vertex;
    }

    pub fn set_position(&mut self, index: u32, position: Point) {
        self.vertices[index as usize].position = position;
    }

    /// Adds a triangle. The indices must refer to existing vertices.
    pub fn append_triangle(&mut self, triangle: [u32; 3]) -> u32 {
        debug_assert!(
            triangle.iter().all(|&i| i < self.vertex_count()),
            "triangle {:?} references a vertex past {}",
            triangle,
            self.vertex_count()
        );
        self.triangles.push(triangle);
        self.triangles.len() as u32 - 1
    }

    pub(crate) fn vertices_mut(&mut self) -> &mut Vec<StrokeVertex> {
        &mut self.vertices
    }

    pub(crate) fn triangles_mut(&mut self) -> &mut Vec<[u32; 3]> {
        &mut self.triangles
    }

    /// Removes vertices and triangles past the provided counts.
    pub fn truncate(&mut self, vertex_count: u32, triangle_count: u32) {
        self.vertices.truncate(vertex_count as usize);
        self.triangles.truncate(triangle_count as usize);
    }

    /// Computes the bounding rectangle of every vertex.
    pub fn bounds(&self) -> Envelope {
        Envelope::from_points(self.vertices.iter().map(|v| v.position))
    }

    /// Twice the signed area of a triangle, positive for counter-clockwise ones.
    pub fn signed_area(&self, triangle: [u32; 3]) -> f32 {
        crate::geom::utils::orientation(
            self.position(triangle[0]),
            self.position(triangle[1]),
            self.position(triangle[2]),
        )
    }
}

#[test]
fn mesh_buffers() {
    use crate::math::point;

    let mut mesh = Mesh::new();
    let a = mesh.append_vertex(StrokeVertex::at(point(0.0, 0.0)));
    let b = mesh.append_vertex(StrokeVertex::at(point(1.0, 0.0)));
    let c = mesh.append_vertex(StrokeVertex::at(point(0.0, 2.0)));
    assert_eq!((a, b, c), (0, 1, 2));
    assert_eq!(mesh.append_triangle([a, b, c]), 0);
    assert_eq!(mesh.signed_area([a, b, c]), 2.0);
    assert_eq!(
        mesh.bounds().as_box(),
        Some(crate::math::Box2D::new(point(0.0, 0.0), point(1.0, 2.0)))
    );

    mesh.set_position(c, point(-1.0, 1.0));
    assert_eq!(mesh.position(c), point(-1.0, 1.0));

    mesh.truncate(1, 0);
    assert_eq!(mesh.vertex_count(), 1);
    assert_eq!(mesh.triangle_count(), 0);

    mesh.clear();
    assert!(mesh.bounds().is_empty());
}

#[test]
fn vertex_attributes_from_tip_state() {
    use crate::math::point;

    let tip_state = BrushTipState {
        opacity_multiplier: 0.5,
        hue_offset_in_full_turns: 0.25,
        saturation_multiplier: 2.0,
        luminosity_shift: -0.5,
        texture_animation_progress_offset: 0.75,
        ..BrushTipState::circle(point(0.0, 0.0), 1.0)
    };
    let vertex = StrokeVertex::new(point(3.0, 4.0), &tip_state);
    assert_eq!(vertex.position, point(3.0, 4.0));
    assert_eq!(vertex.opacity_shift, -0.5);
    assert_eq!(vertex.hsl_shift, [0.25, 1.0, -0.5]);
    assert_eq!(vertex.texture_animation_progress_offset, 0.75);
}
