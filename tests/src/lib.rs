#![cfg(test)]

use quill::brush::input::{InputModelerState, ModeledStrokeInput};
use quill::brush::{BrushCoat, BrushTip, BrushTipState};
use quill::math::{point, Box2D, Point};
use quill::tessellation::{BrushTipExtruder, Mesh, StrokeShapeBuilder};

fn circle(x: f32, y: f32, radius: f32) -> BrushTipState {
    BrushTipState::circle(point(x, y), radius * 2.0)
}

fn assert_box_near(a: Box2D, b: Box2D, tolerance: f32) {
    let d = (a.min - b.min).abs().max((a.max - b.max).abs());
    if d.x > tolerance || d.y > tolerance {
        panic!("assert box near: {:?} != {:?}", a, b);
    }
}

fn check_indices(mesh: &Mesh) {
    for triangle in mesh.triangles() {
        for &index in triangle {
            assert!(index < mesh.vertex_count(), "{:?}", triangle);
        }
    }
}

fn stroke_inputs(points: &[Point]) -> (InputModelerState, Vec<ModeledStrokeInput>) {
    let mut inputs = Vec::with_capacity(points.len());
    let mut distance = 0.0;
    for (i, &position) in points.iter().enumerate() {
        if let Some(prev) = inputs.last() {
            let prev: &ModeledStrokeInput = prev;
            distance += (position - prev.position).length();
        }
        inputs.push(ModeledStrokeInput {
            position,
            traveled_distance: distance,
            elapsed_time: i as f32 * 0.016,
            ..Default::default()
        });
    }

    let elapsed = inputs.last().map(|input| input.elapsed_time).unwrap_or(0.0);
    let state = InputModelerState {
        complete_traveled_distance: distance,
        complete_elapsed_time: elapsed,
        total_real_distance: distance,
        total_real_elapsed_time: elapsed,
        stable_input_count: inputs.len(),
        real_input_count: inputs.len(),
        ..Default::default()
    };

    (state, inputs)
}

#[test]
fn unit_circle() {
    let mut mesh = Mesh::new();
    let mut extruder = BrushTipExtruder::new();
    extruder.start_stroke(0.01, false, &mut mesh);
    extruder.extend_stroke(&mut mesh, &[circle(0.0, 0.0, 1.0)], &[]);

    assert_box_near(
        extruder.bounds().as_box().unwrap(),
        Box2D::new(point(-1.0, -1.0), point(1.0, 1.0)),
        0.06,
    );
    assert_eq!(extruder.bounds(), mesh.bounds());
    check_indices(&mesh);

    let outlines = extruder.outlines();
    assert_eq!(outlines.len(), 1);
    assert!(outlines[0].len() >= 8);
}

#[test]
fn straight_line_triangles_are_counter_clockwise() {
    let mut mesh = Mesh::new();
    let mut extruder = BrushTipExtruder::new();
    extruder.start_stroke(0.01, false, &mut mesh);
    extruder.extend_stroke(
        &mut mesh,
        &[
            circle(0.0, 0.0, 1.0),
            circle(2.0, 0.0, 1.0),
            circle(4.0, 0.0, 1.0),
            circle(6.0, 0.0, 1.0),
        ],
        &[],
    );

    check_indices(&mesh);
    for &triangle in mesh.triangles() {
        assert!(mesh.signed_area(triangle) >= -1e-4, "{:?}", triangle);
    }

    assert_box_near(
        extruder.bounds().as_box().unwrap(),
        Box2D::new(point(-1.0, -1.0), point(7.0, 1.0)),
        0.06,
    );
}

#[test]
fn enclosing_tip_starts_a_new_outline() {
    let mut mesh = Mesh::new();
    let mut extruder = BrushTipExtruder::new();
    extruder.start_stroke(0.01, false, &mut mesh);

    extruder.extend_stroke(&mut mesh, &[circle(0.0, 0.0, 1.0), circle(5.0, 0.0, 1.0)], &[]);
    let first_outline_len = extruder.outlines()[0].len();
    extruder.extend_stroke(&mut mesh, &[circle(3.0, 0.0, 8.0)], &[]);

    let outlines = extruder.outlines();
    assert_eq!(outlines.len(), 2);
    assert_eq!(outlines[0].len(), first_outline_len);
    let bounds = mesh.bounds().as_box().unwrap();
    assert!((bounds.min.x + 5.0).abs() < 0.06);
    assert!((bounds.max.x - 11.0).abs() < 0.06);
    assert_eq!(extruder.bounds(), mesh.bounds());
    check_indices(&mesh);
}

#[test]
fn tip_enclosing_part_of_the_stroke_stays_connected() {
    let mut mesh = Mesh::new();
    let mut extruder = BrushTipExtruder::new();
    extruder.start_stroke(0.01, false, &mut mesh);

    extruder.extend_stroke(
        &mut mesh,
        &[
            circle(0.0, 0.0, 1.0),
            circle(5.0, 0.0, 1.0),
            circle(10.0, 0.0, 1.0),
            circle(15.0, 0.0, 1.0),
        ],
        &[],
    );
    extruder.extend_stroke(&mut mesh, &[circle(12.5, 0.0, 4.2)], &[]);

    assert_eq!(extruder.outlines().len(), 1);
    let bounds = mesh.bounds().as_box().unwrap();
    assert!((bounds.min.x + 1.0).abs() < 0.06);
    assert_eq!(extruder.bounds(), mesh.bounds());
    check_indices(&mesh);
}

#[test]
fn predictions_do_not_leak() {
    let fixed = [circle(0.0, 0.0, 1.0), circle(2.0, 1.0, 1.0)];

    let mut mesh = Mesh::new();
    let mut extruder = BrushTipExtruder::new();
    extruder.start_stroke(0.01, false, &mut mesh);
    extruder.extend_stroke(&mut mesh, &fixed, &[circle(5.0, 5.0, 2.0)]);
    extruder.extend_stroke(&mut mesh, &[], &[circle(-3.0, 2.0, 0.5)]);
    extruder.extend_stroke(&mut mesh, &[], &[]);

    let mut expected_mesh = Mesh::new();
    let mut expected = BrushTipExtruder::new();
    expected.start_stroke(0.01, false, &mut expected_mesh);
    expected.extend_stroke(&mut expected_mesh, &fixed, &[]);

    assert_eq!(mesh.vertices(), expected_mesh.vertices());
    assert_eq!(mesh.triangles(), expected_mesh.triangles());
    assert_eq!(extruder.bounds(), expected.bounds());
}

#[test]
fn builder_pipeline() {
    let points: Vec<Point> = (0..20)
        .map(|i| {
            let x = i as f32 * 0.5;
            point(x, (x * 0.7).sin() * 2.0)
        })
        .collect();

    let mut builder = StrokeShapeBuilder::new();
    builder.start_stroke(&BrushCoat::new(BrushTip::default()), 1.0, 0.01, 7);

    let mut first_update = true;
    for count in 1..=points.len() {
        let (state, inputs) = stroke_inputs(&points[..count]);
        let update = builder.extend_stroke(&state, &inputs);
        if first_update {
            assert_eq!(update.first_vertex_offset, Some(0));
            assert_eq!(update.first_index_offset, Some(0));
            first_update = false;
        }

        assert_eq!(builder.bounds(), builder.mesh().bounds());
        check_indices(builder.mesh());
    }

    let bounds = builder.bounds().as_box().unwrap();
    assert!(bounds.min.x < -0.45);
    assert!(bounds.max.x > 9.95);
    assert_eq!(builder.outlines().len(), 1);
}
