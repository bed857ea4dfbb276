use kurbo::PathEl;

use super::*;

fn p(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

#[test]
fn closed_triangle() {
    let path = parse_path("M0 0 L10 0 L10 10 Z").unwrap();
    assert_eq!(
        path.elements(),
        &[
            PathEl::MoveTo(p(0.0, 0.0)),
            PathEl::LineTo(p(10.0, 0.0)),
            PathEl::LineTo(p(10.0, 10.0)),
            PathEl::ClosePath,
        ]
    );
}

#[test]
fn smooth_cubic_without_prior_control_is_quadratic() {
    let path = parse_path("M0 0 S10 10 20 0").unwrap();
    assert_eq!(
        path.elements(),
        &[
            PathEl::MoveTo(p(0.0, 0.0)),
            PathEl::QuadTo(p(10.0, 10.0), p(20.0, 0.0)),
        ]
    );
}

#[test]
fn smooth_cubic_reflects_non_zero_control() {
    let path = parse_path("M0 0 C5 5 10 10 20 20 S40 40 50 50").unwrap();
    assert_eq!(
        path.elements()[2],
        PathEl::CurveTo(p(30.0, 30.0), p(40.0, 40.0), p(50.0, 50.0))
    );
}

#[test]
fn smooth_cubic_with_zero_coordinate_control_falls_back_to_quadratic() {
    // Previous second control point is (10, 0): one zero coordinate disables reflection.
    let path = parse_path("M0 0 C0 5 10 0 20 20 S40 40 50 50").unwrap();
    assert_eq!(
        path.elements()[2],
        PathEl::QuadTo(p(40.0, 40.0), p(50.0, 50.0))
    );
}

#[test]
fn relative_commands_offset_from_current_point() {
    let path = parse_path("m10 10 l5 0 h5 v5 c1 1 2 2 3 3 q1 0 2 2 z").unwrap();
    assert_eq!(
        path.elements(),
        &[
            PathEl::MoveTo(p(10.0, 10.0)),
            PathEl::LineTo(p(15.0, 10.0)),
            PathEl::LineTo(p(20.0, 10.0)),
            PathEl::LineTo(p(20.0, 15.0)),
            PathEl::CurveTo(p(21.0, 16.0), p(22.0, 17.0), p(23.0, 18.0)),
            PathEl::QuadTo(p(24.0, 18.0), p(25.0, 20.0)),
            PathEl::ClosePath,
        ]
    );
}

#[test]
fn commas_and_extra_whitespace_are_separators() {
    let a = parse_path("M1,2L3,4").unwrap();
    let b = parse_path("  M 1   2 L 3 4 ").unwrap();
    assert_eq!(a, b);
}

#[test]
fn arcs_are_no_ops() {
    let path = parse_path("M0 0 A5 5 0 0 1 10 10 L1 1").unwrap();
    assert_eq!(
        path.elements(),
        &[PathEl::MoveTo(p(0.0, 0.0)), PathEl::LineTo(p(1.0, 1.0))]
    );
}

#[test]
fn arcs_with_missing_arguments_are_still_no_ops() {
    let path = parse_path("M0 0 A5 5 L1 1 a Z").unwrap();
    assert_eq!(
        path.elements(),
        &[
            PathEl::MoveTo(p(0.0, 0.0)),
            PathEl::LineTo(p(1.0, 1.0)),
            PathEl::ClosePath
        ]
    );
}

#[test]
fn repeated_groups_continue_the_command() {
    let path = parse_path("M0 0 5 5 L1 1 2 2").unwrap();
    assert_eq!(
        path.elements(),
        &[
            PathEl::MoveTo(p(0.0, 0.0)),
            PathEl::LineTo(p(5.0, 5.0)),
            PathEl::LineTo(p(1.0, 1.0)),
            PathEl::LineTo(p(2.0, 2.0)),
        ]
    );
}

#[test]
fn exponent_numbers_are_not_split() {
    let path = parse_path("M1e1 2E-1").unwrap();
    assert_eq!(path.elements(), &[PathEl::MoveTo(p(10.0, 0.2))]);
}

#[test]
fn close_returns_to_subpath_start() {
    let path = parse_path("M5 5 L10 5 Z l1 1").unwrap();
    assert_eq!(path.elements()[3], PathEl::MoveTo(p(5.0, 5.0)));
    assert_eq!(path.elements()[4], PathEl::LineTo(p(6.0, 6.0)));
}

#[test]
fn invalid_input_is_a_render_error() {
    assert!(matches!(
        parse_path("M0 zero"),
        Err(SvgaError::RenderTransient(_))
    ));
    assert!(matches!(
        parse_path("M0 0 C1 2"),
        Err(SvgaError::RenderTransient(_))
    ));
    assert!(matches!(
        parse_path("10 10"),
        Err(SvgaError::RenderTransient(_))
    ));
}

#[test]
fn empty_path_is_empty() {
    assert!(parse_path("").unwrap().elements().is_empty());
    assert_eq!(tokenize("Z").unwrap(), vec![Segment { cmd: 'Z', args: vec![] }]);
}
