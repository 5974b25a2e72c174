// Geometry language: parsing table and projection properties

use dims::geometry::Geometry;
use rstest::rstest;

#[rstest]
#[case("100x200", 100.0, 200.0, 0, 0)]
#[case("100", 100.0, 0.0, 0, 0)]
#[case("x50", 0.0, 50.0, 0, 0)]
#[case("10x20+5+7", 10.0, 20.0, 5, 7)]
#[case("10x20+5", 10.0, 20.0, 5, 0)]
#[case("", 0.0, 0.0, 0, 0)]
fn test_parse_sizes_and_offsets(
    #[case] input: &str,
    #[case] width: f64,
    #[case] height: f64,
    #[case] x: i64,
    #[case] y: i64,
) {
    let g = Geometry::parse(input).unwrap();
    assert_eq!((g.width, g.height, g.x, g.y), (width, height, x, y));
}

#[rstest]
#[case("abc")]
#[case("+10+10")]
#[case("10x10+")]
#[case("10x10*")]
#[case("10x10!!x")]
fn test_parse_rejects_malformed(#[case] input: &str) {
    assert!(Geometry::parse(input).is_err(), "{} should not parse", input);
}

#[test]
fn test_error_message_names_column() {
    let err = Geometry::parse("10x10?").unwrap_err();
    assert_eq!(err.column, 5);
    assert!(err.to_string().starts_with("syntax error at column 5"));
}

#[rstest]
#[case("100x100", 512, 256, 100.0, 50.0)]
#[case("100x100!", 512, 256, 100.0, 100.0)]
#[case("50%", 512, 256, 256.0, 128.0)]
#[case("200x200^", 400, 100, 800.0, 200.0)]
#[case("1000x1000>", 300, 200, 300.0, 200.0)]
#[case("10x10<", 300, 200, 300.0, 200.0)]
fn test_project(
    #[case] input: &str,
    #[case] w: u32,
    #[case] h: u32,
    #[case] expected_w: f64,
    #[case] expected_h: f64,
) {
    let g = Geometry::parse(input).unwrap().project(w, h);
    assert!((g.width - expected_w).abs() < 1e-6, "width {}", g.width);
    assert!((g.height - expected_h).abs() < 1e-6, "height {}", g.height);
}

#[test]
fn test_projection_keeps_aspect_ratio_without_force() {
    for (w, h) in [(640u32, 480u32), (100, 300), (1, 1), (4000, 1000)] {
        for spec in ["100x100", "37x91", "250x", "x80", "10%x40%"] {
            let g = Geometry::parse(spec).unwrap().project(w, h);
            let expected = w as f64 / h as f64;
            let actual = g.width / g.height;
            assert!(
                (expected - actual).abs() < 1e-6,
                "{} on {}x{} gave {}x{}",
                spec,
                w,
                h,
                g.width,
                g.height
            );
        }
    }
}

#[test]
fn test_projection_clears_percent_flags() {
    let g = Geometry::parse("50%x50%+10%+10%")
        .unwrap()
        .project(200, 100);
    assert!(!g.flags.width_pct && !g.flags.height_pct);
    assert!(!g.flags.x_pct && !g.flags.y_pct);
    assert_eq!((g.x, g.y), (20, 10));
}
