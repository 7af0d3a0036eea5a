use zone_engine::*;

fn a4_points() -> PhysicalSize {
    PhysicalSize::new(595.0, 842.0, Unit::Point).unwrap()
}

#[test]
fn test_canvas_to_vector_example() {
    let (x, y) = canvas_to_vector_coordinates(100.0, 100.0, 800.0, 600.0, 595.0, 842.0);
    assert_eq!(x, 74.375);
    assert_eq!(y, 140.333);

    let (cx, cy) = vector_to_canvas_coordinates(x, y, 800.0, 600.0, 595.0, 842.0);
    assert_eq!((cx, cy), (100.0, 100.0));
}

#[test]
fn test_relative_position_survives_canvas_resize() {
    let small = CoordinateSystem::for_document(800.0, 600.0, a4_points()).unwrap();
    let large = CoordinateSystem::for_document(1600.0, 1200.0, a4_points()).unwrap();

    let rect = Rect::new(100.0, 100.0, 200.0, 150.0);
    let doubled = Rect::new(200.0, 200.0, 400.0, 300.0);
    assert_eq!(
        small.canvas_rect_to_vector(&rect),
        large.canvas_rect_to_vector(&doubled)
    );

    // A stored rect lands at the same relative spot on any canvas
    let stored = small.canvas_rect_to_vector(&rect);
    let on_large = large.vector_rect_to_canvas(&stored);
    assert!((on_large.x - 200.0).abs() < 0.01);
    assert!((on_large.y - 200.0).abs() < 0.01);
}

#[test]
fn test_round_trip_within_a_pixel() {
    let canvases = [(400.0, 300.0), (800.0, 600.0), (1024.0, 768.0), (1600.0, 1200.0)];
    let documents = [(595.0, 842.0), (612.0, 792.0), (1190.55, 841.89), (288.0, 432.0)];

    for (canvas_w, canvas_h) in canvases {
        for (doc_w, doc_h) in documents {
            for i in 0..=7 {
                for j in 0..=7 {
                    let x = canvas_w * i as f64 / 7.0;
                    let y = canvas_h * j as f64 / 7.0;
                    let (vx, vy) =
                        canvas_to_vector_coordinates(x, y, canvas_w, canvas_h, doc_w, doc_h);
                    assert!((vx - x * doc_w / canvas_w).abs() <= 0.001);
                    assert!((vy - y * doc_h / canvas_h).abs() <= 0.001);

                    let (cx, cy) =
                        vector_to_canvas_coordinates(vx, vy, canvas_w, canvas_h, doc_w, doc_h);
                    assert!(
                        (cx - x).abs() <= 0.01,
                        "x {x} came back as {cx} on {canvas_w}x{canvas_h} over {doc_w}x{doc_h}"
                    );
                    assert!(
                        (cy - y).abs() <= 0.01,
                        "y {y} came back as {cy} on {canvas_w}x{canvas_h} over {doc_w}x{doc_h}"
                    );
                }
            }
        }
    }
}

#[test]
fn test_doubling_canvas_and_document_width_keeps_physical_position() {
    let base = CoordinateSystem::new(800.0, 600.0, 595.0, 842.0).unwrap();
    let wide = CoordinateSystem::new(1600.0, 600.0, 1190.0, 842.0).unwrap();

    for (x, y) in [(0.0, 0.0), (100.0, 100.0), (333.3, 512.25), (800.0, 600.0)] {
        let (bx, by) = base.canvas_to_physical(x, y, Unit::Millimeter);
        let (wx, wy) = wide.canvas_to_physical(x, y, Unit::Millimeter);
        assert!((bx - wx).abs() < 1e-9, "x {x}: {bx} vs {wx}");
        assert!((by - wy).abs() < 1e-9, "y {y}: {by} vs {wy}");
    }
}

#[test]
fn test_canvas_to_physical_in_mm() {
    // Canvas showing A4 at one pixel per point
    let system = CoordinateSystem::for_document(595.0, 842.0, a4_points()).unwrap();
    let (x, y) = system.canvas_to_physical(595.0, 842.0, Unit::Millimeter);
    assert!((x - 209.9).abs() < 0.1);
    assert!((y - 297.0).abs() < 0.1);

    let (cx, cy) = system.physical_to_canvas(x, y, Unit::Millimeter);
    assert!((cx - 595.0).abs() < 1e-6);
    assert!((cy - 842.0).abs() < 1e-6);
}

#[test]
fn test_zero_sized_canvas_is_rejected() {
    assert!(matches!(
        CoordinateSystem::new(0.0, 600.0, 595.0, 842.0),
        Err(ZoneError::InvalidDimensions(_))
    ));
}

#[test]
fn test_declared_size_mismatch() {
    let declared: PhysicalSize = "210x297mm".parse().unwrap();
    let letter = PhysicalSize::new(612.0, 792.0, Unit::Point).unwrap();

    let matching = CoordinateSystem::for_document(800.0, 600.0, a4_points())
        .unwrap()
        .with_declared_size(declared);
    assert!(matching.dimensions_match_default());
    assert!(matching.mismatch_warning(0.05).is_none());

    let mismatched = CoordinateSystem::for_document(800.0, 600.0, letter)
        .unwrap()
        .with_declared_size(declared);
    assert!(!mismatched.dimensions_match(0.05));
    // A looser tolerance accepts it
    assert!(mismatched.dimensions_match(0.1));

    let warning = mismatched.mismatch_warning(0.05).unwrap();
    assert!(!warning.orientation_flipped);
    assert!(warning.to_string().contains("may not align"));
}

#[test]
fn test_landscape_upload_for_portrait_template() {
    let declared: PhysicalSize = "210x297mm".parse().unwrap();
    let landscape = PhysicalSize::new(842.0, 595.0, Unit::Point).unwrap();
    let warning = compare_dimensions(&declared, &landscape, 0.05).unwrap();
    assert!(warning.orientation_flipped);
    assert_eq!(landscape.orientation(), Orientation::Landscape);
}

#[test]
fn test_without_declared_size_always_matches() {
    let system = CoordinateSystem::for_document(800.0, 600.0, a4_points()).unwrap();
    assert!(system.dimensions_match(0.0));
}

#[test]
fn test_guides_grow_with_bleed() {
    let system = CoordinateSystem::for_document(800.0, 600.0, a4_points()).unwrap();
    let guides = compute_guides(&system, &BleedSettings::uniform(3.0, Unit::Millimeter), 5.0);

    assert_eq!(guides.trim, Rect::new(0.0, 0.0, 800.0, 600.0));
    assert!(guides.bleed.x < 0.0 && guides.bleed.y < 0.0);
    assert!(guides.bleed.right() > 800.0 && guides.bleed.bottom() > 600.0);
    assert!(guides.safe.x > 0.0 && guides.safe.right() < 800.0);
}

#[test]
fn test_string_unit_conversion() {
    assert!((convert_str(1.0, "in", "mm").unwrap() - 25.4).abs() < 1e-9);
    assert!((convert_str(72.0, "PT", "px").unwrap() - 96.0).abs() < 1e-9);
    assert!(matches!(
        convert_str(1.0, "cm", "mm"),
        Err(ZoneError::UnsupportedUnitKind(unit)) if unit == "cm"
    ));
}

#[test]
fn test_size_conversion_keeps_aspect() {
    let a4: PhysicalSize = "210x297mm".parse().unwrap();
    let in_points = a4.to_unit(Unit::Point, &UnitConverter::default());
    assert!((in_points.width - 595.276).abs() < 0.001);
    assert!((in_points.aspect_ratio() - a4.aspect_ratio()).abs() < 1e-12);
}
