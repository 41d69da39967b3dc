//! Integration tests for the on-disk format: files produced by the writers
//! must parse back through the generic object table.

use dxseis::dx::{DataAddress, DataRepr, FileObjectTable, ObjectClass};
use dxseis::prelude::*;

use tempfile::TempDir;

fn sample_geometry() -> (GridGeometry, TimeAxis) {
    let axis = TimeAxis::new(1700.0, 2.0, 4);
    let geometry = GridGeometry::new(
        DVec3::new(10.0, 20.0, axis.origin),
        DVec2::new(0.5, 0.0),
        DVec2::new(0.0, 1.5),
        3,
        2,
    );
    (geometry, axis)
}

#[test]
fn test_cube_header_parses_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cube.dx");
    let (geometry, axis) = sample_geometry();
    drop(CubeWriter::create(&path, geometry, axis).unwrap());

    let table = FileObjectTable::parse(&path).unwrap();
    let classes: Vec<_> = table.objects.iter().map(|o| o.class.clone()).collect();
    assert_eq!(
        classes,
        vec![
            ObjectClass::GridPositions,
            ObjectClass::GridConnections,
            ObjectClass::Array,
            ObjectClass::Field,
        ]
    );

    // one binary data block holding every sample, at the data start
    assert_eq!(table.data_entries.len(), 1);
    let entry = &table.data_entries[0];
    assert_eq!(entry.address, DataAddress::Internal(0));
    assert_eq!(entry.length, 3 * 2 * 4 * 4);
    let samples = &table.objects[entry.object];
    assert_eq!(samples.items, 3 * 2 * 4);
    assert_eq!(samples.data_repr, Some(DataRepr::Lsb));

    // file ends exactly at header plus data block
    let file_len = std::fs::metadata(&path).unwrap().len();
    assert_eq!(file_len, table.data_start + entry.length);
}

#[test]
fn test_cube_grid_params_survive_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cube.dx");
    let (geometry, axis) = sample_geometry();
    drop(CubeWriter::create(&path, geometry, axis).unwrap());

    let table = FileObjectTable::parse(&path).unwrap();
    let grid = table.find_by_class(&ObjectClass::GridPositions).unwrap();
    let params = grid.regarray_params().unwrap();
    assert_eq!(params.counts.as_slice(), &[3, 2, 4]);
    assert_eq!(params.origin[0], 10.0);
    assert_eq!(params.origin[1], 20.0);
    // vertical origin and step are stored downward
    assert_eq!(params.origin[2], -1700.0);
    assert_eq!(params.deltas[2][2], -2.0);
}

#[test]
fn test_cube_field_components() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cube.dx");
    let (geometry, axis) = sample_geometry();
    drop(CubeWriter::create(&path, geometry, axis).unwrap());

    let table = FileObjectTable::parse(&path).unwrap();
    let field = table.find_by_id("default").unwrap();
    assert_eq!(field.component_id("positions").as_deref(), Some("1"));
    assert_eq!(field.component_id("data").as_deref(), Some("3"));
    assert_eq!(field.str_attribute("name").as_deref(), Some("3D"));
}

#[test]
fn test_cube_create_like_copies_layout() {
    let dir = TempDir::new().unwrap();
    let (geometry, axis) = sample_geometry();
    let a = dir.path().join("a.dx");
    drop(CubeWriter::create(&a, geometry, axis).unwrap());

    let source = CubeReader::open(&a).unwrap();
    let b = dir.path().join("b.dx");
    drop(CubeWriter::create_like(&b, &source).unwrap());

    let copy = CubeReader::open(&b).unwrap();
    assert_eq!(copy.geometry(), source.geometry());
    assert_eq!(copy.time_axis(), source.time_axis());
}

#[test]
fn test_line_header_parses_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("line.dx");
    let points = vec![LinePoint::new(100.0, 200.0, 1), LinePoint::new(110.0, 210.0, 2)];
    let axis = TimeAxis::new(1500.0, 4.0, 3);
    drop(LineWriter::create(&path, &points, axis, "Line 7").unwrap());

    let table = FileObjectTable::parse(&path).unwrap();
    let z = table.find_by_class(&ObjectClass::RegularArray).unwrap();
    let params = z.regarray_params().unwrap();
    assert_eq!(params.counts.as_slice(), &[3]);
    assert_eq!(params.origin[2], -1500.0);
    assert_eq!(params.deltas[0][2], -4.0);

    // positions then samples, both relative to the data start
    assert_eq!(table.data_entries.len(), 2);
    assert_eq!(table.data_entries[0].address, DataAddress::Internal(0));
    assert_eq!(table.data_entries[1].address, DataAddress::Internal(2 * 12));
    assert_eq!(table.data_entries[1].length, 2 * 3 * 4);
}

#[test]
fn test_line_create_like_renames() {
    let dir = TempDir::new().unwrap();
    let points = vec![
        LinePoint::new(0.0, 0.0, 1),
        LinePoint::new(5.0, 5.0, 2),
        LinePoint::new(10.0, 10.0, 3),
    ];
    let axis = TimeAxis::new(0.0, 2.0, 2);
    let a = dir.path().join("a.dx");
    drop(LineWriter::create(&a, &points, axis, "old").unwrap());

    let source = LineReader::open(&a).unwrap();
    let b = dir.path().join("b.dx");
    drop(LineWriter::create_like(&b, &source, "new").unwrap());

    let copy = LineReader::open(&b).unwrap();
    assert_eq!(copy.name(), Some("new"));
    assert_eq!(copy.points(), source.points());
    assert_eq!(copy.time_axis(), source.time_axis());
}
