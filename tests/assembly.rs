//! GDAL assembly behavior on synthetic rasters: the nodata rewrite touches
//! only the tag, and both the rewrite and the stack mirror the source's
//! sample type.
use std::fs;
use std::path::Path;

use gdal::raster::{Buffer, GdalDataType, GdalType};
use gdal::{Dataset, DriverManager};
use tempfile::TempDir;

use sarprep::Error;
use sarprep::io::raster::{post_process, stack_and_finalize};

const GEO_TRANSFORM: [f64; 6] = [10.0, 0.5, 0.0, 20.0, 0.0, -0.5];

fn write_raster<T: GdalType + Copy>(path: &Path, values: Vec<T>, nodata: Option<f64>) {
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut ds = driver
        .create_with_band_type::<T, _>(path, 4, 4, 1)
        .unwrap();
    ds.set_geo_transform(&GEO_TRANSFORM).unwrap();
    let mut band = ds.rasterband(1).unwrap();
    if let Some(value) = nodata {
        band.set_no_data_value(Some(value)).unwrap();
    }
    let mut buffer = Buffer::new((4, 4), values);
    band.write((0, 0), (4, 4), &mut buffer).unwrap();
}

fn pols(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

#[test]
fn post_process_rewrites_only_the_nodata_tag() {
    let tmp = TempDir::new().unwrap();
    let values: Vec<f32> = (0..16).map(|v| v as f32 * 0.25).collect();
    write_raster(&tmp.path().join("vv.tif"), values.clone(), Some(-9999.0));

    post_process(tmp.path(), &pols(&["vv"])).unwrap();

    let ds = Dataset::open(tmp.path().join("vv.tif")).unwrap();
    let band = ds.rasterband(1).unwrap();
    assert_eq!(band.no_data_value(), Some(0.0));
    let read = band.read_as::<f32>((0, 0), (4, 4), (4, 4), None).unwrap();
    assert_eq!(read.data(), values.as_slice());
    assert_eq!(ds.geo_transform().unwrap(), GEO_TRANSFORM);
    // the intermediate rewrite file replaced the original
    assert!(!tmp.path().join("updated_vv.tif").exists());
}

#[test]
fn post_process_keeps_float64_samples_exact() {
    let tmp = TempDir::new().unwrap();
    // 0.1 + n has no exact Float32 representation
    let values: Vec<f64> = (0..16).map(|v| 0.1 + v as f64).collect();
    write_raster(&tmp.path().join("vv.tif"), values.clone(), None);

    post_process(tmp.path(), &pols(&["vv"])).unwrap();

    let ds = Dataset::open(tmp.path().join("vv.tif")).unwrap();
    let band = ds.rasterband(1).unwrap();
    assert_eq!(band.band_type(), GdalDataType::Float64);
    let read = band.read_as::<f64>((0, 0), (4, 4), (4, 4), None).unwrap();
    assert_eq!(read.data(), values.as_slice());
}

#[test]
fn stack_keeps_the_source_band_type() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("scene-9");
    fs::create_dir_all(&dir).unwrap();
    write_raster::<u16>(&dir.join("vv.tif"), (0u16..16).collect(), None);
    write_raster::<u16>(&dir.join("vh.tif"), (16u16..32).collect(), None);

    let final_path = stack_and_finalize(&dir, &pols(&["vv", "vh"])).unwrap();
    assert_eq!(final_path, tmp.path().join("scene-9.tif"));

    let ds = Dataset::open(&final_path).unwrap();
    assert_eq!(ds.raster_count() as usize, 2);
    for index in 1..=2 {
        assert_eq!(
            ds.rasterband(index).unwrap().band_type(),
            GdalDataType::UInt16
        );
    }
    let read = ds
        .rasterband(2)
        .unwrap()
        .read_as::<u16>((0, 0), (4, 4), (4, 4), None)
        .unwrap();
    assert_eq!(read.data(), (16u16..32).collect::<Vec<_>>().as_slice());
}

#[test]
fn stacking_without_polarisations_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("scene-0");
    fs::create_dir_all(&dir).unwrap();

    let err = stack_and_finalize(&dir, &[]).unwrap_err();
    assert!(matches!(err, Error::Metadata(_)));
    assert!(dir.exists());
}
