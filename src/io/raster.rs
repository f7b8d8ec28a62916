//! GDAL-backed output assembly: nodata rewriting, multi-band stacking with
//! band descriptions, and the final rename/relocate/cleanup of each scene's
//! output directory.
use std::fs;
use std::path::{Path, PathBuf};

use gdal::raster::{Buffer, GdalDataType, GdalType, RasterBand, RasterCreationOptions};
use gdal::{Dataset, Driver, DriverManager, Metadata};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Rows copied per windowed read, keeping memory bounded for large scenes.
const STRIPE_ROWS: usize = 512;

/// Rewrite each polarisation raster so its nodata value is 0, which
/// downstream GIS tools recognise. Pixel data and the spatial profile are
/// preserved; the rewrite goes through a temporary `updated_<pol>.tif` that
/// then replaces the original.
pub fn post_process(dir: &Path, pols: &[String]) -> Result<()> {
    for pol in pols {
        let original = dir.join(format!("{pol}.tif"));
        let updated = dir.join(format!("updated_{pol}.tif"));
        rewrite_nodata(&original, &updated, 0.0)?;
        fs::remove_file(&original)?;
        fs::rename(&updated, &original)?;
    }
    Ok(())
}

fn rewrite_nodata(src_path: &Path, dst_path: &Path, nodata: f64) -> Result<()> {
    let src = Dataset::open(src_path)?;
    let (cols, rows) = src.raster_size();
    let bands = src.raster_count() as usize;
    let band_type = src.rasterband(1)?.band_type();

    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut dst = create_like(&driver, dst_path, (cols, rows), bands, band_type, None)?;
    copy_spatial_profile(&src, &mut dst)?;

    for index in 1..=bands {
        let src_band = src.rasterband(index)?;
        let mut dst_band = dst.rasterband(index)?;
        dst_band.set_no_data_value(Some(nodata))?;
        copy_band(&src_band, &mut dst_band, cols, rows)?;
    }
    Ok(())
}

/// Stack the per-polarisation rasters of one output directory into a single
/// multi-band GeoTIFF: band *i* is band 1 of polarisation file *i*, described
/// by its polarisation code. The stack is renamed after the output id, moved
/// up to the output root, and the per-id directory is removed. Returns the
/// final artifact path.
pub fn stack_and_finalize(dir: &Path, pols: &[String]) -> Result<PathBuf> {
    if pols.is_empty() {
        return Err(Error::Metadata(format!(
            "no polarisation rasters to stack in {}",
            dir.display()
        )));
    }
    let id = dir
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::Metadata(format!("output directory {} has no name", dir.display())))?
        .to_string();

    let stack_path = dir.join("stack.tif");
    info!("Writing started.");
    write_stack(dir, pols, &stack_path)?;
    info!("Writing is finished.");

    for pol in pols {
        fs::remove_file(dir.join(format!("{pol}.tif")))?;
    }

    let named = dir.join(format!("{id}.tif"));
    fs::rename(&stack_path, &named)?;

    let parent = dir
        .parent()
        .ok_or_else(|| Error::Metadata(format!("{} has no parent directory", dir.display())))?;
    let final_path = parent.join(format!("{id}.tif"));
    move_file(&named, &final_path)?;

    remove_dir_best_effort(dir);
    Ok(final_path)
}

fn write_stack(dir: &Path, pols: &[String], stack_path: &Path) -> Result<()> {
    let first = Dataset::open(dir.join(format!("{}.tif", pols[0])))?;
    let (cols, rows) = first.raster_size();
    let first_band = first.rasterband(1)?;
    let nodata = first_band.no_data_value();
    let band_type = first_band.band_type();
    drop(first_band);

    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let options = RasterCreationOptions::from_iter(["COMPRESS=LZW", "BIGTIFF=IF_SAFER"]);
    let mut dst = create_like(
        &driver,
        stack_path,
        (cols, rows),
        pols.len(),
        band_type,
        Some(&options),
    )?;
    copy_spatial_profile(&first, &mut dst)?;
    drop(first);

    for (index, pol) in pols.iter().enumerate() {
        let src = Dataset::open(dir.join(format!("{pol}.tif")))?;
        let src_band = src.rasterband(1)?;
        let mut dst_band = dst.rasterband(index + 1)?;
        if let Some(value) = nodata {
            dst_band.set_no_data_value(Some(value))?;
        }
        copy_band(&src_band, &mut dst_band, cols, rows)?;
        dst_band.set_description(pol)?;
    }
    Ok(())
}

fn copy_spatial_profile(src: &Dataset, dst: &mut Dataset) -> Result<()> {
    if let Ok(transform) = src.geo_transform() {
        dst.set_geo_transform(&transform)?;
    }
    let projection = src.projection();
    if !projection.is_empty() {
        dst.set_projection(&projection)?;
    }
    Ok(())
}

/// GTiff bands share one data type; mirror the source's. 64-bit integer and
/// Int8 sources fall back to Float64, which covers their value range.
fn create_like(
    driver: &Driver,
    path: &Path,
    size: (usize, usize),
    bands: usize,
    band_type: GdalDataType,
    options: Option<&RasterCreationOptions>,
) -> Result<Dataset> {
    macro_rules! create {
        ($t:ty) => {
            match options {
                Some(opts) => driver
                    .create_with_band_type_with_options::<$t, _>(path, size.0, size.1, bands, opts)?,
                None => driver.create_with_band_type::<$t, _>(path, size.0, size.1, bands)?,
            }
        };
    }
    Ok(match band_type {
        GdalDataType::UInt8 => create!(u8),
        GdalDataType::UInt16 => create!(u16),
        GdalDataType::Int16 => create!(i16),
        GdalDataType::UInt32 => create!(u32),
        GdalDataType::Int32 => create!(i32),
        GdalDataType::Float32 => create!(f32),
        _ => create!(f64),
    })
}

/// Dispatch the stripe copy on the source band's sample type so values pass
/// through unconverted.
fn copy_band(src: &RasterBand, dst: &mut RasterBand, cols: usize, rows: usize) -> Result<()> {
    match src.band_type() {
        GdalDataType::UInt8 => copy_band_as::<u8>(src, dst, cols, rows),
        GdalDataType::UInt16 => copy_band_as::<u16>(src, dst, cols, rows),
        GdalDataType::Int16 => copy_band_as::<i16>(src, dst, cols, rows),
        GdalDataType::UInt32 => copy_band_as::<u32>(src, dst, cols, rows),
        GdalDataType::Int32 => copy_band_as::<i32>(src, dst, cols, rows),
        GdalDataType::Float32 => copy_band_as::<f32>(src, dst, cols, rows),
        _ => copy_band_as::<f64>(src, dst, cols, rows),
    }
}

fn copy_band_as<T: GdalType + Copy>(
    src: &RasterBand,
    dst: &mut RasterBand,
    cols: usize,
    rows: usize,
) -> Result<()> {
    let mut row = 0usize;
    while row < rows {
        let height = STRIPE_ROWS.min(rows - row);
        let mut buffer: Buffer<T> =
            src.read_as::<T>((0, row as isize), (cols, height), (cols, height), None)?;
        dst.write((0, row as isize), (cols, height), &mut buffer)?;
        row += height;
    }
    Ok(())
}

/// Rename, falling back to copy-and-remove for cross-device moves.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_err() {
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}

/// Residual files can make directory removal fail on some filesystems; fall
/// back to unlinking whatever is left.
fn remove_dir_best_effort(dir: &Path) {
    if let Err(e) = fs::remove_dir_all(dir) {
        warn!(
            "Could not remove {}: {e}; unlinking remaining files individually",
            dir.display()
        );
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let _ = fs::remove_file(entry.path());
            }
        }
    }
}
