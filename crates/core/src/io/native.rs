//! GeoTIFF reading/writing for single-band radiance composites
//!
//! Uses the `tiff` crate. Only north-up grids described by the
//! ModelPixelScale/ModelTiepoint tag pair are understood, which covers
//! the monthly and annual NTL composites this crate consumes.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray64Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

/// Read the first band of a GeoTIFF file
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(BufReader::new(file))
}

/// Read a GeoTIFF from an in-memory buffer
pub fn read_geotiff_from_buffer<T>(data: &[u8]) -> Result<Raster<T>>
where
    T: RasterElement,
{
    decode_geotiff(Cursor::new(data))
}

fn cast_all<S, T>(buf: Vec<S>) -> Vec<T>
where
    S: num_traits::NumCast + Copy,
    T: RasterElement,
{
    buf.into_iter()
        .map(|v| num_traits::cast(v).unwrap_or(T::default_nodata()))
        .collect()
}

fn decode_geotiff<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: std::io::Read + std::io::Seek,
{
    let mut decoder =
        Decoder::new(reader).map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {}", e)))?;

    let rows = height as usize;
    let cols = width as usize;

    let result = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {}", e)))?;

    let data: Vec<T> = match result {
        DecodingResult::F32(buf) => cast_all(buf),
        DecodingResult::F64(buf) => cast_all(buf),
        DecodingResult::U8(buf) => cast_all(buf),
        DecodingResult::U16(buf) => cast_all(buf),
        DecodingResult::U32(buf) => cast_all(buf),
        DecodingResult::I16(buf) => cast_all(buf),
        DecodingResult::I32(buf) => cast_all(buf),
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Some(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }

    let nodata = decoder
        .get_tag_ascii_string(Tag::Unknown(GDAL_NODATA))
        .ok()
        .and_then(|s| s.trim_matches(char::from(0)).trim().parse::<f64>().ok())
        .and_then(num_traits::cast::<f64, T>);
    raster.set_nodata(nodata);

    Ok(raster)
}

fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_PIXEL_SCALE)).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_TIEPOINT)).ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }

    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

/// Write a raster as a single-band 64-bit float GeoTIFF
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    encode_geotiff(raster, BufWriter::new(file))
}

/// Write a raster to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer<T>(raster: &Raster<T>) -> Result<Vec<u8>>
where
    T: RasterElement,
{
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf))?;
    Ok(buf)
}

fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W) -> Result<()>
where
    T: RasterElement,
    W: std::io::Write + std::io::Seek,
{
    let mut encoder =
        TiffEncoder::new(writer).map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;

    let (rows, cols) = raster.shape();

    // no-data cells are written as NaN regardless of the source sentinel
    let data: Vec<f64> = raster
        .data()
        .iter()
        .map(|&v| {
            if raster.is_nodata(v) {
                f64::NAN
            } else {
                num_traits::cast(v).unwrap_or(f64::NAN)
            }
        })
        .collect();

    let mut image = encoder
        .new_image::<Gray64Float>(cols as u32, rows as u32)
        .map_err(|e| Error::Other(format!("Cannot create TIFF image: {}", e)))?;

    let gt = raster.transform();
    let tag_err = |e: tiff::TiffError| Error::Other(format!("Cannot write GeoTIFF tag: {}", e));

    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &scale[..])
        .map_err(tag_err)?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_TIEPOINT), &tiepoint[..])
        .map_err(tag_err)?;

    // Version 1.1.0 with two keys: geographic model, pixel-is-area
    let geokeys: [u16; 12] = [1, 1, 0, 2, 1024, 0, 1, 2, 1025, 0, 1, 1];
    image
        .encoder()
        .write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), &geokeys[..])
        .map_err(tag_err)?;

    image
        .encoder()
        .write_tag(Tag::Unknown(GDAL_NODATA), "nan")
        .map_err(tag_err)?;

    image
        .write_data(&data)
        .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))?;

    Ok(())
}
