use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::{ColorType, GrayImage, ImageBuffer, ImageFormat, Luma};
use ndarray::Array2;
use tiff::encoder::{colortype, TiffEncoder};

use crate::error::{PsiiError, Result};
use crate::frame::{Frame, Mask, RatioImage};

/// Load a grayscale TIFF/PNG into a Frame, keeping raw camera counts.
pub fn load_frame(path: &Path) -> Result<Frame> {
    let img = image::open(path)?;
    let sixteen_bit = matches!(
        img.color(),
        ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16
    );

    let frame = if sixteen_bit {
        let gray = img.to_luma16();
        let (w, h) = gray.dimensions();
        let data = Array2::from_shape_fn((h as usize, w as usize), |(row, col)| {
            gray.get_pixel(col as u32, row as u32).0[0]
        });
        Frame::new(data, 16)
    } else {
        let gray = img.to_luma8();
        let (w, h) = gray.dimensions();
        let data = Array2::from_shape_fn((h as usize, w as usize), |(row, col)| {
            gray.get_pixel(col as u32, row as u32).0[0] as u16
        });
        Frame::new(data, 8)
    };

    Ok(frame)
}

/// Save a frame with its raw counts as 16-bit grayscale TIFF.
pub fn save_frame_tiff(frame: &Frame, path: &Path) -> Result<()> {
    let (h, w) = frame.dim();
    let pixels: Vec<u16> = frame.data.iter().copied().collect();

    let img = ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels).ok_or(
        PsiiError::DimensionMismatch {
            expected: (h, w),
            actual: frame.dim(),
        },
    )?;
    img.save_with_format(path, ImageFormat::Tiff)?;
    Ok(())
}

/// Save a mask as 8-bit PNG, plant = 255.
pub fn save_mask_png(mask: &Mask, path: &Path) -> Result<()> {
    let (h, w) = mask.dim();

    let mut img = GrayImage::new(w as u32, h as u32);
    for ((row, col), &plant) in mask.data.indexed_iter() {
        if plant {
            img.put_pixel(col as u32, row as u32, Luma([255]));
        }
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Load a mask image; any non-zero pixel is plant.
pub fn load_mask(path: &Path) -> Result<Mask> {
    let gray = image::open(path)?.to_luma8();
    let (w, h) = gray.dimensions();
    let data = Array2::from_shape_fn((h as usize, w as usize), |(row, col)| {
        gray.get_pixel(col as u32, row as u32).0[0] > 0
    });
    Ok(Mask::new(data))
}

/// Save a ratio image as single-channel 32-bit float TIFF.
pub fn save_ratio_tiff(image: &RatioImage, path: &Path) -> Result<()> {
    let (h, w) = image.dim();
    let pixels: Vec<f32> = image.iter().copied().collect();

    let mut writer = BufWriter::new(File::create(path)?);
    {
        let mut encoder = TiffEncoder::new(&mut writer)?;
        encoder.write_image::<colortype::Gray32Float>(w as u32, h as u32, &pixels)?;
    }
    writer.flush()?;
    Ok(())
}
