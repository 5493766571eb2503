//! TGA encode/decode
//!
//! The encoder only ever writes uncompressed data with the native-row
//! descriptor bit set. The decoder additionally accepts RLE files produced
//! by other tools.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use super::header::*;
use super::{PixelBuffer, PixelFormat, TgaError};

/// Extension-area offset, developer-area offset, then the TGA 2.0 signature
const FOOTER_SIGNATURE: &[u8; 18] = b"TRUEVISION-XFILE.\0";
pub const FOOTER_SIZE: usize = 4 + 4 + 18;

/// Decode a complete TGA file held in memory
pub fn decode(bytes: &[u8]) -> Result<PixelBuffer, TgaError> {
    let header = TgaHeader::parse(bytes)?;
    debug!("TGA header: {:?}", header);

    if header.color_map_type != 0 {
        return Err(TgaError::ColorMapUnsupported);
    }
    match header.image_type {
        IMAGE_TYPE_TRUE_COLOR
        | IMAGE_TYPE_GRAYSCALE
        | IMAGE_TYPE_RLE_TRUE_COLOR
        | IMAGE_TYPE_RLE_GRAYSCALE => {}
        other => return Err(TgaError::UnknownImageType(other)),
    }
    let format = PixelFormat::from_bits(header.image_bpp)?;

    let mut image = PixelBuffer::new(
        header.image_width as usize,
        header.image_height as usize,
        format,
    )?;

    let start = HEADER_SIZE + header.id_len as usize;
    let payload = bytes.get(start..).unwrap_or(&[]);

    if header.is_rle() {
        let consumed = decode_rle(payload, image.data_mut(), format.bytes_per_pixel())?;
        debug!("RLE payload: {} bytes expanded to {}", consumed, image.data().len());
    } else {
        let size = image.data().len();
        let src = payload.get(..size).ok_or(TgaError::Truncated {
            expected: size,
            actual: payload.len(),
        })?;
        image.data_mut().copy_from_slice(src);
    }

    if header.needs_vertical_flip() {
        image.flip_vertically();
    }
    if header.needs_horizontal_flip() {
        image.flip_horizontally();
    }

    Ok(image)
}

/// Expand RLE packets from `stream` until `out` is full.
///
/// Control byte < 128: raw packet of (value + 1) literal pixels.
/// Control byte >= 128: run packet, one pixel repeated (value - 127) times.
/// Returns the number of stream bytes consumed.
pub fn decode_rle(stream: &[u8], out: &mut [u8], bpp: usize) -> Result<usize, TgaError> {
    let mut pos = 0;
    let mut written = 0;

    while written < out.len() {
        let control = *stream.get(pos).ok_or(TgaError::Truncated {
            expected: pos + 1,
            actual: stream.len(),
        })?;
        pos += 1;

        let (count, raw) = if control < 128 {
            (control as usize + 1, true)
        } else {
            (control as usize - 127, false)
        };

        let requested = count * bpp;
        let remaining = out.len() - written;
        if requested > remaining {
            return Err(TgaError::RlePacketOverrun {
                offset: written,
                requested,
                remaining,
            });
        }

        let read = if raw { requested } else { bpp };
        let src = stream.get(pos..pos + read).ok_or(TgaError::Truncated {
            expected: pos + read,
            actual: stream.len(),
        })?;
        pos += read;

        if raw {
            out[written..written + requested].copy_from_slice(src);
        } else {
            for chunk in out[written..written + requested].chunks_exact_mut(bpp) {
                chunk.copy_from_slice(src);
            }
        }
        written += requested;
    }

    Ok(pos)
}

/// Encode as an uncompressed TGA with the 2.0 footer appended
pub fn encode(image: &PixelBuffer) -> Result<Vec<u8>, TgaError> {
    let (width, height) = (image.width(), image.height());
    let too_large = || TgaError::DimensionTooLarge { width, height };
    let w = u16::try_from(width).map_err(|_| too_large())?;
    let h = u16::try_from(height).map_err(|_| too_large())?;

    let header = TgaHeader::uncompressed(w, h, image.format());

    let mut out = Vec::with_capacity(HEADER_SIZE + image.data().len() + FOOTER_SIZE);
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(image.data());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(FOOTER_SIGNATURE);
    Ok(out)
}

/// Read and decode a TGA file
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<PixelBuffer, TgaError> {
    let bytes = fs::read(path)?;
    decode(&bytes)
}

/// Encode and write a TGA file.
///
/// The bytes land in a sibling `.partial` file first and are renamed into
/// place only once fully written, so a failed write never leaves a
/// truncated image at `path`.
pub fn write_file<P: AsRef<Path>>(image: &PixelBuffer, path: P) -> Result<(), TgaError> {
    let bytes = encode(image)?;
    let path = path.as_ref();
    let partial = partial_path(path);

    let result = fs::write(&partial, &bytes).and_then(|_| fs::rename(&partial, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&partial);
        return Err(e.into());
    }
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::Color;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn header_bytes(image_type: u8, width: u16, height: u16, bits: u8, descriptor: u8) -> Vec<u8> {
        let header = TgaHeader {
            image_type,
            image_width: width,
            image_height: height,
            image_bpp: bits,
            image_descriptor: descriptor,
            ..TgaHeader::default()
        };
        header.to_bytes().to_vec()
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tgarender-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_encode_layout() {
        let mut image = PixelBuffer::new(2, 1, PixelFormat::Rgb).unwrap();
        image.set_pixel(0, 0, Color::new(10, 20, 30)).unwrap();
        image.set_pixel(1, 0, Color::new(40, 50, 60)).unwrap();
        let bytes = encode(&image).unwrap();

        assert_eq!(bytes.len(), HEADER_SIZE + 6 + FOOTER_SIZE);
        assert_eq!(&bytes[..HEADER_SIZE], &header_bytes(2, 2, 1, 24, 0x20)[..]);
        assert_eq!(&bytes[HEADER_SIZE..HEADER_SIZE + 6], &[10, 20, 30, 40, 50, 60]);
        assert_eq!(&bytes[HEADER_SIZE + 6..HEADER_SIZE + 14], &[0; 8]);
        assert_eq!(&bytes[HEADER_SIZE + 14..], b"TRUEVISION-XFILE.\0");
    }

    #[test]
    fn test_encode_grayscale_type() {
        let image = PixelBuffer::new(3, 3, PixelFormat::Grayscale).unwrap();
        let bytes = encode(&image).unwrap();
        assert_eq!(bytes[2], IMAGE_TYPE_GRAYSCALE);
        assert_eq!(bytes[16], 8);
    }

    #[test]
    fn test_encode_rejects_oversized() {
        let image = PixelBuffer::new(70_000, 1, PixelFormat::Grayscale).unwrap();
        assert!(matches!(encode(&image), Err(TgaError::DimensionTooLarge { .. })));
    }

    #[test]
    fn test_roundtrip_random_buffers() {
        let mut rng = StdRng::seed_from_u64(42);
        for &(w, h) in &[(1, 1), (3, 5), (16, 9), (7, 7)] {
            for format in [PixelFormat::Grayscale, PixelFormat::Rgb, PixelFormat::Rgba] {
                let mut data = vec![0u8; w * h * format.bytes_per_pixel()];
                rng.fill(&mut data[..]);
                let image = PixelBuffer::from_raw(w, h, format, data).unwrap();

                let decoded = decode(&encode(&image).unwrap()).unwrap();
                assert_eq!(decoded, image, "{}x{} {:?}", w, h, format);
            }
        }
    }

    #[test]
    fn test_decode_rle_mixed_packets() {
        // 2x3 RGB: raw packet of 2 pixels, run of 3, raw packet of 1
        let mut bytes = header_bytes(IMAGE_TYPE_RLE_TRUE_COLOR, 2, 3, 24, 0x20);
        bytes.extend_from_slice(&[1, 1, 2, 3, 4, 5, 6]);
        bytes.extend_from_slice(&[0x82, 9, 9, 9]);
        bytes.extend_from_slice(&[0, 7, 7, 7]);

        let image = decode(&bytes).unwrap();
        assert_eq!(
            image.data(),
            &[1, 2, 3, 4, 5, 6, 9, 9, 9, 9, 9, 9, 9, 9, 9, 7, 7, 7]
        );
    }

    #[test]
    fn test_decode_rle_grayscale_run() {
        let mut bytes = header_bytes(IMAGE_TYPE_RLE_GRAYSCALE, 4, 1, 8, 0x20);
        bytes.extend_from_slice(&[0x83, 200]);
        let image = decode(&bytes).unwrap();
        assert_eq!(image.format(), PixelFormat::Grayscale);
        assert_eq!(image.data(), &[200, 200, 200, 200]);
    }

    #[test]
    fn test_decode_rle_overrun_rejected() {
        // 2 pixels declared, run packet asks for 3
        let mut bytes = header_bytes(IMAGE_TYPE_RLE_GRAYSCALE, 2, 1, 8, 0x20);
        bytes.extend_from_slice(&[0x82, 1]);
        assert!(matches!(
            decode(&bytes),
            Err(TgaError::RlePacketOverrun { offset: 0, requested: 3, remaining: 2 })
        ));

        // raw packet overruns after one pixel was already written
        let mut bytes = header_bytes(IMAGE_TYPE_RLE_GRAYSCALE, 2, 1, 8, 0x20);
        bytes.extend_from_slice(&[0x00, 5, 0x01, 6, 7]);
        assert!(matches!(
            decode(&bytes),
            Err(TgaError::RlePacketOverrun { offset: 1, requested: 2, remaining: 1 })
        ));
    }

    #[test]
    fn test_decode_rle_truncated_stream() {
        let mut bytes = header_bytes(IMAGE_TYPE_RLE_TRUE_COLOR, 2, 1, 24, 0x20);
        bytes.extend_from_slice(&[0x01, 1, 2, 3]);
        assert!(matches!(decode(&bytes), Err(TgaError::Truncated { .. })));
    }

    #[test]
    fn test_decode_truncated_uncompressed() {
        let mut bytes = header_bytes(IMAGE_TYPE_TRUE_COLOR, 2, 2, 24, 0x20);
        bytes.extend_from_slice(&[0; 11]);
        assert!(matches!(
            decode(&bytes),
            Err(TgaError::Truncated { expected: 12, actual: 11 })
        ));
    }

    #[test]
    fn test_decode_rejects_color_map() {
        let mut bytes = header_bytes(1, 1, 1, 8, 0x20);
        bytes[1] = 1;
        bytes.push(0);
        assert!(matches!(decode(&bytes), Err(TgaError::ColorMapUnsupported)));
    }

    #[test]
    fn test_decode_rejects_unknown_type_and_depth() {
        let mut bytes = header_bytes(9, 1, 1, 24, 0x20);
        bytes.extend_from_slice(&[0; 3]);
        assert!(matches!(decode(&bytes), Err(TgaError::UnknownImageType(9))));

        let mut bytes = header_bytes(IMAGE_TYPE_TRUE_COLOR, 1, 1, 16, 0x20);
        bytes.extend_from_slice(&[0; 2]);
        assert!(matches!(decode(&bytes), Err(TgaError::UnsupportedBitsPerPixel(16))));
    }

    #[test]
    fn test_decode_skips_image_id() {
        let mut bytes = header_bytes(IMAGE_TYPE_GRAYSCALE, 2, 1, 8, 0x20);
        bytes[0] = 3;
        bytes.extend_from_slice(b"abc");
        bytes.extend_from_slice(&[10, 20]);
        assert_eq!(decode(&bytes).unwrap().data(), &[10, 20]);
    }

    #[test]
    fn test_decode_applies_origin_flips() {
        // descriptor 0: rows stored in the opposite order
        let mut bytes = header_bytes(IMAGE_TYPE_GRAYSCALE, 2, 2, 8, 0x00);
        bytes.extend_from_slice(&[1, 2, 3, 4]);
        assert_eq!(decode(&bytes).unwrap().data(), &[3, 4, 1, 2]);

        // right-to-left columns
        let mut bytes = header_bytes(IMAGE_TYPE_GRAYSCALE, 2, 2, 8, 0x30);
        bytes.extend_from_slice(&[1, 2, 3, 4]);
        assert_eq!(decode(&bytes).unwrap().data(), &[2, 1, 4, 3]);
    }

    #[test]
    fn test_write_and_read_file() {
        let path = temp_path("roundtrip.tga");
        let mut image = PixelBuffer::new(3, 2, PixelFormat::Rgba).unwrap();
        image.clear(Color::with_alpha(1, 2, 3, 4));
        write_file(&image, &path).unwrap();

        assert!(!partial_path(&path).exists());
        assert_eq!(read_file(&path).unwrap(), image);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_failed_write_leaves_nothing_behind() {
        let path = temp_path("missing-dir").join("out.tga");
        let image = PixelBuffer::new(1, 1, PixelFormat::Rgb).unwrap();
        assert!(matches!(write_file(&image, &path), Err(TgaError::Io(_))));
        assert!(!path.exists());
        assert!(!partial_path(&path).exists());
    }
}
