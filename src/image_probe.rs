//! MIME-dispatched image header probes.
//!
//! Probes report dimensions, used channels, and a conservative GPU memory
//! estimate without decoding pixels. PNG and JPEG parsers ship built in;
//! probes for other MIME types (KTX2, WebP) are injected by the host.

use crate::error::{Error, Result};
use byteorder::{BigEndian, ReadBytesExt};
use std::collections::HashMap;
use std::io::{Cursor, Seek, SeekFrom};

/// Red channel bit.
pub const CHANNEL_R: u8 = 1;
/// Green channel bit.
pub const CHANNEL_G: u8 = 2;
/// Blue channel bit.
pub const CHANNEL_B: u8 = 4;
/// Alpha channel bit.
pub const CHANNEL_A: u8 = 8;

/// Header-derived facts about an encoded image.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ImageInfo {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Bitmask of the channels the pixel format carries.
    pub channel_mask: u8,
}

impl ImageInfo {
    /// Number of channels in the pixel format.
    pub fn channel_count(self) -> u32 {
        u32::from(self.channel_mask.count_ones())
    }

    /// Conservative upper bound on GPU memory for the base level, assuming
    /// RGBA8; multiplied by `1 + 1/3` when a mip chain will be generated.
    pub fn gpu_byte_length(self, mipmapped: bool) -> u64 {
        let base = u64::from(self.width) * u64::from(self.height) * 4;
        if mipmapped {
            base + base / 3
        } else {
            base
        }
    }
}

/// A size/channel probe for one image MIME type.
pub trait ImageProbe {
    /// Extracts [`ImageInfo`] from the first bytes of an encoded image.
    fn probe(&self, data: &[u8]) -> Result<ImageInfo>;
}

/// MIME type to probe dispatch table.
pub struct ProbeRegistry {
    probes: HashMap<String, Box<dyn ImageProbe>>,
}

impl Default for ProbeRegistry {
    fn default() -> Self {
        let mut registry = Self {
            probes: HashMap::new(),
        };
        registry.register("image/png", PngProbe);
        registry.register("image/jpeg", JpegProbe);
        registry
    }
}

impl ProbeRegistry {
    /// A registry with the built-in PNG and JPEG probes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a probe for a MIME type, replacing any previous one.
    pub fn register(&mut self, mime_type: &str, probe: impl ImageProbe + 'static) {
        self.probes.insert(mime_type.to_string(), Box::new(probe));
    }

    /// Probes `data` according to its MIME type.
    pub fn probe(&self, mime_type: &str, data: &[u8]) -> Result<ImageInfo> {
        match self.probes.get(mime_type) {
            Some(probe) => probe.probe(data),
            None => Err(Error::EncoderMissing(format!(
                "no image probe registered for {mime_type:?}"
            ))),
        }
    }
}

/// Parses the PNG signature and IHDR chunk.
#[derive(Clone, Copy, Debug, Default)]
pub struct PngProbe;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

impl ImageProbe for PngProbe {
    fn probe(&self, data: &[u8]) -> Result<ImageInfo> {
        if data.len() < 26 || data[..8] != PNG_SIGNATURE {
            return Err(Error::InvalidContainer("not a PNG stream".into()));
        }
        if &data[12..16] != b"IHDR" {
            return Err(Error::InvalidContainer("PNG missing IHDR chunk".into()));
        }
        let mut cursor = Cursor::new(&data[16..]);
        let width = cursor.read_u32::<BigEndian>()?;
        let height = cursor.read_u32::<BigEndian>()?;
        let _bit_depth = cursor.read_u8()?;
        let color_type = cursor.read_u8()?;
        let channel_mask = match color_type {
            0 => CHANNEL_R,
            4 => CHANNEL_R | CHANNEL_A,
            2 | 3 => CHANNEL_R | CHANNEL_G | CHANNEL_B,
            6 => CHANNEL_R | CHANNEL_G | CHANNEL_B | CHANNEL_A,
            other => {
                return Err(Error::InvalidContainer(format!(
                    "PNG color type {other} is not defined"
                )))
            }
        };
        Ok(ImageInfo {
            width,
            height,
            channel_mask,
        })
    }
}

/// Scans JPEG markers for the first start-of-frame segment.
#[derive(Clone, Copy, Debug, Default)]
pub struct JpegProbe;

impl ImageProbe for JpegProbe {
    fn probe(&self, data: &[u8]) -> Result<ImageInfo> {
        let mut cursor = Cursor::new(data);
        let soi = cursor.read_u16::<BigEndian>()?;
        if soi != 0xFFD8 {
            return Err(Error::InvalidContainer("not a JPEG stream".into()));
        }
        loop {
            let mut marker = cursor.read_u8()?;
            if marker != 0xFF {
                return Err(Error::InvalidContainer("JPEG marker desynchronized".into()));
            }
            // Fill bytes pad between segments.
            while marker == 0xFF {
                marker = cursor.read_u8()?;
            }
            match marker {
                // SOF0..SOF15, minus DHT/JPG/DAC which share the range.
                0xC0..=0xCF if marker != 0xC4 && marker != 0xC8 && marker != 0xCC => {
                    let _length = cursor.read_u16::<BigEndian>()?;
                    let _precision = cursor.read_u8()?;
                    let height = u32::from(cursor.read_u16::<BigEndian>()?);
                    let width = u32::from(cursor.read_u16::<BigEndian>()?);
                    let components = cursor.read_u8()?;
                    let channel_mask = match components {
                        1 => CHANNEL_R,
                        3 => CHANNEL_R | CHANNEL_G | CHANNEL_B,
                        _ => CHANNEL_R | CHANNEL_G | CHANNEL_B | CHANNEL_A,
                    };
                    return Ok(ImageInfo {
                        width,
                        height,
                        channel_mask,
                    });
                }
                // Standalone markers carry no length field.
                0xD0..=0xD9 => {}
                _ => {
                    let length = cursor.read_u16::<BigEndian>()?;
                    if length < 2 {
                        return Err(Error::InvalidContainer(
                            "JPEG segment length underflow".into(),
                        ));
                    }
                    cursor.seek(SeekFrom::Current(i64::from(length) - 2))?;
                }
            }
            if cursor.position() as usize >= data.len() {
                return Err(Error::InvalidContainer(
                    "JPEG ended before start-of-frame".into(),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_png(width: u32, height: u32, color_type: u8) -> Vec<u8> {
        let mut data = PNG_SIGNATURE.to_vec();
        data.extend_from_slice(&13u32.to_be_bytes());
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[8, color_type, 0, 0, 0]);
        data
    }

    #[test]
    fn png_probe_reads_ihdr() {
        let info = PngProbe.probe(&tiny_png(640, 480, 6)).unwrap();
        assert_eq!(info.width, 640);
        assert_eq!(info.height, 480);
        assert_eq!(info.channel_count(), 4);
    }

    #[test]
    fn png_probe_rejects_other_formats() {
        assert!(PngProbe.probe(b"not a png at all, promise").is_err());
    }

    #[test]
    fn jpeg_probe_finds_sof() {
        // SOI, APP0 (empty), SOF0 with 2x1 pixels, 3 components.
        let mut data = vec![0xFF, 0xD8];
        data.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x02]);
        data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x0B, 0x08, 0x00, 0x01, 0x00, 0x02, 0x03]);
        let info = JpegProbe.probe(&data).unwrap();
        assert_eq!(info.width, 2);
        assert_eq!(info.height, 1);
        assert_eq!(info.channel_count(), 3);
    }

    #[test]
    fn gpu_estimate_includes_mip_factor() {
        let info = ImageInfo {
            width: 16,
            height: 16,
            channel_mask: CHANNEL_R | CHANNEL_G | CHANNEL_B | CHANNEL_A,
        };
        assert_eq!(info.gpu_byte_length(false), 1024);
        assert_eq!(info.gpu_byte_length(true), 1024 + 341);
    }

    #[test]
    fn registry_reports_missing_probe() {
        let registry = ProbeRegistry::new();
        assert!(matches!(
            registry.probe("image/ktx2", &[]),
            Err(Error::EncoderMissing(_))
        ));
    }
}
