//! The single-file binary container.
//!
//! Layout: a 12-byte header (`glTF` magic, version 2, total length), a JSON
//! chunk, and an optional BIN chunk. Chunks are 4-byte aligned; JSON pads
//! with spaces, BIN with zero bytes.

use crate::error::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::borrow::Cow;
use std::io;

/// The `glTF` magic number.
pub const MAGIC: [u8; 4] = *b"glTF";

/// Size of the container header in bytes.
pub const HEADER_LENGTH: usize = 12;

/// Size of one chunk header in bytes.
pub const CHUNK_HEADER_LENGTH: usize = 8;

/// Binary glTF contents.
#[derive(Clone, Debug)]
pub struct Glb<'a> {
    /// The header section of the `.glb` file.
    pub header: Header,
    /// The JSON chunk.
    pub json: Cow<'a, [u8]>,
    /// The optional BIN chunk.
    pub bin: Option<Cow<'a, [u8]>>,
}

/// The header section of a `.glb` file.
#[derive(Clone, Copy, Debug)]
pub struct Header {
    /// Must be `b"glTF"`.
    pub magic: [u8; 4],
    /// Must be `2`.
    pub version: u32,
    /// Must match the length of the parent `.glb` file.
    pub length: u32,
}

/// GLB chunk type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ChunkType {
    Json,
    Bin,
}

struct ChunkHeader {
    length: u32,
    ty: ChunkType,
}

fn align_to_multiple_of_four(n: &mut usize) {
    *n = (*n + 3) & !3;
}

impl Header {
    fn from_reader<R: io::Read>(mut reader: R) -> Result<Self> {
        let mut magic = [0; 4];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(Error::InvalidContainer(format!(
                "magic {magic:?} is not glTF"
            )));
        }
        Ok(Self {
            magic,
            version: reader.read_u32::<LittleEndian>()?,
            length: reader.read_u32::<LittleEndian>()?,
        })
    }
}

impl ChunkHeader {
    fn from_reader<R: io::Read>(mut reader: R) -> Result<Self> {
        let length = reader.read_u32::<LittleEndian>()?;
        let mut ty = [0; 4];
        reader.read_exact(&mut ty)?;
        let ty = match &ty {
            b"JSON" => ChunkType::Json,
            b"BIN\0" => ChunkType::Bin,
            other => {
                return Err(Error::InvalidContainer(format!(
                    "unknown chunk type {other:?}"
                )))
            }
        };
        Ok(Self { length, ty })
    }
}

fn split_chunks(mut data: &[u8]) -> Result<(&[u8], Option<&[u8]>)> {
    let json_header = ChunkHeader::from_reader(&mut data)?;
    if json_header.ty != ChunkType::Json {
        return Err(Error::InvalidContainer(
            "first chunk must be JSON".into(),
        ));
    }
    if json_header.length as usize > data.len() {
        return Err(Error::InvalidContainer(format!(
            "JSON chunk length {} exceeds remaining {} bytes",
            json_header.length,
            data.len()
        )));
    }
    let (json, mut rest) = data.split_at(json_header.length as usize);

    let bin = if rest.is_empty() {
        None
    } else {
        let bin_header = ChunkHeader::from_reader(&mut rest)?;
        if bin_header.ty != ChunkType::Bin {
            return Err(Error::InvalidContainer(
                "second chunk must be BIN".into(),
            ));
        }
        if bin_header.length as usize > rest.len() {
            return Err(Error::InvalidContainer(format!(
                "BIN chunk length {} exceeds remaining {} bytes",
                bin_header.length,
                rest.len()
            )));
        }
        // A zero-length BIN chunk (header only) is valid.
        Some(&rest[..bin_header.length as usize])
    };
    Ok((json, bin))
}

impl<'a> Glb<'a> {
    /// Whether `data` starts with the binary container magic.
    pub fn sniff(data: &[u8]) -> bool {
        data.starts_with(&MAGIC)
    }

    /// Splits a loaded `.glb` into its header, JSON chunk, and optional BIN
    /// chunk.
    pub fn from_slice(mut data: &'a [u8]) -> Result<Self> {
        let header = Header::from_reader(&mut data)?;
        if header.version != 2 {
            return Err(Error::InvalidContainer(format!(
                "unsupported container version {}",
                header.version
            )));
        }
        let declared = (header.length as usize)
            .checked_sub(HEADER_LENGTH)
            .ok_or_else(|| {
                Error::InvalidContainer("declared length shorter than the header".into())
            })?;
        if declared > data.len() {
            return Err(Error::InvalidContainer(format!(
                "declared length {} exceeds {} bytes read",
                header.length,
                data.len() + HEADER_LENGTH
            )));
        }
        let (json, bin) = split_chunks(&data[..declared])?;
        Ok(Glb {
            header,
            json: json.into(),
            bin: bin.map(Into::into),
        })
    }

    /// Reads binary glTF from a generic stream.
    pub fn from_reader<R: io::Read>(mut reader: R) -> Result<Glb<'static>> {
        let header = Header::from_reader(&mut reader)?;
        if header.version != 2 {
            return Err(Error::InvalidContainer(format!(
                "unsupported container version {}",
                header.version
            )));
        }
        let declared = (header.length as usize)
            .checked_sub(HEADER_LENGTH)
            .ok_or_else(|| {
                Error::InvalidContainer("declared length shorter than the header".into())
            })?;
        let mut buf = vec![0; declared];
        reader.read_exact(&mut buf)?;
        let (json, bin) = split_chunks(&buf)?;
        Ok(Glb {
            header,
            json: json.to_vec().into(),
            bin: bin.map(|b| b.to_vec().into()),
        })
    }

    /// Total container length after padding, as written by
    /// [`to_writer`](Self::to_writer).
    pub fn padded_length(&self) -> usize {
        let mut length = HEADER_LENGTH + CHUNK_HEADER_LENGTH + self.json.len();
        align_to_multiple_of_four(&mut length);
        if let Some(bin) = self.bin.as_ref() {
            length += CHUNK_HEADER_LENGTH + bin.len();
            align_to_multiple_of_four(&mut length);
        }
        length
    }

    /// Writes the container to a writer.
    pub fn to_writer<W: io::Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&MAGIC)?;
        writer.write_u32::<LittleEndian>(2)?;
        writer.write_u32::<LittleEndian>(self.padded_length() as u32)?;

        {
            let mut length = self.json.len();
            align_to_multiple_of_four(&mut length);
            let padding = length - self.json.len();
            writer.write_u32::<LittleEndian>(length as u32)?;
            writer.write_all(b"JSON")?;
            writer.write_all(&self.json)?;
            for _ in 0..padding {
                writer.write_u8(0x20)?;
            }
        }

        if let Some(bin) = self.bin.as_ref() {
            let mut length = bin.len();
            align_to_multiple_of_four(&mut length);
            let padding = length - bin.len();
            writer.write_u32::<LittleEndian>(length as u32)?;
            writer.write_all(b"BIN\0")?;
            writer.write_all(bin)?;
            for _ in 0..padding {
                writer.write_u8(0)?;
            }
        }
        Ok(())
    }

    /// Writes the container to a byte vector.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.padded_length());
        self.to_writer(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_with_padding() {
        let glb = Glb {
            header: Header {
                magic: MAGIC,
                version: 2,
                length: 0,
            },
            json: br#"{"asset":{"version":"2.0"}}"#.to_vec().into(),
            bin: Some(vec![1u8, 2, 3].into()),
        };
        let bytes = glb.to_vec().unwrap();
        assert_eq!(bytes.len() % 4, 0);
        assert_eq!(bytes.len(), glb.padded_length());

        let parsed = Glb::from_slice(&bytes).unwrap();
        assert_eq!(parsed.header.length as usize, bytes.len());
        assert_eq!(&parsed.json[..], &glb.json[..]);
        // BIN padding is part of the chunk on the wire but not the payload.
        assert_eq!(&parsed.bin.unwrap()[..4], &[1, 2, 3, 0]);
    }

    #[test]
    fn rejects_bad_magic() {
        assert!(matches!(
            Glb::from_slice(b"noTF\x02\0\0\0\x0c\0\0\0"),
            Err(Error::InvalidContainer(_))
        ));
    }

    #[test]
    fn accepts_empty_bin_chunk() {
        let glb = Glb {
            header: Header {
                magic: MAGIC,
                version: 2,
                length: 0,
            },
            json: br#"{"asset":{"version":"2.0"}}"#.to_vec().into(),
            bin: Some(Vec::new().into()),
        };
        let bytes = glb.to_vec().unwrap();
        let parsed = Glb::from_slice(&bytes).unwrap();
        assert_eq!(parsed.bin.as_deref(), Some(&[][..]));
    }
}
