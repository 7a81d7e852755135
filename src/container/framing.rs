// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use crate::container::{DecodeError, BOM, SIGNATURE};
use crate::container::version_supported;
use crate::util::{ByteReader, ByteWriter};

/// Length of the file header: signature, byte order mark, version,
/// file size, header size, section count, and the DATA/LABL offset
/// table.
pub const FILE_HEADER_LEN: usize = 0x20;

/// Length of a section header: four byte tag, size word, and one
/// reserved word.
pub const SECTION_HEADER_LEN: usize = 0x0C;

/// Tag opening the DATA section.
pub const DATA_TAG: [u8; 4] = *b"DATA";

/// Tag opening the LABL section.
pub const LABL_TAG: [u8; 4] = *b"LABL";

/// The parsed file header together with the validated DATA section
/// header.  Offsets and sizes are absolute within the byte image; the
/// instruction payload spans `payload_start..payload_end`.
#[derive(Clone, Debug, PartialEq)]
pub struct Framing {
    pub version: (u8, u8),
    pub file_size: u32,
    pub data_base: u32,
    pub data_size: u32,
    pub label_base: u32,
    pub label_size: u32,
}

impl Framing {
    /// Parse and sanity-check the file header and the DATA section
    /// header.  The LABL section body is left to `labels::parse`.
    pub fn parse(bytes: &[u8]) -> Result<Framing, DecodeError> {
        let mut reader = ByteReader::new(bytes);
        match_tag(&mut reader, SIGNATURE, |_| DecodeError::TruncatedHeader)?;
        // Pull out static information
        let bom = reader.read_u16(|_| DecodeError::TruncatedHeader)?;
        if bom != BOM {
            return Err(DecodeError::UnsupportedBom(bom));
        }
        let version_word = reader.read_u16(|_| DecodeError::TruncatedHeader)?;
        let version = ((version_word >> 8) as u8, version_word as u8);
        if !version_supported(version) {
            return Err(DecodeError::UnknownVersion(version_word));
        }
        let file_size = reader.read_u32(|_| DecodeError::TruncatedHeader)?;
        let header_size = reader.read_u16(|_| DecodeError::TruncatedHeader)?;
        let section_count = reader.read_u16(|_| DecodeError::TruncatedHeader)?;
        // Sanity check the self-describing fields
        if header_size < 16 || section_count < 1 {
            return Err(DecodeError::TruncatedHeader);
        }
        let data_base = reader.read_u32(|_| DecodeError::TruncatedHeader)?;
        let data_size = reader.read_u32(|_| DecodeError::TruncatedHeader)?;
        let label_base = reader.read_u32(|_| DecodeError::TruncatedHeader)?;
        let label_size = reader.read_u32(|_| DecodeError::TruncatedHeader)?;
        let framing = Framing {
            version,
            file_size,
            data_base,
            data_size,
            label_base,
            label_size,
        };
        framing.check_data_section(bytes)?;
        Ok(framing)
    }

    /// Absolute offset of the first payload byte.
    pub fn payload_start(&self) -> usize {
        self.data_base as usize + SECTION_HEADER_LEN
    }

    /// Absolute offset one past the last payload byte.
    pub fn payload_end(&self) -> usize {
        self.data_base as usize + self.data_size as usize
    }

    /// Validate the DATA section header against the byte image.  The
    /// reserved base-offset word is ignored; the size field must at
    /// least cover the section header and stay within the image.
    fn check_data_section(&self, bytes: &[u8]) -> Result<(), DecodeError> {
        let base = self.data_base as usize;
        let mut reader = ByteReader::new(bytes);
        if base + SECTION_HEADER_LEN > bytes.len() {
            return Err(DecodeError::TruncatedSection(base));
        }
        reader.seek(base);
        match_tag(&mut reader, DATA_TAG, DecodeError::TruncatedSection)?;
        let size = reader.read_u32(DecodeError::TruncatedSection)? as usize;
        let _reserved = reader.read_u32(DecodeError::TruncatedSection)?;
        if size < SECTION_HEADER_LEN || base + size > bytes.len() || size != self.data_size as usize {
            return Err(DecodeError::TruncatedSection(base));
        }
        Ok(())
    }
}

/// Match a four byte ASCII tag at the current position, producing a
/// `BadSignature` pinpointing the mismatch.  The truncation error
/// generator is used when the image ends inside the tag.
pub fn match_tag<'a>(
    reader: &mut ByteReader<'a>,
    expected: [u8; 4],
    ef: fn(usize) -> DecodeError,
) -> Result<(), DecodeError> {
    let offset = reader.position();
    let found = reader.read_tag(4, ef)?;
    if found != expected {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(found);
        Err(DecodeError::BadSignature { expected, found: raw, offset })
    } else {
        Ok(())
    }
}

/// Emit the file header.  All sizes are final at this point; the
/// encoder lays sections out before writing the header.
pub fn write_file_header(
    writer: &mut ByteWriter,
    version: (u8, u8),
    file_size: u32,
    data_size: u32,
    label_base: u32,
    label_size: u32,
) {
    writer.write_bytes(&SIGNATURE);
    writer.write_u16(BOM);
    writer.write_u16(((version.0 as u16) << 8) | version.1 as u16);
    writer.write_u32(file_size);
    writer.write_u16(FILE_HEADER_LEN as u16);
    writer.write_u16(2);
    writer.write_u32(FILE_HEADER_LEN as u32);
    writer.write_u32(data_size);
    writer.write_u32(label_base);
    writer.write_u32(label_size);
}

/// Emit the DATA section header for a payload of the given length.
pub fn write_data_header(writer: &mut ByteWriter, payload_len: usize) {
    writer.write_bytes(&DATA_TAG);
    writer.write_u32((SECTION_HEADER_LEN + payload_len) as u32);
    writer.write_u32(SECTION_HEADER_LEN as u32);
}
