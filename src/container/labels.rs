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
use crate::container::framing::{self, Framing, LABL_TAG};
use crate::container::{DecodeError, Label};
use crate::util::{ByteReader, ByteWriter};

/// The decoded LABL section: every named entry point into the DATA
/// payload, in file order.
pub struct LabelTable {
    pub labels: Vec<Label>,
}

impl LabelTable {
    /// Read the LABL block.  Entry offsets are relative to the
    /// section base plus eight; names are raw ASCII with an explicit
    /// length and no terminator.
    pub fn parse(bytes: &[u8], framing: &Framing) -> Result<LabelTable, DecodeError> {
        let base = framing.label_base as usize;
        if base + framing::SECTION_HEADER_LEN > bytes.len() {
            return Err(DecodeError::TruncatedSection(base));
        }
        let mut reader = ByteReader::new(bytes);
        reader.seek(base);
        framing::match_tag(&mut reader, LABL_TAG, DecodeError::TruncatedSection)?;
        let _size = reader.read_u32(DecodeError::TruncatedSection)?;
        let count = reader.read_u32(DecodeError::TruncatedSection)? as usize;
        // Pull out the entry offset table
        let mut entry_offsets = Vec::with_capacity(count);
        for _i in 0..count {
            entry_offsets.push(reader.read_u32(DecodeError::TruncatedSection)? as usize);
        }
        // Read each entry in table order
        let mut labels = Vec::with_capacity(count);
        for entry_offset in entry_offsets {
            reader.seek(base + 8 + entry_offset);
            let data_offset = reader.read_u32(DecodeError::TruncatedSection)?;
            let name_len = reader.read_u32(DecodeError::TruncatedSection)? as usize;
            let name_at = reader.position();
            let raw = reader.read_tag(name_len, DecodeError::TruncatedSection)?;
            if raw.is_empty() || !raw.iter().all(|b| b.is_ascii() && !b.is_ascii_control()) {
                return Err(DecodeError::TruncatedSection(name_at));
            }
            let name: String = raw.iter().map(|&b| b as char).collect();
            labels.push(Label { name, data_offset, synthetic: false });
        }
        Ok(LabelTable { labels })
    }

    /// First label (in file order) whose entry point is the given
    /// payload offset.
    pub fn by_offset(&self, offset: u32) -> Option<&Label> {
        self.labels.iter().find(|l| l.data_offset == offset)
    }

    /// Labels sorted ascending by entry offset.  The sort is stable,
    /// so aliased offsets keep their file order.
    pub fn sorted_by_offset(&self) -> Vec<&Label> {
        let mut sorted: Vec<&Label> = self.labels.iter().collect();
        sorted.sort_by_key(|l| l.data_offset);
        sorted
    }
}

/// Size of one encoded entry, padded to a four byte boundary.
fn entry_len(name: &str) -> usize {
    (8 + name.len() + 3) & !3
}

/// The size word written into the LABL section header for a given
/// set of names.
pub fn section_size(labels: &[(&str, u32)]) -> usize {
    8 + 4 * labels.len() + labels.iter().map(|(n, _)| entry_len(n)).sum::<usize>()
}

/// Emit the LABL section: header, entry offset table, then the
/// entries packed end-to-end on four byte boundaries.
pub fn write_label_section(writer: &mut ByteWriter, labels: &[(&str, u32)]) {
    writer.write_bytes(&LABL_TAG);
    writer.write_u32(section_size(labels) as u32);
    writer.write_u32(labels.len() as u32);
    // Entry offsets are relative to the section base plus eight; the
    // first entry sits directly after the offset table.
    let mut entry_offset = 4 + 4 * labels.len();
    for (name, _) in labels {
        writer.write_u32(entry_offset as u32);
        entry_offset += entry_len(name);
    }
    for (name, data_offset) in labels {
        writer.write_u32(*data_offset);
        writer.write_u32(name.len() as u32);
        writer.write_bytes(name.as_bytes());
        for _ in 0..(entry_len(name) - 8 - name.len()) {
            writer.write_u8(0);
        }
    }
}
