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
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::container::BseqFile;
use crate::{asm, format_text};

/// Convert a file to its counterpart representation, dispatching on
/// the extension: `.brseq` (binary) becomes a `.rseq` listing and
/// vice versa.  The sibling file is written next to the input and its
/// path returned.
pub fn convert(path: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match extension {
        "brseq" => {
            let bytes = fs::read(path)?;
            let file = BseqFile::from_bytes(&bytes)?;
            let target = path.with_extension("rseq");
            fs::write(&target, format_text(&file))?;
            info!("converted {} -> {}", path.display(), target.display());
            Ok(target)
        }
        "rseq" => {
            let text = fs::read_to_string(path)?;
            let file = asm::parse(&text)?;
            let target = path.with_extension("brseq");
            fs::write(&target, file.to_bytes()?)?;
            info!("converted {} -> {}", path.display(), target.display());
            Ok(target)
        }
        _ => Err(format!("unsupported extension on {}", path.display()).into()),
    }
}
