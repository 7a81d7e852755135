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
// Walks the DATA payload label by label.
pub mod decoder;
// Two-pass layout and byte emission.
pub mod encoder;
// The instruction and operand model.
pub mod instruction;
// The opcode tables both directions are driven from.
pub mod opcode;

pub use encoder::{EncodeError, EncodeOptions};
pub use instruction::{Instruction, Operand};
