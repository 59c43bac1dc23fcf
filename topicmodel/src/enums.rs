//Copyright 2024 Felix Engl
//
//Licensed under the Apache License, Version 2.0 (the "License");
//you may not use this file except in compliance with the License.
//You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
//Unless required by applicable law or agreed to in writing, software
//distributed under the License is distributed on an "AS IS" BASIS,
//WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//See the License for the specific language governing permissions and
//limitations under the License.

use strum::{AsRefStr, Display, EnumString, FromRepr};
use thiserror::Error;

/// The magic bytes at the start of every written model.
pub const MODEL_MAGIC: &[u8; 8] = b"LDAGIBBS";

/// The model storing version.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Display, AsRefStr, EnumString, FromRepr)]
#[repr(u16)]
pub enum ModelFormatVersion {
    #[default]
    V1 = 1,
}

/// The errors while writing
#[derive(Debug, Error)]
pub enum WriteError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    Encode(#[from] bincode::Error),
}

/// The errors while reading
#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    Decode(#[from] bincode::Error),
    #[error("The data does not start with the model header!")]
    NotAModel,
    #[error("The model format version {0} is not supported!")]
    UnsupportedVersion(u16),
    #[error("The stored model is inconsistent: {0}")]
    Inconsistent(&'static str),
}
