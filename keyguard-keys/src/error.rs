//! Error types for key lifecycle management
// Copyright 2025 Francisco F. Pinochet
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use keyguard_types::TypesError;
use thiserror::Error;

/// Key lifecycle errors
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("External provider error: {0}")]
    ExternalProvider(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

impl KeyError {
    /// Whether the scheduler should simply try again on its next cycle
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            KeyError::NotFound(_)
                | KeyError::ExternalProvider(_)
                | KeyError::Persistence(_)
                | KeyError::Io(_)
        )
    }
}

impl From<TypesError> for KeyError {
    fn from(err: TypesError) -> Self {
        match err {
            TypesError::Validation(msg) | TypesError::InvalidValue(msg) => KeyError::Validation(msg),
            TypesError::InvalidPayload(msg) => KeyError::Serialization(serde::de::Error::custom(msg)),
            TypesError::Serialization(e) => KeyError::Serialization(e),
        }
    }
}

/// Result type for key operations
pub type KeyResult<T> = Result<T, KeyError>;
