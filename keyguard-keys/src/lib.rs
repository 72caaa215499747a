//! Key lifecycle management for Keyguard
//!
//! Stores references to keys held by external KMS providers, rotates them
//! under tenant policies and keeps the parent/child lineage of every
//! rotation. Key material never enters this crate except inside the bundled
//! local HSM client.
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


pub mod admin;
pub mod audit;
pub mod error;
pub mod key_store;
pub mod kms;
pub mod lifecycle;
pub mod local_store;
pub mod repository;
pub mod service_integration;

pub use admin::{PolicyAdministration, RotationHistoryEntry};
pub use audit::{AuditSink, MemoryAuditSink, TracingAuditSink};
pub use error::{KeyError, KeyResult};
pub use key_store::KeyStore;
pub use kms::{KmsClient, KmsRegistry, MintRequest};
pub use lifecycle::{KeyLifecycleService, NewKey, RolledBackKeys, RotatedKeys};
pub use local_store::LocalHsmClient;
pub use repository::{KeyRepository, PolicyRepository, PolicyScope};
pub use service_integration::*;
