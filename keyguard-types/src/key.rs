//! Encryption key reference and its lifecycle metadata
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


use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::TypesError;

/// Classification of the data a key protects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyType {
    /// Protected health information at rest
    PhiData,
    /// Billing and payment records
    Financial,
    /// Audit log signing and sealing
    AuditLog,
    /// Personally identifiable information outside PHI
    PiiData,
    /// Database and object storage backups
    Backup,
    /// Short-lived session material
    Session,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::PhiData => "PHI_DATA",
            KeyType::Financial => "FINANCIAL",
            KeyType::AuditLog => "AUDIT_LOG",
            KeyType::PiiData => "PII_DATA",
            KeyType::Backup => "BACKUP",
            KeyType::Session => "SESSION",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = TypesError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "PHI_DATA" => Ok(KeyType::PhiData),
            "FINANCIAL" => Ok(KeyType::Financial),
            "AUDIT_LOG" => Ok(KeyType::AuditLog),
            "PII_DATA" => Ok(KeyType::PiiData),
            "BACKUP" => Ok(KeyType::Backup),
            "SESSION" => Ok(KeyType::Session),
            other => Err(TypesError::InvalidValue(format!("unknown key type: {}", other))),
        }
    }
}

/// External key management provider holding the actual key material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KmsProvider {
    AwsKms,
    AzureKv,
    HashicorpVault,
    GcpKms,
    LocalHsm,
}

impl KmsProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            KmsProvider::AwsKms => "AWS_KMS",
            KmsProvider::AzureKv => "AZURE_KV",
            KmsProvider::HashicorpVault => "HASHICORP_VAULT",
            KmsProvider::GcpKms => "GCP_KMS",
            KmsProvider::LocalHsm => "LOCAL_HSM",
        }
    }
}

impl fmt::Display for KmsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KmsProvider {
    type Err = TypesError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "AWS_KMS" => Ok(KmsProvider::AwsKms),
            "AZURE_KV" => Ok(KmsProvider::AzureKv),
            "HASHICORP_VAULT" => Ok(KmsProvider::HashicorpVault),
            "GCP_KMS" => Ok(KmsProvider::GcpKms),
            "LOCAL_HSM" => Ok(KmsProvider::LocalHsm),
            other => Err(TypesError::InvalidValue(format!("unknown KMS provider: {}", other))),
        }
    }
}

/// Lifecycle status of a key reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyStatus {
    Pending,
    Active,
    Inactive,
    Rotated,
    Expired,
    Compromised,
}

impl KeyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStatus::Pending => "PENDING",
            KeyStatus::Active => "ACTIVE",
            KeyStatus::Inactive => "INACTIVE",
            KeyStatus::Rotated => "ROTATED",
            KeyStatus::Expired => "EXPIRED",
            KeyStatus::Compromised => "COMPROMISED",
        }
    }
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a key custodied by an external KMS.
///
/// Only the provider-issued `kms_key_id` is kept here. Key bytes never pass
/// through this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptionKey {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Logical name shared by every version in a lineage chain
    pub key_name: String,
    pub key_type: KeyType,
    pub kms_provider: KmsProvider,
    pub kms_key_id: String,
    pub algorithm: String,
    pub status: KeyStatus,
    pub version: u32,
    pub activated_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub rotated_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    /// The key this one replaced
    pub parent_key_id: Option<Uuid>,
    pub can_rollback: bool,
    pub rollback_expires_at: Option<DateTime<Utc>>,
    /// Keys without a policy are never rotated automatically
    pub rotation_policy_id: Option<Uuid>,
    pub created_by_token_id: Option<Uuid>,
    pub rotated_by_token_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EncryptionKey {
    pub fn is_active(&self) -> bool {
        self.status == KeyStatus::Active
    }

    /// Whether a rotated key may still be reactivated at `now`
    pub fn rollback_open_at(&self, now: DateTime<Utc>) -> bool {
        self.status == KeyStatus::Rotated
            && self.can_rollback
            && self.rollback_expires_at.map_or(false, |expires| now < expires)
    }

    /// Whether two keys belong to the same lineage chain
    pub fn same_chain(&self, other: &EncryptionKey) -> bool {
        self.tenant_id == other.tenant_id && self.key_name == other.key_name
    }
}
