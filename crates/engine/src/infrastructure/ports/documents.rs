//! Document persistence port.
//!
//! The host owns storage. Every update carries complete replacement values
//! keyed by dot-path, never list patches.

use async_trait::async_trait;
use kitsheet_domain::{CharacterId, FeatureId, FieldUpdate};

use super::error::PortError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentPort: Send + Sync {
    async fn update_character(
        &self,
        id: CharacterId,
        updates: Vec<FieldUpdate>,
    ) -> Result<(), PortError>;

    async fn update_feature(&self, id: FeatureId, updates: Vec<FieldUpdate>)
        -> Result<(), PortError>;

    /// Batch update of several features in one host call.
    async fn update_features(
        &self,
        updates: Vec<(FeatureId, Vec<FieldUpdate>)>,
    ) -> Result<(), PortError>;

    async fn delete_features(&self, ids: Vec<FeatureId>) -> Result<(), PortError>;
}
