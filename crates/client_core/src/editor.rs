//! Edit and create flows for a patio: cached load, box/zone reconciliation and
//! the final wizard submit.

use std::{sync::Arc, time::Duration};

use shared::{
    domain::PatioId,
    protocol::{ParkingBox, Patio, PatioRequest, Zone},
};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    cache::{Snapshot, TimedSnapshot, DEFAULT_CACHE_TTL},
    error::{ClientError, ClientResult},
    reconcile::{has_named_box, sync_boxes, sync_zones, SyncError, SyncReport},
    wizard::{BoxDraft, InvalidStep, Wizard},
    YardBackend,
};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] InvalidStep),
    #[error("Dados do pátio inválidos.")]
    NotLoaded,
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl SubmitError {
    /// Banner text for the failed save.
    pub fn display_message(&self) -> String {
        match self {
            Self::Client(err) => err.display_message(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatioSnapshot {
    pub patio: Patio,
    pub zones: Vec<Zone>,
    pub boxes: Vec<ParkingBox>,
}

impl Snapshot for PatioSnapshot {
    fn has_data(&self) -> bool {
        !self.boxes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    pub patio: Patio,
    pub zones: SyncReport,
    pub boxes: SyncReport,
}

impl EditOutcome {
    pub fn summary_message(&self) -> String {
        self.boxes.summary_message()
    }
}

/// Holds one patio's server state for an edit screen.
pub struct PatioEditor {
    backend: Arc<dyn YardBackend>,
    patio_id: PatioId,
    cache: TimedSnapshot<PatioSnapshot>,
    patio: Option<Patio>,
}

impl PatioEditor {
    pub fn new(backend: Arc<dyn YardBackend>, patio_id: PatioId) -> Self {
        Self::with_ttl(backend, patio_id, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(backend: Arc<dyn YardBackend>, patio_id: PatioId, ttl: Duration) -> Self {
        Self {
            backend,
            patio_id,
            cache: TimedSnapshot::new(ttl),
            patio: None,
        }
    }

    pub fn patio_id(&self) -> PatioId {
        self.patio_id
    }

    /// Cached snapshot when fresh, otherwise a new fetch.
    pub async fn load(&mut self) -> ClientResult<PatioSnapshot> {
        if let Some(snapshot) = self.cache.fresh() {
            return Ok(snapshot.clone());
        }
        self.reload().await
    }

    pub async fn reload(&mut self) -> ClientResult<PatioSnapshot> {
        let patio_id = self.patio_id;
        let patio = self.backend.fetch_patio(patio_id).await?;
        let zones = self.backend.list_patio_zones(patio_id, patio.status).await?;
        let boxes = self.backend.list_patio_boxes(patio_id, patio.status).await?;
        info!(%patio_id, zones = zones.len(), boxes = boxes.len(), "editor: patio loaded");

        let snapshot = PatioSnapshot {
            patio: patio.clone(),
            zones,
            boxes,
        };
        self.patio = Some(patio);
        self.cache.store(snapshot.clone());
        Ok(snapshot)
    }

    /// Wizard seeded with the current server state.
    pub async fn wizard(&mut self) -> ClientResult<Wizard> {
        let snapshot = self.load().await?;
        Ok(Wizard::for_existing(
            &snapshot.patio,
            &snapshot.zones,
            &snapshot.boxes,
        ))
    }

    /// Converges the patio's boxes to `boxes`, then refetches once whatever the outcome.
    pub async fn save_boxes(&mut self, boxes: &[BoxDraft]) -> Result<SyncReport, SubmitError> {
        if !has_named_box(boxes) {
            return Err(SyncError::EmptyBoxList.into());
        }
        let patio = self.patio.clone().ok_or(SubmitError::NotLoaded)?;

        let result = sync_boxes(self.backend.as_ref(), patio.id_patio, patio.status, boxes).await;
        self.refresh_after_save().await;
        Ok(result?)
    }

    /// Edit-mode submit: patio basics, then zones, then boxes. Refetches once afterwards.
    pub async fn save_wizard(&mut self, wizard: &mut Wizard) -> Result<EditOutcome, SubmitError> {
        wizard.validate_all()?;
        let patio = self.patio.clone().ok_or(SubmitError::NotLoaded)?;

        let result = self.apply_edit(&patio, wizard).await;
        self.refresh_after_save().await;
        result
    }

    async fn apply_edit(&self, patio: &Patio, wizard: &Wizard) -> Result<EditOutcome, SubmitError> {
        let data = wizard.data();
        let request = PatioRequest {
            nome_patio: data.patio.nome_patio.trim().to_string(),
            status: data.patio.status,
            observacao: data.patio.observacao.clone(),
            contato_id: patio.contato.as_ref().map(|contato| contato.id_contato),
            endereco_id: patio.endereco.as_ref().map(|endereco| endereco.id_endereco),
        };
        let updated = self.backend.update_patio(patio.id_patio, &request).await?;
        let backend = self.backend.as_ref();
        let zones = sync_zones(backend, updated.id_patio, updated.status, &data.zonas).await?;
        let boxes = sync_boxes(backend, updated.id_patio, updated.status, &data.boxes).await?;
        Ok(EditOutcome {
            patio: updated,
            zones,
            boxes,
        })
    }

    async fn refresh_after_save(&mut self) {
        self.cache.invalidate();
        if let Err(err) = self.reload().await {
            warn!(patio_id = %self.patio_id, error = %err, "editor: refetch after save failed");
        }
    }
}

/// Create-mode submit: re-validates every step and posts the whole aggregate.
pub async fn create_patio(backend: &dyn YardBackend, wizard: &mut Wizard) -> Result<Patio, SubmitError> {
    wizard.validate_all()?;
    let request = wizard.to_complete_request();
    let patio = backend.create_complete_patio(&request).await?;
    info!(patio_id = %patio.id_patio, zones = request.zonas.len(), boxes = request.boxes.len(), "editor: patio created");
    Ok(patio)
}

pub fn created_message(patio: &Patio) -> String {
    format!(
        "Pátio \"{}\" cadastrado com sucesso! ID: {}",
        patio.nome_patio, patio.id_patio
    )
}

#[cfg(test)]
#[path = "tests/editor_tests.rs"]
mod tests;
