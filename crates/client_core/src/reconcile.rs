//! Name-keyed reconciliation of client-held boxes and zones against the server.
//!
//! A [`SyncPlan`] is computed up front from the server and client lists and then
//! executed sequentially: deletes first (soft failures), then updates and creates
//! in client order (hard failures). Names are matched case-insensitively.

use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use async_trait::async_trait;
use chrono::{NaiveDateTime, SubsecRound, Utc};
use shared::{
    domain::{name_key, BoxId, PatioId, PatioStatus, ZoneId},
    protocol::{BoxRequest, ParkingBox, Zone, ZoneRequest},
};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    error::{ClientError, ClientResult},
    wizard::{BoxDraft, ZoneDraft},
    YardBackend,
};

pub const EMPTY_BOX_LIST_MESSAGE: &str = "Não é possível salvar as alterações. Um pátio deve ter pelo menos um box. Adicione boxes antes de continuar.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncKind {
    Boxes,
    Zones,
}

impl SyncKind {
    fn singular(self) -> &'static str {
        match self {
            Self::Boxes => "box",
            Self::Zones => "zona",
        }
    }

    fn plural(self) -> &'static str {
        match self {
            Self::Boxes => "boxes",
            Self::Zones => "zonas",
        }
    }

    fn counted(self) -> &'static str {
        match self {
            Self::Boxes => "box(es)",
            Self::Zones => "zona(s)",
        }
    }

    /// Participle suffix agreeing with the noun's gender.
    fn agree(self, stem: &str) -> String {
        match self {
            Self::Boxes => format!("{stem}o(s)"),
            Self::Zones => format!("{stem}a(s)"),
        }
    }

    fn pronoun(self) -> &'static str {
        match self {
            Self::Boxes => "ele",
            Self::Zones => "ela",
        }
    }
}

impl fmt::Display for SyncKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plural())
    }
}

/// Why a delete was refused. Delete failures never abort a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteFailure {
    LastBox,
    InUse,
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotDeleted {
    pub name: String,
    pub reason: DeleteFailure,
}

impl fmt::Display for NotDeleted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            DeleteFailure::LastBox => write!(f, "\"{}\" (é o último box do pátio)", self.name),
            DeleteFailure::InUse => write!(f, "\"{}\" (em uso)", self.name),
            DeleteFailure::Rejected(message) => write!(f, "\"{}\" ({message})", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOp<Id, P> {
    Delete { id: Id, name: String },
    Update { id: Id, name: String, payload: P },
    Create { name: String, payload: P },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncPlan<Id, P> {
    pub ops: Vec<SyncOp<Id, P>>,
    pub server_count: usize,
    pub client_count: usize,
    /// Client entries dropped for a blank or repeated name.
    pub skipped: usize,
}

impl<Id, P> SyncPlan<Id, P> {
    pub fn deletes(&self) -> usize {
        self.count(|op| matches!(op, SyncOp::Delete { .. }))
    }

    pub fn updates(&self) -> usize {
        self.count(|op| matches!(op, SyncOp::Update { .. }))
    }

    pub fn creates(&self) -> usize {
        self.count(|op| matches!(op, SyncOp::Create { .. }))
    }

    fn count(&self, pred: impl Fn(&SyncOp<Id, P>) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }
}

/// One reconcilable collection: how to name, diff and persist its records.
#[async_trait]
pub trait SyncItem: Send + Sync {
    type Remote: Send + Sync;
    type Local: Send + Sync;
    type Id: Copy + fmt::Display + Send + Sync;
    type Payload: Send + Sync;

    const KIND: SyncKind;

    fn remote_name(remote: &Self::Remote) -> &str;
    fn remote_id(remote: &Self::Remote) -> Self::Id;
    fn local_name(local: &Self::Local) -> &str;
    fn update_payload(&self, local: &Self::Local, remote: &Self::Remote) -> Self::Payload;
    fn create_payload(&self, local: &Self::Local) -> Self::Payload;

    fn classify_delete_failure(&self, err: &ClientError) -> DeleteFailure {
        match err.status() {
            Some(409) => DeleteFailure::InUse,
            _ => DeleteFailure::Rejected(err.display_message()),
        }
    }

    async fn fetch_remote(&self, backend: &dyn YardBackend) -> ClientResult<Vec<Self::Remote>>;
    async fn delete(&self, backend: &dyn YardBackend, id: Self::Id) -> ClientResult<()>;
    async fn update(
        &self,
        backend: &dyn YardBackend,
        id: Self::Id,
        payload: &Self::Payload,
    ) -> ClientResult<()>;
    async fn create(&self, backend: &dyn YardBackend, payload: &Self::Payload) -> ClientResult<()>;
}

pub fn plan<S: SyncItem>(
    target: &S,
    remote: &[S::Remote],
    local: &[S::Local],
) -> SyncPlan<S::Id, S::Payload> {
    let client_keys: HashSet<String> = local.iter().map(|l| name_key(S::local_name(l))).collect();
    let server_by_name: HashMap<String, &S::Remote> = remote
        .iter()
        .map(|r| (name_key(S::remote_name(r)), r))
        .collect();

    let mut ops: Vec<SyncOp<S::Id, S::Payload>> = remote
        .iter()
        .filter(|r| !client_keys.contains(&name_key(S::remote_name(r))))
        .map(|r| SyncOp::Delete {
            id: S::remote_id(r),
            name: S::remote_name(r).to_string(),
        })
        .collect();

    let mut seen = HashSet::new();
    let mut skipped = 0;
    for item in local {
        let name = S::local_name(item);
        let key = name_key(name);
        if name.trim().is_empty() || !seen.insert(key.clone()) {
            warn!(kind = %S::KIND, name = %name, "sync: skipping blank or repeated name");
            skipped += 1;
            continue;
        }
        let op = match server_by_name.get(&key) {
            Some(existing) => SyncOp::Update {
                id: S::remote_id(existing),
                name: name.to_string(),
                payload: target.update_payload(item, existing),
            },
            None => SyncOp::Create {
                name: name.to_string(),
                payload: target.create_payload(item),
            },
        };
        ops.push(op);
    }

    SyncPlan {
        ops,
        server_count: remote.len(),
        client_count: local.len(),
        skipped,
    }
}

/// Outcome counters of one executed plan.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub kind: SyncKind,
    pub server_count: usize,
    pub client_count: usize,
    pub planned_deletes: usize,
    pub deleted: usize,
    pub updated: usize,
    pub created: usize,
    pub skipped: usize,
    pub not_deleted: Vec<NotDeleted>,
    pub last_box_blocked: bool,
}

impl SyncReport {
    fn start<Id, P>(kind: SyncKind, plan: &SyncPlan<Id, P>) -> Self {
        Self {
            kind,
            server_count: plan.server_count,
            client_count: plan.client_count,
            planned_deletes: plan.deletes(),
            deleted: 0,
            updated: 0,
            created: 0,
            skipped: plan.skipped,
            not_deleted: Vec::new(),
            last_box_blocked: false,
        }
    }

    /// User-facing summary shown after a successful save.
    pub fn summary_message(&self) -> String {
        let kind = self.kind;
        let removed = kind.agree("removid");
        let mut parts = Vec::new();

        let nothing_deleted = self.planned_deletes > 0 && self.deleted == 0;
        if nothing_deleted && self.last_box_blocked {
            parts.push(
                "Alterações salvas. Não é possível remover todos os boxes - um pátio deve ter pelo menos um box. O último box do pátio não pode ser removido."
                    .to_string(),
            );
        } else {
            parts.push("Alterações salvas com sucesso!".to_string());
        }

        parts.push(format!(
            "{} {} {}, {} {}.",
            self.updated,
            kind.counted(),
            kind.agree("atualizad"),
            self.created,
            kind.agree("criad"),
        ));

        if self.planned_deletes > 0 {
            if self.deleted == self.planned_deletes {
                parts.push(format!("{} {} {removed}.", self.deleted, kind.counted()));
            } else if self.deleted > 0 {
                parts.push(format!(
                    "{} de {} {} {removed}.",
                    self.deleted,
                    self.planned_deletes,
                    kind.counted()
                ));
                if self.last_box_blocked {
                    parts.push("O último box do pátio não pode ser removido.".to_string());
                }
            } else if !self.last_box_blocked {
                parts.push(match kind {
                    SyncKind::Boxes => {
                        "Alguns boxes não puderam ser removidos pois estão em uso.".to_string()
                    }
                    SyncKind::Zones => {
                        "Algumas zonas não puderam ser removidas pois estão em uso.".to_string()
                    }
                });
            }
        }

        if (1..=3).contains(&self.not_deleted.len()) {
            let label = match kind {
                SyncKind::Boxes => "Boxes não removidos",
                SyncKind::Zones => "Zonas não removidas",
            };
            let names = self
                .not_deleted
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            parts.push(format!("{label}: {names}."));
        }

        parts.join(" ")
    }

    fn conflict_diagnostic(&self, name: &str) -> String {
        let kind = self.kind;
        let plural = kind.plural();
        format!(
            "ERRO DE SINCRONIZAÇÃO!\n\n\
             Tentou criar {singular} \"{name}\", mas {pronoun} JÁ EXISTE no servidor.\n\n\
             ESTADO ATUAL:\n\
             - {title} buscados do servidor: {server}\n\
             - {title} no assistente: {client}\n\
             - {title} deletados: {deleted}\n\
             - {title} atualizados: {updated}\n\
             - {title} criados até agora: {created}\n\n\
             Recarregue os dados do pátio para ver todos os {plural} do servidor e tente novamente.",
            singular = kind.singular(),
            pronoun = kind.pronoun(),
            title = capitalize(plural),
            server = self.server_count,
            client = self.client_count,
            deleted = self.deleted,
            updated = self.updated,
            created = self.created,
        )
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{}", EMPTY_BOX_LIST_MESSAGE)]
    EmptyBoxList,
    #[error("não foi possível carregar {kind} do servidor: {}", .source.display_message())]
    Fetch {
        kind: SyncKind,
        #[source]
        source: ClientError,
    },
    /// A create hit an existing record: the client list was stale.
    #[error("{diagnostic}")]
    CreateConflict {
        name: String,
        diagnostic: String,
        report: Box<SyncReport>,
    },
    #[error("{message}")]
    Aborted {
        name: String,
        message: String,
        report: Box<SyncReport>,
        #[source]
        source: ClientError,
    },
}

impl SyncError {
    /// Progress made before the failure, when any call was attempted.
    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            Self::CreateConflict { report, .. } | Self::Aborted { report, .. } => Some(&**report),
            Self::EmptyBoxList | Self::Fetch { .. } => None,
        }
    }
}

pub async fn execute<S: SyncItem>(
    target: &S,
    backend: &dyn YardBackend,
    plan: SyncPlan<S::Id, S::Payload>,
) -> Result<SyncReport, SyncError> {
    let kind = S::KIND;
    let mut report = SyncReport::start(kind, &plan);

    for op in plan.ops {
        match op {
            SyncOp::Delete { id, name } => match target.delete(backend, id).await {
                Ok(()) => {
                    report.deleted += 1;
                    info!(%kind, %id, name = %name, "sync: removed");
                }
                Err(err) => {
                    let reason = target.classify_delete_failure(&err);
                    if reason == DeleteFailure::LastBox {
                        report.last_box_blocked = true;
                    }
                    warn!(%kind, %id, name = %name, status = ?err.status(), error = %err, "sync: remove refused");
                    report.not_deleted.push(NotDeleted { name, reason });
                }
            },
            SyncOp::Update { id, name, payload } => {
                if let Err(source) = target.update(backend, id, &payload).await {
                    error!(%kind, %id, name = %name, error = %source, "sync: update failed");
                    let message = update_failure_message(kind, &name, &source);
                    return Err(SyncError::Aborted {
                        name,
                        message,
                        report: Box::new(report),
                        source,
                    });
                }
                report.updated += 1;
            }
            SyncOp::Create { name, payload } => match target.create(backend, &payload).await {
                Ok(()) => report.created += 1,
                Err(source) if source.status() == Some(409) => {
                    error!(%kind, name = %name, "sync: create conflicted with an existing record");
                    let diagnostic = report.conflict_diagnostic(&name);
                    return Err(SyncError::CreateConflict {
                        name,
                        diagnostic,
                        report: Box::new(report),
                    });
                }
                Err(source) => {
                    error!(%kind, name = %name, error = %source, "sync: create failed");
                    return Err(SyncError::Aborted {
                        name,
                        message: source.display_message(),
                        report: Box::new(report),
                        source,
                    });
                }
            },
        }
    }

    info!(
        %kind,
        deleted = report.deleted,
        planned_deletes = report.planned_deletes,
        updated = report.updated,
        created = report.created,
        "sync: finished"
    );
    Ok(report)
}

fn update_failure_message(kind: SyncKind, name: &str, err: &ClientError) -> String {
    match err {
        ClientError::Api(api) if api.status == 409 => format!(
            "Falha ao atualizar {} \"{name}\": {}. {}",
            kind.singular(),
            api.message,
            api.suggestion().unwrap_or_default()
        )
        .trim_end()
        .to_string(),
        other => other.display_message(),
    }
}

/// Fetches the server list, plans against `local` and executes the plan.
pub async fn reconcile<S: SyncItem>(
    target: &S,
    backend: &dyn YardBackend,
    local: &[S::Local],
) -> Result<SyncReport, SyncError> {
    let remote = target
        .fetch_remote(backend)
        .await
        .map_err(|source| SyncError::Fetch {
            kind: S::KIND,
            source,
        })?;
    let plan = plan(target, &remote, local);
    info!(
        kind = %S::KIND,
        server = plan.server_count,
        client = plan.client_count,
        deletes = plan.deletes(),
        updates = plan.updates(),
        creates = plan.creates(),
        "sync: planned"
    );
    execute(target, backend, plan).await
}

/// True when at least one draft survives the blank-name skip in [`plan`].
pub(crate) fn has_named_box(boxes: &[BoxDraft]) -> bool {
    boxes.iter().any(|draft| !draft.nome.trim().is_empty())
}

/// Converges the patio's boxes to `boxes`. A list with no named box is refused
/// before any call.
pub async fn sync_boxes(
    backend: &dyn YardBackend,
    patio_id: PatioId,
    patio_status: PatioStatus,
    boxes: &[BoxDraft],
) -> Result<SyncReport, SyncError> {
    if !has_named_box(boxes) {
        warn!(%patio_id, "sync: refusing to save a patio without boxes");
        return Err(SyncError::EmptyBoxList);
    }
    reconcile(&BoxSync::new(patio_id, patio_status), backend, boxes).await
}

pub async fn sync_zones(
    backend: &dyn YardBackend,
    patio_id: PatioId,
    patio_status: PatioStatus,
    zones: &[ZoneDraft],
) -> Result<SyncReport, SyncError> {
    reconcile(&ZoneSync { patio_id, patio_status }, backend, zones).await
}

#[derive(Debug, Clone, Copy)]
pub struct BoxSync {
    pub patio_id: PatioId,
    pub patio_status: PatioStatus,
    /// Entry/exit time for new boxes and for server boxes without dates.
    pub now: NaiveDateTime,
}

impl BoxSync {
    pub fn new(patio_id: PatioId, patio_status: PatioStatus) -> Self {
        Self {
            patio_id,
            patio_status,
            now: Utc::now().naive_utc().trunc_subsecs(0),
        }
    }
}

#[async_trait]
impl SyncItem for BoxSync {
    type Remote = ParkingBox;
    type Local = BoxDraft;
    type Id = BoxId;
    type Payload = BoxRequest;

    const KIND: SyncKind = SyncKind::Boxes;

    fn remote_name(remote: &ParkingBox) -> &str {
        &remote.nome
    }

    fn remote_id(remote: &ParkingBox) -> BoxId {
        remote.id_box
    }

    fn local_name(local: &BoxDraft) -> &str {
        &local.nome
    }

    fn update_payload(&self, local: &BoxDraft, remote: &ParkingBox) -> BoxRequest {
        BoxRequest {
            nome: local.nome.clone(),
            status: local.status.unwrap_or(remote.status),
            data_entrada: remote.data_entrada.unwrap_or(self.now),
            data_saida: remote.data_saida.unwrap_or(self.now),
            observacao: non_blank_or(&local.observacao, remote.observacao.as_deref()),
            patio_id: self.patio_id,
            patio_status: self.patio_status,
        }
    }

    fn create_payload(&self, local: &BoxDraft) -> BoxRequest {
        BoxRequest {
            nome: local.nome.clone(),
            status: local.status.unwrap_or_default(),
            data_entrada: self.now,
            data_saida: self.now,
            observacao: local.observacao.clone(),
            patio_id: self.patio_id,
            patio_status: self.patio_status,
        }
    }

    fn classify_delete_failure(&self, err: &ClientError) -> DeleteFailure {
        match err.status() {
            Some(403) => DeleteFailure::LastBox,
            Some(409) => DeleteFailure::InUse,
            _ => DeleteFailure::Rejected(err.display_message()),
        }
    }

    async fn fetch_remote(&self, backend: &dyn YardBackend) -> ClientResult<Vec<ParkingBox>> {
        backend
            .list_patio_boxes(self.patio_id, self.patio_status)
            .await
    }

    async fn delete(&self, backend: &dyn YardBackend, id: BoxId) -> ClientResult<()> {
        backend.delete_box(id).await
    }

    async fn update(
        &self,
        backend: &dyn YardBackend,
        id: BoxId,
        payload: &BoxRequest,
    ) -> ClientResult<()> {
        backend.update_box(id, payload).await.map(drop)
    }

    async fn create(&self, backend: &dyn YardBackend, payload: &BoxRequest) -> ClientResult<()> {
        backend.create_box(payload).await.map(drop)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ZoneSync {
    pub patio_id: PatioId,
    pub patio_status: PatioStatus,
}

#[async_trait]
impl SyncItem for ZoneSync {
    type Remote = Zone;
    type Local = ZoneDraft;
    type Id = ZoneId;
    type Payload = ZoneRequest;

    const KIND: SyncKind = SyncKind::Zones;

    fn remote_name(remote: &Zone) -> &str {
        &remote.nome
    }

    fn remote_id(remote: &Zone) -> ZoneId {
        remote.id_zona
    }

    fn local_name(local: &ZoneDraft) -> &str {
        &local.nome
    }

    fn update_payload(&self, local: &ZoneDraft, remote: &Zone) -> ZoneRequest {
        ZoneRequest {
            nome: local.nome.clone(),
            status: local.status,
            observacao: non_blank_or(&local.observacao, remote.observacao.as_deref()),
            patio_id: self.patio_id,
            patio_status: self.patio_status,
        }
    }

    fn create_payload(&self, local: &ZoneDraft) -> ZoneRequest {
        ZoneRequest {
            nome: local.nome.clone(),
            status: local.status,
            observacao: local.observacao.clone(),
            patio_id: self.patio_id,
            patio_status: self.patio_status,
        }
    }

    async fn fetch_remote(&self, backend: &dyn YardBackend) -> ClientResult<Vec<Zone>> {
        backend
            .list_patio_zones(self.patio_id, self.patio_status)
            .await
    }

    async fn delete(&self, backend: &dyn YardBackend, id: ZoneId) -> ClientResult<()> {
        backend
            .delete_patio_zone(self.patio_id, self.patio_status, id)
            .await
    }

    async fn update(
        &self,
        backend: &dyn YardBackend,
        id: ZoneId,
        payload: &ZoneRequest,
    ) -> ClientResult<()> {
        backend.update_zone(id, payload).await.map(drop)
    }

    async fn create(&self, backend: &dyn YardBackend, payload: &ZoneRequest) -> ClientResult<()> {
        backend.create_zone(payload).await.map(drop)
    }
}

fn non_blank_or(preferred: &str, fallback: Option<&str>) -> String {
    if preferred.is_empty() {
        fallback.unwrap_or_default().to_string()
    } else {
        preferred.to_string()
    }
}

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod tests;
