//! In-memory backend that records every call, for reconciliation and editor tests.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{
    domain::{name_key, BoxId, BoxStatus, PatioId, PatioStatus, ZoneId},
    error::{ApiErrorBody, ApiException},
    protocol::{
        BoxRequest, CompletePatioRequest, ParkingBox, Patio, PatioRequest, Zone, ZoneRequest,
    },
};

use crate::{ClientError, ClientResult, YardBackend};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    FetchPatio(PatioId),
    UpdatePatio(PatioId),
    CreateCompletePatio(String),
    ListBoxes(PatioId),
    CreateBox(String),
    UpdateBox(BoxId, String),
    DeleteBox(BoxId),
    ListZones(PatioId),
    CreateZone(String),
    UpdateZone(ZoneId, String),
    DeleteZone(ZoneId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum FailOn {
    ListBoxes,
    CreateBox,
    UpdateBox,
    DeleteBox,
    CreateZone,
    DeleteZone,
    UpdatePatio,
}

#[derive(Default)]
struct FakeState {
    patio: Option<Patio>,
    boxes: Vec<ParkingBox>,
    zones: Vec<Zone>,
    next_id: i64,
    calls: Vec<Call>,
    failures: HashMap<(FailOn, String), (u16, String)>,
    last_update: Option<BoxRequest>,
    last_complete: Option<CompletePatioRequest>,
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    state: Mutex<FakeState>,
}

pub(crate) fn patio(id: i64, name: &str) -> Patio {
    Patio {
        id_patio: PatioId(id),
        nome_patio: name.to_string(),
        status: PatioStatus::Active,
        observacao: None,
        data_cadastro: NaiveDate::from_ymd_opt(2025, 1, 10),
        contato: None,
        endereco: None,
    }
}

pub(crate) fn server_box(id: i64, name: &str) -> ParkingBox {
    ParkingBox {
        id_box: BoxId(id),
        nome: name.to_string(),
        status: BoxStatus::Free,
        data_entrada: NaiveDate::from_ymd_opt(2025, 1, 10).and_then(|d| d.and_hms_opt(8, 0, 0)),
        data_saida: None,
        observacao: Some(format!("obs {name}")),
        patio_id: Some(PatioId(1)),
        patio_status: Some(PatioStatus::Active),
    }
}

pub(crate) fn server_zone(id: i64, name: &str) -> Zone {
    Zone {
        id_zona: ZoneId(id),
        nome: name.to_string(),
        status: PatioStatus::Active,
        observacao: None,
        patio_id: Some(PatioId(1)),
        patio_status: Some(PatioStatus::Active),
    }
}

impl FakeBackend {
    pub(crate) fn with_patio(patio: Patio, zones: Vec<Zone>, boxes: Vec<ParkingBox>) -> Self {
        let backend = Self::default();
        {
            let mut state = backend.lock();
            state.patio = Some(patio);
            state.zones = zones;
            state.boxes = boxes;
            state.next_id = 100;
        }
        backend
    }

    /// Makes the given operation on `name` (or `""` for list calls) fail with `status`.
    pub(crate) fn fail(&self, on: FailOn, name: &str, status: u16, message: &str) {
        self.lock()
            .failures
            .insert((on, name_key(name)), (status, message.to_string()));
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub(crate) fn count_calls(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| pred(call)).count()
    }

    pub(crate) fn box_names(&self) -> Vec<String> {
        self.lock().boxes.iter().map(|b| b.nome.clone()).collect()
    }

    pub(crate) fn zone_names(&self) -> Vec<String> {
        self.lock().zones.iter().map(|z| z.nome.clone()).collect()
    }

    pub(crate) fn last_box_update(&self) -> Option<BoxRequest> {
        self.lock().last_update.clone()
    }

    pub(crate) fn last_complete_request(&self) -> Option<CompletePatioRequest> {
        self.lock().last_complete.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake backend lock")
    }

    fn record(&self, call: Call) {
        self.lock().calls.push(call);
    }

    fn check(&self, on: FailOn, name: &str) -> ClientResult<()> {
        match self.lock().failures.get(&(on, name_key(name))) {
            Some((status, message)) => {
                let body = ApiErrorBody {
                    status: Some(*status),
                    message: Some(message.clone()),
                    ..ApiErrorBody::default()
                };
                Err(ClientError::Api(ApiException::from_response(*status, body, "erro")))
            }
            None => Ok(()),
        }
    }

    fn next_id(&self) -> i64 {
        let mut state = self.lock();
        state.next_id += 1;
        state.next_id
    }

    fn not_found() -> ClientError {
        ClientError::Api(ApiException::from_response(
            404,
            ApiErrorBody::default(),
            "Erro na API: 404 - Not Found",
        ))
    }
}

#[async_trait]
impl YardBackend for FakeBackend {
    async fn fetch_patio(&self, patio_id: PatioId) -> ClientResult<Patio> {
        self.record(Call::FetchPatio(patio_id));
        self.lock()
            .patio
            .clone()
            .filter(|patio| patio.id_patio == patio_id)
            .ok_or_else(Self::not_found)
    }

    async fn update_patio(&self, patio_id: PatioId, request: &PatioRequest) -> ClientResult<Patio> {
        self.record(Call::UpdatePatio(patio_id));
        self.check(FailOn::UpdatePatio, "")?;
        let mut state = self.lock();
        let patio = state.patio.as_mut().ok_or_else(Self::not_found)?;
        patio.nome_patio = request.nome_patio.clone();
        patio.status = request.status;
        patio.observacao = Some(request.observacao.clone());
        Ok(patio.clone())
    }

    async fn create_complete_patio(&self, request: &CompletePatioRequest) -> ClientResult<Patio> {
        self.record(Call::CreateCompletePatio(request.patio.nome_patio.clone()));
        let id = self.next_id();
        self.lock().last_complete = Some(request.clone());
        Ok(patio(id, &request.patio.nome_patio))
    }

    async fn list_patio_boxes(
        &self,
        patio_id: PatioId,
        _patio_status: PatioStatus,
    ) -> ClientResult<Vec<ParkingBox>> {
        self.record(Call::ListBoxes(patio_id));
        self.check(FailOn::ListBoxes, "")?;
        Ok(self.lock().boxes.clone())
    }

    async fn create_box(&self, request: &BoxRequest) -> ClientResult<ParkingBox> {
        self.record(Call::CreateBox(request.nome.clone()));
        self.check(FailOn::CreateBox, &request.nome)?;
        let id = self.next_id();
        let created = ParkingBox {
            id_box: BoxId(id),
            nome: request.nome.clone(),
            status: request.status,
            data_entrada: Some(request.data_entrada),
            data_saida: Some(request.data_saida),
            observacao: Some(request.observacao.clone()),
            patio_id: Some(request.patio_id),
            patio_status: Some(request.patio_status),
        };
        self.lock().boxes.push(created.clone());
        Ok(created)
    }

    async fn update_box(&self, box_id: BoxId, request: &BoxRequest) -> ClientResult<ParkingBox> {
        self.record(Call::UpdateBox(box_id, request.nome.clone()));
        self.check(FailOn::UpdateBox, &request.nome)?;
        let mut state = self.lock();
        state.last_update = Some(request.clone());
        let existing = state
            .boxes
            .iter_mut()
            .find(|b| b.id_box == box_id)
            .ok_or_else(Self::not_found)?;
        existing.nome = request.nome.clone();
        existing.status = request.status;
        existing.observacao = Some(request.observacao.clone());
        Ok(existing.clone())
    }

    async fn delete_box(&self, box_id: BoxId) -> ClientResult<()> {
        self.record(Call::DeleteBox(box_id));
        let name = self
            .lock()
            .boxes
            .iter()
            .find(|b| b.id_box == box_id)
            .map(|b| b.nome.clone())
            .unwrap_or_default();
        self.check(FailOn::DeleteBox, &name)?;
        self.lock().boxes.retain(|b| b.id_box != box_id);
        Ok(())
    }

    async fn list_patio_zones(
        &self,
        patio_id: PatioId,
        _patio_status: PatioStatus,
    ) -> ClientResult<Vec<Zone>> {
        self.record(Call::ListZones(patio_id));
        Ok(self.lock().zones.clone())
    }

    async fn create_zone(&self, request: &ZoneRequest) -> ClientResult<Zone> {
        self.record(Call::CreateZone(request.nome.clone()));
        self.check(FailOn::CreateZone, &request.nome)?;
        let id = self.next_id();
        let created = Zone {
            id_zona: ZoneId(id),
            nome: request.nome.clone(),
            status: request.status,
            observacao: Some(request.observacao.clone()),
            patio_id: Some(request.patio_id),
            patio_status: Some(request.patio_status),
        };
        self.lock().zones.push(created.clone());
        Ok(created)
    }

    async fn update_zone(&self, zone_id: ZoneId, request: &ZoneRequest) -> ClientResult<Zone> {
        self.record(Call::UpdateZone(zone_id, request.nome.clone()));
        let mut state = self.lock();
        let existing = state
            .zones
            .iter_mut()
            .find(|z| z.id_zona == zone_id)
            .ok_or_else(Self::not_found)?;
        existing.nome = request.nome.clone();
        existing.status = request.status;
        Ok(existing.clone())
    }

    async fn delete_patio_zone(
        &self,
        _patio_id: PatioId,
        _patio_status: PatioStatus,
        zone_id: ZoneId,
    ) -> ClientResult<()> {
        self.record(Call::DeleteZone(zone_id));
        let name = self
            .lock()
            .zones
            .iter()
            .find(|z| z.id_zona == zone_id)
            .map(|z| z.nome.clone())
            .unwrap_or_default();
        self.check(FailOn::DeleteZone, &name)?;
        self.lock().zones.retain(|z| z.id_zona != zone_id);
        Ok(())
    }
}
