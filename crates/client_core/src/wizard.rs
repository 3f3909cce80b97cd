//! Multi-step patio wizard: aggregate state, per-step validators and the
//! payload handed to `POST /patios/completo`.

use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};
use shared::{
    domain::{digits_only, name_key, BoxStatus, ZoneStatus},
    protocol::{
        AddressRequest, AddressWithLocality, CompletePatioBox, CompletePatioRequest,
        CompletePatioZone, ContactRequest, Locality, ParkingBox, Patio, PatioBasics, Zone,
    },
};
use thiserror::Error;

use crate::error::FieldErrors;

const NEXT_STEP_BLOCKED: &str = "Por favor, corrija os erros antes de continuar.";
const JUMP_BLOCKED: &str = "Por favor, preencha todos os campos obrigatórios antes de avançar.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    Patio,
    Contacts,
    Location,
    Zones,
    Boxes,
    Summary,
}

impl WizardStep {
    pub const ALL: [WizardStep; 6] = [
        Self::Patio,
        Self::Contacts,
        Self::Location,
        Self::Zones,
        Self::Boxes,
        Self::Summary,
    ];

    /// 1-based position as shown in the step header.
    pub fn index(self) -> usize {
        match self {
            Self::Patio => 1,
            Self::Contacts => 2,
            Self::Location => 3,
            Self::Zones => 4,
            Self::Boxes => 5,
            Self::Summary => 6,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index.checked_sub(1)?).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Patio => "Pátio",
            Self::Contacts => "Contatos",
            Self::Location => "Localização",
            Self::Zones => "Zonas",
            Self::Boxes => "Boxes",
            Self::Summary => "Resumo",
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        Self::from_index(self.index() - 1)
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.index())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneDraft {
    pub nome: String,
    #[serde(default)]
    pub status: ZoneStatus,
    #[serde(default)]
    pub observacao: String,
}

impl ZoneDraft {
    pub fn named(nome: impl Into<String>) -> Self {
        Self {
            nome: nome.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxDraft {
    pub nome: String,
    /// `None` lets the server keep its status on update and defaults to free on create.
    #[serde(default)]
    pub status: Option<BoxStatus>,
    #[serde(default)]
    pub observacao: String,
    #[serde(default)]
    pub zona_nome: Option<String>,
}

impl BoxDraft {
    pub fn named(nome: impl Into<String>) -> Self {
        Self {
            nome: nome.into(),
            ..Self::default()
        }
    }
}

/// Everything the wizard collects across its steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WizardData {
    pub patio: PatioBasics,
    pub contato: ContactRequest,
    pub endereco: AddressRequest,
    #[serde(rename = "dadosViaCep")]
    pub locality: Locality,
    pub zonas: Vec<ZoneDraft>,
    pub boxes: Vec<BoxDraft>,
}

impl WizardData {
    /// Edit-mode seed built from server records.
    pub fn from_existing(patio: &Patio, zones: &[Zone], boxes: &[ParkingBox]) -> Self {
        let contato = patio
            .contato
            .as_ref()
            .map(ContactRequest::from)
            .unwrap_or_default();
        let (endereco, locality) = patio
            .endereco
            .as_ref()
            .map(|address| (address.to_request(), address.locality()))
            .unwrap_or_default();
        Self {
            patio: PatioBasics {
                nome_patio: patio.nome_patio.clone(),
                status: patio.status,
                observacao: patio.observacao.clone().unwrap_or_default(),
            },
            contato,
            endereco,
            locality,
            zonas: zones
                .iter()
                .map(|zone| ZoneDraft {
                    nome: zone.nome.clone(),
                    status: zone.status,
                    observacao: zone.observacao.clone().unwrap_or_default(),
                })
                .collect(),
            boxes: boxes
                .iter()
                .map(|parking_box| BoxDraft {
                    nome: parking_box.nome.clone(),
                    status: Some(parking_box.status),
                    observacao: parking_box.observacao.clone().unwrap_or_default(),
                    zona_nome: None,
                })
                .collect(),
        }
    }

    pub fn to_complete_request(&self) -> CompletePatioRequest {
        CompletePatioRequest {
            patio: self.patio.clone(),
            contato: self.contato.clone(),
            endereco: AddressWithLocality {
                address: self.endereco.clone(),
                locality: self.locality.clone(),
            },
            zonas: self
                .zonas
                .iter()
                .map(|zone| CompletePatioZone {
                    nome: zone.nome.clone(),
                    status: zone.status,
                    observacao: zone.observacao.clone(),
                })
                .collect(),
            boxes: self
                .boxes
                .iter()
                .map(|draft| CompletePatioBox {
                    nome: draft.nome.clone(),
                    status: draft.status.unwrap_or_default(),
                    observacao: draft.observacao.clone(),
                    zona_nome: draft
                        .zona_nome
                        .clone()
                        .filter(|zona| !zona.trim().is_empty()),
                })
                .collect(),
        }
    }
}

/// A step that failed validation, with its field errors.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("etapa {step} inválida: {}", join_messages(.errors))]
pub struct InvalidStep {
    pub step: WizardStep,
    pub errors: FieldErrors,
}

fn join_messages(errors: &FieldErrors) -> String {
    errors.values().map(String::as_str).collect::<Vec<_>>().join("; ")
}

/// Pure validator for one step. An empty map means the step passes.
pub fn validate_step(step: WizardStep, data: &WizardData) -> FieldErrors {
    match step {
        WizardStep::Patio => validate_patio(&data.patio),
        WizardStep::Contacts => validate_contacts(&data.contato),
        WizardStep::Location => validate_location(&data.endereco),
        WizardStep::Zones => validate_zones(&data.zonas),
        WizardStep::Boxes => validate_boxes(&data.boxes, &data.zonas),
        WizardStep::Summary => FieldErrors::new(),
    }
}

fn validate_patio(patio: &PatioBasics) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let name = patio.nome_patio.trim();
    let len = name.chars().count();
    if name.is_empty() {
        errors.insert("nomePatio".into(), "Nome do pátio é obrigatório".into());
    } else if len < 3 {
        errors.insert("nomePatio".into(), "Nome deve ter pelo menos 3 caracteres".into());
    } else if len > 50 {
        errors.insert("nomePatio".into(), "Nome deve ter no máximo 50 caracteres".into());
    }
    errors
}

fn validate_contacts(contato: &ContactRequest) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if contato.email.trim().is_empty() {
        errors.insert("email".into(), "E-mail é obrigatório".into());
    } else if !is_email_shape(&contato.email) {
        errors.insert("email".into(), "E-mail inválido".into());
    }

    if let Some(message) = phone_error(&contato.telefone1, "Telefone fixo") {
        errors.insert("telefone1".into(), message);
    }
    if let Some(message) = phone_error(&contato.celular, "Celular") {
        errors.insert("celular".into(), message);
    }

    if !(11..=99).contains(&contato.ddd) {
        errors.insert("ddd".into(), "DDD deve estar entre 11 e 99".into());
    }
    if !(1..=999).contains(&contato.ddi) {
        errors.insert("ddi".into(), "DDI deve estar entre 1 e 999".into());
    }
    errors
}

fn phone_error(raw: &str, label: &str) -> Option<String> {
    if raw.trim().is_empty() {
        Some(format!("{label} é obrigatório"))
    } else if digits_only(raw).len() < 10 {
        Some(format!("{label} deve ter pelo menos 10 dígitos"))
    } else {
        None
    }
}

/// `local@domain.tld` with no whitespace and a single `@`.
fn is_email_shape(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

fn validate_location(endereco: &AddressRequest) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if digits_only(&endereco.cep).len() != 8 {
        errors.insert("cep".into(), "CEP deve ter 8 dígitos".into());
    }
    if endereco.numero <= 0 {
        errors.insert("numero".into(), "Número é obrigatório".into());
    }
    errors
}

fn validate_zones(zonas: &[ZoneDraft]) -> FieldErrors {
    let message = if zonas.is_empty() {
        Some("Pelo menos uma zona deve ser criada".to_string())
    } else if zonas.iter().any(|zone| zone.nome.trim().is_empty()) {
        Some("Todas as zonas devem ter um nome".to_string())
    } else {
        first_duplicate(zonas.iter().map(|zone| zone.nome.as_str()))
            .map(|name| format!("Já existe uma zona com o nome \"{name}\""))
    };
    single_error("zonas", message)
}

fn validate_boxes(boxes: &[BoxDraft], zonas: &[ZoneDraft]) -> FieldErrors {
    let message = if boxes.is_empty() {
        Some("Pelo menos um box deve ser criado".to_string())
    } else if boxes.iter().any(|draft| draft.nome.trim().is_empty()) {
        Some("Todos os boxes devem ter um nome".to_string())
    } else if let Some(name) = first_duplicate(boxes.iter().map(|draft| draft.nome.as_str())) {
        Some(format!("Já existe um box com o nome \"{name}\""))
    } else {
        let known: HashSet<String> = zonas.iter().map(|zone| name_key(zone.nome.trim())).collect();
        boxes
            .iter()
            .filter_map(|draft| {
                let zona = draft.zona_nome.as_deref()?.trim();
                (!zona.is_empty() && !known.contains(&name_key(zona)))
                    .then(|| format!("Box \"{}\" referencia uma zona inexistente: {zona}", draft.nome))
            })
            .next()
    };
    single_error("boxes", message)
}

fn first_duplicate<'a>(names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    names.into_iter().find(|name| !seen.insert(name_key(name.trim())))
}

fn single_error(field: &str, message: Option<String>) -> FieldErrors {
    message
        .map(|message| FieldErrors::from([(field.to_string(), message)]))
        .unwrap_or_default()
}

/// Step controller over [`WizardData`]. Holds the current step and the errors of
/// the last validation.
#[derive(Debug, Clone)]
pub struct Wizard {
    data: WizardData,
    step: WizardStep,
    errors: FieldErrors,
    error: Option<String>,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self::with_data(WizardData::default())
    }

    pub fn with_data(data: WizardData) -> Self {
        Self {
            data,
            step: WizardStep::Patio,
            errors: FieldErrors::new(),
            error: None,
        }
    }

    pub fn for_existing(patio: &Patio, zones: &[Zone], boxes: &[ParkingBox]) -> Self {
        Self::with_data(WizardData::from_existing(patio, zones, boxes))
    }

    pub fn data(&self) -> &WizardData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut WizardData {
        &mut self.data
    }

    pub fn into_data(self) -> WizardData {
        self.data
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Page-level message left by the last blocked navigation.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Validates the current step and records its errors.
    pub fn validate_current(&mut self) -> bool {
        self.errors = validate_step(self.step, &self.data);
        self.errors.is_empty()
    }

    /// Moves forward one step when the current one validates.
    pub fn next(&mut self) -> bool {
        if !self.validate_current() {
            self.error = Some(NEXT_STEP_BLOCKED.to_string());
            return false;
        }
        let Some(next) = self.step.next() else {
            return false;
        };
        self.move_to(next);
        true
    }

    pub fn back(&mut self) {
        let previous = self.step.previous().unwrap_or(self.step);
        self.move_to(previous);
    }

    /// Header navigation: any earlier step, or the immediate next one after validation.
    pub fn go_to(&mut self, target: WizardStep) -> bool {
        if target == self.step {
            return true;
        }
        if target < self.step {
            self.move_to(target);
            return true;
        }
        if Some(target) != self.step.next() {
            return false;
        }
        if !self.validate_current() {
            self.error = Some(JUMP_BLOCKED.to_string());
            return false;
        }
        self.move_to(target);
        true
    }

    fn move_to(&mut self, step: WizardStep) {
        self.step = step;
        self.errors.clear();
        self.error = None;
    }

    /// Re-validates every step; the first failing one is reported and its errors recorded.
    pub fn validate_all(&mut self) -> Result<(), InvalidStep> {
        for step in WizardStep::ALL {
            let errors = validate_step(step, &self.data);
            if !errors.is_empty() {
                self.errors = errors.clone();
                return Err(InvalidStep { step, errors });
            }
        }
        self.errors.clear();
        Ok(())
    }

    pub fn apply_postal_lookup(&mut self, locality: Locality) {
        self.data.locality = locality;
    }

    pub fn add_zone(&mut self, zone: ZoneDraft) {
        self.data.zonas.push(zone);
    }

    /// Removes the zone and clears it from boxes that referenced it.
    pub fn remove_zone(&mut self, name: &str) -> Option<ZoneDraft> {
        let key = name_key(name.trim());
        let position = self
            .data
            .zonas
            .iter()
            .position(|zone| name_key(zone.nome.trim()) == key)?;
        for draft in &mut self.data.boxes {
            if draft
                .zona_nome
                .as_deref()
                .is_some_and(|zona| name_key(zona.trim()) == key)
            {
                draft.zona_nome = None;
            }
        }
        Some(self.data.zonas.remove(position))
    }

    pub fn add_box(&mut self, draft: BoxDraft) {
        self.data.boxes.push(draft);
    }

    pub fn remove_box(&mut self, name: &str) -> Option<BoxDraft> {
        let key = name_key(name.trim());
        let position = self
            .data
            .boxes
            .iter()
            .position(|draft| name_key(draft.nome.trim()) == key)?;
        Some(self.data.boxes.remove(position))
    }

    /// Appends `count` boxes named `PREFIX001`, `PREFIX002`, ... skipping names
    /// already taken. Returns the number of boxes added.
    pub fn generate_boxes(&mut self, prefix: &str, count: usize, zone: Option<&str>) -> usize {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return 0;
        }
        let mut taken: HashSet<String> = self
            .data
            .boxes
            .iter()
            .map(|draft| name_key(draft.nome.trim()))
            .collect();
        let mut added = 0;
        let mut sequence = 1usize;
        while added < count {
            let nome = format!("{prefix}{sequence:03}");
            sequence += 1;
            if !taken.insert(name_key(&nome)) {
                continue;
            }
            self.data.boxes.push(BoxDraft {
                nome,
                status: Some(BoxStatus::Free),
                observacao: String::new(),
                zona_nome: zone.map(str::to_string),
            });
            added += 1;
        }
        added
    }

    pub fn to_complete_request(&self) -> CompletePatioRequest {
        self.data.to_complete_request()
    }
}

#[cfg(test)]
#[path = "tests/wizard_tests.rs"]
mod tests;
