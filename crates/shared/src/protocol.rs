use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AddressId, BoxId, BoxStatus, ClientId, ContactId, NotificationId, ParkingId, PatioId,
    PatioStatus, VehicleId, ZoneId, ZoneStatus,
};

/// Spring Data `Page` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpringPage<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
}

impl<T> SpringPage<T> {
    pub fn single(content: Vec<T>) -> Self {
        let len = content.len();
        Self {
            content,
            number: 0,
            size: len as u32,
            total_elements: len as u64,
            total_pages: u32::from(len > 0),
            first: true,
            last: true,
        }
    }
}

/// Some listing endpoints answer with a page, others with a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PageOrList<T> {
    Page(SpringPage<T>),
    List(Vec<T>),
}

impl<T> PageOrList<T> {
    pub fn into_page(self) -> SpringPage<T> {
        match self {
            Self::Page(page) => page,
            Self::List(items) => SpringPage::single(items),
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Page(page) => page.content,
            Self::List(items) => items,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    /// Used wherever the whole collection is needed in one response.
    pub const ALL: Self = Self { page: 0, size: 9999 };
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 0, size: 10 }
    }
}

// ---- contacts ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    pub email: String,
    pub ddd: u16,
    pub ddi: u16,
    pub telefone1: String,
    #[serde(default)]
    pub telefone2: String,
    #[serde(default)]
    pub telefone3: String,
    pub celular: String,
    #[serde(default)]
    pub outro: String,
    #[serde(default)]
    pub observacao: String,
}

impl Default for ContactRequest {
    fn default() -> Self {
        Self {
            email: String::new(),
            ddd: 11,
            ddi: 55,
            telefone1: String::new(),
            telefone2: String::new(),
            telefone3: String::new(),
            celular: String::new(),
            outro: String::new(),
            observacao: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id_contato: ContactId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub ddd: Option<u16>,
    #[serde(default)]
    pub ddi: Option<u16>,
    #[serde(default)]
    pub telefone1: Option<String>,
    #[serde(default)]
    pub telefone2: Option<String>,
    #[serde(default)]
    pub telefone3: Option<String>,
    #[serde(default)]
    pub celular: Option<String>,
    #[serde(default)]
    pub outro: Option<String>,
    #[serde(default)]
    pub observacao: Option<String>,
}

impl From<&Contact> for ContactRequest {
    fn from(value: &Contact) -> Self {
        let defaults = ContactRequest::default();
        Self {
            email: value.email.clone(),
            ddd: value.ddd.unwrap_or(defaults.ddd),
            ddi: value.ddi.unwrap_or(defaults.ddi),
            telefone1: value.telefone1.clone().unwrap_or_default(),
            telefone2: value.telefone2.clone().unwrap_or_default(),
            telefone3: value.telefone3.clone().unwrap_or_default(),
            celular: value.celular.clone().unwrap_or_default(),
            outro: value.outro.clone().unwrap_or_default(),
            observacao: value.observacao.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub celular: Option<String>,
}

// ---- addresses ----

/// Locality fields derived from a postal-code lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Locality {
    #[serde(default)]
    pub logradouro: String,
    #[serde(default)]
    pub bairro: String,
    #[serde(default)]
    pub cidade: String,
    #[serde(default)]
    pub estado: String,
    #[serde(default)]
    pub pais: String,
}

impl Default for Locality {
    fn default() -> Self {
        Self {
            logradouro: String::new(),
            bairro: String::new(),
            cidade: String::new(),
            estado: String::new(),
            pais: "Brasil".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub cep: String,
    pub numero: i32,
    #[serde(default)]
    pub complemento: String,
    #[serde(default)]
    pub observacao: String,
}

/// Address payload with locality merged in, as the complete-patio endpoint expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressWithLocality {
    #[serde(flatten)]
    pub address: AddressRequest,
    #[serde(flatten)]
    pub locality: Locality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id_endereco: AddressId,
    #[serde(default)]
    pub cep: String,
    #[serde(default)]
    pub numero: Option<i32>,
    #[serde(default)]
    pub complemento: Option<String>,
    #[serde(default)]
    pub observacao: Option<String>,
    #[serde(default)]
    pub logradouro: Option<String>,
    #[serde(default)]
    pub bairro: Option<String>,
    #[serde(default)]
    pub cidade: Option<String>,
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default)]
    pub pais: Option<String>,
}

impl Address {
    pub fn to_request(&self) -> AddressRequest {
        AddressRequest {
            cep: self.cep.clone(),
            numero: self.numero.unwrap_or_default(),
            complemento: self.complemento.clone().unwrap_or_default(),
            observacao: self.observacao.clone().unwrap_or_default(),
        }
    }

    pub fn locality(&self) -> Locality {
        let defaults = Locality::default();
        Locality {
            logradouro: self.logradouro.clone().unwrap_or_default(),
            bairro: self.bairro.clone().unwrap_or_default(),
            cidade: self.cidade.clone().unwrap_or_default(),
            estado: self.estado.clone().unwrap_or_default(),
            pais: self
                .pais
                .clone()
                .filter(|pais| !pais.is_empty())
                .unwrap_or(defaults.pais),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cep: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
}

// ---- patios ----

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatioRequest {
    pub nome_patio: String,
    pub status: PatioStatus,
    #[serde(default)]
    pub observacao: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contato_id: Option<ContactId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endereco_id: Option<AddressId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patio {
    pub id_patio: PatioId,
    pub nome_patio: String,
    pub status: PatioStatus,
    #[serde(default)]
    pub observacao: Option<String>,
    #[serde(default)]
    pub data_cadastro: Option<NaiveDate>,
    #[serde(default)]
    pub contato: Option<Contact>,
    #[serde(default)]
    pub endereco: Option<Address>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatioFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome_patio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PatioStatus>,
}

/// Patio section of the complete-patio payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatioBasics {
    pub nome_patio: String,
    pub status: PatioStatus,
    #[serde(default)]
    pub observacao: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletePatioZone {
    pub nome: String,
    pub status: ZoneStatus,
    pub observacao: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletePatioBox {
    pub nome: String,
    pub status: BoxStatus,
    pub observacao: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zona_nome: Option<String>,
}

/// Body of `POST /patios/completo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletePatioRequest {
    pub patio: PatioBasics,
    pub contato: ContactRequest,
    pub endereco: AddressWithLocality,
    pub zonas: Vec<CompletePatioZone>,
    pub boxes: Vec<CompletePatioBox>,
}

// ---- zones ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRequest {
    pub nome: String,
    pub status: ZoneStatus,
    #[serde(default)]
    pub observacao: String,
    pub patio_id: PatioId,
    pub patio_status: PatioStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id_zona: ZoneId,
    pub nome: String,
    #[serde(default)]
    pub status: ZoneStatus,
    #[serde(default)]
    pub observacao: Option<String>,
    #[serde(default)]
    pub patio_id: Option<PatioId>,
    #[serde(default)]
    pub patio_status: Option<PatioStatus>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ZoneStatus>,
}

// ---- boxes ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxRequest {
    pub nome: String,
    pub status: BoxStatus,
    pub data_entrada: NaiveDateTime,
    pub data_saida: NaiveDateTime,
    #[serde(default)]
    pub observacao: String,
    pub patio_id: PatioId,
    pub patio_status: PatioStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingBox {
    pub id_box: BoxId,
    pub nome: String,
    #[serde(default)]
    pub status: BoxStatus,
    #[serde(default)]
    pub data_entrada: Option<NaiveDateTime>,
    #[serde(default)]
    pub data_saida: Option<NaiveDateTime>,
    #[serde(default)]
    pub observacao: Option<String>,
    #[serde(default)]
    pub patio_id: Option<PatioId>,
    #[serde(default)]
    pub patio_status: Option<PatioStatus>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BoxStatus>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxBatchRequest {
    pub prefixo: String,
    pub quantidade: u32,
}

// ---- clients ----

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRequest {
    pub nome: String,
    pub sobrenome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sexo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_nascimento: Option<NaiveDate>,
    pub cpf: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profissao: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estado_civil: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contato_id: Option<ContactId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endereco_id: Option<AddressId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id_cliente: ClientId,
    pub nome: String,
    #[serde(default)]
    pub sobrenome: Option<String>,
    #[serde(default)]
    pub sexo: Option<String>,
    #[serde(default)]
    pub data_nascimento: Option<NaiveDate>,
    #[serde(default)]
    pub data_cadastro: Option<NaiveDate>,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub profissao: Option<String>,
    #[serde(default)]
    pub estado_civil: Option<String>,
    #[serde(default)]
    pub contato: Option<Contact>,
    #[serde(default)]
    pub endereco: Option<Address>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sobrenome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
}

// ---- vehicles ----

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRequest {
    pub placa: String,
    pub renavam: String,
    pub chassi: String,
    pub fabricante: String,
    pub modelo: String,
    #[serde(default)]
    pub motor: String,
    pub ano: i32,
    #[serde(default)]
    pub combustivel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_operacional: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_ble_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id_veiculo: VehicleId,
    pub placa: String,
    #[serde(default)]
    pub renavam: Option<String>,
    #[serde(default)]
    pub chassi: Option<String>,
    #[serde(default)]
    pub fabricante: Option<String>,
    #[serde(default)]
    pub modelo: Option<String>,
    #[serde(default)]
    pub motor: Option<String>,
    #[serde(default)]
    pub ano: Option<i32>,
    #[serde(default)]
    pub combustivel: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_operacional: Option<String>,
    #[serde(default)]
    pub tag_ble_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modelo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fabricante: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Where a vehicle currently sits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleLocation {
    pub id_veiculo: VehicleId,
    pub placa: String,
    #[serde(default)]
    pub modelo: Option<String>,
    #[serde(default)]
    pub fabricante: Option<String>,
    #[serde(default)]
    pub status_operacional: Option<String>,
    #[serde(default)]
    pub patio_associado: Option<ParkingPatioSummary>,
    #[serde(default)]
    pub zona_associada: Option<Zone>,
    #[serde(default)]
    pub box_associado: Option<ParkingBoxSummary>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextBleTag {
    pub tag_ble_id: String,
}

// ---- parking records ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingVehicleSummary {
    pub id_veiculo: VehicleId,
    pub placa: String,
    #[serde(default)]
    pub modelo: Option<String>,
    #[serde(default)]
    pub fabricante: Option<String>,
    #[serde(default)]
    pub tag_ble_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingBoxSummary {
    pub id_box: BoxId,
    pub nome: String,
    #[serde(default)]
    pub status: BoxStatus,
    #[serde(default)]
    pub data_entrada: Option<NaiveDateTime>,
    #[serde(default)]
    pub data_saida: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingPatioSummary {
    pub id_patio: PatioId,
    pub nome_patio: String,
    #[serde(default)]
    pub status: Option<PatioStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingRecord {
    pub id_estacionamento: ParkingId,
    pub veiculo: ParkingVehicleSummary,
    pub r#box: ParkingBoxSummary,
    pub patio: ParkingPatioSummary,
    pub esta_estacionado: bool,
    pub data_entrada: NaiveDateTime,
    #[serde(default)]
    pub data_saida: Option<NaiveDateTime>,
    #[serde(default)]
    pub data_ultima_atualizacao: Option<NaiveDateTime>,
    #[serde(default)]
    pub observacoes: Option<String>,
    #[serde(default)]
    pub tempo_estacionado_minutos: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkRequest {
    pub placa: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_id: Option<BoxId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patio_id: Option<PatioId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRequest {
    pub placa: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observacoes: Option<String>,
}

// ---- notifications ----

/// Notification as shown in the notifications view. Decoding is lenient because the
/// REST listing and the live stream do not agree on field names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub tipo: String,
    pub titulo: String,
    pub mensagem: String,
    pub data_hora: String,
    pub lida: bool,
    pub prioridade: String,
    pub categoria: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_redirecionamento: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNotification {
    #[serde(default)]
    id_notificacao: Option<i64>,
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    tipo: Option<String>,
    #[serde(default)]
    titulo: Option<String>,
    #[serde(default)]
    mensagem: Option<String>,
    #[serde(default)]
    data_hora_criacao: Option<String>,
    #[serde(default)]
    data_hora: Option<String>,
    #[serde(default)]
    lida: Option<bool>,
    #[serde(default)]
    prioridade: Option<String>,
    #[serde(default)]
    categoria: Option<String>,
    #[serde(default)]
    url_redirecionamento: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl<'de> Deserialize<'de> for Notification {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawNotification::deserialize(deserializer)?;
        let lower_or = |value: Option<String>, default: &str| {
            non_empty(value)
                .map(|v| v.to_lowercase())
                .unwrap_or_else(|| default.to_string())
        };
        Ok(Self {
            id: NotificationId(raw.id_notificacao.or(raw.id).unwrap_or_default()),
            tipo: lower_or(raw.tipo, "info"),
            titulo: non_empty(raw.titulo).unwrap_or_else(|| "Notificação".to_string()),
            mensagem: non_empty(raw.mensagem).unwrap_or_else(|| "Sem mensagem".to_string()),
            data_hora: non_empty(raw.data_hora_criacao)
                .or_else(|| non_empty(raw.data_hora))
                .unwrap_or_default(),
            lida: raw.lida.unwrap_or(false),
            prioridade: lower_or(raw.prioridade, "media"),
            categoria: lower_or(raw.categoria, "sistema"),
            url_redirecionamento: non_empty(raw.url_redirecionamento),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lida: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prioridade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categoria: Option<String>,
}
