use serde::Deserialize;
use shared::{domain::digits_only, protocol::Locality};
use tracing::debug;

use crate::{error::ClientError, ApiClient, ClientResult};

/// ViaCEP answer. A missing postal code comes back as `200 {"erro": true}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ViaCepResponse {
    logradouro: Option<String>,
    bairro: Option<String>,
    localidade: Option<String>,
    uf: Option<String>,
    erro: Option<serde_json::Value>,
}

impl ViaCepResponse {
    fn not_found(&self) -> bool {
        match &self.erro {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::String(text)) => !text.is_empty() && text != "false",
            Some(_) => true,
        }
    }

    fn into_locality(self) -> Locality {
        Locality {
            logradouro: self.logradouro.unwrap_or_default(),
            bairro: self.bairro.unwrap_or_default(),
            cidade: self.localidade.unwrap_or_default(),
            estado: self.uf.unwrap_or_default(),
            ..Locality::default()
        }
    }
}

impl ApiClient {
    /// Resolves a Brazilian postal code into locality fields.
    pub async fn lookup_cep(&self, cep: &str) -> ClientResult<Locality> {
        let digits = digits_only(cep);
        if digits.len() != 8 {
            return Err(ClientError::Lookup("CEP deve ter 8 dígitos".into()));
        }

        let response = self.http().get(self.cep_endpoint(&digits)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Lookup(format!(
                "Erro ao buscar CEP: {}",
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body: ViaCepResponse = serde_json::from_slice(&response.bytes().await?)?;
        if body.not_found() {
            debug!(cep = %digits, "cep: not found");
            return Err(ClientError::Lookup("CEP não encontrado ou inválido".into()));
        }
        Ok(body.into_locality())
    }
}
