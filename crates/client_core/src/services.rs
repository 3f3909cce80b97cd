//! Thin wrappers over the REST endpoints, one service per resource.

use async_trait::async_trait;
use shared::{
    domain::{
        AddressId, BoxId, ClientId, ContactId, NotificationId, PatioId, PatioStatus, VehicleId,
        ZoneId,
    },
    protocol::{
        Address, AddressFilter, AddressRequest, BoxBatchRequest, BoxFilter, BoxRequest, Client,
        ClientFilter, ClientRequest, CompletePatioRequest, Contact, ContactFilter,
        ContactRequest, NextBleTag, Notification, NotificationFilter, PageOrList, PageRequest,
        ParkRequest, ParkingBox, ParkingRecord, Patio, PatioFilter, PatioRequest, ReleaseRequest,
        SpringPage, Vehicle, VehicleFilter, VehicleLocation, VehicleRequest, Zone, ZoneFilter,
        ZoneRequest,
    },
};

use crate::{error::ClientResult, ApiClient, YardBackend};

impl ApiClient {
    pub fn patios(&self) -> PatioService<'_> {
        PatioService { api: self }
    }

    pub fn boxes(&self) -> BoxService<'_> {
        BoxService { api: self }
    }

    pub fn zones(&self) -> ZoneService<'_> {
        ZoneService { api: self }
    }

    pub fn contacts(&self) -> ContactService<'_> {
        ContactService { api: self }
    }

    pub fn addresses(&self) -> AddressService<'_> {
        AddressService { api: self }
    }

    pub fn clients(&self) -> ClientService<'_> {
        ClientService { api: self }
    }

    pub fn vehicles(&self) -> VehicleService<'_> {
        VehicleService { api: self }
    }

    pub fn parking(&self) -> ParkingService<'_> {
        ParkingService { api: self }
    }

    pub fn notifications(&self) -> NotificationService<'_> {
        NotificationService { api: self }
    }
}

fn sort_param(sort: &str) -> [(&'static str, &str); 1] {
    [("sort", sort)]
}

pub struct PatioService<'a> {
    api: &'a ApiClient,
}

impl PatioService<'_> {
    pub async fn search(
        &self,
        filter: &PatioFilter,
        page: PageRequest,
    ) -> ClientResult<SpringPage<Patio>> {
        let request = self
            .api
            .get("/patios/search")
            .query(filter)
            .query(&page)
            .query(&sort_param("idPatio,asc"));
        self.api.fetch(request).await
    }

    pub async fn get(&self, patio_id: PatioId) -> ClientResult<Patio> {
        self.api.fetch(self.api.get(&format!("/patios/{patio_id}"))).await
    }

    pub async fn create(&self, request: &PatioRequest) -> ClientResult<Patio> {
        self.api.fetch(self.api.post("/patios").json(request)).await
    }

    pub async fn update(&self, patio_id: PatioId, request: &PatioRequest) -> ClientResult<Patio> {
        self.api
            .fetch(self.api.put(&format!("/patios/{patio_id}")).json(request))
            .await
    }

    pub async fn update_status(&self, patio_id: PatioId, status: PatioStatus) -> ClientResult<Patio> {
        let request = self
            .api
            .patch(&format!("/patios/{patio_id}/status"))
            .query(&[("status", status.as_code())]);
        self.api.fetch(request).await
    }

    pub async fn delete(&self, patio_id: PatioId) -> ClientResult<()> {
        self.api.send(self.api.delete(&format!("/patios/{patio_id}"))).await
    }

    /// Creates patio, contact, address, zones and boxes in one backend transaction.
    pub async fn create_complete(&self, request: &CompletePatioRequest) -> ClientResult<Patio> {
        self.api
            .fetch(self.api.post("/patios/completo").json(request))
            .await
    }
}

pub struct BoxService<'a> {
    api: &'a ApiClient,
}

impl BoxService<'_> {
    pub async fn search(
        &self,
        filter: &BoxFilter,
        page: PageRequest,
    ) -> ClientResult<SpringPage<ParkingBox>> {
        let request = self
            .api
            .get("/boxes/search")
            .query(filter)
            .query(&page)
            .query(&sort_param("idBox,asc"));
        self.api.fetch(request).await
    }

    pub async fn get(&self, box_id: BoxId) -> ClientResult<ParkingBox> {
        self.api.fetch(self.api.get(&format!("/boxes/{box_id}"))).await
    }

    pub async fn create(&self, request: &BoxRequest) -> ClientResult<ParkingBox> {
        self.api.fetch(self.api.post("/boxes").json(request)).await
    }

    pub async fn update(&self, box_id: BoxId, request: &BoxRequest) -> ClientResult<ParkingBox> {
        self.api
            .fetch(self.api.put(&format!("/boxes/{box_id}")).json(request))
            .await
    }

    pub async fn delete(&self, box_id: BoxId) -> ClientResult<()> {
        self.api.send(self.api.delete(&format!("/boxes/{box_id}"))).await
    }

    /// Returns the backend's confirmation text.
    pub async fn generate_batch(&self, prefix: &str, quantity: u32) -> ClientResult<String> {
        let body = BoxBatchRequest {
            prefixo: prefix.to_string(),
            quantidade: quantity,
        };
        self.api
            .fetch_text(self.api.post("/boxes/gerar-em-lote").json(&body))
            .await
    }

    pub async fn list_by_patio(
        &self,
        patio_id: PatioId,
        patio_status: PatioStatus,
        page: PageRequest,
    ) -> ClientResult<SpringPage<ParkingBox>> {
        let request = self
            .api
            .get(&format!("/patios/{patio_id}/status/{patio_status}/boxes"))
            .query(&page);
        let page: PageOrList<ParkingBox> = self.api.fetch(request).await?;
        Ok(page.into_page())
    }
}

pub struct ZoneService<'a> {
    api: &'a ApiClient,
}

impl ZoneService<'_> {
    pub async fn search(
        &self,
        filter: &ZoneFilter,
        page: PageRequest,
    ) -> ClientResult<SpringPage<Zone>> {
        let request = self
            .api
            .get("/zonas/search")
            .query(filter)
            .query(&page)
            .query(&sort_param("idZona,asc"));
        self.api.fetch(request).await
    }

    pub async fn get(&self, zone_id: ZoneId) -> ClientResult<Zone> {
        self.api.fetch(self.api.get(&format!("/zonas/{zone_id}"))).await
    }

    pub async fn create(&self, request: &ZoneRequest) -> ClientResult<Zone> {
        self.api.fetch(self.api.post("/zonas").json(request)).await
    }

    pub async fn update(&self, zone_id: ZoneId, request: &ZoneRequest) -> ClientResult<Zone> {
        self.api
            .fetch(self.api.put(&format!("/zonas/{zone_id}")).json(request))
            .await
    }

    pub async fn delete(&self, zone_id: ZoneId) -> ClientResult<()> {
        self.api.send(self.api.delete(&format!("/zonas/{zone_id}"))).await
    }

    pub async fn list_by_patio(
        &self,
        patio_id: PatioId,
        patio_status: PatioStatus,
        page: PageRequest,
    ) -> ClientResult<SpringPage<Zone>> {
        let request = self
            .api
            .get(&format!("/patios/{patio_id}/status/{patio_status}/zonas"))
            .query(&page);
        let page: PageOrList<Zone> = self.api.fetch(request).await?;
        Ok(page.into_page())
    }

    pub async fn delete_by_patio(
        &self,
        patio_id: PatioId,
        patio_status: PatioStatus,
        zone_id: ZoneId,
    ) -> ClientResult<()> {
        self.api
            .send(self.api.delete(&format!(
                "/patios/{patio_id}/status/{patio_status}/zonas/{zone_id}"
            )))
            .await
    }
}

pub struct ContactService<'a> {
    api: &'a ApiClient,
}

impl ContactService<'_> {
    pub async fn search(
        &self,
        filter: &ContactFilter,
        page: PageRequest,
    ) -> ClientResult<SpringPage<Contact>> {
        let request = self
            .api
            .get("/contatos/search")
            .query(filter)
            .query(&page)
            .query(&sort_param("idContato,asc"));
        self.api.fetch(request).await
    }

    pub async fn list_all(&self) -> ClientResult<Vec<Contact>> {
        self.api.fetch(self.api.get("/contatos/all")).await
    }

    pub async fn get(&self, contact_id: ContactId) -> ClientResult<Contact> {
        self.api
            .fetch(self.api.get(&format!("/contatos/{contact_id}")))
            .await
    }

    pub async fn create(&self, request: &ContactRequest) -> ClientResult<Contact> {
        self.api.fetch(self.api.post("/contatos").json(request)).await
    }

    pub async fn update(&self, contact_id: ContactId, request: &ContactRequest) -> ClientResult<Contact> {
        self.api
            .fetch(self.api.put(&format!("/contatos/{contact_id}")).json(request))
            .await
    }

    pub async fn delete(&self, contact_id: ContactId) -> ClientResult<()> {
        self.api
            .send(self.api.delete(&format!("/contatos/{contact_id}")))
            .await
    }
}

pub struct AddressService<'a> {
    api: &'a ApiClient,
}

impl AddressService<'_> {
    pub async fn search(
        &self,
        filter: &AddressFilter,
        page: PageRequest,
    ) -> ClientResult<SpringPage<Address>> {
        let request = self
            .api
            .get("/enderecos/search")
            .query(filter)
            .query(&page)
            .query(&sort_param("idEndereco,asc"));
        self.api.fetch(request).await
    }

    pub async fn list_all(&self) -> ClientResult<Vec<Address>> {
        self.api.fetch(self.api.get("/enderecos/all")).await
    }

    pub async fn get(&self, address_id: AddressId) -> ClientResult<Address> {
        self.api
            .fetch(self.api.get(&format!("/enderecos/{address_id}")))
            .await
    }

    pub async fn create(&self, request: &AddressRequest) -> ClientResult<Address> {
        self.api.fetch(self.api.post("/enderecos").json(request)).await
    }

    pub async fn update(&self, address_id: AddressId, request: &AddressRequest) -> ClientResult<Address> {
        self.api
            .fetch(self.api.put(&format!("/enderecos/{address_id}")).json(request))
            .await
    }

    pub async fn delete(&self, address_id: AddressId) -> ClientResult<()> {
        self.api
            .send(self.api.delete(&format!("/enderecos/{address_id}")))
            .await
    }
}

pub struct ClientService<'a> {
    api: &'a ApiClient,
}

impl ClientService<'_> {
    pub async fn search(
        &self,
        filter: &ClientFilter,
        page: PageRequest,
    ) -> ClientResult<SpringPage<Client>> {
        let request = self
            .api
            .get("/clientes/search")
            .query(filter)
            .query(&page)
            .query(&sort_param("idCliente,asc"));
        self.api.fetch(request).await
    }

    pub async fn get(&self, client_id: ClientId) -> ClientResult<Client> {
        self.api
            .fetch(self.api.get(&format!("/clientes/{client_id}")))
            .await
    }

    pub async fn create(&self, request: &ClientRequest) -> ClientResult<Client> {
        self.api.fetch(self.api.post("/clientes").json(request)).await
    }

    pub async fn update(&self, client_id: ClientId, request: &ClientRequest) -> ClientResult<Client> {
        self.api
            .fetch(self.api.put(&format!("/clientes/{client_id}")).json(request))
            .await
    }

    pub async fn delete(&self, client_id: ClientId) -> ClientResult<()> {
        self.api
            .send(self.api.delete(&format!("/clientes/{client_id}")))
            .await
    }
}

pub struct VehicleService<'a> {
    api: &'a ApiClient,
}

impl VehicleService<'_> {
    pub async fn search(
        &self,
        filter: &VehicleFilter,
        page: PageRequest,
    ) -> ClientResult<SpringPage<Vehicle>> {
        let request = self
            .api
            .get("/veiculos/search")
            .query(filter)
            .query(&page)
            .query(&sort_param("idVeiculo,asc"));
        self.api.fetch(request).await
    }

    pub async fn get(&self, vehicle_id: VehicleId) -> ClientResult<Vehicle> {
        self.api
            .fetch(self.api.get(&format!("/veiculos/{vehicle_id}")))
            .await
    }

    pub async fn create(&self, request: &VehicleRequest) -> ClientResult<Vehicle> {
        self.api.fetch(self.api.post("/veiculos").json(request)).await
    }

    pub async fn update(&self, vehicle_id: VehicleId, request: &VehicleRequest) -> ClientResult<Vehicle> {
        self.api
            .fetch(self.api.put(&format!("/veiculos/{vehicle_id}")).json(request))
            .await
    }

    pub async fn delete(&self, vehicle_id: VehicleId) -> ClientResult<()> {
        self.api
            .send(self.api.delete(&format!("/veiculos/{vehicle_id}")))
            .await
    }

    pub async fn location(&self, vehicle_id: VehicleId) -> ClientResult<VehicleLocation> {
        self.api
            .fetch(self.api.get(&format!("/veiculos/{vehicle_id}/localizacao")))
            .await
    }

    pub async fn list_parked(&self) -> ClientResult<Vec<VehicleLocation>> {
        self.api.fetch(self.api.get("/veiculos/estacionados")).await
    }

    pub async fn next_ble_tag(&self) -> ClientResult<String> {
        let tag: NextBleTag = self
            .api
            .fetch(self.api.get("/veiculos/proxima-tag-ble"))
            .await?;
        Ok(tag.tag_ble_id)
    }
}

pub struct ParkingService<'a> {
    api: &'a ApiClient,
}

impl ParkingService<'_> {
    pub async fn list_active(&self, page: PageRequest) -> ClientResult<SpringPage<ParkingRecord>> {
        let request = self.api.get("/estacionamentos/ativos").query(&page);
        let page: PageOrList<ParkingRecord> = self.api.fetch(request).await?;
        Ok(page.into_page())
    }

    pub async fn list_active_by_patio(&self, patio_id: PatioId) -> ClientResult<Vec<ParkingRecord>> {
        self.api
            .fetch(self.api.get(&format!("/estacionamentos/patio/{patio_id}/ativos")))
            .await
    }

    /// `None` when the plate is not parked anywhere.
    pub async fn find_active_by_plate(&self, plate: &str) -> ClientResult<Option<ParkingRecord>> {
        let request = self
            .api
            .get(&format!("/estacionamentos/placa/{}/ativo", plate.trim()));
        match self.api.fetch_optional(request).await {
            Ok(record) => Ok(record),
            Err(err) if err.status() == Some(404) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn park(&self, request: &ParkRequest) -> ClientResult<ParkingRecord> {
        self.api
            .fetch(self.api.post("/estacionamentos/estacionar").json(request))
            .await
    }

    pub async fn release(&self, request: &ReleaseRequest) -> ClientResult<ParkingRecord> {
        self.api
            .fetch(self.api.post("/estacionamentos/liberar").json(request))
            .await
    }

    pub async fn count_active(&self) -> ClientResult<u64> {
        self.api
            .fetch(self.api.get("/estacionamentos/estatisticas/total-ativos"))
            .await
    }
}

pub struct NotificationService<'a> {
    api: &'a ApiClient,
}

impl NotificationService<'_> {
    pub async fn list(
        &self,
        filter: &NotificationFilter,
        page: PageRequest,
    ) -> ClientResult<SpringPage<Notification>> {
        let request = self.api.get("/notificacoes").query(filter).query(&page);
        let page: PageOrList<Notification> = self.api.fetch(request).await?;
        Ok(page.into_page())
    }

    pub async fn mark_read(&self, notification_id: NotificationId) -> ClientResult<()> {
        self.api
            .send(self.api.put(&format!("/notificacoes/{notification_id}/marcar-lida")))
            .await
    }
}

#[async_trait]
impl YardBackend for ApiClient {
    async fn fetch_patio(&self, patio_id: PatioId) -> ClientResult<Patio> {
        self.patios().get(patio_id).await
    }

    async fn update_patio(&self, patio_id: PatioId, request: &PatioRequest) -> ClientResult<Patio> {
        self.patios().update(patio_id, request).await
    }

    async fn create_complete_patio(&self, request: &CompletePatioRequest) -> ClientResult<Patio> {
        self.patios().create_complete(request).await
    }

    async fn list_patio_boxes(
        &self,
        patio_id: PatioId,
        patio_status: PatioStatus,
    ) -> ClientResult<Vec<ParkingBox>> {
        let page = self
            .boxes()
            .list_by_patio(patio_id, patio_status, PageRequest::ALL)
            .await?;
        Ok(page.content)
    }

    async fn create_box(&self, request: &BoxRequest) -> ClientResult<ParkingBox> {
        self.boxes().create(request).await
    }

    async fn update_box(&self, box_id: BoxId, request: &BoxRequest) -> ClientResult<ParkingBox> {
        self.boxes().update(box_id, request).await
    }

    async fn delete_box(&self, box_id: BoxId) -> ClientResult<()> {
        self.boxes().delete(box_id).await
    }

    async fn list_patio_zones(
        &self,
        patio_id: PatioId,
        patio_status: PatioStatus,
    ) -> ClientResult<Vec<Zone>> {
        let page = self
            .zones()
            .list_by_patio(patio_id, patio_status, PageRequest::ALL)
            .await?;
        Ok(page.content)
    }

    async fn create_zone(&self, request: &ZoneRequest) -> ClientResult<Zone> {
        self.zones().create(request).await
    }

    async fn update_zone(&self, zone_id: ZoneId, request: &ZoneRequest) -> ClientResult<Zone> {
        self.zones().update(zone_id, request).await
    }

    async fn delete_patio_zone(
        &self,
        patio_id: PatioId,
        patio_status: PatioStatus,
        zone_id: ZoneId,
    ) -> ClientResult<()> {
        self.zones()
            .delete_by_patio(patio_id, patio_status, zone_id)
            .await
    }
}
