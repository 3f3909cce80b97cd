use super::*;
use crate::test_support::{patio, server_box, server_zone, Call, FailOn, FakeBackend};
use chrono::NaiveDate;
use shared::domain::BoxStatus;

fn drafts(names: &[&str]) -> Vec<BoxDraft> {
    names.iter().map(|name| BoxDraft::named(*name)).collect()
}

fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .expect("valid date")
}

fn box_sync() -> BoxSync {
    BoxSync {
        patio_id: PatioId(1),
        patio_status: PatioStatus::Active,
        now: fixed_now(),
    }
}

fn backend_with_boxes(names: &[&str]) -> FakeBackend {
    let boxes = names
        .iter()
        .enumerate()
        .map(|(i, name)| server_box(i as i64 + 1, name))
        .collect();
    FakeBackend::with_patio(patio(1, "Pátio Centro"), Vec::new(), boxes)
}

#[test]
fn plan_matches_names_case_insensitively() {
    let server = vec![server_box(1, "a01"), server_box(2, "B02")];
    let client = drafts(&["A01", "c03"]);

    let plan = plan(&box_sync(), &server, &client);

    assert_eq!(plan.deletes(), 1);
    assert_eq!(plan.updates(), 1);
    assert_eq!(plan.creates(), 1);
    match &plan.ops[..] {
        [SyncOp::Delete { id, name }, SyncOp::Update { id: update_id, payload, .. }, SyncOp::Create { name: created, .. }] =>
        {
            assert_eq!((*id, name.as_str()), (BoxId(2), "B02"));
            assert_eq!(*update_id, BoxId(1));
            assert_eq!(payload.nome, "A01");
            assert_eq!(created, "c03");
        }
        other => panic!("unexpected plan: {other:?}"),
    }
}

#[test]
fn plan_never_creates_and_deletes_the_same_name() {
    let server = vec![server_box(1, "A"), server_box(2, "B"), server_box(3, "C")];
    let client = drafts(&["b", "C", "D", "E"]);

    let plan = plan(&box_sync(), &server, &client);

    let deleted: Vec<String> = plan
        .ops
        .iter()
        .filter_map(|op| match op {
            SyncOp::Delete { name, .. } => Some(name_key(name)),
            _ => None,
        })
        .collect();
    let created: Vec<String> = plan
        .ops
        .iter()
        .filter_map(|op| match op {
            SyncOp::Create { name, .. } => Some(name_key(name)),
            _ => None,
        })
        .collect();
    assert_eq!(deleted, ["a"]);
    assert_eq!(created, ["d", "e"]);
    assert!(created.iter().all(|name| !deleted.contains(name)));
    assert_eq!(plan.updates(), 2);
}

#[test]
fn plan_skips_repeated_client_names() {
    let client = drafts(&["A1", "a1", " "]);
    let plan = plan(&box_sync(), &[], &client);
    assert_eq!(plan.creates(), 1);
    assert_eq!(plan.skipped, 2);
}

#[test]
fn update_payload_falls_back_to_server_values() {
    let mut existing = server_box(1, "A");
    existing.status = BoxStatus::Maintenance;
    let draft = BoxDraft::named("A");

    let payload = box_sync().update_payload(&draft, &existing);
    assert_eq!(payload.status, BoxStatus::Maintenance);
    assert_eq!(payload.observacao, "obs A");
    assert_eq!(Some(payload.data_entrada), existing.data_entrada);
    assert_eq!(payload.data_saida, fixed_now());

    let draft = BoxDraft {
        status: Some(BoxStatus::Occupied),
        observacao: "nova".into(),
        ..BoxDraft::named("A")
    };
    let payload = box_sync().update_payload(&draft, &existing);
    assert_eq!(payload.status, BoxStatus::Occupied);
    assert_eq!(payload.observacao, "nova");
}

#[test]
fn create_payload_defaults_to_free_and_now() {
    let payload = box_sync().create_payload(&BoxDraft::named("N1"));
    assert_eq!(payload.status, BoxStatus::Free);
    assert_eq!(payload.data_entrada, fixed_now());
    assert_eq!(payload.data_saida, fixed_now());
    assert_eq!(payload.observacao, "");
}

#[tokio::test]
async fn empty_box_list_is_rejected_before_any_call() {
    let backend = backend_with_boxes(&["A"]);
    let err = sync_boxes(&backend, PatioId(1), PatioStatus::Active, &[])
        .await
        .expect_err("empty list");
    assert!(matches!(err, SyncError::EmptyBoxList));
    assert!(err.to_string().contains("pátio deve ter pelo menos um box."));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn blank_only_box_list_is_rejected_before_any_call() {
    let backend = backend_with_boxes(&["A", "C"]);
    let err = sync_boxes(&backend, PatioId(1), PatioStatus::Active, &drafts(&["  ", ""]))
        .await
        .expect_err("no named box");
    assert!(matches!(err, SyncError::EmptyBoxList));
    assert!(backend.calls().is_empty());
    assert_eq!(backend.box_names(), vec!["A", "C"]);
}

#[tokio::test]
async fn last_box_refusal_is_soft_and_reported() {
    let backend = backend_with_boxes(&["A", "C"]);
    backend.fail(FailOn::DeleteBox, "C", 403, "Não é possível excluir o único box do pátio");

    let report = sync_boxes(&backend, PatioId(1), PatioStatus::Active, &drafts(&["A", "B"]))
        .await
        .expect("sync succeeds");

    assert_eq!(
        backend.calls(),
        vec![
            Call::ListBoxes(PatioId(1)),
            Call::DeleteBox(BoxId(2)),
            Call::UpdateBox(BoxId(1), "A".into()),
            Call::CreateBox("B".into()),
        ]
    );
    assert_eq!((report.deleted, report.updated, report.created), (0, 1, 1));
    assert!(report.last_box_blocked);
    assert_eq!(report.not_deleted.len(), 1);
    assert_eq!(report.not_deleted[0].reason, DeleteFailure::LastBox);

    let update = backend.last_box_update().expect("update sent");
    assert_eq!(update.observacao, "obs A");
    assert_eq!(update.status, BoxStatus::Free);

    let message = report.summary_message();
    assert!(message.contains("O último box do pátio não pode ser removido."));
    assert!(message.contains("1 box(es) atualizado(s), 1 criado(s)."));
    assert!(message.contains("Boxes não removidos: \"C\" (é o último box do pátio)."));
}

#[tokio::test]
async fn conflict_on_create_stops_remaining_creates() {
    let backend = backend_with_boxes(&["A"]);
    backend.fail(FailOn::CreateBox, "Y", 409, "Box 'Y' já existe");

    let err = sync_boxes(
        &backend,
        PatioId(1),
        PatioStatus::Active,
        &drafts(&["A", "X", "Y", "Z"]),
    )
    .await
    .expect_err("conflict aborts");

    match &err {
        SyncError::CreateConflict { name, diagnostic, report } => {
            assert_eq!(name, "Y");
            assert!(diagnostic.contains("Tentou criar box \"Y\", mas ele JÁ EXISTE no servidor."));
            assert!(diagnostic.contains("Boxes buscados do servidor: 1"));
            assert!(diagnostic.contains("Boxes no assistente: 4"));
            assert!(diagnostic.contains("Boxes criados até agora: 1"));
            assert_eq!(report.updated, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.report().map(|r| r.created), Some(1));
    assert_eq!(
        backend.count_calls(|call| matches!(call, Call::CreateBox(name) if name == "Z")),
        0
    );
}

#[tokio::test]
async fn conflict_on_update_carries_backend_message() {
    let backend = backend_with_boxes(&["A", "B"]);
    backend.fail(FailOn::UpdateBox, "A", 409, "Nome duplicado");

    let err = sync_boxes(&backend, PatioId(1), PatioStatus::Active, &drafts(&["A", "B"]))
        .await
        .expect_err("update aborts");

    assert_eq!(err.to_string(), "Falha ao atualizar box \"A\": Nome duplicado.");
    assert!(matches!(err, SyncError::Aborted { ref name, .. } if name == "A"));
    assert_eq!(
        backend.count_calls(|call| matches!(call, Call::UpdateBox(_, name) if name == "B")),
        0
    );
}

#[tokio::test]
async fn other_create_failure_bubbles_backend_message() {
    let backend = backend_with_boxes(&[]);
    backend.fail(FailOn::CreateBox, "A", 400, "Nome inválido");

    let err = sync_boxes(&backend, PatioId(1), PatioStatus::Active, &drafts(&["A"]))
        .await
        .expect_err("create fails");
    assert_eq!(err.to_string(), "Nome inválido");
}

#[tokio::test]
async fn in_use_boxes_are_listed_in_summary() {
    let backend = backend_with_boxes(&["A", "B", "C"]);
    backend.fail(FailOn::DeleteBox, "B", 409, "Box em uso");
    backend.fail(FailOn::DeleteBox, "C", 409, "Box em uso");

    let report = sync_boxes(&backend, PatioId(1), PatioStatus::Active, &drafts(&["A"]))
        .await
        .expect("sync succeeds");

    assert_eq!(
        report.summary_message(),
        "Alterações salvas com sucesso! 1 box(es) atualizado(s), 0 criado(s). \
         Alguns boxes não puderam ser removidos pois estão em uso. \
         Boxes não removidos: \"B\" (em uso), \"C\" (em uso)."
    );
}

#[test]
fn summary_covers_full_and_partial_removal() {
    let mut report = SyncReport {
        kind: SyncKind::Boxes,
        server_count: 3,
        client_count: 1,
        planned_deletes: 2,
        deleted: 2,
        updated: 1,
        created: 0,
        skipped: 0,
        not_deleted: Vec::new(),
        last_box_blocked: false,
    };
    assert_eq!(
        report.summary_message(),
        "Alterações salvas com sucesso! 1 box(es) atualizado(s), 0 criado(s). 2 box(es) removido(s)."
    );

    report.deleted = 1;
    report.last_box_blocked = true;
    report.not_deleted = vec![NotDeleted {
        name: "B".into(),
        reason: DeleteFailure::LastBox,
    }];
    let message = report.summary_message();
    assert!(message.contains("1 de 2 box(es) removido(s). O último box do pátio não pode ser removido."));

    report.not_deleted = (0..4)
        .map(|i| NotDeleted {
            name: format!("B{i}"),
            reason: DeleteFailure::Rejected("erro".into()),
        })
        .collect();
    assert!(!report.summary_message().contains("Boxes não removidos"));
}

#[tokio::test]
async fn zones_reconcile_by_name() {
    let backend = FakeBackend::with_patio(
        patio(1, "Pátio Centro"),
        vec![server_zone(1, "Norte"), server_zone(2, "Sul")],
        Vec::new(),
    );
    let zones = vec![ZoneDraft::named("norte"), ZoneDraft::named("Leste")];

    let report = sync_zones(&backend, PatioId(1), PatioStatus::Active, &zones)
        .await
        .expect("zones sync");

    assert_eq!((report.deleted, report.updated, report.created), (1, 1, 1));
    assert_eq!(backend.zone_names(), ["norte", "Leste"]);
    assert!(report.summary_message().contains("1 zona(s) removida(s)."));
}

#[tokio::test]
async fn zone_in_use_is_kept_without_aborting() {
    let backend = FakeBackend::with_patio(
        patio(1, "Pátio Centro"),
        vec![server_zone(1, "Norte"), server_zone(2, "Sul")],
        Vec::new(),
    );
    backend.fail(FailOn::DeleteZone, "Sul", 409, "Zona possui boxes");

    let report = sync_zones(
        &backend,
        PatioId(1),
        PatioStatus::Active,
        &[ZoneDraft::named("Norte"), ZoneDraft::named("Oeste")],
    )
    .await
    .expect("zones sync");

    assert_eq!((report.deleted, report.updated, report.created), (0, 1, 1));
    assert!(!report.last_box_blocked);
    assert_eq!(backend.zone_names(), ["Norte", "Sul", "Oeste"]);
    assert!(report
        .summary_message()
        .contains("Algumas zonas não puderam ser removidas pois estão em uso."));
}

#[tokio::test]
async fn zone_create_conflict_is_fatal() {
    let backend = FakeBackend::with_patio(patio(1, "Pátio Centro"), Vec::new(), Vec::new());
    backend.fail(FailOn::CreateZone, "Leste", 409, "Zona já existe");

    let err = sync_zones(
        &backend,
        PatioId(1),
        PatioStatus::Active,
        &[ZoneDraft::named("Leste")],
    )
    .await
    .expect_err("conflict");
    assert!(err.to_string().contains("Tentou criar zona \"Leste\", mas ela JÁ EXISTE"));
}

#[tokio::test]
async fn fetch_failure_is_reported() {
    let backend = backend_with_boxes(&["A"]);
    backend.fail(FailOn::ListBoxes, "", 500, "Erro interno");

    let err = sync_boxes(&backend, PatioId(1), PatioStatus::Active, &drafts(&["A"]))
        .await
        .expect_err("fetch fails");
    assert!(matches!(err, SyncError::Fetch { kind: SyncKind::Boxes, .. }));
    assert!(err.report().is_none());
    assert_eq!(backend.calls(), vec![Call::ListBoxes(PatioId(1))]);
}
