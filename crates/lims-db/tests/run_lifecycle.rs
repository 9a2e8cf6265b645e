//! End-to-end run lifecycle against a file-backed database.
//!
//! Builds a small lab (locations, stock, a two-step workflow), drives a run
//! through every task, then reopens the file and checks that stock, entry
//! outcomes, and the audit trail survived.

use lims_core::enums::{AuditAction, DataEntryState, EntityType, RunPhase};
use lims_db::error::DatabaseError;
use lims_db::repos::audit::AuditFilter;
use lims_db::repos::inventory::NewItem;
use lims_db::repos::project::NewProject;
use lims_db::repos::workflow::NewInputField;
use lims_db::service::LimsService;
use pretty_assertions::assert_eq;

struct Lab {
    workflow_id: String,
    products: Vec<String>,
    buffer_id: String,
}

async fn build_lab(svc: &LimsService) -> Lab {
    let freezer = svc.create_location("Freezer A", "FRZ-A", None).await.unwrap();
    let shelf = svc
        .create_location("Shelf 1", "FRZ-A-1", Some(&freezer.id))
        .await
        .unwrap();

    let sample_type = svc.create_item_type("Sample", None).await.unwrap();
    let buffer_type = svc.create_item_type("Buffer", None).await.unwrap();
    let ml = svc.get_measure_by_symbol("ml").await.unwrap();
    let buffer = svc
        .create_item(
            NewItem::new("Wash buffer", "WB-1", &buffer_type.id)
                .amount(20.0)
                .measure(&ml.id)
                .location(&shelf.id),
        )
        .await
        .unwrap();

    let prep = svc
        .create_task_template("Prep", Some("Wash and spin"), Some(&sample_type.id), None)
        .await
        .unwrap();
    svc.add_input_field(
        &prep.id,
        NewInputField {
            label: "Wash".into(),
            item_type_id: buffer_type.id.clone(),
            amount: 2.5,
            amount_measure_id: Some(ml.id.clone()),
        },
    )
    .await
    .unwrap();
    let sequence = svc.create_task_template("Sequence", None, None, None).await.unwrap();
    let workflow = svc
        .create_workflow("Prep and sequence", &[prep.id, sequence.id])
        .await
        .unwrap();

    let project = svc.create_project(NewProject::new("Soil survey", "PRJ-7")).await.unwrap();
    let mut products = Vec::new();
    for n in 1..=3 {
        let product = svc
            .create_product(&project.id, &format!("Core {n}"), &format!("C-{n}"), None, None)
            .await
            .unwrap();
        let sample = svc
            .create_item(NewItem::new(format!("Core sample {n}"), format!("CS-{n}"), &sample_type.id))
            .await
            .unwrap();
        svc.link_item_to_product(&product.id, &sample.id).await.unwrap();
        svc.link_item_to_product(&product.id, &buffer.id).await.unwrap();
        products.push(product.id);
    }

    Lab {
        workflow_id: workflow.id,
        products,
        buffer_id: buffer.id,
    }
}

#[tokio::test]
async fn run_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lims.db");
    let path = path.to_str().unwrap();

    let (run_id, buffer_id) = {
        let svc = LimsService::new_local(path, "tech").await.unwrap();
        let lab = build_lab(&svc).await;
        let run = svc
            .create_run_from_workflow(&lab.workflow_id, "Batch 7", "RUN-7", &lab.products)
            .await
            .unwrap();
        svc.start_run(&run.id, None).await.unwrap();

        let started = svc.start_task(&run.id).await.unwrap();
        assert_eq!(started.transfers.len(), 3);
        let failed = vec![lab.products[2].clone()];
        svc.finish_task(&run.id, &failed, false).await.unwrap();

        svc.start_task(&run.id).await.unwrap();
        let done = svc.finish_task(&run.id, &[], false).await.unwrap();
        assert_eq!(done.run.phase(), RunPhase::Finished);
        (run.id, lab.buffer_id)
    };

    let svc = LimsService::new_local(path, "auditor").await.unwrap();
    let run = svc.get_run_by_identifier("RUN-7").await.unwrap();
    assert_eq!(run.id, run_id);
    assert_eq!(run.phase(), RunPhase::Finished);
    assert!(!run.is_active);

    let buffer = svc.get_item(&buffer_id).await.unwrap();
    assert!((buffer.amount_available - 12.5).abs() < 1e-9);

    let entries = svc.list_entries(&run.id, None).await.unwrap();
    assert_eq!(entries.len(), 6);
    let failed = entries
        .iter()
        .filter(|e| e.state == DataEntryState::Failed)
        .count();
    assert_eq!(failed, 1);

    let takes = svc
        .query_audit(&AuditFilter {
            entity_type: Some(EntityType::ItemTransfer),
            action: Some(AuditAction::Taken),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(takes.len(), 3);
    assert!(takes.iter().all(|t| t.actor.as_deref() == Some("tech")));
    let detail = takes[0].detail.as_ref().unwrap();
    assert_eq!(detail["item_id"], buffer_id.as_str());
}

#[tokio::test]
async fn short_stock_blocks_finish_without_side_effects() {
    let svc = LimsService::new_local(":memory:", "tech").await.unwrap();
    let lab = build_lab(&svc).await;
    svc.set_item_amount(&lab.buffer_id, 5.0).await.unwrap();

    let run = svc
        .create_run_from_workflow(&lab.workflow_id, "Batch 8", "RUN-8", &lab.products)
        .await
        .unwrap();
    svc.start_run(&run.id, None).await.unwrap();
    svc.start_task(&run.id).await.unwrap();

    let err = svc.finish_task(&run.id, &[], false).await.unwrap_err();
    assert!(matches!(err, DatabaseError::InsufficientStock { .. }));
    assert!((svc.get_item(&lab.buffer_id).await.unwrap().amount_available - 5.0).abs() < 1e-9);

    // Abandoning the task clears the way for a retry with more stock.
    svc.stop_task(&run.id).await.unwrap();
    svc.set_item_amount(&lab.buffer_id, 50.0).await.unwrap();
    svc.start_task(&run.id).await.unwrap();
    let done = svc.finish_task(&run.id, &[], false).await.unwrap();
    assert_eq!(done.run.current_task, 1);
    assert!((svc.get_item(&lab.buffer_id).await.unwrap().amount_available - 42.5).abs() < 1e-9);
}
