//! Serde roundtrip and JsonSchema validation tests for entity and response types.

use chrono::{Duration, Utc};
use schemars::schema_for;
use lims_core::audit_detail::{StatusChangedDetail, StockMovedDetail, TaskRunDetail};
use lims_core::entities::*;
use lims_core::enums::*;
use lims_core::responses::*;

/// Validate a JSON value against a schemars-generated schema.
fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

macro_rules! roundtrip_and_validate {
    ($name:ident, $ty:ty, $instance:expr) => {
        #[test]
        fn $name() {
            let val: $ty = $instance;

            let json_str = serde_json::to_string_pretty(&val).unwrap();
            let recovered: $ty = serde_json::from_str(&json_str).unwrap();
            assert_eq!(
                recovered,
                val,
                "serde roundtrip failed for {}",
                stringify!($ty)
            );

            let schema = serde_json::to_value(schema_for!($ty)).unwrap();
            let instance = serde_json::to_value(&val).unwrap();
            let errors = validate_against_schema(&schema, &instance);
            assert!(
                errors.is_empty(),
                "Schema validation failed for {}: {:?}",
                stringify!($ty),
                errors
            );
        }
    };
}

fn sample_user() -> User {
    User {
        id: "usr-0a1b2c3d".into(),
        username: "admin".into(),
        email: Some("admin@lab.example".into()),
        is_staff: true,
        is_superuser: true,
        is_active: true,
        created_at: Utc::now(),
    }
}

fn sample_run() -> Run {
    Run {
        id: "run-5e6f7a8b".into(),
        name: "Extraction batch 12".into(),
        identifier: "RUN-0012".into(),
        current_task: 1,
        has_started: true,
        task_in_progress: true,
        is_active: true,
        task_run_identifier: Some("trn-9c0d1e2f".into()),
        started_by: Some("usr-0a1b2c3d".into()),
        created_at: Utc::now(),
        started_at: Some(Utc::now()),
        finished_at: None,
    }
}

fn sample_transfer() -> ItemTransfer {
    ItemTransfer {
        id: "xfr-1f2e3d4c".into(),
        item_id: "itm-aa11bb22".into(),
        amount_to_take: 2.5,
        amount_available: 7.5,
        amount_measure_id: Some("msr-00000001".into()),
        is_addition: false,
        run_identifier: Some("trn-9c0d1e2f".into()),
        linked_transfer_id: None,
        has_taken: true,
        transfer_complete: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn sample_entry() -> DataEntry {
    DataEntry {
        id: "ent-3b4c5d6e".into(),
        run_id: "run-5e6f7a8b".into(),
        task_template_id: "tpl-77889900".into(),
        product_id: "prd-12345678".into(),
        item_id: None,
        task_run_identifier: "trn-9c0d1e2f".into(),
        state: DataEntryState::Active,
        data: serde_json::json!({"volume_ul": 50, "notes": "clear"}),
        created_by: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

roundtrip_and_validate!(
    item_roundtrip,
    Item,
    Item {
        id: "itm-aa11bb22".into(),
        name: "Tris buffer".into(),
        identifier: "TRIS-001".into(),
        barcode: Some("0123456789".into()),
        item_type_id: "ityp-1234abcd".into(),
        location_id: Some("loc-deadbeef".into()),
        amount_available: 10.0,
        amount_measure_id: Some("msr-00000001".into()),
        in_inventory: true,
        added_by: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    location_node_roundtrip,
    LocationNode,
    LocationNode {
        location: Location {
            id: "loc-deadbeef".into(),
            name: "Freezer 2".into(),
            code: "FRZ-2".into(),
            parent_id: Some("loc-cafebabe".into()),
            created_at: Utc::now(),
        },
        depth: 1,
        path: "Lab A/Freezer 2".into(),
    }
);

roundtrip_and_validate!(transfer_roundtrip, ItemTransfer, sample_transfer());

roundtrip_and_validate!(run_roundtrip, Run, sample_run());

roundtrip_and_validate!(data_entry_roundtrip, DataEntry, sample_entry());

roundtrip_and_validate!(
    task_input_field_roundtrip,
    TaskInputField,
    TaskInputField {
        id: "inp-44556677".into(),
        task_template_id: "tpl-77889900".into(),
        label: "Lysis buffer".into(),
        item_type_id: "ityp-1234abcd".into(),
        amount: 0.2,
        amount_measure_id: None,
        position: 0,
    }
);

roundtrip_and_validate!(
    project_roundtrip,
    Project,
    Project {
        id: "prj-abcdef01".into(),
        name: "Soil microbiome".into(),
        identifier: "P-2026-014".into(),
        description: None,
        primary_lab_contact: Some("usr-0a1b2c3d".into()),
        crm_project_id: Some("cpj-10203040".into()),
        deadline: Some(Utc::now() + Duration::days(10)),
        deadline_warn: Some(Utc::now() + Duration::days(7)),
        deadline_status: DeadlineStatus::OnSchedule,
        archived: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    crm_quote_roundtrip,
    CrmQuote,
    CrmQuote {
        id: "cqt-01020304".into(),
        crm_id: "Q-88812".into(),
        quote_number: "Q-2026-0042".into(),
        subtotal: 1200.0,
        total: 1440.0,
        crm_project_id: Some("cpj-10203040".into()),
        synced_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    reservation_roundtrip,
    EquipmentReservation,
    EquipmentReservation {
        id: "rsv-a0b0c0d0".into(),
        equipment_id: "eqp-e0e0e0e0".into(),
        start: Utc::now(),
        end: Utc::now() + Duration::hours(2),
        reserved_for: Some("qPCR plate 3".into()),
        reserved_by: Some("usr-0a1b2c3d".into()),
        is_confirmed: false,
        checked_in: false,
        created_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    price_roundtrip,
    Price,
    Price {
        id: "prc-0f0f0f0f".into(),
        name: "DNA extraction".into(),
        code: "EXT-DNA".into(),
        price: 35.5,
        price_type: PriceType::External,
        created_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    group_roundtrip,
    Group,
    Group {
        id: "grp-11112222".into(),
        name: "staff".into(),
        permissions: vec!["inventory.add_item".into(), "workflow.run_task".into()],
    }
);

roundtrip_and_validate!(
    audit_entry_roundtrip,
    AuditEntry,
    AuditEntry {
        id: "aud-99887766".into(),
        actor: Some("deadline-job".into()),
        entity_type: EntityType::Project,
        entity_id: "prj-abcdef01".into(),
        action: AuditAction::StatusChanged,
        detail: Some(
            serde_json::to_value(StatusChangedDetail {
                from: "on_schedule".into(),
                to: "warning".into(),
                reason: None,
            })
            .unwrap()
        ),
        created_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    stock_moved_detail_roundtrip,
    StockMovedDetail,
    StockMovedDetail {
        item_id: "itm-aa11bb22".into(),
        amount: 2.5,
        is_addition: false,
        amount_available: 7.5,
    }
);

roundtrip_and_validate!(
    task_run_detail_roundtrip,
    TaskRunDetail,
    TaskRunDetail {
        task_run_identifier: "trn-9c0d1e2f".into(),
        task_template_id: "tpl-77889900".into(),
        position: 0,
        repeat: true,
    }
);

roundtrip_and_validate!(
    bootstrap_report_roundtrip,
    BootstrapReport,
    BootstrapReport {
        created: vec!["admin".into(), "staff".into()],
        skipped: vec!["user".into()],
    }
);

roundtrip_and_validate!(
    superuser_outcome_roundtrip,
    SuperuserOutcome,
    SuperuserOutcome::AlreadyExists(sample_user())
);

roundtrip_and_validate!(
    deadline_report_roundtrip,
    DeadlineReport,
    DeadlineReport {
        checked: 4,
        updated: 2,
        notified: 1,
    }
);

roundtrip_and_validate!(
    task_start_response_roundtrip,
    TaskStartResponse,
    TaskStartResponse {
        run: sample_run(),
        task_run_identifier: "trn-9c0d1e2f".into(),
        entries: vec![sample_entry()],
        transfers: vec![sample_transfer()],
    }
);

#[test]
fn superuser_outcome_is_tagged() {
    let json = serde_json::to_value(SuperuserOutcome::Created(sample_user())).unwrap();
    assert_eq!(json["outcome"], "created");
    assert_eq!(json["user"]["username"], "admin");
}

#[test]
fn run_phase_follows_flags() {
    let mut run = sample_run();
    assert_eq!(run.phase(), RunPhase::InProgress);
    run.task_in_progress = false;
    assert_eq!(run.phase(), RunPhase::Idle);
    run.is_active = false;
    assert_eq!(run.phase(), RunPhase::Finished);
    run.has_started = false;
    assert_eq!(run.phase(), RunPhase::Pending);
}

#[test]
fn transfer_delta_sign() {
    let mut transfer = sample_transfer();
    assert!((transfer.delta() + 2.5).abs() < f64::EPSILON);
    transfer.is_addition = true;
    assert!((transfer.delta() - 2.5).abs() < f64::EPSILON);
}

#[test]
fn reservation_overlap_is_half_open() {
    let start = Utc::now();
    let reservation = EquipmentReservation {
        id: "rsv-a0b0c0d0".into(),
        equipment_id: "eqp-e0e0e0e0".into(),
        start,
        end: start + Duration::hours(1),
        reserved_for: None,
        reserved_by: None,
        is_confirmed: false,
        checked_in: false,
        created_at: start,
    };
    assert!(reservation.overlaps(start + Duration::minutes(30), start + Duration::hours(2)));
    assert!(!reservation.overlaps(start + Duration::hours(1), start + Duration::hours(2)));
    assert!(!reservation.overlaps(start - Duration::hours(1), start));
}

#[test]
fn data_entry_state_rejects_unknown_values() {
    let err = serde_json::from_str::<DataEntryState>("\"pending\"");
    assert!(err.is_err());
}
