//! Command pipeline: idempotency, rollback, operator check, broadcast

use super::*;
use shared::order::FulfillmentEventKind;

#[test]
fn test_duplicate_command_has_no_effect() {
    let manager = create_test_manager();
    manager.upsert_article(plain_article(10, 120, 20)).unwrap();
    let order_id = create_order(&manager, "CMD-6001");

    let cmd = command(
        CONFIRMER,
        CommandPayload::AddLine {
            order_id,
            article_id: 10,
            variant_id: None,
            quantity: 1,
        },
    );
    let first = manager.execute_command(cmd.clone());
    assert!(first.success);
    let second = manager.execute_command(cmd);
    assert!(second.success);
    assert!(second.data.is_none());
    assert_eq!(second.message, "Duplicate command ignored");

    assert_eq!(manager.line_items(order_id).unwrap().len(), 1);
}

#[test]
fn test_unknown_operator_refused() {
    let manager = create_test_manager();
    let resp = manager.execute_command(command(
        77,
        CommandPayload::CreateOrder {
            reference: "CMD-6002".to_string(),
            client_reference: "CLI-1".to_string(),
            city: "Fès".to_string(),
            declared_total: Decimal::from(100),
            delivery_fee: Decimal::ZERO,
        },
    ));
    assert_eq!(error_code(&resp), CommandErrorCode::OperatorNotFound);
    assert!(manager.list_orders().unwrap().is_empty());
}

#[test]
fn test_refused_command_can_be_retried() {
    let manager = create_test_manager();
    let order_id = create_order(&manager, "CMD-6003");

    // the refused attempt is not marked processed
    let cmd = command(
        CONFIRMER,
        CommandPayload::AddLine {
            order_id,
            article_id: 10,
            variant_id: None,
            quantity: 1,
        },
    );
    let resp = manager.execute_command(cmd.clone());
    assert_eq!(error_code(&resp), CommandErrorCode::ArticleNotFound);

    manager.upsert_article(plain_article(10, 120, 20)).unwrap();
    let resp = manager.execute_command(cmd);
    assert!(resp.success, "{}", resp.message);
    assert!(resp.data.is_some());
}

#[test]
fn test_duplicate_reference_refused() {
    let manager = create_test_manager();
    create_order(&manager, "CMD-6004");
    let resp = manager.execute_command(command(
        CONFIRMER,
        CommandPayload::CreateOrder {
            reference: "CMD-6004".to_string(),
            client_reference: "CLI-9".to_string(),
            city: "Tanger".to_string(),
            declared_total: Decimal::from(100),
            delivery_fee: Decimal::ZERO,
        },
    ));
    assert_eq!(error_code(&resp), CommandErrorCode::OrderReferenceExists);
    assert_eq!(manager.list_orders().unwrap().len(), 1);
}

#[test]
fn test_failed_transition_keeps_audit_clean() {
    let manager = create_test_manager();
    let order_id = create_order(&manager, "CMD-6005");
    assert!(transition(&manager, CONFIRMER, order_id, "CONFIRMED").success);

    // Report Problem is only legal from In Preparation
    let resp = manager.execute_command(command(
        PREPARER,
        CommandPayload::ReportProblem {
            order_id,
            comment: "Client injoignable".to_string(),
        },
    ));
    assert_eq!(error_code(&resp), CommandErrorCode::StatePrecondition);

    let operations = manager.operations_for_order(order_id).unwrap();
    assert_eq!(operations.len(), 1);
    assert_eq!(operations[0].operation_type.to_string(), "ORDER_CONFIRMED");
}

#[test]
fn test_record_operation_registers_unknown_type() {
    let manager = create_test_manager();
    let order_id = create_order(&manager, "CMD-6006");

    let resp = manager.execute_command(command(
        CONFIRMER,
        CommandPayload::RecordOperation {
            order_id,
            operation_type: "CALL_BACK".to_string(),
            conclusion: "Rappeler après 18h".to_string(),
        },
    ));
    assert!(resp.success);
    assert_eq!(resp.warnings.len(), 1);
    assert_eq!(
        manager.registered_operation_types().unwrap(),
        vec!["CALL_BACK".to_string()]
    );

    // second use of the same label: no warning
    let resp = manager.execute_command(command(
        CONFIRMER,
        CommandPayload::RecordOperation {
            order_id,
            operation_type: "CALL_BACK".to_string(),
            conclusion: "Client rappelé".to_string(),
        },
    ));
    assert!(resp.success);
    assert!(resp.warnings.is_empty());
}

#[test]
fn test_events_broadcast_after_commit() {
    let manager = create_test_manager();
    let mut rx = manager.subscribe();

    let order_id = create_order(&manager, "CMD-7001");
    let resp = transition(&manager, CONFIRMER, order_id, "CONFIRMED");
    assert!(resp.success);

    let created = rx.try_recv().unwrap();
    assert_eq!(created.order_id, Some(order_id));
    assert!(matches!(
        created.kind,
        FulfillmentEventKind::OrderCreated { ref reference } if reference == "CMD-7001"
    ));

    let changed = rx.try_recv().unwrap();
    assert!(changed.sequence > created.sequence);
    assert_eq!(changed.command_id, resp.command_id);
    match changed.kind {
        FulfillmentEventKind::StateChanged { from, to, .. } => {
            assert_eq!(from, None);
            assert_eq!(to, StateKind::Confirmed);
        }
        other => panic!("unexpected event {:?}", other),
    }

    // refused commands publish nothing
    let resp = transition(&manager, CONFIRMER, order_id, "DELIVERED");
    assert!(!resp.success);
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_adjust_stock_event_has_no_order() {
    let manager = create_test_manager();
    manager.upsert_article(sized_article(11, 7, 4)).unwrap();
    let mut rx = manager.subscribe();

    let resp = manager.execute_command(command(
        PREPARER,
        CommandPayload::AdjustStock {
            article_id: 11,
            variant_id: Some(7),
            delta: -4,
            reason: "Casse entrepôt".to_string(),
        },
    ));
    assert!(resp.success, "{}", resp.message);
    let event = rx.try_recv().unwrap();
    assert_eq!(event.order_id, None);
    assert!(matches!(
        event.kind,
        FulfillmentEventKind::StockAdjusted {
            quantity_after: 0,
            ..
        }
    ));

    let resp = manager.execute_command(command(
        PREPARER,
        CommandPayload::AdjustStock {
            article_id: 11,
            variant_id: Some(7),
            delta: -1,
            reason: "Casse entrepôt".to_string(),
        },
    ));
    assert_eq!(error_code(&resp), CommandErrorCode::InsufficientStock);
}
