//! Administration and read-side queries

use super::*;

#[test]
fn test_upsert_article_keeps_stock_and_books_opening() {
    let manager = create_test_manager();
    let created = manager.upsert_article(plain_article(10, 120, 20)).unwrap();
    assert_eq!(created.available_quantity, 20);

    let movements = manager.stock_movements_for(10).unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].quantity_before, 0);
    assert_eq!(movements[0].quantity_after, 20);
    assert_eq!(movements[0].operator_id, SYSTEM_OPERATOR_ID);

    // a price change never rewrites stock
    let updated = manager
        .upsert_article(Article {
            base_price: Decimal::from(130),
            available_quantity: 999,
            ..plain_article(10, 120, 20)
        })
        .unwrap();
    assert_eq!(updated.base_price, Decimal::from(130));
    assert_eq!(updated.available_quantity, 20);
    assert_eq!(manager.stock_movements_for(10).unwrap().len(), 1);
}

#[test]
fn test_upsert_article_new_variant_gets_opening_stock() {
    let manager = create_test_manager();
    manager.upsert_article(sized_article(11, 7, 4)).unwrap();

    let mut article = sized_article(11, 7, 100);
    article.variants.push(ArticleVariant {
        id: 8,
        label: "L".to_string(),
        available_quantity: 6,
    });
    let saved = manager.upsert_article(article).unwrap();
    assert_eq!(saved.available(Some(7)), Some(4));
    assert_eq!(saved.available(Some(8)), Some(6));
}

#[test]
fn test_upsert_article_validation() {
    let manager = create_test_manager();
    let err = manager
        .upsert_article(plain_article(10, 120, -1))
        .unwrap_err();
    assert!(matches!(err, ManagerError::InvalidOperation(_)));
    let err = manager
        .upsert_article(plain_article(10, -5, 1))
        .unwrap_err();
    assert!(matches!(err, ManagerError::InvalidOperation(_)));
    assert!(manager.get_article(10).unwrap().is_none());
}

#[test]
fn test_register_operator_requires_name() {
    let manager = create_test_manager();
    let err = manager
        .register_operator(Operator {
            id: 5,
            name: "  ".to_string(),
            role: OperatorRole::Delivery,
        })
        .unwrap_err();
    assert!(matches!(err, ManagerError::InvalidOperation(_)));
}

#[test]
fn test_queries_on_missing_order() {
    let manager = create_test_manager();
    assert!(manager.get_order(99).unwrap().is_none());
    assert!(matches!(
        manager.current_state(99),
        Err(ManagerError::OrderNotFound(99))
    ));
    assert!(matches!(
        manager.state_history(99),
        Err(ManagerError::OrderNotFound(99))
    ));
    assert!(matches!(
        manager.find_resend_orders(99),
        Err(ManagerError::OrderNotFound(99))
    ));
}

#[test]
fn test_fresh_order_has_no_state() {
    let manager = create_test_manager();
    let order_id = create_order(&manager, "CMD-8001");
    assert!(manager.current_state(order_id).unwrap().is_none());
    assert!(manager.previous_state(order_id).unwrap().is_none());
    assert!(manager.state_history(order_id).unwrap().is_empty());

    let order = manager.find_order_by_reference("CMD-8001").unwrap().unwrap();
    assert_eq!(order.id, order_id);
    assert_eq!(order.assigned_operator_id, Some(CONFIRMER));
}

#[test]
fn test_previous_state_after_return_to_confirmation() {
    let manager = create_test_manager();
    let order_id = create_order(&manager, "CMD-8002");
    assert!(transition(&manager, CONFIRMER, order_id, "CONFIRMED").success);
    assert!(transition(&manager, PREPARER, order_id, "IN_PREPARATION").success);
    assert!(transition(&manager, PREPARER, order_id, "Retour Confirmation").success);

    let previous = manager.previous_state(order_id).unwrap().unwrap();
    assert_eq!(previous.kind, StateKind::Confirmed);
}
