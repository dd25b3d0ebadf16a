use super::*;
use rust_decimal::Decimal;
use shared::models::{ArticleVariant, OperatorRole};
use shared::order::{
    CommandErrorCode, CommandPayload, DeliveredEntry, ItemCondition, ReturnedEntry, StateKind,
};

mod test_pipeline;
mod test_queries;

const CONFIRMER: i64 = 1;
const PREPARER: i64 = 2;
const DRIVER: i64 = 3;

fn create_test_manager() -> FulfillmentManager {
    create_manager_with(EngineOptions::default())
}

fn create_manager_with(options: EngineOptions) -> FulfillmentManager {
    let storage = OrderStorage::open_in_memory().unwrap();
    let manager = FulfillmentManager::with_storage(storage, options);
    for (id, role) in [
        (CONFIRMER, OperatorRole::Confirmation),
        (PREPARER, OperatorRole::Preparation),
        (DRIVER, OperatorRole::Delivery),
    ] {
        manager
            .register_operator(Operator {
                id,
                name: format!("Operator {}", id),
                role,
            })
            .unwrap();
    }
    manager
}

fn command(operator_id: i64, payload: CommandPayload) -> FulfillmentCommand {
    FulfillmentCommand::new(operator_id, format!("Operator {}", operator_id), payload)
}

fn plain_article(id: i64, price: i64, stock: i64) -> Article {
    Article {
        id,
        name: format!("Article {}", id),
        base_price: Decimal::from(price),
        is_upsell: false,
        upsell_tiers: vec![],
        available_quantity: stock,
        variants: vec![],
    }
}

/// Upsell article: 100 / 90 / (unset) / 70
fn upsell_article(id: i64, stock: i64) -> Article {
    Article {
        is_upsell: true,
        upsell_tiers: vec![
            Some(Decimal::from(100)),
            Some(Decimal::from(90)),
            None,
            Some(Decimal::from(70)),
        ],
        ..plain_article(id, 100, stock)
    }
}

fn sized_article(id: i64, variant_id: i64, stock: i64) -> Article {
    Article {
        variants: vec![ArticleVariant {
            id: variant_id,
            label: "M".to_string(),
            available_quantity: stock,
        }],
        ..plain_article(id, 200, 0)
    }
}

/// Create an order and return its id
fn create_order(manager: &FulfillmentManager, reference: &str) -> u64 {
    let resp = manager.execute_command(command(
        CONFIRMER,
        CommandPayload::CreateOrder {
            reference: reference.to_string(),
            client_reference: "CLI-42".to_string(),
            city: "Rabat".to_string(),
            declared_total: Decimal::from(600),
            delivery_fee: Decimal::from(35),
        },
    ));
    assert!(resp.success, "create failed: {}", resp.message);
    resp.data.unwrap()["id"].as_u64().unwrap()
}

/// Add a line and return its id
fn add_line(
    manager: &FulfillmentManager,
    order_id: u64,
    article_id: i64,
    variant_id: Option<i64>,
    quantity: u32,
) -> u64 {
    let resp = manager.execute_command(command(
        CONFIRMER,
        CommandPayload::AddLine {
            order_id,
            article_id,
            variant_id,
            quantity,
        },
    ));
    assert!(resp.success, "add line failed: {}", resp.message);
    let lines = resp.data.unwrap()["lines"].as_array().unwrap().clone();
    lines
        .iter()
        .filter(|l| l["article_id"].as_i64() == Some(article_id))
        .filter_map(|l| l["id"].as_u64())
        .max()
        .unwrap()
}

fn transition(
    manager: &FulfillmentManager,
    operator_id: i64,
    order_id: u64,
    target: &str,
) -> CommandResponse {
    manager.execute_command(command(
        operator_id,
        CommandPayload::Transition {
            order_id,
            target: target.to_string(),
            comment: None,
        },
    ))
}

/// Drive an order from creation to `IN_DELIVERY`
fn drive_to_delivery(manager: &FulfillmentManager, order_id: u64) {
    for (operator_id, target) in [
        (CONFIRMER, "CONFIRMED"),
        (PREPARER, "IN_PREPARATION"),
        (PREPARER, "PREPARED"),
        (DRIVER, "IN_DELIVERY"),
    ] {
        let resp = transition(manager, operator_id, order_id, target);
        assert!(resp.success, "{} failed: {}", target, resp.message);
    }
}

fn current_kind(manager: &FulfillmentManager, order_id: u64) -> Option<StateKind> {
    manager
        .current_state(order_id)
        .unwrap()
        .map(|instance| instance.kind)
}

fn error_code(resp: &CommandResponse) -> CommandErrorCode {
    assert!(!resp.success, "expected failure, got: {}", resp.message);
    resp.error.as_ref().unwrap().code
}
