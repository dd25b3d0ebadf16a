//! Test fixtures shared by the action tests

use crate::orders::storage::OrderStorage;
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata};
use redb::WriteTransaction;
use rust_decimal::Decimal;
use shared::models::{Article, ArticleVariant, Operator, OperatorRole};
use shared::order::Order;

use super::CreateOrderAction;

pub fn create_test_metadata() -> CommandMetadata {
    CommandMetadata {
        command_id: "cmd-1".to_string(),
        operator_id: 1,
        operator_name: "Test User".to_string(),
        timestamp: 1234567890,
    }
}

pub fn metadata_for(operator_id: i64) -> CommandMetadata {
    CommandMetadata {
        operator_id,
        ..create_test_metadata()
    }
}

pub fn article(id: i64, price: i64, stock: i64) -> Article {
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

/// Upsell article priced 100, then 90 / unset / 70 by counter
pub fn upsell_article(id: i64) -> Article {
    Article {
        is_upsell: true,
        upsell_tiers: vec![
            Some(Decimal::from(100)),
            Some(Decimal::from(90)),
            None,
            Some(Decimal::from(70)),
        ],
        ..article(id, 100, 50)
    }
}

pub fn article_with_variant(id: i64, variant_id: i64, stock: i64) -> Article {
    Article {
        variants: vec![ArticleVariant {
            id: variant_id,
            label: "Default".to_string(),
            available_quantity: stock,
        }],
        ..article(id, 150, 0)
    }
}

pub fn seed_operator(storage: &OrderStorage, txn: &WriteTransaction, id: i64, role: OperatorRole) {
    storage
        .store_operator(
            txn,
            &Operator {
                id,
                name: format!("Operator {}", id),
                role,
            },
        )
        .unwrap();
}

pub fn seed_article(storage: &OrderStorage, txn: &WriteTransaction, article: Article) {
    storage.store_article(txn, &article).unwrap();
}

/// Create an order through the action so counters and the reference index stay consistent
pub fn create_order(ctx: &mut CommandContext<'_>, reference: &str) -> Order {
    let action = CreateOrderAction {
        reference: reference.to_string(),
        client_reference: "CLI-1".to_string(),
        city: "Casablanca".to_string(),
        declared_total: Decimal::from(300),
        delivery_fee: Decimal::from(30),
    };
    let outcome = action.execute(ctx, &create_test_metadata()).unwrap();
    serde_json::from_value(outcome.data.unwrap()).unwrap()
}
