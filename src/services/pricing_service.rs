use std::collections::{BTreeSet, HashMap};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{
    error::AppResult,
    models::{CartLine, Item, Variant},
    store::CatalogStore,
};

/// Authoritative pricing of a cart, plus the catalog rows it was computed from.
#[derive(Debug, Clone, Default)]
pub struct PriceQuote {
    pub total_minor: i64,
    pub items_by_id: HashMap<i64, Item>,
    pub variants_by_id: HashMap<i64, Variant>,
}

impl PriceQuote {
    /// Variant price when a variant is referenced, otherwise the item's base price.
    /// Unknown ids price as zero; rejecting them is the caller's job.
    pub fn unit_price(&self, line: &CartLine) -> Decimal {
        match line.variant_id {
            Some(variant_id) => self
                .variants_by_id
                .get(&variant_id)
                .map(|v| v.price_minor)
                .unwrap_or(Decimal::ZERO),
            None => self
                .items_by_id
                .get(&line.item_id)
                .map(|i| i.base_price_minor)
                .unwrap_or(Decimal::ZERO),
        }
    }
}

/// Prices `lines` with two batched catalog reads regardless of cart size.
pub async fn resolve(store: &dyn CatalogStore, lines: &[CartLine]) -> AppResult<PriceQuote> {
    if lines.is_empty() {
        return Ok(PriceQuote::default());
    }

    let item_ids: Vec<i64> = lines
        .iter()
        .map(|l| l.item_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let variant_ids: Vec<i64> = lines
        .iter()
        .filter_map(|l| l.variant_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let items = store.items_by_ids(&item_ids).await?;
    let variants = if variant_ids.is_empty() {
        Vec::new()
    } else {
        store.variants_by_ids(&variant_ids).await?
    };

    let mut quote = PriceQuote {
        total_minor: 0,
        items_by_id: items.into_iter().map(|i| (i.id, i)).collect(),
        variants_by_id: variants.into_iter().map(|v| (v.id, v)).collect(),
    };
    let total = total_minor(lines.iter().map(|line| (quote.unit_price(line), line.quantity)));
    quote.total_minor = total;

    Ok(quote)
}

/// Sums `unit_price * quantity` at full precision and rounds once.
///
/// Overflow collapses the total to zero so the order is rejected downstream.
pub fn total_minor(lines: impl IntoIterator<Item = (Decimal, i32)>) -> i64 {
    let exact = lines.into_iter().try_fold(Decimal::ZERO, |acc, (unit_price, quantity)| {
        unit_price
            .checked_mul(Decimal::from(quantity))
            .and_then(|line_total| acc.checked_add(line_total))
    });

    let Some(exact) = exact else {
        tracing::warn!("cart total overflowed");
        return 0;
    };

    exact
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}
