//! Line-item aggregation and pricing.
//!
//! Items are split into "new" (created inside the trailing window) and
//! "existing", grouped by display name for presentation, and priced. The
//! subtotal always sums the raw items so that grouping can never change the
//! amount charged.

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use super::line_item::LineItem;

/// Items created less than this long before evaluation are "new".
pub const NEW_ITEM_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountType {
    Percentage,
    Fixed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Discount {
    pub kind: DiscountType,
    pub amount: BigDecimal,
}

impl Discount {
    pub fn percentage(amount: BigDecimal) -> Self {
        Self {
            kind: DiscountType::Percentage,
            amount,
        }
    }

    pub fn fixed(amount: BigDecimal) -> Self {
        Self {
            kind: DiscountType::Fixed,
            amount,
        }
    }

    pub fn is_effective(&self) -> bool {
        self.amount > BigDecimal::zero()
    }
}

/// Document-level pricing inputs that sit next to the items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricingTerms {
    pub discount: Option<Discount>,
    /// Total persisted with the document. Wins over the computed total when positive.
    pub stored_total: Option<BigDecimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupedItem {
    pub display_name: String,
    /// Unit price of the first member seen.
    pub unit_price: BigDecimal,
    pub quantity: i64,
    pub total_price: BigDecimal,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub is_new: bool,
    pub item_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregationResult {
    pub new_items: Vec<GroupedItem>,
    pub existing_items: Vec<GroupedItem>,
    /// All items grouped together; the rows of the printed table.
    pub grouped_items: Vec<GroupedItem>,
    pub subtotal: BigDecimal,
    pub discount: Option<Discount>,
    pub discount_value: BigDecimal,
    pub has_discount: bool,
    pub total: BigDecimal,
    pub item_count: usize,
}

pub fn is_recent(item: &LineItem, now: DateTime<Utc>) -> bool {
    match item.created_at {
        Some(created) => now - created < Duration::hours(NEW_ITEM_WINDOW_HOURS),
        None => false,
    }
}

/// Group items by display name, preserving first-seen order.
pub fn group_by_display_name<'a, I>(items: I, now: DateTime<Utc>) -> Vec<GroupedItem>
where
    I: IntoIterator<Item = &'a LineItem>,
{
    let mut groups: Vec<GroupedItem> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in items {
        let name = item.display_name();
        let recent = is_recent(item, now);
        match index.get(name) {
            Some(&pos) => {
                let group = &mut groups[pos];
                group.quantity += i64::from(item.quantity);
                group.is_new |= recent;
                group.item_ids.push(item.id.clone());
            }
            None => {
                index.insert(name.to_string(), groups.len());
                groups.push(GroupedItem {
                    display_name: name.to_string(),
                    unit_price: item.unit_price.clone(),
                    quantity: i64::from(item.quantity),
                    total_price: BigDecimal::zero(),
                    category: item.reference.category().map(str::to_string),
                    unit: item.reference.unit().map(str::to_string),
                    is_new: recent,
                    item_ids: vec![item.id.clone()],
                });
            }
        }
    }

    for group in &mut groups {
        group.total_price = &group.unit_price * BigDecimal::from(group.quantity);
    }
    groups
}

/// Discount in money, clamped to `[0, subtotal]`.
pub fn discount_value(subtotal: &BigDecimal, discount: Option<&Discount>) -> BigDecimal {
    let Some(discount) = discount.filter(|d| d.is_effective()) else {
        return BigDecimal::zero();
    };
    let raw = match discount.kind {
        DiscountType::Percentage => subtotal * &discount.amount / BigDecimal::from(100),
        DiscountType::Fixed => discount.amount.clone(),
    };
    let ceiling = subtotal.clone().max(BigDecimal::zero());
    raw.min(ceiling).max(BigDecimal::zero())
}

pub fn resolve_total(
    subtotal: &BigDecimal,
    discount_value: &BigDecimal,
    stored_total: Option<&BigDecimal>,
) -> BigDecimal {
    match stored_total {
        Some(stored) if *stored > BigDecimal::zero() => stored.clone(),
        _ => (subtotal - discount_value).max(BigDecimal::zero()),
    }
}

pub fn aggregate(items: &[LineItem], now: DateTime<Utc>) -> AggregationResult {
    aggregate_with_terms(items, &PricingTerms::default(), now)
}

pub fn aggregate_with_terms(
    items: &[LineItem],
    terms: &PricingTerms,
    now: DateTime<Utc>,
) -> AggregationResult {
    let (recent, original): (Vec<&LineItem>, Vec<&LineItem>) =
        items.iter().partition(|item| is_recent(item, now));

    let subtotal = items
        .iter()
        .fold(BigDecimal::zero(), |acc, item| acc + item.effective_total());

    let discount = terms.discount.clone().filter(Discount::is_effective);
    let discount_value = discount_value(&subtotal, discount.as_ref());
    let total = resolve_total(&subtotal, &discount_value, terms.stored_total.as_ref());

    let result = AggregationResult {
        new_items: group_by_display_name(recent, now),
        existing_items: group_by_display_name(original, now),
        grouped_items: group_by_display_name(items, now),
        subtotal,
        has_discount: discount.is_some(),
        discount,
        discount_value,
        total,
        item_count: items.len(),
    };

    log::debug!(
        "aggregated {} items into {} groups ({} new, {} existing)",
        result.item_count,
        result.grouped_items.len(),
        result.new_items.len(),
        result.existing_items.len()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::line_item::LineItemRef;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 15, 0, 0).unwrap()
    }

    fn material(id: &str, name: &str, unit_price: &str, qty: i32, total: &str) -> LineItem {
        LineItem {
            id: id.to_string(),
            reference: LineItemRef::Material {
                name: name.to_string(),
                category: Some("Cabos".to_string()),
                unit: Some("m".to_string()),
            },
            unit_price: dec(unit_price),
            quantity: qty,
            total_price: Some(dec(total)),
            created_at: None,
        }
    }

    fn created(mut item: LineItem, at: DateTime<Utc>) -> LineItem {
        item.created_at = Some(at);
        item
    }

    #[test]
    fn duplicate_names_collapse_into_one_group() {
        let items = vec![
            material("a", "Cabo", "10", 2, "20"),
            material("b", "Cabo", "10", 3, "30"),
        ];
        let r = aggregate(&items, now());

        assert_eq!(r.grouped_items.len(), 1);
        let g = &r.grouped_items[0];
        assert_eq!(g.display_name, "Cabo");
        assert_eq!(g.quantity, 5);
        assert_eq!(g.total_price, dec("50"));
        assert_eq!(g.item_ids, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(g.category.as_deref(), Some("Cabos"));
        assert_eq!(r.subtotal, dec("50"));
        assert_eq!(r.total, dec("50"));
        assert!(!r.has_discount);
    }

    #[test]
    fn percentage_discount() {
        let items = vec![material("a", "Disjuntor", "25", 4, "100")];
        let terms = PricingTerms {
            discount: Some(Discount::percentage(dec("10"))),
            stored_total: None,
        };
        let r = aggregate_with_terms(&items, &terms, now());
        assert!(r.has_discount);
        assert_eq!(r.discount_value, dec("10"));
        assert_eq!(r.total, dec("90"));
    }

    #[test]
    fn fixed_discount_is_floored_at_subtotal() {
        let items = vec![material("a", "Disjuntor", "25", 4, "100")];
        let terms = PricingTerms {
            discount: Some(Discount::fixed(dec("150"))),
            stored_total: None,
        };
        let r = aggregate_with_terms(&items, &terms, now());
        assert_eq!(r.discount_value, dec("100"));
        assert_eq!(r.total, BigDecimal::zero());
    }

    #[test]
    fn empty_items_produce_zeroes() {
        let r = aggregate(&[], now());
        assert_eq!(r.subtotal, BigDecimal::zero());
        assert_eq!(r.total, BigDecimal::zero());
        assert_eq!(r.discount_value, BigDecimal::zero());
        assert!(r.grouped_items.is_empty());
        assert!(r.new_items.is_empty());
        assert!(r.existing_items.is_empty());
        assert_eq!(r.item_count, 0);
    }

    #[test]
    fn zero_or_negative_discount_is_no_discount() {
        let items = vec![material("a", "Cabo", "10", 1, "10")];
        for amount in ["0", "-5"] {
            let terms = PricingTerms {
                discount: Some(Discount::fixed(dec(amount))),
                stored_total: None,
            };
            let r = aggregate_with_terms(&items, &terms, now());
            assert!(!r.has_discount);
            assert!(r.discount.is_none());
            assert_eq!(r.discount_value, BigDecimal::zero());
            assert_eq!(r.total, dec("10"));
        }
    }

    #[test]
    fn positive_stored_total_wins() {
        let items = vec![material("a", "Cabo", "10", 1, "10")];
        let terms = PricingTerms {
            discount: Some(Discount::fixed(dec("2"))),
            stored_total: Some(dec("9.5")),
        };
        let r = aggregate_with_terms(&items, &terms, now());
        assert_eq!(r.discount_value, dec("2"));
        assert_eq!(r.total, dec("9.5"));

        let zero_stored = PricingTerms {
            discount: None,
            stored_total: Some(BigDecimal::zero()),
        };
        assert_eq!(aggregate_with_terms(&items, &zero_stored, now()).total, dec("10"));
    }

    #[test]
    fn window_boundary() {
        let n = now();
        let old = created(
            material("a", "Cabo", "1", 1, "1"),
            n - Duration::hours(24) - Duration::seconds(1),
        );
        let exactly = created(material("b", "Cabo", "1", 1, "1"), n - Duration::hours(24));
        let fresh = created(material("c", "Cabo", "1", 1, "1"), n - Duration::hours(23));
        assert!(!is_recent(&old, n));
        assert!(!is_recent(&exactly, n));
        assert!(is_recent(&fresh, n));
    }

    #[test]
    fn missing_created_at_is_existing() {
        let item = material("a", "Cabo", "1", 1, "1");
        assert!(!is_recent(&item, now()));
    }

    #[test]
    fn partitions_cover_every_item_once() {
        let n = now();
        let items = vec![
            created(material("1", "Cabo", "10", 1, "10"), n - Duration::hours(2)),
            material("2", "Cabo", "10", 2, "20"),
            created(material("3", "Tomada", "8", 3, "24"), n - Duration::days(3)),
            created(material("4", "Tomada", "8", 1, "8"), n - Duration::minutes(5)),
            material("5", "Disjuntor", "30", 1, "30"),
        ];
        let r = aggregate(&items, n);

        let mut seen: Vec<String> = r
            .new_items
            .iter()
            .chain(r.existing_items.iter())
            .flat_map(|g| g.item_ids.iter().cloned())
            .collect();
        seen.sort();
        assert_eq!(seen, vec!["1", "2", "3", "4", "5"]);

        let new_ids: Vec<&String> = r.new_items.iter().flat_map(|g| &g.item_ids).collect();
        assert_eq!(new_ids, vec!["1", "4"]);
        assert!(r.new_items.iter().all(|g| g.is_new));
        assert!(r.existing_items.iter().all(|g| !g.is_new));
    }

    #[test]
    fn combined_group_is_new_if_any_member_is_recent() {
        let n = now();
        let items = vec![
            material("1", "Cabo", "10", 1, "10"),
            created(material("2", "Cabo", "10", 1, "10"), n - Duration::hours(1)),
            material("3", "Tomada", "8", 1, "8"),
        ];
        let r = aggregate(&items, n);
        assert_eq!(r.grouped_items.len(), 2);
        assert!(r.grouped_items[0].is_new);
        assert!(!r.grouped_items[1].is_new);
    }

    #[test]
    fn first_unit_price_wins() {
        let items = vec![
            material("a", "Cabo", "10", 1, "10"),
            material("b", "Cabo", "12", 1, "12"),
        ];
        let r = aggregate(&items, now());
        let g = &r.grouped_items[0];
        assert_eq!(g.unit_price, dec("10"));
        assert_eq!(g.total_price, dec("20"));
        // Pricing stays on the raw items.
        assert_eq!(r.subtotal, dec("22"));
    }

    #[test]
    fn subtotal_is_invariant_under_grouping_for_consistent_items() {
        let items = vec![
            material("a", "Cabo", "3.33", 3, "0"),
            material("b", "Tomada", "12.5", 2, "25"),
            material("c", "Cabo", "3.33", 7, "0"),
            material("d", "Fita", "0.99", 11, "0"),
        ];
        let r = aggregate(&items, now());
        let grouped_sum = r
            .grouped_items
            .iter()
            .fold(BigDecimal::zero(), |acc, g| acc + &g.total_price);
        assert_eq!(r.subtotal, grouped_sum);
    }

    #[test]
    fn zero_quantity_item_still_forms_a_group() {
        let items = vec![material("a", "Cabo", "10", 0, "0")];
        let r = aggregate(&items, now());
        assert_eq!(r.grouped_items.len(), 1);
        assert_eq!(r.grouped_items[0].quantity, 0);
        assert_eq!(r.subtotal, BigDecimal::zero());
    }

    #[test]
    fn negative_unit_price_passes_through() {
        let items = vec![
            material("a", "Cabo", "10", 2, "20"),
            material("b", "Estorno", "-5", 1, "0"),
        ];
        let r = aggregate(&items, now());
        assert_eq!(r.subtotal, dec("15"));
        assert_eq!(r.grouped_items[1].total_price, dec("-5"));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let n = now();
        let items = vec![
            created(material("1", "Cabo", "10", 1, "10"), n - Duration::hours(2)),
            material("2", "Tomada", "8", 3, "24"),
        ];
        let terms = PricingTerms {
            discount: Some(Discount::percentage(dec("7.5"))),
            stored_total: None,
        };
        assert_eq!(
            aggregate_with_terms(&items, &terms, n),
            aggregate_with_terms(&items, &terms, n)
        );
    }

    #[test]
    fn discount_never_exceeds_subtotal_and_total_never_negative() {
        let subtotals = ["0", "1", "99.99", "1000"];
        let discounts = [
            Discount::percentage(dec("150")),
            Discount::percentage(dec("33.3")),
            Discount::fixed(dec("0.01")),
            Discount::fixed(dec("5000")),
        ];
        for s in subtotals {
            let subtotal = dec(s);
            for d in &discounts {
                let v = discount_value(&subtotal, Some(d));
                assert!(v <= subtotal);
                assert!(v >= BigDecimal::zero());
                assert!(resolve_total(&subtotal, &v, None) >= BigDecimal::zero());
            }
        }
    }
}
