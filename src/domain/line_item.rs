use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};

/// Display name used when a line item references nothing with a usable name.
pub const FALLBACK_ITEM_NAME: &str = "Item";

/// What a line item bills for.
#[derive(Debug, Clone, PartialEq)]
pub enum LineItemRef {
    Service {
        name: String,
        unit: Option<String>,
    },
    Material {
        name: String,
        category: Option<String>,
        unit: Option<String>,
    },
    Unknown,
}

impl LineItemRef {
    pub fn display_name(&self) -> &str {
        let name = match self {
            LineItemRef::Service { name, .. } | LineItemRef::Material { name, .. } => name.trim(),
            LineItemRef::Unknown => "",
        };
        if name.is_empty() {
            FALLBACK_ITEM_NAME
        } else {
            name
        }
    }

    pub fn unit(&self) -> Option<&str> {
        match self {
            LineItemRef::Service { unit, .. } | LineItemRef::Material { unit, .. } => {
                unit.as_deref()
            }
            LineItemRef::Unknown => None,
        }
    }

    pub fn category(&self) -> Option<&str> {
        match self {
            LineItemRef::Material { category, .. } => category.as_deref(),
            _ => None,
        }
    }
}

/// One billable row of a budget or material list.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub id: String,
    pub reference: LineItemRef,
    pub unit_price: BigDecimal,
    pub quantity: i32,
    /// Stored row total. Only trusted when strictly positive.
    pub total_price: Option<BigDecimal>,
    pub created_at: Option<DateTime<Utc>>,
}

impl LineItem {
    pub fn display_name(&self) -> &str {
        self.reference.display_name()
    }

    /// Stored total when positive, otherwise `unit_price × quantity`.
    pub fn effective_total(&self) -> BigDecimal {
        match &self.total_price {
            Some(total) if *total > BigDecimal::zero() => total.clone(),
            _ => &self.unit_price * BigDecimal::from(self.quantity),
        }
    }
}
