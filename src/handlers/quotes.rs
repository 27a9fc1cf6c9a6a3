use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::quote_service::QuoteService;
use crate::domain::coerce::{decimal_or_zero, quantity_or_zero, timestamp_or_none};
use crate::domain::document::{ImageRef, Page};
use crate::domain::errors::DomainError;
use crate::domain::format::{format_amount, plain_decimal};
use crate::domain::layout::{DocumentKind, DocumentMeta};
use crate::domain::line_item::{LineItem, LineItemRef};
use crate::domain::ports::Clock;
use crate::domain::pricing::{AggregationResult, Discount, DiscountType, GroupedItem, PricingTerms};
use crate::errors::AppError;

/// The service as shared between workers.
pub type SharedQuoteService = QuoteService<Box<dyn Clock>>;

// ── Request DTOs ─────────────────────────────────────────────────────────────
//
// Numeric fields accept JSON numbers or strings; anything unreadable counts
// as zero.

#[derive(Debug, Deserialize, ToSchema)]
pub struct ServiceRefRequest {
    pub name: Option<String>,
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MaterialRefRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LineItemRequest {
    #[serde(default)]
    #[schema(value_type = Object)]
    pub id: Value,
    pub service: Option<ServiceRefRequest>,
    pub material: Option<MaterialRefRequest>,
    #[serde(default, alias = "unitPrice")]
    #[schema(value_type = Object)]
    pub unit_price: Value,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub quantity: Value,
    #[serde(default, alias = "totalPrice")]
    #[schema(value_type = Object)]
    pub total_price: Value,
    /// RFC 3339 timestamp or epoch milliseconds.
    #[serde(default, alias = "createdAt")]
    #[schema(value_type = Object)]
    pub created_at: Value,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiscountTypeRequest {
    #[serde(alias = "percentage")]
    Percentage,
    #[serde(alias = "fixed")]
    Fixed,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DiscountRequest {
    #[serde(rename = "type")]
    pub kind: DiscountTypeRequest,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub amount: Value,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct QuoteRequest {
    #[serde(default)]
    pub items: Vec<LineItemRequest>,
    pub discount: Option<DiscountRequest>,
    /// Total stored with the document; used when positive.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub total: Value,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKindRequest {
    Budget,
    MaterialList,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DocumentMetaRequest {
    pub kind: Option<DocumentKindRequest>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub company_name: String,
    pub company_phone: Option<String>,
    pub company_website: Option<String>,
    /// URL or data URI of the company logo.
    pub company_logo: Option<String>,
    pub client_name: String,
    /// RFC 3339 creation timestamp of the document.
    pub created_at: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DocumentRequest {
    #[serde(flatten)]
    pub quote: QuoteRequest,
    pub document: DocumentMetaRequest,
}

// ── Response DTOs ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct GroupedItemResponse {
    pub display_name: String,
    pub unit_price: String,
    pub quantity: i64,
    pub total_price: String,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub is_new: bool,
    pub item_ids: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiscountTypeResponse {
    Percentage,
    Fixed,
}

/// The discount as applied, so clients can label it.
#[derive(Debug, Serialize, ToSchema)]
pub struct DiscountResponse {
    #[serde(rename = "type")]
    pub kind: DiscountTypeResponse,
    pub amount: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryResponse {
    pub new_items: Vec<GroupedItemResponse>,
    pub existing_items: Vec<GroupedItemResponse>,
    pub grouped_items: Vec<GroupedItemResponse>,
    pub subtotal: String,
    pub has_discount: bool,
    pub discount: Option<DiscountResponse>,
    pub discount_value: String,
    pub total: String,
    pub item_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentResponse {
    pub filename: String,
    pub summary: SummaryResponse,
    /// Pages of draw commands in page-local points, origin top-left.
    #[schema(value_type = Vec<Object>)]
    pub pages: Vec<Page>,
}

// ── Conversions ──────────────────────────────────────────────────────────────

fn non_blank(s: &Option<String>) -> bool {
    s.as_deref().is_some_and(|n| !n.trim().is_empty())
}

impl LineItemRequest {
    fn into_line_item(self, position: usize) -> LineItem {
        let id = match &self.id {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => format!("#{}", position + 1),
        };
        let reference = match (self.service, self.material) {
            (Some(s), _) if non_blank(&s.name) => LineItemRef::Service {
                name: s.name.unwrap_or_default(),
                unit: s.unit,
            },
            (_, Some(m)) if non_blank(&m.name) => LineItemRef::Material {
                name: m.name.unwrap_or_default(),
                category: m.category,
                unit: m.unit,
            },
            _ => LineItemRef::Unknown,
        };
        let total_price = match &self.total_price {
            Value::Null => None,
            other => Some(decimal_or_zero(other)),
        };
        LineItem {
            id,
            reference,
            unit_price: decimal_or_zero(&self.unit_price),
            quantity: quantity_or_zero(&self.quantity),
            total_price,
            created_at: timestamp_or_none(&self.created_at),
        }
    }
}

impl QuoteRequest {
    fn into_parts(self) -> (Vec<LineItem>, PricingTerms) {
        let items = self
            .items
            .into_iter()
            .enumerate()
            .map(|(i, item)| item.into_line_item(i))
            .collect();
        let discount = self.discount.map(|d| Discount {
            kind: match d.kind {
                DiscountTypeRequest::Percentage => DiscountType::Percentage,
                DiscountTypeRequest::Fixed => DiscountType::Fixed,
            },
            amount: decimal_or_zero(&d.amount),
        });
        let stored_total = match &self.total {
            Value::Null => None,
            other => Some(decimal_or_zero(other)),
        };
        (
            items,
            PricingTerms {
                discount,
                stored_total,
            },
        )
    }
}

impl TryFrom<DocumentMetaRequest> for DocumentMeta {
    type Error = DomainError;

    fn try_from(req: DocumentMetaRequest) -> Result<Self, Self::Error> {
        let created_at = DateTime::parse_from_rfc3339(req.created_at.trim())
            .map_err(|e| {
                DomainError::InvalidInput(format!(
                    "Invalid document.created_at '{}': {}",
                    req.created_at, e
                ))
            })?
            .with_timezone(&Utc);
        let document_id = req
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Ok(DocumentMeta {
            kind: match req.kind {
                Some(DocumentKindRequest::MaterialList) => DocumentKind::MaterialList,
                Some(DocumentKindRequest::Budget) | None => DocumentKind::Budget,
            },
            document_id,
            document_name: req.name,
            company_name: req.company_name,
            company_phone: req.company_phone,
            company_website: req.company_website,
            company_logo: req.company_logo.filter(|l| !l.trim().is_empty()).map(ImageRef),
            client_name: req.client_name,
            created_at,
        })
    }
}

fn money(amount: &BigDecimal) -> String {
    format_amount(amount)
}

impl From<&GroupedItem> for GroupedItemResponse {
    fn from(g: &GroupedItem) -> Self {
        Self {
            display_name: g.display_name.clone(),
            unit_price: money(&g.unit_price),
            quantity: g.quantity,
            total_price: money(&g.total_price),
            category: g.category.clone(),
            unit: g.unit.clone(),
            is_new: g.is_new,
            item_ids: g.item_ids.clone(),
        }
    }
}

impl From<&AggregationResult> for SummaryResponse {
    fn from(r: &AggregationResult) -> Self {
        let rows = |items: &[GroupedItem]| -> Vec<GroupedItemResponse> {
            items.iter().map(GroupedItemResponse::from).collect()
        };
        Self {
            new_items: rows(&r.new_items),
            existing_items: rows(&r.existing_items),
            grouped_items: rows(&r.grouped_items),
            subtotal: money(&r.subtotal),
            has_discount: r.has_discount,
            discount: r.discount.as_ref().map(|d| DiscountResponse {
                kind: match d.kind {
                    DiscountType::Percentage => DiscountTypeResponse::Percentage,
                    DiscountType::Fixed => DiscountTypeResponse::Fixed,
                },
                amount: plain_decimal(&d.amount, '.'),
            }),
            discount_value: money(&r.discount_value),
            total: money(&r.total),
            item_count: r.item_count,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /quotes/summary
///
/// Groups the line items by name, splits off the ones added in the last
/// 24 hours and prices the whole set.
#[utoipa::path(
    post,
    path = "/quotes/summary",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Aggregated items and totals", body = SummaryResponse),
        (status = 400, description = "Malformed request body"),
    ),
    tag = "quotes"
)]
pub async fn summarize_quote(
    service: web::Data<SharedQuoteService>,
    body: web::Json<QuoteRequest>,
) -> Result<HttpResponse, AppError> {
    let (items, terms) = body.into_inner().into_parts();
    let summary = service.summarize(&items, &terms);
    Ok(HttpResponse::Ok().json(SummaryResponse::from(&summary)))
}

/// POST /quotes/document
///
/// Lays the quote out as printable pages of draw commands and names the
/// file the renderer should produce.
#[utoipa::path(
    post,
    path = "/quotes/document",
    request_body = DocumentRequest,
    responses(
        (status = 200, description = "Paginated draw commands", body = DocumentResponse),
        (status = 400, description = "Malformed request body or document metadata"),
    ),
    tag = "quotes"
)]
pub async fn build_document(
    service: web::Data<SharedQuoteService>,
    body: web::Json<DocumentRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let meta = DocumentMeta::try_from(body.document)?;
    let (items, terms) = body.quote.into_parts();

    let rendered = service.build_document(&items, &terms, &meta);

    Ok(HttpResponse::Ok().json(DocumentResponse {
        filename: rendered.document.filename,
        summary: SummaryResponse::from(&rendered.summary),
        pages: rendered.document.pages,
    }))
}
