use crate::domain::document::Document;
use crate::domain::format::document_filename;
use crate::domain::layout::{DocumentMeta, LayoutEngine};
use crate::domain::line_item::LineItem;
use crate::domain::ports::Clock;
use crate::domain::pricing::{aggregate_with_terms, AggregationResult, PricingTerms};

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub summary: AggregationResult,
    pub document: Document,
}

pub struct QuoteService<C> {
    clock: C,
    engine: LayoutEngine,
}

impl<C: Clock> QuoteService<C> {
    pub fn new(clock: C, engine: LayoutEngine) -> Self {
        Self { clock, engine }
    }

    pub fn summarize(&self, items: &[LineItem], terms: &PricingTerms) -> AggregationResult {
        aggregate_with_terms(items, terms, self.clock.now())
    }

    pub fn build_document(
        &self,
        items: &[LineItem],
        terms: &PricingTerms,
        meta: &DocumentMeta,
    ) -> RenderedDocument {
        let now = self.clock.now();
        let summary = aggregate_with_terms(items, terms, now);
        let pages = self.engine.layout(&summary, meta);
        let filename = document_filename(
            meta.kind,
            meta.name_or_id(),
            &meta.document_id,
            now.timestamp_millis(),
        );
        log::debug!(
            "built {} ({} item(s), {} page(s))",
            filename,
            summary.item_count,
            pages.len()
        );
        RenderedDocument {
            summary,
            document: Document { filename, pages },
        }
    }
}
