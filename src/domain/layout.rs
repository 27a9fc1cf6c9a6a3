//! Printable document layout.
//!
//! The document is drawn top to bottom as a fixed sequence of regions. Each
//! region is a pure function of the vertical cursor that returns its draw
//! commands and the advanced cursor; `PageBuilder` collects them into pages
//! and opens a new page when the item table or the totals block would cross
//! the bottom margin.
//!
//! Coordinates are page-local points, origin top-left, y growing downward.
//! Text `y` is the baseline.

use chrono::{DateTime, Duration, Utc};

use super::document::{Color, DrawCommand, Font, ImageRef, Page, TextAlign};
use super::errors::DomainError;
use super::format::{format_brl, format_date, plain_decimal, truncate_to_width};
use super::pricing::{AggregationResult, DiscountType, GroupedItem};

/// Budgets are valid for this many days after creation.
pub const VALIDITY_DAYS: i64 = 10;

const HEADER_HEIGHT: f64 = 90.0;
const TITLE_HEIGHT: f64 = 25.0;
const RECIPIENT_HEIGHT: f64 = 70.0;
const RECIPIENT_BOX_HEIGHT: f64 = 55.0;
const RECIPIENT_RADIUS: f64 = 6.0;
const TABLE_HEADER_HEIGHT: f64 = 25.0;
const ROW_HEIGHT: f64 = 22.0;
const CELL_PADDING: f64 = 8.0;
const LOGO_WIDTH: f64 = 80.0;
const LOGO_HEIGHT: f64 = 60.0;
const TOTALS_GAP: f64 = 15.0;
const TOTALS_LINE_HEIGHT: f64 = 18.0;
const TOTALS_DIVIDER_HEIGHT: f64 = 8.0;
const TOTALS_GRAND_HEIGHT: f64 = 22.0;
const TOTALS_WIDTH: f64 = 200.0;
const TOTALS_VALUE_WIDTH: f64 = 95.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentKind {
    #[default]
    Budget,
    MaterialList,
}

impl DocumentKind {
    pub fn title(&self) -> &'static str {
        match self {
            DocumentKind::Budget => "ORÇAMENTO",
            DocumentKind::MaterialList => "LISTA DE MATERIAIS",
        }
    }

    pub fn filename_prefix(&self) -> &'static str {
        match self {
            DocumentKind::Budget => "orcamento",
            DocumentKind::MaterialList => "lista-de-materiais",
        }
    }
}

/// Page size and margin, validated so that every region fits on a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    width: f64,
    height: f64,
    margin: f64,
}

impl PageGeometry {
    pub fn new(width: f64, height: f64, margin: f64) -> Result<Self, DomainError> {
        if !(width.is_finite() && height.is_finite() && margin.is_finite()) {
            return Err(DomainError::InvalidConfiguration(
                "page dimensions must be finite".to_string(),
            ));
        }
        if width <= 0.0 || height <= 0.0 {
            return Err(DomainError::InvalidConfiguration(format!(
                "page size must be positive, got {}x{}",
                width, height
            )));
        }
        if margin < 0.0 {
            return Err(DomainError::InvalidConfiguration(format!(
                "page margin must not be negative, got {}",
                margin
            )));
        }
        if 2.0 * margin >= width {
            return Err(DomainError::InvalidConfiguration(format!(
                "margin {} leaves no printable width on a {} wide page",
                margin, width
            )));
        }
        let printable = height - 2.0 * margin;
        let required = min_printable_height();
        if printable < required {
            return Err(DomainError::InvalidConfiguration(format!(
                "printable height {} is below the {} needed for one page of content",
                printable, required
            )));
        }
        Ok(Self {
            width,
            height,
            margin,
        })
    }

    /// A4 in points with a 40pt margin.
    pub fn a4() -> Self {
        Self {
            width: 595.28,
            height: 841.89,
            margin: 40.0,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    fn content_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    fn right(&self) -> f64 {
        self.width - self.margin
    }

    fn bottom(&self) -> f64 {
        self.height - self.margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

fn min_printable_height() -> f64 {
    HEADER_HEIGHT
        + TITLE_HEIGHT
        + RECIPIENT_HEIGHT
        + TABLE_HEADER_HEIGHT
        + ROW_HEIGHT
        + totals_height(true)
}

fn totals_height(has_discount: bool) -> f64 {
    let discount_line = if has_discount { TOTALS_LINE_HEIGHT } else { 0.0 };
    TOTALS_GAP + TOTALS_LINE_HEIGHT + discount_line + TOTALS_DIVIDER_HEIGHT + TOTALS_GRAND_HEIGHT
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMeta {
    pub kind: DocumentKind,
    pub document_id: String,
    pub document_name: Option<String>,
    pub company_name: String,
    pub company_phone: Option<String>,
    pub company_website: Option<String>,
    pub company_logo: Option<ImageRef>,
    pub client_name: String,
    pub created_at: DateTime<Utc>,
}

impl DocumentMeta {
    pub fn valid_until(&self) -> DateTime<Utc> {
        self.created_at + Duration::days(VALIDITY_DAYS)
    }

    /// Name used in the filename; the id when the document has no name.
    pub fn name_or_id(&self) -> &str {
        self.document_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.document_id)
    }
}

type Region = (Vec<DrawCommand>, f64);

/// Collects draw commands into pages.
struct PageBuilder {
    geometry: PageGeometry,
    finished: Vec<Page>,
    current: Vec<DrawCommand>,
}

impl PageBuilder {
    fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            finished: Vec::new(),
            current: Vec::new(),
        }
    }

    fn place(&mut self, (commands, cursor): Region) -> f64 {
        self.current.extend(commands);
        cursor
    }

    /// Close the current page and return the cursor at the top of the next one.
    fn break_page(&mut self) -> f64 {
        let commands = std::mem::take(&mut self.current);
        let page = self.page(commands);
        self.finished.push(page);
        self.geometry.margin
    }

    fn page(&self, commands: Vec<DrawCommand>) -> Page {
        Page {
            number: self.finished.len() + 1,
            width: self.geometry.width,
            height: self.geometry.height,
            commands,
        }
    }

    fn finish(mut self) -> Vec<Page> {
        let commands = std::mem::take(&mut self.current);
        let last = self.page(commands);
        self.finished.push(last);
        self.finished
    }
}

fn text(content: impl Into<String>, x: f64, y: f64, align: TextAlign, font: Font, color: Color) -> DrawCommand {
    DrawCommand::Text {
        content: content.into(),
        x,
        y,
        align,
        font,
        color,
    }
}

fn hline(x1: f64, x2: f64, y: f64, color: Color, width: f64) -> DrawCommand {
    DrawCommand::Line {
        x1,
        y1: y,
        x2,
        y2: y,
        color,
        width,
    }
}

fn rect(x: f64, y: f64, w: f64, h: f64, corner_radius: f64, fill_color: Color) -> DrawCommand {
    DrawCommand::Rect {
        x,
        y,
        w,
        h,
        corner_radius,
        fill_color,
    }
}

fn header_region(g: &PageGeometry, meta: &DocumentMeta, y: f64) -> Region {
    let mut commands = Vec::new();
    if let Some(logo) = &meta.company_logo {
        commands.push(DrawCommand::Image {
            image: logo.clone(),
            x: g.margin,
            y,
            w: LOGO_WIDTH,
            h: LOGO_HEIGHT,
        });
    }

    let right = g.right();
    // Right-aligned name must stop short of the logo.
    let name_width = match meta.company_logo {
        Some(_) => g.content_width() - LOGO_WIDTH - CELL_PADDING,
        None => g.content_width(),
    };
    commands.push(text(
        truncate_to_width(&meta.company_name, name_width, 16.0),
        right,
        y + 18.0,
        TextAlign::Right,
        Font::bold(16.0),
        Color::TEXT,
    ));
    let contact_lines = [&meta.company_phone, &meta.company_website]
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());
    for (i, line) in contact_lines.enumerate() {
        commands.push(text(
            line,
            right,
            y + 36.0 + 14.0 * i as f64,
            TextAlign::Right,
            Font::regular(10.0),
            Color::MUTED,
        ));
    }
    commands.push(hline(g.margin, right, y + 80.0, Color::RULE, 0.5));
    (commands, y + HEADER_HEIGHT)
}

fn title_region(g: &PageGeometry, meta: &DocumentMeta, y: f64) -> Region {
    let commands = vec![
        text(
            meta.kind.title(),
            g.margin,
            y + 18.0,
            TextAlign::Left,
            Font::bold(18.0),
            Color::PRIMARY,
        ),
        text(
            format!("Válido até: {}", format_date(meta.valid_until())),
            g.right(),
            y + 18.0,
            TextAlign::Right,
            Font::regular(10.0),
            Color::MUTED,
        ),
    ];
    (commands, y + TITLE_HEIGHT)
}

fn recipient_region(g: &PageGeometry, meta: &DocumentMeta, y: f64) -> Region {
    let x = g.margin + 12.0;
    let commands = vec![
        rect(
            g.margin,
            y + 5.0,
            g.content_width(),
            RECIPIENT_BOX_HEIGHT,
            RECIPIENT_RADIUS,
            Color::PANEL,
        ),
        text("PARA:", x, y + 25.0, TextAlign::Left, Font::bold(10.0), Color::MUTED),
        text(
            truncate_to_width(&meta.client_name, g.content_width() - 24.0, 14.0),
            x,
            y + 45.0,
            TextAlign::Left,
            Font::bold(14.0),
            Color::TEXT,
        ),
    ];
    (commands, y + RECIPIENT_HEIGHT)
}

/// Column anchors of the item table.
struct Columns {
    description_x: f64,
    description_width: f64,
    unit_price_center: f64,
    quantity_center: f64,
    total_right: f64,
}

impl Columns {
    fn for_page(g: &PageGeometry) -> Self {
        let w = g.content_width();
        let description_width = w * 0.5;
        let unit_width = w * 0.2;
        let quantity_width = w * 0.1;
        Self {
            description_x: g.margin + CELL_PADDING,
            description_width: description_width - 2.0 * CELL_PADDING,
            unit_price_center: g.margin + description_width + unit_width / 2.0,
            quantity_center: g.margin + description_width + unit_width + quantity_width / 2.0,
            total_right: g.right() - CELL_PADDING,
        }
    }
}

fn table_header(g: &PageGeometry, y: f64) -> Region {
    let cols = Columns::for_page(g);
    let font = Font::bold(10.0);
    let baseline = y + 16.0;
    let commands = vec![
        rect(g.margin, y, g.content_width(), TABLE_HEADER_HEIGHT, 0.0, Color::PRIMARY),
        text("DESCRIÇÃO", cols.description_x, baseline, TextAlign::Left, font, Color::WHITE),
        text("VALOR UNIT.", cols.unit_price_center, baseline, TextAlign::Center, font, Color::WHITE),
        text("QTD.", cols.quantity_center, baseline, TextAlign::Center, font, Color::WHITE),
        text("TOTAL", cols.total_right, baseline, TextAlign::Right, font, Color::WHITE),
    ];
    (commands, y + TABLE_HEADER_HEIGHT)
}

fn quantity_label(item: &GroupedItem) -> String {
    match item.unit.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        Some(unit) => format!("{} {}", item.quantity, unit),
        None => item.quantity.to_string(),
    }
}

fn table_row(g: &PageGeometry, item: &GroupedItem, y: f64, last: bool) -> Region {
    let cols = Columns::for_page(g);
    let font = Font::regular(10.0);
    let baseline = y + 15.0;
    let mut commands = Vec::with_capacity(6);

    if item.is_new {
        commands.push(rect(g.margin, y, g.content_width(), ROW_HEIGHT, 0.0, Color::HIGHLIGHT));
    }
    commands.push(text(
        truncate_to_width(&item.display_name, cols.description_width, font.size),
        cols.description_x,
        baseline,
        TextAlign::Left,
        font,
        Color::TEXT,
    ));
    commands.push(text(
        format_brl(&item.unit_price),
        cols.unit_price_center,
        baseline,
        TextAlign::Center,
        font,
        Color::TEXT,
    ));
    commands.push(text(
        quantity_label(item),
        cols.quantity_center,
        baseline,
        TextAlign::Center,
        font,
        Color::TEXT,
    ));
    commands.push(text(
        format_brl(&item.total_price),
        cols.total_right,
        baseline,
        TextAlign::Right,
        font,
        Color::TEXT,
    ));
    if !last {
        commands.push(hline(g.margin, g.right(), y + ROW_HEIGHT, Color::RULE, 0.5));
    }
    (commands, y + ROW_HEIGHT)
}

fn closing_rule(g: &PageGeometry, y: f64) -> Region {
    (vec![hline(g.margin, g.right(), y, Color::MUTED, 1.0)], y)
}

fn discount_label(result: &AggregationResult) -> String {
    match &result.discount {
        Some(d) if d.kind == DiscountType::Percentage => {
            format!("Desconto ({}%):", plain_decimal(&d.amount, ','))
        }
        _ => "Desconto:".to_string(),
    }
}

fn totals_region(g: &PageGeometry, result: &AggregationResult, y: f64) -> Region {
    let value_x = g.right();
    let label_x = g.right() - TOTALS_VALUE_WIDTH;
    let mut commands = Vec::new();
    let mut y = y + TOTALS_GAP;

    let line = |commands: &mut Vec<DrawCommand>, label: String, value: String, font: Font, color: Color, baseline: f64| {
        commands.push(text(label, label_x, baseline, TextAlign::Right, font, Color::TEXT));
        commands.push(text(value, value_x, baseline, TextAlign::Right, font, color));
    };

    line(
        &mut commands,
        "Subtotal:".to_string(),
        format_brl(&result.subtotal),
        Font::regular(11.0),
        Color::TEXT,
        y + 12.0,
    );
    y += TOTALS_LINE_HEIGHT;

    if result.has_discount {
        line(
            &mut commands,
            discount_label(result),
            format!("- {}", format_brl(&result.discount_value)),
            Font::regular(11.0),
            Color::DISCOUNT,
            y + 12.0,
        );
        y += TOTALS_LINE_HEIGHT;
    }

    commands.push(hline(value_x - TOTALS_WIDTH, value_x, y + 4.0, Color::RULE, 0.75));
    y += TOTALS_DIVIDER_HEIGHT;

    line(
        &mut commands,
        "TOTAL:".to_string(),
        format_brl(&result.total),
        Font::bold(13.0),
        Color::PRIMARY,
        y + 15.0,
    );
    y += TOTALS_GRAND_HEIGHT;

    (commands, y)
}

/// Lays an aggregated budget out onto fixed-size pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutEngine {
    geometry: PageGeometry,
}

impl LayoutEngine {
    pub fn new(geometry: PageGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn layout(&self, result: &AggregationResult, meta: &DocumentMeta) -> Vec<Page> {
        let g = &self.geometry;
        let mut pages = PageBuilder::new(*g);

        let y = g.margin;
        let y = pages.place(header_region(g, meta, y));
        let y = pages.place(title_region(g, meta, y));
        let y = pages.place(recipient_region(g, meta, y));
        let mut y = pages.place(table_header(g, y));

        let rows = &result.grouped_items;
        let mut rows_on_page = 0usize;
        for (i, item) in rows.iter().enumerate() {
            if rows_on_page > 0 && y + ROW_HEIGHT > g.bottom() {
                y = pages.break_page();
                y = pages.place(table_header(g, y));
                rows_on_page = 0;
            }
            y = pages.place(table_row(g, item, y, i + 1 == rows.len()));
            rows_on_page += 1;
        }
        let y = pages.place(closing_rule(g, y));

        let y = if y + totals_height(result.has_discount) > g.bottom() {
            pages.break_page()
        } else {
            y
        };
        pages.place(totals_region(g, result, y));

        let pages = pages.finish();
        log::debug!(
            "laid out {} rows on {} page(s)",
            rows.len(),
            pages.len()
        );
        pages
    }
}
