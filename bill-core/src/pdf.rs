use std::io::Cursor;

use base64::Engine as _;
use printpdf::path::PaintMode;
use printpdf::{
    Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Point, Rect, Rgb,
};

use crate::currency::CurrencyFormat;
use crate::error::ExportError;
use crate::export::DocumentRenderer;
use crate::invoice::Invoice;
use crate::profile::BusinessProfile;

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const PAGE_MARGIN_X: f32 = 15.0;
const PAGE_MARGIN_TOP: f32 = 15.0;
const PAGE_MARGIN_BOTTOM: f32 = 18.0;

const PT_TO_MM: f32 = 25.4 / 72.0;

const CELL_PAD_X: f32 = 1.6;
const TABLE_TEXT_SIZE: f32 = 9.5;
const TABLE_LINE_H: f32 = 4.4;
const TABLE_ROW_PAD_Y: f32 = 2.6;

const LOGO_DPI: f32 = 300.0;
const LOGO_MAX_H: f32 = 18.0;

fn rgb(r: f32, g: f32, b: f32) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

// Unicode font for customer and item names in any script, and the rupee sign.
static BUNDLED_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

struct Fonts<'a> {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
    // Same bytes as the embedded font, parsed for width measurement.
    face: ttf_parser::Face<'a>,
}

impl Fonts<'_> {
    fn width_mm(&self, text: &str, font_size_pt: f32) -> f32 {
        text_width_mm_ttf(&self.face, text, font_size_pt)
    }

    fn covers(&self, text: &str) -> bool {
        text.chars().all(|ch| matches!(self.face.glyph_index(ch), Some(gid) if gid.0 != 0))
    }
}

fn embed_font<'a>(doc: &PdfDocumentReference, bytes: &'a [u8]) -> Result<Fonts<'a>, String> {
    let face = ttf_parser::Face::parse(bytes, 0).map_err(|e| format!("font is not a usable TTF ({e})"))?;
    let font = doc
        .add_external_font(Cursor::new(bytes))
        .map_err(|e| format!("failed to embed font ({e})"))?;
    // Every style shares the one embedded face.
    Ok(Fonts {
        regular: font.clone(),
        bold: font.clone(),
        italic: font,
        face,
    })
}

/// Embeds the profile's own font when it loads, the bundled one otherwise.
fn load_fonts<'a>(doc: &PdfDocumentReference, custom: Option<&'a [u8]>) -> Result<Fonts<'a>, String> {
    if let Some(bytes) = custom {
        match embed_font(doc, bytes) {
            Ok(fonts) => return Ok(fonts),
            Err(e) => log::warn!("[pdf] {e}; using the bundled font"),
        }
    }
    embed_font(doc, BUNDLED_FONT)
}

fn text_width_mm_ttf(face: &ttf_parser::Face<'_>, text: &str, font_size_pt: f32) -> f32 {
    let units_per_em = face.units_per_em() as f32;
    if units_per_em <= 0.0 {
        return 0.0;
    }

    let mut width_units: i32 = 0;
    for ch in text.chars() {
        let Some(gid) = face.glyph_index(ch) else {
            continue;
        };
        width_units += face.glyph_hor_advance(gid).unwrap_or(0) as i32;
    }

    (width_units as f32 / units_per_em) * font_size_pt * PT_TO_MM
}

fn push_line(layer: &PdfLayerReference, font: &IndirectFontRef, text: &str, font_size: f32, x: f32, y: f32) {
    layer.use_text(text, font_size, Mm(x), Mm(y), font);
}

fn push_line_right(
    layer: &PdfLayerReference,
    fonts: &Fonts<'_>,
    font: &IndirectFontRef,
    text: &str,
    font_size: f32,
    x_right: f32,
    y: f32,
) {
    let x = (x_right - fonts.width_mm(text, font_size)).max(0.0);
    push_line(layer, font, text, font_size, x, y);
}

fn push_line_centered(
    layer: &PdfLayerReference,
    fonts: &Fonts<'_>,
    font: &IndirectFontRef,
    text: &str,
    font_size: f32,
    y: f32,
) {
    let x = ((PAGE_W - fonts.width_mm(text, font_size)) / 2.0).max(PAGE_MARGIN_X);
    push_line(layer, font, text, font_size, x, y);
}

fn draw_rule(layer: &PdfLayerReference, x1: f32, y1: f32, x2: f32, y2: f32, thickness: f32) {
    layer.set_outline_thickness(thickness);
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(x1), Mm(y1)), false),
            (Point::new(Mm(x2), Mm(y2)), false),
        ],
        is_closed: false,
    });
}

fn fill_rect(layer: &PdfLayerReference, x: f32, y_top: f32, w: f32, h: f32, gray: f32) {
    layer.set_fill_color(rgb(gray, gray, gray));
    let rect = Rect::new(Mm(x), Mm(y_top - h), Mm(x + w), Mm(y_top)).with_mode(PaintMode::Fill);
    layer.add_rect(rect);
    layer.set_fill_color(rgb(0.0, 0.0, 0.0));
}

/// Greedy word wrap by measured width; single words wider than the column are
/// split by character.
fn wrap_text_by_width_mm(fonts: &Fonts<'_>, input: &str, font_size: f32, max_width_mm: f32) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in input.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if fonts.width_mm(&candidate, font_size) <= max_width_mm {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }

        for ch in word.chars() {
            let cand = format!("{}{}", current, ch);
            if current.is_empty() || fonts.width_mm(&cand, font_size) <= max_width_mm {
                current = cand;
            } else {
                out.push(std::mem::replace(&mut current, ch.to_string()));
            }
        }
    }

    if !current.is_empty() {
        out.push(current);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

fn decode_logo(data_url: &str) -> Option<printpdf::image_crate::DynamicImage> {
    let s = data_url.trim();
    if !s.to_ascii_lowercase().starts_with("data:") {
        return None;
    }
    let comma = s.find(',')?;
    let (meta, data) = s.split_at(comma);
    if !meta.to_ascii_lowercase().contains(";base64") {
        return None;
    }
    let bytes = base64::engine::general_purpose::STANDARD.decode(&data[1..]).ok()?;
    printpdf::image_crate::load_from_memory(&bytes).ok()
}

/// Column grid for the line-item table, as left/right x anchors in mm.
struct Columns {
    left: f32,
    right: f32,
    // Right edges of S.No, Item, Quantity, Price; Total ends at `right`.
    dividers: [f32; 4],
}

impl Columns {
    fn new() -> Self {
        let left = PAGE_MARGIN_X;
        let right = PAGE_W - PAGE_MARGIN_X;
        let total_w = 32.0;
        let price_w = 30.0;
        let qty_w = 22.0;
        let sno_w = 12.0;
        let price_right = right - total_w;
        let qty_right = price_right - price_w;
        let item_right = qty_right - qty_w;
        Self {
            left,
            right,
            dividers: [left + sno_w, item_right, qty_right, price_right],
        }
    }

    fn item_width(&self) -> f32 {
        self.dividers[1] - self.dividers[0] - 2.0 * CELL_PAD_X
    }

    fn cell_left(&self, col: usize) -> f32 {
        if col == 0 {
            self.left + CELL_PAD_X
        } else {
            self.dividers[col - 1] + CELL_PAD_X
        }
    }

    fn cell_right(&self, col: usize) -> f32 {
        if col == 4 {
            self.right - CELL_PAD_X
        } else {
            self.dividers[col] - CELL_PAD_X
        }
    }

    /// Horizontal rule under a row plus the vertical borders of its cells.
    fn draw_row_frame(&self, layer: &PdfLayerReference, top: f32, bottom: f32) {
        draw_rule(layer, self.left, bottom, self.right, bottom, 0.4);
        for x in [self.left, self.dividers[0], self.dividers[1], self.dividers[2], self.dividers[3], self.right] {
            draw_rule(layer, x, top, x, bottom, 0.4);
        }
    }
}

/// Current page and the flowing y cursor (baseline space, bottom-left origin).
struct Canvas<'d> {
    doc: &'d PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    page_count: usize,
}

impl Canvas<'_> {
    fn new_page(&mut self) {
        self.page_count += 1;
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_W), Mm(PAGE_H), format!("Page {}", self.page_count));
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_H - PAGE_MARGIN_TOP;
    }

    fn fits(&self, h: f32) -> bool {
        self.y - h >= PAGE_MARGIN_BOTTOM
    }
}

fn draw_table_header(canvas: &mut Canvas<'_>, fonts: &Fonts<'_>, cols: &Columns, money: &CurrencyFormat) {
    let row_h = TABLE_LINE_H + 2.0 * TABLE_ROW_PAD_Y;
    let top = canvas.y;
    let bottom = top - row_h;
    let baseline = top - TABLE_ROW_PAD_Y - TABLE_LINE_H * 0.8;
    let layer = &canvas.layer;

    fill_rect(layer, cols.left, top, cols.right - cols.left, row_h, 0.95);
    draw_rule(layer, cols.left, top, cols.right, top, 0.4);

    let price_label = format!("Price ({})", money.symbol);
    let total_label = format!("Total ({})", money.symbol);
    push_line(layer, &fonts.bold, "S.No", TABLE_TEXT_SIZE, cols.cell_left(0), baseline);
    push_line(layer, &fonts.bold, "Item", TABLE_TEXT_SIZE, cols.cell_left(1), baseline);
    push_line_right(layer, fonts, &fonts.bold, "Quantity", TABLE_TEXT_SIZE, cols.cell_right(2), baseline);
    push_line_right(layer, fonts, &fonts.bold, &price_label, TABLE_TEXT_SIZE, cols.cell_right(3), baseline);
    push_line_right(layer, fonts, &fonts.bold, &total_label, TABLE_TEXT_SIZE, cols.cell_right(4), baseline);

    cols.draw_row_frame(layer, top, bottom);
    canvas.y = bottom;
}

/// Lays out `invoice` on A4 pages and returns the encoded PDF.
pub fn generate_pdf_bytes(invoice: &Invoice, profile: &BusinessProfile) -> Result<Vec<u8>, String> {
    let title = format!("{} {}", profile.business_name, invoice.invoice_number);
    let (doc, page1, layer1) = PdfDocument::new(&title, Mm(PAGE_W), Mm(PAGE_H), "Page 1");

    let font_bytes = profile.font_path.as_deref().and_then(|path| match std::fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log::warn!("[pdf] cannot read font {}: {e}", path.display());
            None
        }
    });
    let fonts = load_fonts(&doc, font_bytes.as_deref())?;

    // A custom font may lack a glyph for the symbol; print its plain-text form then.
    let money = if fonts.covers(&profile.currency.symbol) {
        profile.currency.clone()
    } else {
        profile.currency.with_symbol(&profile.currency.pdf_symbol)
    };

    let mut canvas = Canvas {
        doc: &doc,
        layer: doc.get_page(page1).get_layer(layer1),
        y: PAGE_H - PAGE_MARGIN_TOP,
        page_count: 1,
    };
    let content_left = PAGE_MARGIN_X;
    let content_right = PAGE_W - PAGE_MARGIN_X;

    // A) Header: optional logo on the left, business name and tagline centered.
    let header_top = canvas.y;
    let mut header_bottom = header_top;
    if let Some(img) = profile.logo_data_url.as_deref().and_then(decode_logo) {
        let px_w = img.width().max(1) as f32;
        let px_h = img.height().max(1) as f32;
        let natural_h_mm = px_h / LOGO_DPI * 25.4;
        let natural_w_mm = px_w / LOGO_DPI * 25.4;
        let scale = (LOGO_MAX_H / natural_h_mm.max(1.0)).min(40.0 / natural_w_mm.max(1.0)).max(0.01);
        Image::from_dynamic_image(&img).add_to_layer(
            canvas.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(content_left)),
                translate_y: Some(Mm(header_top - natural_h_mm * scale)),
                rotate: None,
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(LOGO_DPI),
            },
        );
        header_bottom = header_top - natural_h_mm * scale;
    }

    canvas.y -= 20.0 * PT_TO_MM;
    canvas.layer.set_fill_color(rgb(0.10, 0.37, 0.48));
    push_line_centered(&canvas.layer, &fonts, &fonts.bold, &profile.business_name, 20.0, canvas.y);
    canvas.layer.set_fill_color(rgb(0.40, 0.40, 0.40));
    if !profile.tagline.trim().is_empty() {
        canvas.y -= 6.0;
        push_line_centered(&canvas.layer, &fonts, &fonts.italic, &profile.tagline, 9.0, canvas.y);
    }
    canvas.layer.set_fill_color(rgb(0.2, 0.2, 0.2));
    canvas.y = canvas.y.min(header_bottom) - 8.0;

    // B) Business details (left) and invoice details (right).
    let info_size = 9.5;
    let info_line_h = 5.2;
    let left_rows: Vec<(&str, &str)> = [
        ("Proprietor", profile.proprietor.as_str()),
        ("Phone", profile.phone.as_str()),
        ("Address", profile.address.as_str()),
    ]
    .into_iter()
    .filter(|(_, v)| !v.trim().is_empty())
    .collect();
    let date_label = invoice.date_label();
    let right_rows: [(&str, &str); 3] = [
        ("Invoice Date", date_label.as_str()),
        ("Customer", invoice.customer_name.as_str()),
        ("Invoice #", invoice.invoice_number.as_str()),
    ];

    let info_top = canvas.y;
    for (idx, (label, value)) in left_rows.iter().enumerate() {
        let y = info_top - idx as f32 * info_line_h;
        let prefix = format!("{}: ", label);
        push_line(&canvas.layer, &fonts.bold, &prefix, info_size, content_left, y);
        let value_x = content_left + fonts.width_mm(&prefix, info_size);
        push_line(&canvas.layer, &fonts.regular, value, info_size, value_x, y);
    }
    for (idx, (label, value)) in right_rows.iter().enumerate() {
        let y = info_top - idx as f32 * info_line_h;
        push_line_right(&canvas.layer, &fonts, &fonts.regular, value, info_size, content_right, y);
        let label_right = content_right - fonts.width_mm(value, info_size);
        push_line_right(
            &canvas.layer,
            &fonts,
            &fonts.bold,
            &format!("{}: ", label),
            info_size,
            label_right,
            y,
        );
    }
    let info_rows = left_rows.len().max(right_rows.len());
    canvas.y = info_top - info_rows as f32 * info_line_h - 4.0;

    // C) Line items, continuing on new pages with a repeated header.
    let cols = Columns::new();
    canvas.layer.set_fill_color(rgb(0.0, 0.0, 0.0));
    draw_table_header(&mut canvas, &fonts, &cols, &money);

    for li in &invoice.line_items {
        let name_lines = wrap_text_by_width_mm(&fonts, &li.name, TABLE_TEXT_SIZE, cols.item_width());
        let row_h = name_lines.len() as f32 * TABLE_LINE_H + 2.0 * TABLE_ROW_PAD_Y;
        if !canvas.fits(row_h) {
            canvas.new_page();
            draw_table_header(&mut canvas, &fonts, &cols, &money);
        }

        let top = canvas.y;
        let baseline = top - TABLE_ROW_PAD_Y - TABLE_LINE_H * 0.8;
        let layer = &canvas.layer;
        push_line(layer, &fonts.regular, &li.serial_number.to_string(), TABLE_TEXT_SIZE, cols.cell_left(0), baseline);
        for (idx, line) in name_lines.iter().enumerate() {
            let y = baseline - idx as f32 * TABLE_LINE_H;
            push_line(layer, &fonts.regular, line, TABLE_TEXT_SIZE, cols.cell_left(1), y);
        }
        push_line_right(layer, &fonts, &fonts.regular, &li.quantity, TABLE_TEXT_SIZE, cols.cell_right(2), baseline);
        push_line_right(
            layer,
            &fonts,
            &fonts.regular,
            &money.format(li.unit_price),
            TABLE_TEXT_SIZE,
            cols.cell_right(3),
            baseline,
        );
        push_line_right(
            layer,
            &fonts,
            &fonts.regular,
            &money.format(li.line_total),
            TABLE_TEXT_SIZE,
            cols.cell_right(4),
            baseline,
        );

        let bottom = top - row_h;
        cols.draw_row_frame(layer, top, bottom);
        canvas.y = bottom;
    }

    // D) Grand total.
    let total_size = 12.0;
    let total_block_h = 10.0;
    if !canvas.fits(total_block_h) {
        canvas.new_page();
    }
    canvas.y -= 7.0;
    push_line_right(
        &canvas.layer,
        &fonts,
        &fonts.bold,
        &format!("Total: {}", money.format(invoice.grand_total)),
        total_size,
        content_right,
        canvas.y,
    );
    canvas.y -= total_block_h;

    // E) Footer lines, kept together.
    let footer_size = 8.0;
    let footer_line_h = 4.2;
    let footer_lines: Vec<String> = profile
        .footer_lines
        .iter()
        .flat_map(|line| wrap_text_by_width_mm(&fonts, line, footer_size, content_right - content_left))
        .collect();
    if !footer_lines.is_empty() {
        if !canvas.fits(footer_lines.len() as f32 * footer_line_h) {
            canvas.new_page();
        }
        canvas.layer.set_fill_color(rgb(0.40, 0.40, 0.40));
        for line in &footer_lines {
            push_line_centered(&canvas.layer, &fonts, &fonts.regular, line, footer_size, canvas.y);
            canvas.y -= footer_line_h;
        }
    }

    log::debug!(
        "[pdf] laid out {} line items on {} page(s)",
        invoice.line_items.len(),
        canvas.page_count
    );

    drop(canvas);
    let mut writer = std::io::BufWriter::new(Vec::<u8>::new());
    doc.save(&mut writer).map_err(|e| e.to_string())?;
    let bytes = writer.into_inner().map_err(|e| e.to_string())?;
    Ok(bytes)
}

/// Renders invoices with `printpdf` using the given business profile.
#[derive(Debug, Clone)]
pub struct PrintPdfRenderer {
    profile: BusinessProfile,
}

impl PrintPdfRenderer {
    pub fn new(profile: BusinessProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &BusinessProfile {
        &self.profile
    }
}

impl DocumentRenderer for PrintPdfRenderer {
    fn render(&self, invoice: &Invoice) -> Result<Vec<u8>, ExportError> {
        generate_pdf_bytes(invoice, &self.profile).map_err(ExportError::Render)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{build_invoice_with, InvoiceNumber};
    use crate::item::Item;
    use crate::profile::embedded_profile;
    use time::macros::date;

    fn invoice_with(n: usize, name: &str) -> Invoice {
        let items: Vec<Item> = (0..n)
            .map(|i| Item {
                id: i as u64 + 1,
                name: format!("{name} {i}"),
                quantity: "2".into(),
                price: "149.5".into(),
            })
            .collect();
        build_invoice_with("Ali", &items, date!(2026 - 10 - 19), InvoiceNumber::from_code(1)).unwrap()
    }

    #[test]
    fn renders_a_pdf() {
        let bytes = generate_pdf_bytes(&invoice_with(2, "Bulb"), embedded_profile()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn long_bills_do_not_fail() {
        let long_name = "Copper wire twin core flexible heavy duty insulated extension cable";
        let bytes = generate_pdf_bytes(&invoice_with(120, long_name), embedded_profile()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        let short = generate_pdf_bytes(&invoice_with(1, "Bulb"), embedded_profile()).unwrap();
        assert!(bytes.len() > short.len());
    }

    #[test]
    fn missing_font_and_bad_logo_fall_back() {
        let mut profile = embedded_profile().clone();
        profile.font_path = Some("/definitely/not/here.ttf".into());
        profile.logo_data_url = Some("data:image/png;base64,!!!".into());
        let bytes = generate_pdf_bytes(&invoice_with(1, "Fan"), &profile).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn renderer_maps_into_export_pipeline() {
        let renderer = PrintPdfRenderer::new(embedded_profile().clone());
        let bytes = renderer.render(&invoice_with(3, "Switch")).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(renderer.profile().business_name, "FMU Electronics");
    }

    /// Operands of every `Tj` in the document, as the glyph-id bytes printpdf writes.
    fn shown_strings(pdf: &[u8]) -> Vec<Vec<u8>> {
        let doc = printpdf::lopdf::Document::load_mem(pdf).unwrap();
        let mut out = Vec::new();
        for page_id in doc.get_pages().into_values() {
            let content = doc.get_and_decode_page_content(page_id).unwrap();
            for op in content.operations {
                if op.operator != "Tj" {
                    continue;
                }
                for operand in op.operands {
                    if let printpdf::lopdf::Object::String(bytes, _) = operand {
                        out.push(bytes);
                    }
                }
            }
        }
        out
    }

    fn glyph_bytes(text: &str) -> Vec<u8> {
        let face = ttf_parser::Face::parse(BUNDLED_FONT, 0).unwrap();
        text.chars()
            .flat_map(|ch| {
                let gid = face.glyph_index(ch).unwrap_or_else(|| panic!("no glyph for {ch:?}"));
                gid.0.to_be_bytes()
            })
            .collect()
    }

    #[test]
    fn non_latin_names_and_rupee_sign_reach_the_page() {
        let items = [Item {
            id: 1,
            name: "Pankha ZZQQ علی".into(),
            quantity: "1".into(),
            price: "5".into(),
        }];
        let invoice =
            build_invoice_with("Zoë علی", &items, date!(2026 - 10 - 19), InvoiceNumber::from_code(7)).unwrap();
        let shown = shown_strings(&generate_pdf_bytes(&invoice, embedded_profile()).unwrap());

        for text in ["Zoë علی", "Pankha ZZQQ علی", "Total: ₹5.00", "Price (₹)"] {
            assert!(shown.contains(&glyph_bytes(text)), "{text:?} not drawn in full");
        }
    }

    #[test]
    fn coverage_reports_missing_glyphs() {
        let doc = PdfDocument::empty("cover");
        let fonts = load_fonts(&doc, None).unwrap();
        assert!(fonts.covers("₹"));
        assert!(fonts.covers("Rs."));
        assert!(!fonts.covers("\u{10FFFD}"));
    }

    #[test]
    fn unusable_custom_font_uses_bundled_one() {
        let doc = PdfDocument::empty("fonts");
        let fonts = load_fonts(&doc, Some(b"not a font".as_slice())).unwrap();
        assert!(fonts.covers("علی"));
        assert!(fonts.width_mm("Bulb", 10.0) > 0.0);
    }

    #[test]
    fn wrapping_splits_long_text() {
        let doc = PdfDocument::empty("wrap");
        let fonts = load_fonts(&doc, None).unwrap();
        let lines = wrap_text_by_width_mm(&fonts, "aaaa bbbb cccc dddd", 10.0, 20.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| fonts.width_mm(l, 10.0) <= 20.0));

        let split = wrap_text_by_width_mm(&fonts, &"x".repeat(200), 10.0, 20.0);
        assert!(split.len() > 1);
        assert_eq!(split.concat().len(), 200);

        assert_eq!(wrap_text_by_width_mm(&fonts, "", 10.0, 20.0), vec![String::new()]);
    }
}
