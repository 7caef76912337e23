use crate::invoice::Invoice;
use crate::profile::BusinessProfile;

const INVOICE_CSS: &str = "\
body { font-family: 'Helvetica', 'Arial', sans-serif; padding: 20px; color: #333; font-size: 12px; }
.header { text-align: center; margin-bottom: 20px; }
.header img { max-height: 64px; margin-bottom: 8px; }
h1 { font-size: 24px; color: #1a5f7a; margin: 0; }
.tagline { font-style: italic; color: #666; margin-top: 5px; font-size: 10px; }
.info { margin-bottom: 20px; display: flex; justify-content: space-between; }
.info-section { flex: 1; }
.info-section:last-child { text-align: right; }
table { width: 100%; border-collapse: collapse; margin-top: 10px; }
th, td { border: 1px solid #ddd; padding: 6px; text-align: left; }
th { background-color: #f2f2f2; font-weight: bold; }
.total { font-size: 14px; font-weight: bold; margin-top: 10px; text-align: right; }
.footer { margin-top: 20px; text-align: center; font-size: 10px; color: #666; }
";

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn push_info_row(html: &mut String, label: &str, value: &str) {
    if value.trim().is_empty() {
        return;
    }
    html.push_str(&format!(
        "<p><strong>{}:</strong> {}</p>",
        escape_html(label),
        escape_html(value)
    ));
}

/// Printable markup for `invoice`, shown in the webview preview.
pub fn render_html(invoice: &Invoice, profile: &BusinessProfile) -> String {
    let money = &profile.currency;
    let sym = escape_html(&money.symbol);

    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\"/>");
    html.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0, maximum-scale=1.0, minimum-scale=1.0, user-scalable=no\"/>",
    );
    html.push_str(&format!(
        "<title>{}</title><style>{}</style></head><body>",
        escape_html(invoice.invoice_number.as_str()),
        INVOICE_CSS
    ));

    html.push_str("<div class=\"header\">");
    if let Some(logo) = profile.logo_data_url.as_deref().map(str::trim).filter(|s| s.starts_with("data:image/")) {
        html.push_str(&format!("<img src=\"{}\" alt=\"\"/>", escape_html(logo)));
    }
    html.push_str(&format!("<h1>{}</h1>", escape_html(&profile.business_name)));
    if !profile.tagline.trim().is_empty() {
        html.push_str(&format!("<p class=\"tagline\">{}</p>", escape_html(&profile.tagline)));
    }
    html.push_str("</div>");

    html.push_str("<div class=\"info\"><div class=\"info-section\">");
    push_info_row(&mut html, "Proprietor", &profile.proprietor);
    push_info_row(&mut html, "Phone", &profile.phone);
    push_info_row(&mut html, "Address", &profile.address);
    html.push_str("</div><div class=\"info-section\">");
    push_info_row(&mut html, "Invoice Date", &invoice.date_label());
    push_info_row(&mut html, "Customer", &invoice.customer_name);
    push_info_row(&mut html, "Invoice #", invoice.invoice_number.as_str());
    html.push_str("</div></div>");

    html.push_str(&format!(
        "<table><thead><tr><th>S.No</th><th>Item</th><th>Quantity</th><th>Price ({sym})</th><th>Total ({sym})</th></tr></thead><tbody>"
    ));
    for li in &invoice.line_items {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            li.serial_number,
            escape_html(&li.name),
            escape_html(&li.quantity),
            escape_html(&money.format(li.unit_price)),
            escape_html(&money.format(li.line_total)),
        ));
    }
    html.push_str("</tbody></table>");

    html.push_str(&format!(
        "<p class=\"total\">Total: {}</p>",
        escape_html(&money.format(invoice.grand_total))
    ));

    if !profile.footer_lines.is_empty() {
        html.push_str("<div class=\"footer\">");
        for line in &profile.footer_lines {
            html.push_str(&format!("<p>{}</p>", escape_html(line)));
        }
        html.push_str("</div>");
    }

    html.push_str("</body></html>");
    html
}
