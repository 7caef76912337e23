use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Grouping {
    /// 12,34,567.00
    #[default]
    Indian,
    /// 1,234,567.00
    Western,
}

/// Currency rendering for one hardcoded locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyFormat {
    pub symbol: String,
    /// Printed in the PDF when a custom font has no glyph for `symbol`.
    #[serde(default = "default_pdf_symbol")]
    pub pdf_symbol: String,
    #[serde(default)]
    pub grouping: Grouping,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

fn default_pdf_symbol() -> String {
    "Rs.".to_string()
}

fn default_decimals() -> u8 {
    2
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            symbol: "₹".to_string(),
            pdf_symbol: default_pdf_symbol(),
            grouping: Grouping::Indian,
            decimals: default_decimals(),
        }
    }
}

impl CurrencyFormat {
    pub fn with_symbol(&self, symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            ..self.clone()
        }
    }

    pub fn format(&self, v: f64) -> String {
        let v = if v.is_finite() { v } else { 0.0 };
        let s = format!("{:.*}", usize::from(self.decimals), v.abs());
        let (int_part, dec_part) = match s.split_once('.') {
            Some((i, d)) => (i, Some(d)),
            None => (s.as_str(), None),
        };

        // Values that round to zero never get a sign.
        let negative = v < 0.0 && s.bytes().any(|b| b.is_ascii_digit() && b != b'0');

        let mut out = String::with_capacity(s.len() + self.symbol.len() + 4);
        if negative {
            out.push('-');
        }
        out.push_str(&self.symbol);
        out.push_str(&group_digits(int_part, self.grouping));
        if let Some(dec) = dec_part {
            out.push('.');
            out.push_str(dec);
        }
        out
    }

    /// Reads back a value produced by [`CurrencyFormat::format`]. Separators and the
    /// symbol are ignored; anything else that is not part of a number fails.
    pub fn parse(&self, input: &str) -> Option<f64> {
        let trimmed = input.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(r) => (true, r.trim_start()),
            None => (false, trimmed),
        };
        let rest = rest
            .strip_prefix(self.symbol.as_str())
            .or_else(|| rest.strip_prefix(self.pdf_symbol.as_str()))
            .unwrap_or(rest);

        let digits: String = rest
            .chars()
            .filter(|c| *c != ',' && !c.is_whitespace())
            .collect();
        if digits.is_empty() {
            return None;
        }

        let value = digits.parse::<f64>().ok()?;
        Some(if negative { -value } else { value })
    }
}

fn group_digits(int_part: &str, grouping: Grouping) -> String {
    let chars: Vec<char> = int_part.chars().collect();
    let mut out = String::with_capacity(chars.len() + chars.len() / 2);
    let mut cnt = 0;
    let mut group = 3;
    for i in (0..chars.len()).rev() {
        if cnt == group {
            out.push(',');
            cnt = 0;
            if grouping == Grouping::Indian {
                group = 2;
            }
        }
        out.push(chars[i]);
        cnt += 1;
    }
    out.chars().rev().collect()
}
