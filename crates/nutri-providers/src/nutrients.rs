//! Best-effort numeric extraction from provider nutrient text.
//!
//! Providers report figures as plain numbers, as unit-mixed strings
//! (`"150kcal"`, `"< 0.5 g"`, `"1,5"`), or buried in free text
//! (`"Calories: 150, Protein 5g"`). Everything here is lenient: a figure
//! that cannot be read becomes `None`, never an error.

/// Kilojoules per kilocalorie.
pub const KJ_PER_KCAL: f64 = 4.184;

/// Extract the first number in `text`.
///
/// A comma followed by exactly three digits is a thousands separator
/// (`1,200`); any other comma followed by a digit is a decimal separator
/// (`1,5`).
#[must_use]
pub fn extract_number(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(u8::is_ascii_digit)?;
    // ".5" style leading decimals
    let start = if start > 0 && bytes[start - 1] == b'.' {
        start - 1
    } else {
        start
    };

    let mut number = String::new();
    let mut seen_decimal = false;
    let mut i = start;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_digit() {
            number.push(b as char);
        } else if b == b',' && !seen_decimal && is_thousands_group(bytes, i) {
            // grouping only, nothing to keep
        } else if (b == b'.' || b == b',')
            && !seen_decimal
            && bytes.get(i + 1).is_some_and(u8::is_ascii_digit)
        {
            seen_decimal = true;
            number.push('.');
        } else {
            break;
        }
        i += 1;
    }
    if number.starts_with('.') {
        number.insert(0, '0');
    }
    number.parse().ok()
}

/// Whether the comma at `comma` is followed by exactly three digits.
fn is_thousands_group(bytes: &[u8], comma: usize) -> bool {
    let group = bytes
        .get(comma + 1..comma + 4)
        .is_some_and(|g| g.iter().all(u8::is_ascii_digit));
    group && !bytes.get(comma + 4).is_some_and(u8::is_ascii_digit)
}

/// Split a serving description like `"170 g"` or `"1 cup (240 ml)"` into
/// amount and unit. The unit stops at a parenthesis or comma and is lowercased.
#[must_use]
pub fn parse_quantity(text: &str) -> Option<(f64, String)> {
    let amount = extract_number(text)?;
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let after = text[start..]
        .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ',')
        .trim_start();
    let unit = after
        .split(['(', ','])
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    Some((amount, unit))
}

/// Read a JSON value that may be a number or a unit-mixed string.
#[must_use]
pub fn value_as_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => extract_number(s),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// Round to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Normalize a provider nutrient name into a lowercase snake_case key.
///
/// `"Vitamin C, total ascorbic acid"` → `vitamin_c`, `"omega-3-fat"` →
/// `omega_3_fat`. Text after the first comma or parenthesis is dropped.
#[must_use]
pub fn micronutrient_key(name: &str) -> Option<String> {
    let head = name.split([',', '(']).next().unwrap_or_default();
    let mut key = String::with_capacity(head.len());
    for c in head.chars() {
        if c.is_ascii_alphanumeric() {
            key.push(c.to_ascii_lowercase());
        } else if !key.is_empty() && !key.ends_with('_') {
            key.push('_');
        }
    }
    let key = key.trim_end_matches('_').to_string();
    if key.is_empty() {
        return None;
    }
    if key.starts_with(|c: char| c.is_ascii_digit()) {
        return Some(format!("n_{key}"));
    }
    Some(key)
}

/// Figures pulled out of a free-text nutrition label.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LabeledNutrients {
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub sugar_g: Option<f64>,
    pub sodium_mg: Option<f64>,
}

impl LabeledNutrients {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.calories.is_none()
            && self.protein_g.is_none()
            && self.carbs_g.is_none()
            && self.fat_g.is_none()
            && self.fiber_g.is_none()
            && self.sugar_g.is_none()
            && self.sodium_mg.is_none()
    }
}

/// Parse label-style text such as `"Calories: 150, Total Fat 8g, Sodium 140mg"`.
#[must_use]
pub fn parse_labeled_nutrients(text: &str) -> LabeledNutrients {
    let lower = text.to_lowercase();
    let sodium = labeled_segment(&lower, &["sodium"]).and_then(|seg| {
        let value = extract_number(seg)?;
        let in_grams = !seg.contains("mg") && seg.contains('g');
        Some(if in_grams { round2(value * 1000.0) } else { value })
    });
    LabeledNutrients {
        calories: labeled_value(&lower, &["calories", "energy", "kcal"]),
        protein_g: labeled_value(&lower, &["protein"]),
        carbs_g: labeled_value(
            &lower,
            &["total carbohydrate", "carbohydrates", "carbohydrate", "carbs"],
        ),
        fat_g: labeled_value(&lower, &["total fat", "fat"]),
        fiber_g: labeled_value(&lower, &["dietary fiber", "fiber", "fibre"]),
        sugar_g: labeled_value(&lower, &["total sugars", "sugars", "sugar"]),
        sodium_mg: sodium,
    }
}

fn labeled_value(lower: &str, labels: &[&str]) -> Option<f64> {
    labeled_segment(lower, labels).and_then(extract_number)
}

/// Text between a label and the next separator, for the first label that
/// occurs as a standalone nutrient (not `saturated fat`, not `added sugars`).
fn labeled_segment<'a>(lower: &'a str, labels: &[&str]) -> Option<&'a str> {
    const QUALIFIERS: [&str; 4] = ["saturated", "trans", "added", "calories from"];

    for label in labels {
        for (idx, _) in lower.match_indices(label) {
            let before = lower[..idx].trim_end();
            if QUALIFIERS.iter().any(|q| before.ends_with(q)) {
                continue;
            }
            let rest = &lower[idx + label.len()..];
            // word boundary: "fat" must not match "fatty"
            if rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
                continue;
            }
            let end = [";", "\n", "|", ", "]
                .iter()
                .filter_map(|sep| rest.find(sep))
                .min()
                .unwrap_or(rest.len());
            let segment = &rest[..end];
            if segment.bytes().any(|b| b.is_ascii_digit()) {
                return Some(segment);
            }
        }
    }
    None
}
