//! Display helpers for prices and images.

/// Shown for items that have no image of their own.
pub const IMAGE_PLACEHOLDER: &str = "/placeholder.svg?height=150&width=150";

/// Render a price the way the menu shows it, e.g. `Rp 25.000`.
pub fn format_price(price: u64) -> String {
    let digits = price.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("Rp {grouped}")
}

pub fn image_or_placeholder(image: Option<&str>) -> &str {
    image.filter(|image| !image.is_empty()).unwrap_or(IMAGE_PLACEHOLDER)
}
