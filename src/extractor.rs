use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use scraper::{Html, Selector};
use std::str::FromStr;

/// Site-specific markup patterns for major e-commerce sites, tried in a
/// fixed priority order. Ordering is load-bearing: later, noisier
/// selectors can shadow correct earlier matches if reordered.
const SITE_SELECTORS: &[&str] = &[
    // Flipkart
    "._30jeq3._16Jk6d",
    "._1vC4OE._3qQ9m1",
    r#"[data-id="price"]"#,
    // Amazon
    ".a-price-whole",
    ".a-price .a-offscreen",
    "#priceblock_ourprice",
    "#priceblock_dealprice",
];

/// Last-resort generic patterns, tried only after every site-specific
/// selector has failed.
const GENERIC_SELECTORS: &[&str] = &[
    ".price",
    r#"[class*="price"]"#,
    "[data-price]",
    ".product-price",
    ".current-price",
];

const STRUCTURED_DATA_SELECTOR: &str = r#"script[type="application/ld+json"]"#;

/// Layered price extraction over raw page content.
///
/// Strategies run in strict priority order with short-circuit on the
/// first accepted value: embedded JSON-LD product offers, then
/// site-specific selectors, then generic ones. A candidate is accepted
/// only if it parses to a finite number strictly greater than zero;
/// anything else is treated as the selector not matching.
pub struct PriceExtractor {
    structured_data: Selector,
    site_selectors: Vec<Selector>,
    generic_selectors: Vec<Selector>,
    currency_clean: Regex,
}

impl Default for PriceExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceExtractor {
    pub fn new() -> Self {
        // Selector lists are compile-time constants; parse failures here
        // are programming errors, not runtime conditions.
        let parse_all = |list: &[&str]| {
            list.iter()
                .map(|s| Selector::parse(s).unwrap())
                .collect::<Vec<_>>()
        };

        Self {
            structured_data: Selector::parse(STRUCTURED_DATA_SELECTOR).unwrap(),
            site_selectors: parse_all(SITE_SELECTORS),
            generic_selectors: parse_all(GENERIC_SELECTORS),
            currency_clean: Regex::new(r"[₹$€£¥,\s]").unwrap(),
        }
    }

    /// Best-effort price for a page, or `None` when no strategy yields
    /// an accepted value.
    pub fn extract(&self, content: &str) -> Option<f64> {
        let document = Html::parse_document(content);

        let strategies: [&dyn Fn(&Html) -> Option<f64>; 3] = [
            &|doc| self.from_structured_data(doc),
            &|doc| self.from_selectors(doc, &self.site_selectors),
            &|doc| self.from_selectors(doc, &self.generic_selectors),
        ];

        strategies.iter().find_map(|strategy| strategy(&document))
    }

    /// Scan all JSON-LD blocks for a product offer price. The first
    /// block whose offer price parses to an accepted value wins;
    /// malformed blocks are skipped, not fatal.
    fn from_structured_data(&self, document: &Html) -> Option<f64> {
        document
            .select(&self.structured_data)
            .filter_map(|el| {
                let raw = el.text().collect::<String>();
                serde_json::from_str::<serde_json::Value>(&raw).ok()
            })
            .find_map(|json| Self::offer_price(&json).filter(|p| accept(*p)))
    }

    fn offer_price(json: &serde_json::Value) -> Option<f64> {
        let price = json.get("offers")?.get("price")?;
        match price {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Try each selector in order, taking the first matching element's
    /// text. An element whose text does not parse to an accepted value
    /// counts as no match and the loop moves on.
    fn from_selectors(&self, document: &Html, selectors: &[Selector]) -> Option<f64> {
        selectors.iter().find_map(|selector| {
            let element = document.select(selector).next()?;
            let text = element.text().collect::<String>();
            self.parse_price_text(&text).filter(|p| accept(*p))
        })
    }

    /// Strip currency symbols, thousands separators and whitespace,
    /// then parse the remainder as a decimal number.
    fn parse_price_text(&self, text: &str) -> Option<f64> {
        let cleaned = self.currency_clean.replace_all(text.trim(), "");
        if cleaned.is_empty() {
            return None;
        }
        Decimal::from_str(&cleaned).ok().and_then(|d| d.to_f64())
    }
}

/// Zero, negative, NaN and infinite candidates are all rejected.
fn accept(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> PriceExtractor {
        PriceExtractor::new()
    }

    fn page(body: &str) -> String {
        format!("<html><head></head><body>{}</body></html>", body)
    }

    #[test]
    fn test_structured_data_number_price() {
        let html = page(
            r#"<script type="application/ld+json">
            {"@type": "Product", "offers": {"price": 1499.0, "priceCurrency": "INR"}}
            </script>"#,
        );
        assert_eq!(extractor().extract(&html), Some(1499.0));
    }

    #[test]
    fn test_structured_data_string_price() {
        let html = page(
            r#"<script type="application/ld+json">
            {"offers": {"price": "249.99"}}
            </script>"#,
        );
        assert_eq!(extractor().extract(&html), Some(249.99));
    }

    #[test]
    fn test_structured_data_wins_over_selectors() {
        // Both sources present with different values: the structured
        // value must win regardless of document order.
        let html = page(
            r#"<div class="price">999</div>
            <script type="application/ld+json">{"offers": {"price": "750"}}</script>"#,
        );
        assert_eq!(extractor().extract(&html), Some(750.0));
    }

    #[test]
    fn test_first_structured_block_wins() {
        let html = page(
            r#"<script type="application/ld+json">{"offers": {"price": "100"}}</script>
            <script type="application/ld+json">{"offers": {"price": "200"}}</script>"#,
        );
        assert_eq!(extractor().extract(&html), Some(100.0));
    }

    #[test]
    fn test_malformed_structured_block_skipped() {
        let html = page(
            r#"<script type="application/ld+json">{not valid json</script>
            <script type="application/ld+json">{"offers": {"price": "42.50"}}</script>"#,
        );
        assert_eq!(extractor().extract(&html), Some(42.50));
    }

    #[test]
    fn test_structured_zero_falls_through_to_selectors() {
        let html = page(
            r#"<script type="application/ld+json">{"offers": {"price": 0}}</script>
            <div class="price">$15.00</div>"#,
        );
        assert_eq!(extractor().extract(&html), Some(15.0));
    }

    #[test]
    fn test_flipkart_selector() {
        let html = page(r#"<div class="_30jeq3 _16Jk6d">₹1,24,999</div>"#);
        assert_eq!(extractor().extract(&html), Some(124999.0));
    }

    #[test]
    fn test_amazon_price_whole() {
        let html = page(r#"<span class="a-price-whole">1,299</span>"#);
        assert_eq!(extractor().extract(&html), Some(1299.0));
    }

    #[test]
    fn test_amazon_offscreen() {
        let html = page(
            r#"<span class="a-price"><span class="a-offscreen">$34.95</span></span>"#,
        );
        assert_eq!(extractor().extract(&html), Some(34.95));
    }

    #[test]
    fn test_site_selector_beats_generic() {
        let html = page(
            r#"<div class="price">500</div>
            <span id="priceblock_ourprice">$450.00</span>"#,
        );
        assert_eq!(extractor().extract(&html), Some(450.0));
    }

    #[test]
    fn test_generic_class_contains_price() {
        let html = page(r#"<span class="sale-price-large">€89,99</span>"#);
        // Comma is treated as a thousands separator, matching the
        // source heuristic's behavior on continental formats.
        assert_eq!(extractor().extract(&html), Some(8999.0));
    }

    #[test]
    fn test_unparsable_first_match_moves_to_next_selector() {
        // `.price` and `[class*="price"]` both land on the text-only
        // element; `.product-price` further down the chain holds the
        // actual number.
        let html = page(
            r#"<div class="price">Contact us</div>
            <div class="product-price">$20</div>"#,
        );
        assert_eq!(extractor().extract(&html), Some(20.0));
    }

    #[test]
    fn test_zero_price_rejected() {
        let html = page(r#"<div class="price">₹0</div>"#);
        assert_eq!(extractor().extract(&html), None);
    }

    #[test]
    fn test_negative_price_rejected() {
        let html = page(r#"<div class="price">-5.00</div>"#);
        assert_eq!(extractor().extract(&html), None);
    }

    #[test]
    fn test_not_available_rejected() {
        let html = page(r#"<div class="price">N/A</div>"#);
        assert_eq!(extractor().extract(&html), None);
    }

    #[test]
    fn test_no_price_anywhere() {
        let html = page("<p>Just an article with no commerce markup.</p>");
        assert_eq!(extractor().extract(&html), None);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let html = page(
            r#"<div class="price">$19.99</div>
            <script type="application/ld+json">{"offers": {"price": "18.50"}}</script>"#,
        );
        let ex = extractor();
        let first = ex.extract(&html);
        for _ in 0..5 {
            assert_eq!(ex.extract(&html), first);
        }
        assert_eq!(first, Some(18.50));
    }

    #[test]
    fn test_parse_price_text_strips_symbols() {
        let ex = extractor();
        assert_eq!(ex.parse_price_text("₹1,299.00"), Some(1299.0));
        assert_eq!(ex.parse_price_text("$ 45.50"), Some(45.50));
        assert_eq!(ex.parse_price_text("£999"), Some(999.0));
        assert_eq!(ex.parse_price_text(""), None);
        assert_eq!(ex.parse_price_text("free"), None);
    }
}
