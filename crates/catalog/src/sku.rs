//! SKU formatting: `W{CODE}{warehouse:03}-P{product:03}`.

/// Build a SKU from the warehouse and the product's position in it.
///
/// `CODE` is the first two characters of the warehouse name upper-cased, or
/// `XX` when the name is shorter than two characters.
pub fn generate_sku(warehouse_code: i64, warehouse_name: &str, product_number: u64) -> String {
    let mut chars = warehouse_name.chars();
    let prefix = match (chars.next(), chars.next()) {
        (Some(a), Some(b)) => format!("{a}{b}").to_uppercase(),
        _ => "XX".to_string(),
    };

    format!("W{prefix}{warehouse_code:03}-P{product_number:03}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn formats_code_and_sequence() {
        assert_eq!(generate_sku(1, "osaka central", 1), "WOS001-P001");
        assert_eq!(generate_sku(42, "Tokyo", 123), "WTO042-P123");
    }

    #[test]
    fn short_names_fall_back_to_xx() {
        assert_eq!(generate_sku(7, "A", 2), "WXX007-P002");
        assert_eq!(generate_sku(7, "", 2), "WXX007-P002");
    }

    #[test]
    fn wide_numbers_are_not_truncated() {
        assert_eq!(generate_sku(1234, "kobe", 1000), "WKO1234-P1000");
    }

    proptest! {
        #[test]
        fn sku_shape_holds(code in 0i64..1000, name in "[a-z]{2,12}", seq in 1u64..1000) {
            let sku = generate_sku(code, &name, seq);
            let prefix = format!("W{}", name[..2].to_uppercase());
            prop_assert!(sku.starts_with(&prefix));
            prop_assert_eq!(sku.len(), "WXX000-P000".len());
            let suffix = format!("-P{:03}", seq);
            prop_assert!(sku.ends_with(&suffix));
        }
    }
}
