#[cfg(test)]
mod tests {
    use slip_resolver::text_processing::{clean, normalize, parse, split_ocr_lines, LineParser, ParserConfig};

    #[test]
    fn test_parse_plain_name() {
        let line = parse("Crocin");
        assert_eq!(line.name, "Crocin");
        assert_eq!(line.potency, None);
        assert_eq!(line.quantity, "1");
    }

    #[test]
    fn test_parse_potency_and_quantity() {
        let line = parse("Paracetamol 500mg 10");
        assert_eq!(line.name, "Paracetamol");
        assert_eq!(line.potency.as_deref(), Some("500mg"));
        assert_eq!(line.quantity, "10");
    }

    #[test]
    fn test_parse_potency_with_space_and_percent() {
        let line = parse("Betadine 5 % 2");
        assert_eq!(line.potency.as_deref(), Some("5 %"));
        assert_eq!(line.name, "Betadine");
        assert_eq!(line.quantity, "2");

        let line = parse("Insulin 40 IU");
        assert_eq!(line.potency.as_deref(), Some("40 IU"));
        assert_eq!(line.quantity, "1");
    }

    #[test]
    fn test_unit_needs_word_boundary() {
        let line = parse("2 ginger");
        assert_eq!(line.potency, None);
        assert_eq!(line.name, "ginger");
    }

    #[test]
    fn test_digits_only_falls_back_to_full_text() {
        let line = parse("500");
        assert_eq!(line.name, "500");
        assert_eq!(line.quantity, "500");
    }

    #[test]
    fn test_quantity_is_always_digits() {
        for text in ["Dolo", "Dolo 650 3", "Pantocid 40mg", "Zyrtec 10mg 15", "x"] {
            let line = parse(text);
            assert!(!line.quantity.is_empty());
            assert!(line.quantity.chars().all(|c| c.is_ascii_digit()), "{}", text);
        }
    }

    #[test]
    fn test_normalizer_is_total() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("!!!"), "");
        assert_eq!(normalize("3) AZITHRAL 500"), "azithral 500");
        assert_eq!(clean("• Dolo-650, tab"), "Dolo650 tab");
    }

    #[test]
    fn test_parse_line_keeps_raw() {
        let parser = LineParser::new();
        let line = parser.parse_line("1. Crocin 2");
        assert_eq!(line.raw, "1. Crocin 2");
        assert_eq!(line.normalized, "Crocin 2");
        assert_eq!(line.name, "Crocin");
        assert_eq!(line.quantity, "2");
    }

    #[test]
    fn test_split_ocr_lines_drops_blanks() {
        let lines = split_ocr_lines("Crocin 2\n\n   \nDolo 650\r\n");
        assert_eq!(lines, vec!["Crocin 2", "Dolo 650"]);
    }

    #[test]
    fn test_custom_units() {
        let config = ParserConfig {
            potency_units: vec!["tab".to_string()],
            ..Default::default()
        };
        let parser = LineParser::with_config(config).unwrap();
        let line = parser.parse("Dolo 2 tab 5");
        assert_eq!(line.potency.as_deref(), Some("2 tab"));
        assert_eq!(line.quantity, "5");

        // "mg" is no longer a unit
        let line = parser.parse("Crocin 500mg");
        assert_eq!(line.potency, None);
        assert_eq!(line.quantity, "1");
    }

    #[test]
    fn test_invalid_units_rejected() {
        let config = ParserConfig {
            potency_units: vec![],
            ..Default::default()
        };
        assert!(LineParser::with_config(config).is_err());

        let config = ParserConfig {
            potency_units: vec!["m g".to_string()],
            ..Default::default()
        };
        assert!(LineParser::with_config(config).is_err());
    }
}
