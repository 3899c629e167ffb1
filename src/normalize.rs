// 🔤 Text Normalization - accent/case/punctuation independent comparison
//
// "¡Golpe en la PUERTA-delantera!" → "golpe en la puerta delantera"

use unicode_normalization::UnicodeNormalization;

/// Longest code produced by `generate_code`
pub const MAX_CODE_LEN: usize = 20;

/// Combining Diacritical Marks block (U+0300..=U+036F)
fn is_diacritic(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

/// Canonicalize a string for matching
///
/// - Lowercase
/// - NFD decomposition, diacritics dropped ("á" → "a", "ñ" → "n")
/// - Everything outside `[a-z0-9]` becomes a token boundary
/// - Whitespace collapsed and trimmed
pub fn normalize(s: &str) -> String {
    let folded: String = s
        .to_lowercase()
        .nfd()
        .filter(|c| !is_diacritic(*c))
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { ' ' })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Derive a catalog code from a display name
///
/// Example: "Puerta Delantera Izq." → "PUERTA_DELANTERA_IZQ"
pub fn generate_code(name: &str) -> String {
    name.to_uppercase()
        .nfd()
        .filter(|c| !is_diacritic(*c))
        .map(|c| if c.is_ascii_uppercase() || c.is_ascii_digit() { c } else { '_' })
        .take(MAX_CODE_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_strips_accents_and_case() {
        assert_eq!(normalize("Pérdida"), "perdida");
        assert_eq!(normalize("PERDIDA"), "perdida");
        assert_eq!(normalize("perdida"), "perdida");
        assert_eq!(normalize("Rayón"), "rayon");
        assert_eq!(normalize("Pequeño"), "pequeno");
    }

    #[test]
    fn test_normalize_punctuation_becomes_boundary() {
        assert_eq!(
            normalize("¡Golpe en la PUERTA-delantera!"),
            "golpe en la puerta delantera"
        );
        assert_eq!(normalize("faro,izq."), "faro izq");
        assert_eq!(normalize("  rueda\t\n pinchada  "), "rueda pinchada");
    }

    #[test]
    fn test_normalize_empty_and_blank() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("¿?!"), "");
    }

    #[test]
    fn test_normalize_keeps_digits() {
        assert_eq!(normalize("Rueda #2 (R16)"), "rueda 2 r16");
    }

    #[test]
    fn test_generate_code() {
        assert_eq!(generate_code("Parabrisas"), "PARABRISAS");
        assert_eq!(generate_code("Puerta Delantera Izq."), "PUERTA_DELANTERA_IZQ");
        assert_eq!(generate_code("Rayón"), "RAYON");
        assert_eq!(generate_code(""), "");
    }

    #[test]
    fn test_generate_code_truncates() {
        let code = generate_code("Espejo retrovisor exterior derecho");
        assert_eq!(code.chars().count(), MAX_CODE_LEN);
        assert_eq!(code, "ESPEJO_RETROVISOR_EX");
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in "\\PC*") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn normalize_output_is_ascii_tokens(s in "\\PC*") {
            let out = normalize(&s);
            prop_assert!(out.chars().all(|c| c == ' ' || c.is_ascii_lowercase() || c.is_ascii_digit()));
            prop_assert!(!out.starts_with(' ') && !out.ends_with(' '));
            prop_assert!(!out.contains("  "));
        }
    }
}
