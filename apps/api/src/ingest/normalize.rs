/// Normalizes a header label or alias key to its canonical lookup form:
/// trimmed, lowercased, internal whitespace runs collapsed to a single
/// underscore, Spanish vowel diacritics folded to their base letter.
///
/// Exporters disagree on all of these at once (`"Impresiones"`,
/// `" impresiones "`, `"Impresión"`), so every column name is pushed through
/// here during decoding, and alias keys again at resolution time. Cell
/// values are never normalized, only trimmed, since their content is data.
pub fn normalize_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_separator = false;

    for ch in raw.trim().chars() {
        if ch.is_whitespace() {
            pending_separator = true;
            continue;
        }
        if pending_separator {
            out.push('_');
            pending_separator = false;
        }
        for lower in ch.to_lowercase() {
            out.push(fold_diacritic(lower));
        }
    }

    out
}

/// Folds the five Spanish vowel diacritic families. Everything else,
/// including `ñ`, passes through unchanged.
fn fold_diacritic(ch: char) -> char {
    match ch {
        'á' | 'à' | 'ä' => 'a',
        'é' | 'è' | 'ë' => 'e',
        'í' | 'ì' | 'ï' => 'i',
        'ó' | 'ò' | 'ö' => 'o',
        'ú' | 'ù' | 'ü' => 'u',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_whitespace_and_accents_converge() {
        assert_eq!(normalize_key(" Impresión "), "impresion");
        assert_eq!(normalize_key("impresion"), "impresion");
        assert_eq!(normalize_key("IMPRESIÓN"), "impresion");
    }

    #[test]
    fn test_whitespace_runs_collapse_to_one_underscore() {
        assert_eq!(normalize_key("Visitas del perfil"), "visitas_del_perfil");
        assert_eq!(normalize_key("Me  gusta"), "me_gusta");
        assert_eq!(normalize_key("dejar\tde  seguir"), "dejar_de_seguir");
    }

    #[test]
    fn test_all_five_diacritic_families_fold() {
        assert_eq!(normalize_key("áàä éèë íìï óòö úùü"), "aaa_eee_iii_ooo_uuu");
    }

    #[test]
    fn test_enye_is_preserved() {
        assert_eq!(normalize_key("Año"), "año");
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert_eq!(normalize_key(""), "");
        assert_eq!(normalize_key("   "), "");
    }

    #[test]
    fn test_already_normal_keys_are_stable() {
        assert_eq!(normalize_key("nuevos_seguidores"), "nuevos_seguidores");
    }
}
