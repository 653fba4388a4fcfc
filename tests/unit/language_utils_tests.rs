/*!
 * Unit tests for ISO language code utilities
 */

use decktrans::language_utils::{get_language_name, language_codes_match, normalize_to_part2t};

#[test]
fn test_normalizeToPart2t_shouldHandleTwoLetterCodes() {
    assert_eq!(normalize_to_part2t("en").unwrap(), "eng");
    assert_eq!(normalize_to_part2t("ja").unwrap(), "jpn");
    assert_eq!(normalize_to_part2t("FR").unwrap(), "fra");
}

#[test]
fn test_normalizeToPart2t_shouldHandleThreeLetterCodes() {
    assert_eq!(normalize_to_part2t("eng").unwrap(), "eng");
    assert_eq!(normalize_to_part2t("jpn").unwrap(), "jpn");
}

#[test]
fn test_normalizeToPart2t_shouldMapBibliographicVariants() {
    assert_eq!(normalize_to_part2t("fre").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("ger").unwrap(), "deu");
    assert_eq!(normalize_to_part2t("chi").unwrap(), "zho");
}

#[test]
fn test_normalizeToPart2t_shouldRejectInvalidCodes() {
    assert!(normalize_to_part2t("").is_err());
    assert!(normalize_to_part2t("zz").is_err());
    assert!(normalize_to_part2t("notacode").is_err());
}

#[test]
fn test_languageCodesMatch_shouldMatchAcrossFormats() {
    assert!(language_codes_match("en", "eng"));
    assert!(language_codes_match("fre", "fra"));
    assert!(language_codes_match("de", "ger"));
    assert!(!language_codes_match("en", "fr"));
    assert!(!language_codes_match("en", "invalid"));
}

#[test]
fn test_getLanguageName_shouldResolveCodesAndNames() {
    assert_eq!(get_language_name("ja").unwrap(), "Japanese");
    assert_eq!(get_language_name("deu").unwrap(), "German");
    assert_eq!(get_language_name("Japanese").unwrap(), "Japanese");
    assert!(get_language_name("zz").is_err());
}
