/*!
 * Language code handling tests.
 */

use lexisub::language_utils::{
    get_language_name, language_codes_match, normalize_to_part1_or_part2t, validate_language_code,
};

#[test]
fn test_validateLanguageCode_supportedFilterLanguages_shouldAccept() {
    for code in ["de", "en", "es"] {
        assert!(validate_language_code(code).is_ok(), "{} should be valid", code);
    }
}

#[test]
fn test_validateLanguageCode_whitespaceAndCase_shouldNormalize() {
    assert!(validate_language_code(" DE ").is_ok());
    assert!(validate_language_code("Deu").is_ok());
}

#[test]
fn test_normalize_threeLetterWithTwoLetterEquivalent_shouldPreferPart1() {
    assert_eq!(normalize_to_part1_or_part2t("deu").unwrap(), "de");
    assert_eq!(normalize_to_part1_or_part2t("spa").unwrap(), "es");
}

#[test]
fn test_languageCodesMatch_sameLanguage_shouldBeTrueAcrossSpellings() {
    assert!(language_codes_match("de", "ger"));
    assert!(language_codes_match("es", "spa"));
    assert!(!language_codes_match("es", "pt"));
}

#[test]
fn test_getLanguageName_invalidCode_shouldError() {
    assert!(get_language_name("zz").is_err());
}
