/*!
 * Unit tests for application configuration
 */

use decktrans::app_config::{Config, TranslationProvider};
use std::str::FromStr;

use crate::common;

#[test]
fn test_defaultConfig_shouldHaveSaneValues() {
    let config = Config::default();

    assert_eq!(config.source_language, "auto");
    assert_eq!(config.target_language, "ja");
    assert!(config.output_dir.is_none());
    assert_eq!(config.translation.provider, TranslationProvider::OpenAI);
    assert_eq!(config.translation.common.retry_count, 4);
    assert_eq!(config.translation.common.retry_backoff_ms, 1000);
    assert!(config.translation.common.system_prompt.contains("{target_language}"));
}

#[test]
fn test_defaultConfig_shouldRegisterBothProviders() {
    let config = Config::default();

    assert!(config.translation.get_provider_config(&TranslationProvider::OpenAI).is_some());
    assert!(config.translation.get_provider_config(&TranslationProvider::LMStudio).is_some());
}

#[test]
fn test_activeProviderGetters_shouldFollowSelectedProvider() {
    let mut config = Config::default();

    assert_eq!(config.translation.get_endpoint(), "https://api.openai.com/v1");
    assert_eq!(config.translation.get_model(), "gpt-4o");
    assert_eq!(config.translation.get_rate_limit(), Some(60));

    config.translation.provider = TranslationProvider::LMStudio;
    assert_eq!(config.translation.get_endpoint(), "http://localhost:1234/v1");
    assert_eq!(config.translation.get_model(), "local-model");
    assert_eq!(config.translation.get_rate_limit(), None);
}

#[test]
fn test_configRoundTrip_shouldSurviveSaveAndLoad() {
    let temp = common::create_temp_dir().unwrap();
    let path = temp.path().join("conf.json");

    let mut config = Config::default();
    config.target_language = "fr".to_string();
    config.translation.common.retry_count = 7;

    config.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.target_language, "fr");
    assert_eq!(loaded.translation.common.retry_count, 7);
    assert_eq!(loaded.translation.provider, TranslationProvider::OpenAI);
}

#[test]
fn test_loadConfig_shouldApplyDefaultsForMissingFields() {
    let temp = common::create_temp_dir().unwrap();
    let path = common::create_test_file(
        temp.path(),
        "conf.json",
        r#"{"target_language": "de", "translation": {}}"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();

    assert_eq!(config.target_language, "de");
    assert_eq!(config.source_language, "auto");
    assert_eq!(config.translation.common.rate_limit_delay_ms, 200);
}

#[test]
fn test_loadConfig_shouldRejectMalformedJson() {
    let temp = common::create_temp_dir().unwrap();
    let path = common::create_test_file(temp.path(), "conf.json", "{not json").unwrap();

    assert!(Config::from_file(&path).is_err());
}

#[test]
fn test_validate_shouldRequireApiKeyForOpenAI() {
    let config = Config::default();
    // Default OpenAI provider has no API key
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_shouldAcceptLmStudioWithoutApiKey() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::LMStudio;

    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_shouldRejectUnknownTargetLanguage() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::LMStudio;
    config.target_language = "zz".to_string();

    assert!(config.validate().is_err());
}

#[test]
fn test_validate_shouldAcceptAutoSourceLanguage() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::LMStudio;
    config.source_language = "auto".to_string();

    assert!(config.validate().is_ok());
}

#[test]
fn test_providerFromStr_shouldParseKnownNames() {
    assert_eq!(TranslationProvider::from_str("openai").unwrap(), TranslationProvider::OpenAI);
    assert_eq!(TranslationProvider::from_str("LMSTUDIO").unwrap(), TranslationProvider::LMStudio);
    assert!(TranslationProvider::from_str("anthropic").is_err());
}

#[test]
fn test_providerDisplay_shouldUseLowercaseIdentifier() {
    assert_eq!(TranslationProvider::OpenAI.to_string(), "openai");
    assert_eq!(TranslationProvider::LMStudio.display_name(), "LM Studio");
}
