use figment::Jail;
use nutri_config::{ConfigError, NutriConfig};

#[test]
fn env_sets_provider_key() {
    Jail::expect_with(|jail| {
        jail.set_env("NUTRI_PROVIDERS__USDA__API_KEY", "key-from-env");

        let config = NutriConfig::load().expect("config loads");
        assert_eq!(config.providers.usda.api_key, "key-from-env");
        Ok(())
    });
}

#[test]
fn env_sets_threshold() {
    Jail::expect_with(|jail| {
        jail.set_env("NUTRI_SCORING__VERIFIED_THRESHOLD", "0.9");

        let config = NutriConfig::load().expect("config loads");
        assert!((config.scoring.verified_threshold - 0.9).abs() < f64::EPSILON);
        Ok(())
    });
}

#[test]
fn invalid_env_value_fails_validation() {
    Jail::expect_with(|jail| {
        jail.set_env("NUTRI_PROVIDERS__TIMEOUT_SECS", "0");

        let err = NutriConfig::load().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref field, .. } if field == "providers.timeout_secs"
        ));
        Ok(())
    });
}

#[test]
fn unparseable_env_value_is_a_figment_error() {
    Jail::expect_with(|jail| {
        jail.set_env("NUTRI_CACHE__SEARCH_TTL_DAYS", "a-week");

        let err = NutriConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::Figment(_)));
        Ok(())
    });
}
