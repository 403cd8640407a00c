//! Configuration layering and validation.

use parley_error::ParleyErrorKind;
use parley_server::{AuthMode, ParleyConfig};
use std::collections::HashMap;

fn no_env() -> Option<HashMap<String, String>> {
    Some(HashMap::new())
}

fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
    Some(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

#[test]
fn test_bundled_defaults() -> anyhow::Result<()> {
    let config = ParleyConfig::load_from(None, no_env())?;
    assert_eq!(config.server.channel_capacity, 64);
    assert_eq!(config.cache.default_ttl, 600);
    assert!(config.cache.enabled);
    assert_eq!(config.provider.default_model, "gpt-3.5-turbo");
    assert_eq!(config.provider.vision_model, "gpt-4-vision-preview");
    assert_eq!(config.auth.mode, AuthMode::Jwt);
    assert_eq!(config.auth.user_header, "x-user-id");
    assert!(config.database.url.is_none());
    assert_eq!(config.database.pool_size, 8);
    Ok(())
}

#[test]
fn test_config_file_overrides_defaults() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("custom.toml");
    std::fs::write(
        &path,
        r#"
[server]
bind_addr = "0.0.0.0:8080"

[cache]
default_ttl = 30

[auth]
mode = "header"
user_header = "x-forwarded-user"
"#,
    )?;

    let config = ParleyConfig::load_from(Some(&path), no_env())?;
    assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
    assert_eq!(config.server.channel_capacity, 64);
    assert_eq!(config.cache.default_ttl, 30);
    assert_eq!(config.cache.max_size, 1000);
    assert_eq!(config.auth.mode, AuthMode::Header);
    assert_eq!(config.auth.user_header, "x-forwarded-user");
    Ok(())
}

#[test]
fn test_environment_overrides_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[server]\nchannel_capacity = 16\n")?;

    let config = ParleyConfig::load_from(
        Some(&path),
        env(&[
            ("PARLEY_SERVER__CHANNEL_CAPACITY", "8"),
            ("PARLEY_CACHE__ENABLED", "false"),
            ("PARLEY_PROVIDER__DEFAULT_MODEL", "gpt-4o-mini"),
        ]),
    )?;
    assert_eq!(config.server.channel_capacity, 8);
    assert!(!config.cache.enabled);
    assert_eq!(config.provider.default_model, "gpt-4o-mini");
    Ok(())
}

#[test]
fn test_conventional_variables_win() -> anyhow::Result<()> {
    let config = ParleyConfig::load_from(
        None,
        env(&[("PARLEY_PROVIDER__DEFAULT_MODEL", "from-parley-env")]),
    )?
    .with_overrides_from(|key| match key {
        "OPENAI_API_KEY" => Some("sk-env".to_string()),
        "OPENAI_MODEL" => Some("gpt-4".to_string()),
        "DATABASE_URL" => Some("postgres://localhost/parley".to_string()),
        "AUTH_SECRET" => Some("s3cret".to_string()),
        _ => None,
    });

    assert_eq!(config.provider.api_key.as_deref(), Some("sk-env"));
    assert_eq!(config.provider.default_model, "gpt-4");
    assert_eq!(
        config.database.url.as_deref(),
        Some("postgres://localhost/parley")
    );
    assert_eq!(config.auth.jwt_secret.as_deref(), Some("s3cret"));
    assert!(config.validate().is_ok());
    Ok(())
}

#[test]
fn test_missing_explicit_file_is_error() {
    let err = ParleyConfig::load_from(
        Some(std::path::Path::new("/nonexistent/parley.toml")),
        no_env(),
    )
    .unwrap_err();
    assert!(matches!(err.kind(), ParleyErrorKind::Config(_)));
}

#[test]
fn test_validation() -> anyhow::Result<()> {
    let base = ParleyConfig::load_from(None, no_env())?;

    // Bundled defaults use jwt mode and ship no secret
    let err = base.validate().unwrap_err();
    match err.kind() {
        ParleyErrorKind::Config(e) => assert_eq!(e.setting.as_deref(), Some("auth.jwt_secret")),
        other => panic!("expected config error, got {:?}", other),
    }

    let mut header_mode = base.clone();
    header_mode.auth.mode = AuthMode::Header;
    assert!(header_mode.validate().is_ok());

    let mut zero_capacity = header_mode.clone();
    zero_capacity.server.channel_capacity = 0;
    assert_eq!(zero_capacity.validate().unwrap_err().status_code(), 500);

    let mut zero_cache = header_mode.clone();
    zero_cache.cache.max_size = 0;
    assert!(zero_cache.validate().is_err());
    zero_cache.cache.enabled = false;
    assert!(zero_cache.validate().is_ok());

    let mut blank_header = header_mode;
    blank_header.auth.user_header = " ".to_string();
    assert!(blank_header.validate().is_err());
    Ok(())
}
