use slack_mcp_server::AppError;

#[test]
fn display_prefixes_category() {
    assert_eq!(AppError::Config("x".into()).to_string(), "config: x");
    assert_eq!(AppError::Slack("not_in_channel".into()).to_string(), "slack: not_in_channel");
    assert_eq!(AppError::InvalidInput("x".into()).to_string(), "invalid input: x");
    assert_eq!(AppError::Disabled("x".into()).to_string(), "disabled: x");
    assert_eq!(AppError::Mcp("x".into()).to_string(), "mcp: x");
    assert_eq!(AppError::Io("x".into()).to_string(), "io: x");
    assert_eq!(AppError::Internal("x".into()).to_string(), "internal: x");
}

#[test]
fn detail_strips_prefix() {
    assert_eq!(AppError::Slack("ratelimited".into()).detail(), "ratelimited");
    assert_eq!(AppError::Disabled("off".into()).detail(), "off");
}

#[test]
fn toml_errors_become_config_errors() {
    let err: AppError = toml::from_str::<toml::Value>("= broken")
        .map_err(AppError::from)
        .unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn json_errors_become_slack_errors() {
    let err: AppError = serde_json::from_str::<serde_json::Value>("{")
        .map_err(AppError::from)
        .unwrap_err();
    assert!(matches!(err, AppError::Slack(_)));
    assert!(err.detail().starts_with("unexpected response shape"));
}
