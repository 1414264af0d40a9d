use installm_core::config::{ChatMode, Settings};
use installm_core::*;
use tempfile::TempDir;

// ========================================================================
// Settings Tests (config/mod.rs)
// ========================================================================

#[test]
fn test_settings_default_values() {
    let settings = Settings::default();

    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(settings.server.port, 7860);
    assert_eq!(settings.models.dir, std::path::PathBuf::from("models"));

    assert_eq!(settings.inference.max_tokens, 2000);
    assert!(settings.inference.temperature > 0.0);

    assert_eq!(settings.chat.mode, ChatMode::MultiTurn);
    assert_eq!(settings.chat.max_turns, 100);
    assert!(!settings.chat.system_prompt.is_empty());

    assert_eq!(settings.bitnet.python_path, "python3");
    assert_eq!(settings.bitnet.threads, 4);
    assert_eq!(settings.bitnet.ctx_size, 2048);
    assert!(settings.bitnet.timeout_secs.is_none());
}

#[test]
fn test_settings_load_from_missing_file_returns_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let settings = Settings::load_from(&temp_dir.path().join("absent.toml"));

    assert_eq!(settings.server.port, 7860);
    assert_eq!(settings.chat.mode, ChatMode::MultiTurn);
}

#[test]
fn test_settings_partial_toml_keeps_other_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        r#"
[server]
port = 9000

[chat]
mode = "single_turn"

[bitnet]
threads = 8
timeout_secs = 30
"#,
    )
    .unwrap();

    let settings = Settings::load_from(&config_path);

    assert_eq!(settings.server.port, 9000);
    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(settings.chat.mode, ChatMode::SingleTurn);
    assert_eq!(settings.chat.max_turns, 100);
    assert_eq!(settings.bitnet.threads, 8);
    assert_eq!(settings.bitnet.timeout_secs, Some(30));
    assert_eq!(settings.inference.max_tokens, 2000);
}

#[test]
fn test_settings_invalid_toml_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "[server\nport = ").unwrap();

    let settings = Settings::load_from(&config_path);
    assert_eq!(settings.server.port, 7860);
}

#[test]
fn test_settings_save_and_reload() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let mut settings = Settings::default();
    settings.models.dir = "/srv/models".into();
    settings.inference.max_tokens = 256;
    settings.chat.system_prompt = "Answer in French.".to_string();
    settings.save_to(&config_path).unwrap();

    let loaded = Settings::load_from(&config_path);
    assert_eq!(loaded.models.dir, std::path::PathBuf::from("/srv/models"));
    assert_eq!(loaded.inference.max_tokens, 256);
    assert_eq!(loaded.chat.system_prompt, "Answer in French.");
}

#[test]
fn test_settings_bind_addr() {
    let mut settings = Settings::default();
    settings.server.host = "127.0.0.1".to_string();
    settings.server.port = 8080;
    assert_eq!(settings.bind_addr(), "127.0.0.1:8080");
}

// ========================================================================
// ModelRegistry Tests (registry.rs)
// ========================================================================

#[test]
fn test_scan_empty_directory_returns_empty_list() {
    let temp_dir = TempDir::new().unwrap();
    let mut registry = ModelRegistry::new(temp_dir.path());

    assert!(registry.scan().is_empty());
    assert!(registry.default_selection().is_none());
}

#[test]
fn test_scan_creates_missing_directory() {
    let temp_dir = TempDir::new().unwrap();
    let models_dir = temp_dir.path().join("models");
    let mut registry = ModelRegistry::new(&models_dir);

    assert!(registry.scan().is_empty());
    assert!(models_dir.is_dir());
}

#[test]
fn test_scan_classifies_and_sorts_model_files() {
    let temp_dir = TempDir::new().unwrap();
    for name in [
        "zephyr-7b.Q4_K_M.gguf",
        "ggml-model-i2_s-BitNet.gguf",
        "alpha.GGUF",
        "notes.txt",
        "tokenizer.json",
    ] {
        std::fs::write(temp_dir.path().join(name), b"").unwrap();
    }
    std::fs::create_dir(temp_dir.path().join("folder.gguf")).unwrap();

    let mut registry = ModelRegistry::new(temp_dir.path());
    let entries = registry.scan();

    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["alpha.GGUF", "ggml-model-i2_s-BitNet.gguf", "zephyr-7b.Q4_K_M.gguf"]
    );
    assert_eq!(entries[0].kind, ModelKind::Standard);
    assert_eq!(entries[1].kind, ModelKind::AlternateBackend);
    assert_eq!(entries[2].kind, ModelKind::Standard);
    assert_eq!(entries[1].path, temp_dir.path().join("ggml-model-i2_s-BitNet.gguf"));
    assert_eq!(registry.default_selection(), Some("alpha.GGUF"));
}

#[test]
fn test_rescan_replaces_previous_list() {
    let temp_dir = TempDir::new().unwrap();
    let first = temp_dir.path().join("first.gguf");
    std::fs::write(&first, b"").unwrap();

    let mut registry = ModelRegistry::new(temp_dir.path());
    assert_eq!(registry.scan().len(), 1);

    std::fs::remove_file(&first).unwrap();
    std::fs::write(temp_dir.path().join("second.gguf"), b"").unwrap();
    registry.scan();

    assert_eq!(registry.names(), vec!["second.gguf".to_string()]);
    assert!(registry.get("first.gguf").is_none());
    assert!(registry.get("second.gguf").is_some());
}

// ========================================================================
// ConversationHistory Tests (context/history.rs)
// ========================================================================

#[test]
fn test_conversation_history_keeps_order() {
    let mut history = ConversationHistory::new();

    history.add_user_turn("Hello");
    history.add_assistant_turn("Hi there!");
    history.add_user_turn("How are you?");

    let turns = history.to_vec();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[0].text, "Hello");
    assert_eq!(turns[1].role, Role::Assistant);
    assert_eq!(turns[2].text, "How are you?");
    assert_eq!(history.last_turn().unwrap().text, "How are you?");
}

#[test]
fn test_conversation_history_cap_drops_oldest() {
    let mut history = ConversationHistory::new().with_max_turns(2);

    history.add_user_turn("one");
    history.add_assistant_turn("two");
    history.add_user_turn("three");

    let texts: Vec<String> = history.turns().map(|t| t.text.clone()).collect();
    assert_eq!(texts, vec!["three"]);
}

#[test]
fn test_conversation_history_odd_cap_keeps_whole_exchanges() {
    let mut history = ConversationHistory::new().with_max_turns(3);

    for i in 0..4 {
        history.add_user_turn(format!("q{i}"));
        history.add_assistant_turn(format!("a{i}"));
        assert_eq!(history.to_vec()[0].role, Role::User);
        assert!(history.len() <= 3);
    }

    let texts: Vec<String> = history.turns().map(|t| t.text.clone()).collect();
    assert_eq!(texts, vec!["q3", "a3"]);
}

#[test]
fn test_conversation_history_zero_cap_is_unbounded() {
    let mut history = ConversationHistory::new().with_max_turns(0);
    for i in 0..250 {
        history.add_user_turn(format!("turn {i}"));
    }
    assert_eq!(history.len(), 250);

    history.clear();
    assert!(history.is_empty());
}

#[test]
fn test_turn_serializes_lowercase_role() {
    let turn = Turn::assistant("ok");
    let json = serde_json::to_value(&turn).unwrap();
    assert_eq!(json["role"], "assistant");
    assert_eq!(json["text"], "ok");
    assert!(json["timestamp"].is_string());
}
