use super::{load_settings_from, Settings};

use std::{
    fs,
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn defaults_bind_to_local_port_8000() {
    let settings = load_settings_from(Path::new("definitely-missing-server.toml"), no_env);
    assert_eq!(settings, Settings::default());
    assert_eq!(
        settings.bind_addr().expect("addr").to_string(),
        "127.0.0.1:8000"
    );
}

#[test]
fn file_then_env_override_bind_address() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = std::env::temp_dir().join(format!("order_server_config_test_{suffix}.toml"));
    fs::write(&path, "bind_addr = \"0.0.0.0:9100\"\n").expect("write config");

    assert_eq!(load_settings_from(&path, no_env).server_bind, "0.0.0.0:9100");

    let settings = load_settings_from(&path, |key| match key {
        "SERVER_BIND" => Some("127.0.0.1:9200".to_string()),
        "APP__BIND_ADDR" => Some("127.0.0.1:9300".to_string()),
        _ => None,
    });
    assert_eq!(settings.server_bind, "127.0.0.1:9300");

    fs::remove_file(path).expect("cleanup");
}

#[test]
fn rejects_unparseable_bind_address() {
    let settings = Settings {
        server_bind: "localhost-ish".into(),
    };
    assert!(settings.bind_addr().is_err());
}
