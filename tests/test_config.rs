use beacon::config::Config;

#[test]
fn test_config_default_values() {
    let cfg = Config::default();
    assert_eq!(cfg.listen_addr, "127.0.0.1:8080");
    assert_eq!(cfg.read_buffer_size, 4096);
    assert_eq!(cfg.max_headers, 32);
    assert_eq!(cfg.max_header_bytes, 16 * 1024);
}

#[test]
fn test_config_listen_env_override() {
    // When LISTEN env var is not set, should use default
    unsafe {
        std::env::remove_var("LISTEN");
    }
    let cfg = Config::load();
    assert_eq!(cfg.listen_addr, "127.0.0.1:8080");

    // When LISTEN env var is set, should use it
    unsafe {
        std::env::set_var("LISTEN", "0.0.0.0:3000");
    }
    let cfg = Config::load();
    assert_eq!(cfg.listen_addr, "0.0.0.0:3000");
    unsafe {
        std::env::remove_var("LISTEN");
    }
}

#[test]
fn test_config_from_yaml_file() {
    let path = std::env::temp_dir().join("beacon_test_config.yaml");
    std::fs::write(&path, "listen_addr: \"127.0.0.1:9999\"\nmax_headers: 8\n").unwrap();

    let cfg = Config::from_yaml_file(path.to_str().unwrap()).unwrap();
    assert_eq!(cfg.listen_addr, "127.0.0.1:9999");
    assert_eq!(cfg.max_headers, 8);
    // unspecified fields keep their defaults
    assert_eq!(cfg.read_buffer_size, 4096);
    assert_eq!(cfg.max_header_bytes, 16 * 1024);

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_config_from_missing_file_fails() {
    assert!(Config::from_yaml_file("/nonexistent/beacon.yaml").is_err());
}

#[test]
fn test_config_clone() {
    let cfg1 = Config::default();
    let cfg2 = cfg1.clone();
    assert_eq!(cfg1.listen_addr, cfg2.listen_addr);
    assert_eq!(cfg1.max_headers, cfg2.max_headers);
}
