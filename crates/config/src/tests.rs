use super::*;
use serial_test::serial;

fn clear_all() {
    for key in [
        "STORAGE_FILE",
        "WAL_FILE",
        "CACHE_SIZE",
        "REPLICAS",
        "KV_FLUSH_KB",
        "KV_WAL_SYNC",
        "KV_L0_TRIGGER",
        "BIND_ADDR",
    ] {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn defaults_match_spec() {
    clear_all();
    let cfg = Config::from_env();
    assert_eq!(cfg.storage_dir, "/data/kvstore.db");
    assert_eq!(cfg.wal_file, "/data/kvstore.wal");
    assert_eq!(cfg.cache_size, 1000);
    assert!(cfg.replicas.is_empty());
}

#[test]
#[serial]
fn replicas_are_trimmed_and_emptied() {
    clear_all();
    env::set_var("REPLICAS", " host-a:9000, host-b:9001 ,,");
    let cfg = Config::from_env();
    assert_eq!(cfg.replicas, vec!["host-a:9000", "host-b:9001"]);
    clear_all();
}

#[test]
#[serial]
fn empty_replicas_parses_to_empty_vec() {
    clear_all();
    env::set_var("REPLICAS", "");
    let cfg = Config::from_env();
    assert!(cfg.replicas.is_empty());
    clear_all();
}

#[test]
#[serial]
fn cache_size_overrides_default() {
    clear_all();
    env::set_var("CACHE_SIZE", "42");
    let cfg = Config::from_env();
    assert_eq!(cfg.cache_size, 42);
    clear_all();
}

#[test]
#[serial]
fn unparsable_cache_size_falls_back_to_default() {
    clear_all();
    env::set_var("CACHE_SIZE", "not-a-number");
    let cfg = Config::from_env();
    assert_eq!(cfg.cache_size, cache::DEFAULT_CAPACITY);
    clear_all();
}
