pub fn get() -> String {
    match std::env::var("FW_CONFIG_PATH") {
        Ok(path) => path,
        Err(_) => "config.yml".to_owned(),
    }
}
