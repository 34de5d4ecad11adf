use std::{env, error::Error, fs, path::Path};

use serde::Deserialize;

#[derive(Deserialize)]
struct RawConfig {
    ota_hostname: Option<String>,
    ota_port: Option<u16>,
    ota_tls: Option<bool>,
    tls_ca: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=cfg.toml");

    let toml_str = fs::read_to_string("cfg.toml").unwrap_or_default();
    let raw: RawConfig = toml::from_str(&toml_str)?;

    let out_dir = env::var("OUT_DIR")?;
    let dest_path = Path::new(&out_dir).join("config.rs");
    let code = format!(
        r"
        pub const CONFIG: Config = Config {{
            ota_hostname: {host:?},
            ota_port: {port:?},
            ota_tls: {tls:?},
            tls_ca: {ca:?},
        }};
    ",
        host = raw.ota_hostname,
        port = raw.ota_port,
        tls = raw.ota_tls.unwrap_or(true),
        ca = raw.tls_ca,
    );

    fs::write(dest_path, code)?;
    Ok(())
}
