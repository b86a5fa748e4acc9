use crate::config::{AppConfig, DEFAULT_CONFIG, config_path};

pub fn run(config: &AppConfig) {
    let created = match config_path() {
        Some(path) if path.exists() => {
            println!("# Config file: {}", path.display());
            true
        }
        Some(path) => {
            println!("# Config file: {} (not created yet)", path.display());
            false
        }
        None => {
            println!("# Could not determine config directory");
            false
        }
    };
    println!();
    print!("{}", config.to_contents());

    if !created {
        println!();
        println!("# Template:");
        print!("{}", DEFAULT_CONFIG);
    }
}
