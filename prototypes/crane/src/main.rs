use std::path::Path;

use crane::config::{self, Config, CONFIG_PATH};
use macroquad::{miniquad::date, rand::srand, window::Conf};

fn window_conf() -> Conf {
    config::window_conf(&Config::load(Path::new(CONFIG_PATH)))
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    srand(date::now().to_bits());

    let config = Config::load(Path::new(CONFIG_PATH));
    if let Err(err) = crane::run(config).await {
        log::error!("{err}");
        std::process::exit(1);
    }
}
