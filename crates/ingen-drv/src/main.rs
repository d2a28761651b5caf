use std::process::exit;

use ingen_drv::{Config, USAGE};

fn main() {
    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(error) => {
            println!("{error}");
            println!("{USAGE}");
            exit(1);
        }
    };
    exit(ingen_drv::run(&config));
}
