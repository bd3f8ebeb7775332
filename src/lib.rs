#[macro_use]
extern crate rocket;

pub mod api;
pub mod common;
pub mod config;
pub mod database;
pub mod mail;
pub mod receipt;
pub mod setup;
pub mod table;
pub mod upload;
pub mod utils;

use log::warn;
use rocket::fs::{FileServer, Options};
use rocket::{Build, Rocket};

use api::generate_catchers;
use api::handlers::{
    generate_email_routes, generate_legacy_routes, generate_record_routes, generate_system_routes,
};
use config::AppConfig;
use database::Store;
use mail::Mailer;
use upload::UploadDir;

pub fn build_rocket(config: AppConfig, store: Store, mailer: Mailer) -> Rocket<Build> {
    let limit = config.upload_limit_bytes();
    let figment = rocket::Config::figment()
        .merge(("port", config.port))
        .merge(("address", config.address.clone()))
        .merge(("limits.file", limit))
        .merge(("limits.data-form", limit));

    let mut rocket = rocket::custom(figment)
        .manage(store)
        .manage(mailer)
        .manage(UploadDir::new(&config.upload_dir))
        .mount("/api", generate_record_routes())
        .mount("/api", generate_email_routes())
        .mount("/api", generate_system_routes())
        .mount("/", generate_legacy_routes())
        .mount(
            "/uploads",
            FileServer::new(&config.upload_dir, Options::Missing),
        )
        .register("/", generate_catchers());

    if config.static_dir.is_dir() {
        rocket = rocket.mount("/", FileServer::from(&config.static_dir));
    } else {
        warn!(
            "Static directory {} not found; UI is not served",
            config.static_dir.display()
        );
    }

    rocket.manage(config)
}
