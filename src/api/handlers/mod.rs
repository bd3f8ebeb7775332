use rocket::Route;

pub mod email;
pub mod records;
pub mod system;

pub fn generate_record_routes() -> Vec<Route> {
    routes![
        records::list_records,
        records::get_record,
        records::create_record,
        records::update_record,
        records::delete_record
    ]
}

pub fn generate_email_routes() -> Vec<Route> {
    routes![email::send_email, email::test_email]
}

/// Paths bookmarked from the old server, served outside `/api`.
pub fn generate_legacy_routes() -> Vec<Route> {
    routes![email::test_email]
}

pub fn generate_system_routes() -> Vec<Route> {
    routes![
        system::next_number,
        system::email_receipt,
        system::sync_from_json
    ]
}
