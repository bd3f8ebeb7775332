/// Longest client file extension kept on a stored upload.
pub const MAX_EXTENSION_LEN: usize = 8;

pub const ASSOCIATION_NAME: &str = "New Market Traders Association";

pub const ASSOCIATION_ADDRESS: &str = "Pakyong, Sikkim - 737106";

pub const PAYMENT_METHOD: &str = "Online / UPI";

pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

pub const GMAIL_SEND_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";
