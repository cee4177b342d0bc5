pub mod waha_client;
