pub mod probes;
pub mod request_id;
