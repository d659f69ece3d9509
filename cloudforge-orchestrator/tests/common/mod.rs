use base64::{engine::general_purpose, Engine as _};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn decode_user_data(payload: &str) -> String {
    String::from_utf8(general_purpose::STANDARD.decode(payload).unwrap()).unwrap()
}
