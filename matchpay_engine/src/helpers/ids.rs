use rand::{distributions::Alphanumeric, Rng};

fn random_id(prefix: &str, len: usize) -> String {
    let suffix: String = rand::thread_rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect();
    format!("{prefix}{suffix}")
}

/// A fresh chat room identifier, assigned once when a match is created.
pub fn new_chat_room_id() -> String {
    random_id("room_", 12)
}

/// A receipt reference for a new gateway order.
pub fn new_receipt_id() -> String {
    random_id("rcpt_", 12)
}
