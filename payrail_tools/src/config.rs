use log::*;
use mp_common::Secret;

#[derive(Debug, Clone, Default)]
pub struct PayrailConfig {
    pub base_url: String,
    pub key_id: String,
    pub key_secret: Secret<String>,
}

impl PayrailConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("MP_PAYRAIL_BASE_URL").unwrap_or_else(|_| {
            warn!("MP_PAYRAIL_BASE_URL not set, using the sandbox gateway as default");
            "https://sandbox.payrail.example".to_string()
        });
        let key_id = std::env::var("MP_PAYRAIL_KEY_ID").unwrap_or_else(|_| {
            warn!("MP_PAYRAIL_KEY_ID not set, using (probably useless) default");
            "key_test_000000000000".to_string()
        });
        let key_secret = Secret::new(std::env::var("MP_PAYRAIL_KEY_SECRET").unwrap_or_else(|_| {
            warn!("MP_PAYRAIL_KEY_SECRET not set, using (probably useless) default");
            "00000000000000".to_string()
        }));
        Self { base_url, key_id, key_secret }
    }
}
