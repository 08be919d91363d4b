pub mod notifier;
pub mod payrail;
