mod ids;
pub mod payment_signature;

pub use ids::{new_chat_room_id, new_receipt_id};
pub use payment_signature::{
    payment_signature_message,
    sign_payload,
    sign_payment,
    verify_payload,
    verify_payment_signature,
};
