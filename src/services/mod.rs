pub mod admin_view;
pub mod audit;
pub mod conversation;
pub mod flex;
pub mod messaging;
pub mod slots;
