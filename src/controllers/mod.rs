pub mod alerts_controller;
pub mod chat_controller;
pub mod home_controller;
