pub mod comment;
pub mod favorite;
pub mod otp;
pub mod reciter;
pub mod request;
pub mod settings;
pub mod stats;
pub mod user;
