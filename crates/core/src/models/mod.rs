pub mod asset;
pub mod frequency;
pub mod price;
pub mod request;
pub mod response;
pub mod savings;
pub mod settings;
