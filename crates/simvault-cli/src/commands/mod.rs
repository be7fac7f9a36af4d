pub mod export;
pub mod id;
pub mod info;
pub mod ls;
pub mod sweep;
