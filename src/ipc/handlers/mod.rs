pub mod auth;
pub mod backup_exchange;
pub mod core;
pub mod playlists;
pub mod progress;
pub mod schedule;
pub mod videos;
