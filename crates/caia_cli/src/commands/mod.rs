pub mod config;
pub mod db;
pub mod kv;
pub mod learned;
pub mod pack;
pub mod tenant;
pub mod user;
pub mod vendor;
