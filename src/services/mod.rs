pub mod auth;
pub mod compression;
pub mod event_service;
pub mod gallery;
pub mod object_store;
pub mod record_store;
pub mod upload_orchestrator;
