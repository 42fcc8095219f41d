// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod control_channel;
pub mod event_listener;
pub mod file_storage;
pub mod ws_config_writer;

#[cfg(test)]
pub mod mock_home_assistant;
