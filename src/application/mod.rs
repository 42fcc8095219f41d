// Application layer - Use cases over storage and the control channel
pub mod access_service;
pub mod dashboard_service;
pub mod live_updates;
pub mod storage_repository;

#[cfg(test)]
pub mod test_support;
