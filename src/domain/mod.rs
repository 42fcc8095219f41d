// Domain layer - Dashboard, view and account models
pub mod access;
pub mod dashboard;
pub mod lovelace;
pub mod user;
