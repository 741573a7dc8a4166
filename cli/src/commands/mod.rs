pub mod event;
pub mod health;
pub mod resources;
pub mod simulate;
pub mod stats;
pub mod tenants;
pub mod users;
