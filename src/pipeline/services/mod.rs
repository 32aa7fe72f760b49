pub mod backend;
pub mod managers;
pub mod preprocessing;
pub mod routes;
pub mod steps;
