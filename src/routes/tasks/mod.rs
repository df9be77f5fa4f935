pub mod dto;
pub mod listing;
pub mod model;
pub mod queries;
pub mod routes;
