//! Data transfer objects for the REST API.

pub mod action_dto;

pub use action_dto::{ActionRequest, ActionResponse};
