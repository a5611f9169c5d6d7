// Infrastructure layer - External dependencies and adapters
pub mod chunked_json;
pub mod config;
pub mod http_response;
pub mod rest_repository;
pub mod stomp_frame;
pub mod stomp_transport;
pub mod websocket_transport;
