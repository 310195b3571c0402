//! Integration tests with mock HTTP server

mod dispatcher;
mod mock_server;
mod streaming;
