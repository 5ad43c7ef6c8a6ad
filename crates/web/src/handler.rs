//! The built-in static page handlers.
//!
//! [`FileSystemRoute`] serves the registered routes and [`DefaultRoute`] serves
//! every path no route matched. Both currently answer with [`INDEX_PAGE`]; they
//! are separate types so either can change without touching the other.

use async_trait::async_trait;
use dispatch_http::codec::{write_html_page, ResponseWriter};
use dispatch_http::handler::Handler;
use dispatch_http::protocol::{HandlerError, ParsedRequest};
use tracing::debug;

pub const INDEX_PAGE: &str = "<html> <head><title>A test page</title></head> <body> This is a small test page. </body> </html>";

/// Handler for paths matched by a route.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemRoute;

#[async_trait]
impl Handler for FileSystemRoute {
    async fn call(&self, request: &ParsedRequest, writer: &mut ResponseWriter<'_>) -> Result<(), HandlerError> {
        debug!(path = request.path(), "serving file system route");
        write_html_page(writer, INDEX_PAGE.as_bytes()).await?;
        Ok(())
    }
}

/// Handler for paths no route matched.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRoute;

#[async_trait]
impl Handler for DefaultRoute {
    async fn call(&self, request: &ParsedRequest, writer: &mut ResponseWriter<'_>) -> Result<(), HandlerError> {
        debug!(path = request.path(), "serving default route");
        write_html_page(writer, INDEX_PAGE.as_bytes()).await?;
        Ok(())
    }
}
