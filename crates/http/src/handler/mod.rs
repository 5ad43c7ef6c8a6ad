use async_trait::async_trait;

use crate::codec::ResponseWriter;
use crate::protocol::{HandlerError, ParsedRequest};

/// Writes the response to one parsed request.
///
/// Returning `Ok(())` is success. A failure is logged by the caller and never
/// retried; the response may be partially written, and the connection is
/// closed afterwards either way.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, request: &ParsedRequest, writer: &mut ResponseWriter<'_>) -> Result<(), HandlerError>;
}
