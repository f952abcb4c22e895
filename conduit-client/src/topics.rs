//! Topic name endpoints

use crate::ControlClient;
use crate::error::Result;
use conduit_core::topic::TopicName;

impl ControlClient {
    /// Ask the control plane to decode a wire name
    ///
    /// The same result is available offline through
    /// [`conduit_core::topic::decode`]; this goes through the server so callers
    /// see exactly what it accepts.
    pub async fn decode_topic(&self, wire_name: &str) -> Result<TopicName> {
        let response = self
            .client
            .get(self.url(&format!("/topics/decode/{}", wire_name)))
            .send()
            .await?;

        self.handle_response(response).await
    }
}
