//! Outbound webhook HTTP adapters.

mod mock_client;
mod reqwest_client;

pub use mock_client::MockWebhookClient;
pub use reqwest_client::ReqwestWebhookClient;
