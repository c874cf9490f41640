use crate::domain::ports::RenderSink;
use tracing::info;

// Render sink for headless peers: every UI update becomes a log line.
#[derive(Debug, Default)]
pub struct TracingSink;

impl RenderSink for TracingSink {
    fn set_health(&mut self, health: i32) {
        info!(health, "ui: health");
    }

    fn set_ammo(&mut self, capacity: u32, ammo: u32) {
        info!(ammo, capacity, "ui: ammo");
    }

    fn set_coin_text(&mut self, text: String) {
        info!(coins = %text, "ui: coins");
    }

    fn set_medkit_text(&mut self, text: String) {
        info!(medkits = %text, "ui: medkits");
    }
}
