#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub volume: u8,
    pub volume_step: u8,
    pub duck_volume: f32,
    pub progress_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            volume: 100,
            volume_step: 5,
            duck_volume: 0.1,
            progress_interval_ms: 125,
        }
    }
}
