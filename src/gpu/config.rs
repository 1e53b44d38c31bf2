//! Centralized graphics configuration for consistent wgpu settings

/// Global graphics configuration
pub struct GraphicsConfig {
    pub sample_count: u32,
    pub texture_format: wgpu::TextureFormat,
}

impl GraphicsConfig {
    /// Get the global graphics configuration
    pub fn global() -> Self {
        Self {
            sample_count: 1, // Disable multisampling for better compatibility
            texture_format: wgpu::TextureFormat::Bgra8Unorm,
        }
    }

    /// Create multisample state from config
    pub fn multisample_state(&self) -> wgpu::MultisampleState {
        wgpu::MultisampleState {
            count: self.sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        }
    }
}
