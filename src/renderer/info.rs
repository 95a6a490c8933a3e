/// Work submitted during one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Lights collected this frame, ambient lights included.
    pub lights: u32,
    pub vertices: u32,
    pub faces: u32,
    /// Immediate-mode batches plus compiled-list replays.
    pub calls: u32,
}

/// Backend resources currently owned by the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub textures: u32,
    pub lists: u32,
}

/// Frame statistics, reset at the start of every `render` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderInfo {
    pub render: RenderStats,
    pub memory: MemoryStats,
}

impl RenderStats {
    /// Accounts one batch or list replay.
    pub(crate) fn record_call(&mut self, faces: u32, vertices: u32) {
        self.calls += 1;
        self.faces += faces;
        self.vertices += vertices;
    }
}
