//! Headless backend that records the command stream.
//!
//! Executes only the bookkeeping a real driver would expose (matrix stack
//! depth, enabled capabilities, live lists and textures), which makes it the
//! reference backend for tests and tooling.

use glam::{Mat4, Vec2, Vec3, Vec4};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::backend::{
    Capability, ClearFlags, ContextInfo, CullMode, FixedFunction, FrontFace, LightParam, ListId,
    MaterialParam, MatrixMode, PolygonMode, Primitive, ShadeModel, TexParam, TextureId,
};
use crate::errors::BackendError;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    MatrixMode(MatrixMode),
    LoadIdentity,
    LoadMatrix(Mat4),
    MultMatrix(Mat4),
    PushMatrix,
    PopMatrix,

    Viewport { x: i32, y: i32, width: u32, height: u32 },
    ClearColor(Vec4),
    Clear(ClearFlags),

    Enable(Capability),
    Disable(Capability),
    CullFace(CullMode),
    FrontFace(FrontFace),
    PolygonMode(PolygonMode),
    ShadeModel(ShadeModel),

    Begin(Primitive),
    End,
    Color(Vec3),
    Normal(Vec3),
    TexCoord(Vec2),
    Vertex(Vec3),

    NewList(ListId),
    EndList,
    CallList(ListId),
    DeleteList(ListId),

    BindTexture(TextureId),
    TexParameter(TexParam),
    PixelStoreFlipY(bool),
    TexImage2D { width: u32, height: u32, bytes: usize },
    DeleteTexture(TextureId),

    Light { unit: u8, param: LightParam },
    LightModelAmbient(Vec4),
    Material(MaterialParam),

    Flush,
    SwapBuffers,
}

/// Bookkeeping for one live texture object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureRecord {
    pub width: u32,
    pub height: u32,
    pub uploads: u32,
    pub flip_y: bool,
}

pub struct RecordingBackend {
    info: ContextInfo,
    context_lost: bool,

    commands: Vec<Command>,

    // Matrix stacks (depth above the base entry)
    matrix_mode: MatrixMode,
    modelview_depth: usize,
    projection_depth: usize,
    stack_underflows: usize,

    // Compiled lists
    next_list: u32,
    reserved_lists: FxHashSet<ListId>,
    lists: FxHashMap<ListId, Vec<Command>>,
    compiling: Option<(ListId, Vec<Command>)>,

    // Textures
    next_texture: u32,
    textures: FxHashMap<TextureId, TextureRecord>,
    bound_texture: Option<TextureId>,
    flip_y: bool,

    enabled: FxHashSet<Capability>,

    // Failure injection
    failing_list_allocations: u32,
    failing_texture_allocations: u32,
}

impl RecordingBackend {
    /// A context with 8 light units.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            info: ContextInfo {
                max_lights: 8,
                width,
                height,
            },
            context_lost: false,
            commands: Vec::new(),
            matrix_mode: MatrixMode::ModelView,
            modelview_depth: 0,
            projection_depth: 0,
            stack_underflows: 0,
            next_list: 1,
            reserved_lists: FxHashSet::default(),
            lists: FxHashMap::default(),
            compiling: None,
            next_texture: 1,
            textures: FxHashMap::default(),
            bound_texture: None,
            flip_y: false,
            enabled: FxHashSet::default(),
            failing_list_allocations: 0,
            failing_texture_allocations: 0,
        }
    }

    #[must_use]
    pub fn with_max_lights(mut self, max_lights: u8) -> Self {
        self.info.max_lights = max_lights;
        self
    }

    // ========================================================================
    // Failure injection
    // ========================================================================

    /// Makes `context_info` fail from now on.
    pub fn lose_context(&mut self) {
        self.context_lost = true;
    }

    /// The next `count` calls to `gen_list` fail.
    pub fn fail_list_allocations(&mut self, count: u32) {
        self.failing_list_allocations = count;
    }

    /// The next `count` calls to `gen_texture` fail.
    pub fn fail_texture_allocations(&mut self, count: u32) {
        self.failing_texture_allocations = count;
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Every call issued so far, including those recorded into lists.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Returns and forgets the command log.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    #[must_use]
    pub fn list_commands(&self, id: ListId) -> Option<&[Command]> {
        self.lists.get(&id).map(Vec::as_slice)
    }

    #[must_use]
    pub fn live_lists(&self) -> usize {
        self.lists.len()
    }

    #[must_use]
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    #[must_use]
    pub fn texture(&self, id: TextureId) -> Option<&TextureRecord> {
        self.textures.get(&id)
    }

    #[must_use]
    pub fn bound_texture(&self) -> Option<TextureId> {
        self.bound_texture
    }

    #[must_use]
    pub fn matrix_depth(&self, mode: MatrixMode) -> usize {
        match mode {
            MatrixMode::ModelView => self.modelview_depth,
            MatrixMode::Projection => self.projection_depth,
        }
    }

    /// Pops issued on an empty stack.
    #[must_use]
    pub fn stack_underflows(&self) -> usize {
        self.stack_underflows
    }

    #[must_use]
    pub fn is_enabled(&self, cap: Capability) -> bool {
        self.enabled.contains(&cap)
    }

    #[must_use]
    pub fn is_compiling(&self) -> bool {
        self.compiling.is_some()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Logs `command`; returns whether it should also take effect now.
    fn record(&mut self, command: Command) -> bool {
        let execute = match &mut self.compiling {
            Some((_, body)) => {
                body.push(command.clone());
                false
            }
            None => true,
        };
        self.commands.push(command);
        execute
    }

    fn depth_mut(&mut self) -> &mut usize {
        match self.matrix_mode {
            MatrixMode::ModelView => &mut self.modelview_depth,
            MatrixMode::Projection => &mut self.projection_depth,
        }
    }
}

impl FixedFunction for RecordingBackend {
    fn context_info(&self) -> Result<ContextInfo, BackendError> {
        if self.context_lost {
            return Err(BackendError::ContextUnavailable(
                "recording context was lost".to_string(),
            ));
        }
        Ok(self.info)
    }

    fn matrix_mode(&mut self, mode: MatrixMode) {
        if self.record(Command::MatrixMode(mode)) {
            self.matrix_mode = mode;
        }
    }

    fn load_identity(&mut self) {
        self.record(Command::LoadIdentity);
    }

    fn load_matrix(&mut self, matrix: &Mat4) {
        self.record(Command::LoadMatrix(*matrix));
    }

    fn mult_matrix(&mut self, matrix: &Mat4) {
        self.record(Command::MultMatrix(*matrix));
    }

    fn push_matrix(&mut self) {
        if self.record(Command::PushMatrix) {
            *self.depth_mut() += 1;
        }
    }

    fn pop_matrix(&mut self) {
        if self.record(Command::PopMatrix) {
            if *self.depth_mut() == 0 {
                self.stack_underflows += 1;
            } else {
                *self.depth_mut() -= 1;
            }
        }
    }

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.record(Command::Viewport {
            x,
            y,
            width,
            height,
        });
    }

    fn clear_color(&mut self, color: Vec4) {
        self.record(Command::ClearColor(color));
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.record(Command::Clear(flags));
    }

    fn enable(&mut self, cap: Capability) {
        if self.record(Command::Enable(cap)) {
            self.enabled.insert(cap);
        }
    }

    fn disable(&mut self, cap: Capability) {
        if self.record(Command::Disable(cap)) {
            self.enabled.remove(&cap);
        }
    }

    fn cull_face(&mut self, mode: CullMode) {
        self.record(Command::CullFace(mode));
    }

    fn front_face(&mut self, dir: FrontFace) {
        self.record(Command::FrontFace(dir));
    }

    fn polygon_mode(&mut self, mode: PolygonMode) {
        self.record(Command::PolygonMode(mode));
    }

    fn shade_model(&mut self, model: ShadeModel) {
        self.record(Command::ShadeModel(model));
    }

    fn begin(&mut self, primitive: Primitive) {
        self.record(Command::Begin(primitive));
    }

    fn end(&mut self) {
        self.record(Command::End);
    }

    fn color3(&mut self, color: Vec3) {
        self.record(Command::Color(color));
    }

    fn normal3(&mut self, normal: Vec3) {
        self.record(Command::Normal(normal));
    }

    fn tex_coord2(&mut self, uv: Vec2) {
        self.record(Command::TexCoord(uv));
    }

    fn vertex3(&mut self, position: Vec3) {
        self.record(Command::Vertex(position));
    }

    fn gen_list(&mut self) -> Result<ListId, BackendError> {
        if self.failing_list_allocations > 0 {
            self.failing_list_allocations -= 1;
            return Err(BackendError::ListAllocationFailed);
        }
        let id = ListId(self.next_list);
        self.next_list += 1;
        self.reserved_lists.insert(id);
        Ok(id)
    }

    fn new_list(&mut self, id: ListId) {
        self.commands.push(Command::NewList(id));
        if self.compiling.is_some() {
            log::warn!("new_list({}) while already compiling; ignored", id.0);
            return;
        }
        self.compiling = Some((id, Vec::new()));
    }

    fn end_list(&mut self) {
        self.commands.push(Command::EndList);
        if let Some((id, body)) = self.compiling.take() {
            if self.reserved_lists.contains(&id) {
                self.lists.insert(id, body);
            }
        }
    }

    fn call_list(&mut self, id: ListId) {
        self.record(Command::CallList(id));
    }

    fn is_list(&self, id: ListId) -> bool {
        self.lists.contains_key(&id)
    }

    fn delete_list(&mut self, id: ListId) {
        self.commands.push(Command::DeleteList(id));
        self.reserved_lists.remove(&id);
        self.lists.remove(&id);
    }

    fn gen_texture(&mut self) -> Result<TextureId, BackendError> {
        if self.failing_texture_allocations > 0 {
            self.failing_texture_allocations -= 1;
            return Err(BackendError::TextureAllocationFailed);
        }
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        self.textures.insert(id, TextureRecord::default());
        Ok(id)
    }

    fn bind_texture(&mut self, id: TextureId) {
        if self.record(Command::BindTexture(id)) {
            self.bound_texture = Some(id);
        }
    }

    fn tex_parameter(&mut self, param: TexParam) {
        self.record(Command::TexParameter(param));
    }

    fn pixel_store_flip_y(&mut self, flip: bool) {
        if self.record(Command::PixelStoreFlipY(flip)) {
            self.flip_y = flip;
        }
    }

    fn tex_image_2d(&mut self, width: u32, height: u32, rgb: &[u8]) {
        let command = Command::TexImage2D {
            width,
            height,
            bytes: rgb.len(),
        };
        if !self.record(command) {
            return;
        }
        let flip_y = self.flip_y;
        if let Some(record) = self.bound_texture.and_then(|id| self.textures.get_mut(&id)) {
            record.width = width;
            record.height = height;
            record.uploads += 1;
            record.flip_y = flip_y;
        }
    }

    fn delete_texture(&mut self, id: TextureId) {
        self.commands.push(Command::DeleteTexture(id));
        self.textures.remove(&id);
        if self.bound_texture == Some(id) {
            self.bound_texture = None;
        }
    }

    fn light(&mut self, unit: u8, param: LightParam) {
        self.record(Command::Light { unit, param });
    }

    fn light_model_ambient(&mut self, color: Vec4) {
        self.record(Command::LightModelAmbient(color));
    }

    fn material(&mut self, param: MaterialParam) {
        self.record(Command::Material(param));
    }

    fn flush(&mut self) {
        self.record(Command::Flush);
    }

    fn swap_buffers(&mut self) {
        self.commands.push(Command::SwapBuffers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_inside_a_list_are_recorded_not_executed() {
        let mut backend = RecordingBackend::new(64, 64);
        let id = backend.gen_list().unwrap();
        assert!(!backend.is_list(id));

        backend.new_list(id);
        backend.push_matrix();
        backend.enable(Capability::Lighting);
        backend.end_list();

        assert!(backend.is_list(id));
        assert_eq!(backend.matrix_depth(MatrixMode::ModelView), 0);
        assert!(!backend.is_enabled(Capability::Lighting));
        assert_eq!(
            backend.list_commands(id).unwrap(),
            &[Command::PushMatrix, Command::Enable(Capability::Lighting)]
        );
    }

    #[test]
    fn matrix_stacks_are_tracked_per_mode() {
        let mut backend = RecordingBackend::new(64, 64);
        backend.matrix_mode(MatrixMode::Projection);
        backend.push_matrix();
        backend.matrix_mode(MatrixMode::ModelView);
        backend.push_matrix();
        backend.push_matrix();
        assert_eq!(backend.matrix_depth(MatrixMode::Projection), 1);
        assert_eq!(backend.matrix_depth(MatrixMode::ModelView), 2);

        backend.pop_matrix();
        backend.pop_matrix();
        backend.pop_matrix();
        assert_eq!(backend.matrix_depth(MatrixMode::ModelView), 0);
        assert_eq!(backend.stack_underflows(), 1);
    }

    #[test]
    fn allocation_failures_are_consumed() {
        let mut backend = RecordingBackend::new(64, 64);
        backend.fail_list_allocations(1);
        backend.fail_texture_allocations(2);

        assert_eq!(backend.gen_list(), Err(BackendError::ListAllocationFailed));
        assert!(backend.gen_list().is_ok());
        assert!(backend.gen_texture().is_err());
        assert!(backend.gen_texture().is_err());
        assert!(backend.gen_texture().is_ok());
    }

    #[test]
    fn upload_lands_on_bound_texture() {
        let mut backend = RecordingBackend::new(64, 64);
        let id = backend.gen_texture().unwrap();
        backend.bind_texture(id);
        backend.pixel_store_flip_y(true);
        backend.tex_image_2d(2, 2, &[0; 12]);

        let record = backend.texture(id).unwrap();
        assert_eq!((record.width, record.height, record.uploads), (2, 2, 1));
        assert!(record.flip_y);

        backend.delete_texture(id);
        assert_eq!(backend.live_textures(), 0);
        assert_eq!(backend.bound_texture(), None);
    }
}
