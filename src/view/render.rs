use wgpu::{
    Color, CommandEncoderDescriptor, LoadOp, Operations, RenderPassColorAttachment, RenderPassDescriptor, StoreOp,
    SurfaceError, TextureViewDescriptor,
};

use crate::error::{Result, SandpitError};
use crate::view::GpuContext;

/// Draws tessellated egui output onto the overlay surface
pub struct PanelRenderer {
    renderer: egui_wgpu::Renderer,
}

impl PanelRenderer {
    pub fn new(gpu: &GpuContext) -> Self {
        Self {
            renderer: egui_wgpu::Renderer::new(gpu.device.as_ref(), gpu.format, egui_wgpu::RendererOptions::default()),
        }
    }

    pub fn draw(
        &mut self,
        gpu: &mut GpuContext,
        primitives: &[egui::ClippedPrimitive],
        textures: &egui::TexturesDelta,
        pixels_per_point: f32,
    ) -> Result<()> {
        let (width, height) = gpu.size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point,
        };

        let frame = match gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                gpu.resize(width, height);
                gpu.surface
                    .get_current_texture()
                    .map_err(|e| SandpitError::Gpu(e.to_string()))?
            }
            Err(e) => return Err(SandpitError::Gpu(e.to_string())),
        };

        let device = gpu.device.as_ref();
        let queue = gpu.queue.as_ref();
        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("settings_encoder"),
        });

        for (id, image_delta) in &textures.set {
            self.renderer.update_texture(device, queue, *id, image_delta);
        }

        let callback_buffers =
            self.renderer
                .update_buffers(device, queue, &mut encoder, primitives, &screen_descriptor);

        {
            let pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("settings_render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(Color::TRANSPARENT),
                        store: StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.renderer
                .render(&mut pass.forget_lifetime(), primitives, &screen_descriptor);
        }

        for id in &textures.free {
            self.renderer.free_texture(id);
        }

        queue.submit(callback_buffers.into_iter().chain(std::iter::once(encoder.finish())));
        frame.present();
        Ok(())
    }
}
