//! Renderer orchestration
//!
//! Sequences construction of every GPU resource in dependency order:
//! instance -> surface -> physical device -> logical device -> swapchain ->
//! render pass -> pipeline -> framebuffers -> command resources -> sync.
//! Teardown is the exact reverse, driven by RAII: fields are declared in
//! destruction order, and a failed constructor unwinds the locals already
//! built the same way.

use ash::vk;

use crate::core::config::AppConfig;
use crate::render::vulkan::commands::{CommandPool, CommandRecorder};
use crate::render::vulkan::context::{VulkanContext, VulkanError, VulkanResult};
use crate::render::vulkan::framebuffer::Framebuffer;
use crate::render::vulkan::render_pass::RenderPass;
use crate::render::vulkan::shader::{GraphicsPipeline, ShaderModule};
use crate::render::vulkan::swapchain::{SurfaceSupport, Swapchain};
use crate::render::vulkan::sync::FrameSync;
use crate::render::window::Window;

/// Owner of the complete rendering pipeline
///
/// Field order is load-bearing: drops run top to bottom, which is the
/// reverse of creation order. The context (device, surface, instance) must
/// outlive everything created from it.
pub struct Renderer {
    frame_sync: FrameSync,
    command_recorder: CommandRecorder,
    command_pool: CommandPool,
    framebuffers: Vec<Framebuffer>,
    pipeline: GraphicsPipeline,
    render_pass: RenderPass,
    swapchain: Swapchain,
    context: VulkanContext,
}

impl Renderer {
    /// Build the full pipeline for a window
    pub fn new(window: &mut Window, config: &AppConfig) -> VulkanResult<Self> {
        let context = VulkanContext::new(window, &config.window.title)?;
        log::info!("Vulkan context ready");

        // Fresh capability snapshot for the selected device/surface pair
        let support = SurfaceSupport::query(
            context.surface_loader(),
            context.physical_device().device,
            context.surface(),
        )?;

        let (fb_width, fb_height) = window.framebuffer_size();
        let swapchain = Swapchain::new(
            context.instance(),
            context.raw_device(),
            context.surface(),
            &support,
            context.physical_device(),
            vk::Extent2D {
                width: fb_width,
                height: fb_height,
            },
        )?;
        log::info!("Swapchain ready ({} images)", swapchain.image_count());

        let render_pass =
            RenderPass::new_present_pass(context.raw_device(), swapchain.format().format)?;

        // Shader modules are transient: dropped at the end of this scope,
        // once the pipeline holds its own compiled state
        let pipeline = {
            let vertex_shader = ShaderModule::from_file(
                context.raw_device(),
                &config.shaders.vertex_shader_path,
            )?;
            let fragment_shader = ShaderModule::from_file(
                context.raw_device(),
                &config.shaders.fragment_shader_path,
            )?;
            GraphicsPipeline::new(
                context.raw_device(),
                render_pass.handle(),
                &vertex_shader,
                &fragment_shader,
            )?
        };
        log::info!("Graphics pipeline ready");

        let framebuffers: Vec<Framebuffer> = swapchain
            .image_views()
            .iter()
            .map(|&view| {
                Framebuffer::new(
                    context.raw_device(),
                    render_pass.handle(),
                    view,
                    swapchain.extent(),
                )
            })
            .collect::<VulkanResult<_>>()?;
        log::info!("Framebuffers ready ({})", framebuffers.len());

        let command_pool = CommandPool::new(context.raw_device(), context.graphics_queue_family())?;
        let command_buffer = command_pool.allocate_command_buffers(1)?[0];
        let mut command_recorder = CommandRecorder::new(command_buffer, context.raw_device());

        // Initial static recording against the first framebuffer; draw_frame
        // re-records for whichever image gets acquired
        command_recorder.record_triangle_pass(
            render_pass.handle(),
            framebuffers[0].handle(),
            pipeline.handle(),
            swapchain.extent(),
        )?;
        log::info!("Command resources ready");

        let frame_sync = FrameSync::new(context.raw_device())?;

        Ok(Self {
            frame_sync,
            command_recorder,
            command_pool,
            framebuffers,
            pipeline,
            render_pass,
            swapchain,
            context,
        })
    }

    /// Record and submit one frame, then present it
    ///
    /// Single frame in flight: the in-flight fence gates re-recording of the
    /// one command buffer against GPU execution of the previous submission.
    pub fn draw_frame(&mut self) -> VulkanResult<()> {
        self.frame_sync.in_flight.wait()?;

        let (image_index, _suboptimal) = unsafe {
            self.swapchain
                .loader()
                .acquire_next_image(
                    self.swapchain.handle(),
                    u64::MAX,
                    self.frame_sync.image_available.handle(),
                    vk::Fence::null(),
                )
                .map_err(VulkanError::Api)?
        };

        self.frame_sync.in_flight.reset()?;

        self.command_recorder.reset()?;
        self.command_recorder.record_triangle_pass(
            self.render_pass.handle(),
            self.framebuffers[image_index as usize].handle(),
            self.pipeline.handle(),
            self.swapchain.extent(),
        )?;

        let wait_semaphores = [self.frame_sync.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [self.command_recorder.handle()];
        let signal_semaphores = [self.frame_sync.render_finished.handle()];

        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores)
            .build();

        unsafe {
            self.context
                .device
                .device
                .queue_submit(
                    self.context.graphics_queue(),
                    &[submit_info],
                    self.frame_sync.in_flight.handle(),
                )
                .map_err(VulkanError::Api)?;
        }

        let swapchains = [self.swapchain.handle()];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&signal_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe {
            self.swapchain
                .loader()
                .queue_present(self.context.present_queue(), &present_info)
                .map_err(VulkanError::Api)?;
        }

        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // Let in-flight work retire before any field starts tearing down
        unsafe {
            let _ = self.context.device.device.device_wait_idle();
        }
        log::info!("Renderer shutting down");
    }
}
