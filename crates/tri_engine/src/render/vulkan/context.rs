//! Vulkan context management
//!
//! Instance, logical device, and the owning `VulkanContext` that ties the
//! platform surface to the selected physical device. Construction order is
//! instance -> surface -> physical device -> logical device; destruction is
//! exactly the reverse.

use ash::extensions::khr::{Surface, Swapchain as SwapchainLoader};
#[cfg(debug_assertions)]
use ash::extensions::ext::DebugUtils;
use ash::vk;
use ash::{Device, Entry, Instance};
use std::ffi::{CStr, CString};
use thiserror::Error;

use crate::render::vulkan::device::PhysicalDeviceInfo;
use crate::render::window::Window;

/// Vulkan-specific error types
///
/// Every variant is fatal at the point it is raised: errors propagate to the
/// top-level caller, which unwinds whatever was already constructed.
#[derive(Error, Debug)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// Vulkan loader or instance initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// A required instance or device extension (or layer) is unavailable
    #[error("Required extension or layer unavailable: {0}")]
    ExtensionUnavailable(String),

    /// No physical device scored above the viability threshold
    #[error("No viable rendering device found")]
    NoViableDevice,

    /// A device exposes no graphics-capable or no present-capable queue family
    #[error("Incomplete queue families: graphics or present support missing")]
    IncompleteQueueFamilies,

    /// The surface reports no supported formats or no present modes
    #[error("Surface reports no supported formats or present modes")]
    UnsupportedSurface,

    /// Swapchain creation failed
    #[error("Swapchain creation failed: {0:?}")]
    SwapchainCreation(vk::Result),

    /// Render pass creation failed
    #[error("Render pass creation failed: {0:?}")]
    RenderPassCreation(vk::Result),

    /// Pipeline or pipeline layout creation failed
    #[error("Pipeline creation failed: {0:?}")]
    PipelineCreation(vk::Result),

    /// Framebuffer creation failed
    #[error("Framebuffer creation failed: {0:?}")]
    FramebufferCreation(vk::Result),

    /// Command pool or command buffer operation failed
    #[error("Command resource error: {0:?}")]
    CommandResource(vk::Result),

    /// Invalid operation attempted
    #[error("Invalid operation: {reason}")]
    InvalidOperation {
        /// Description of why the operation is invalid
        reason: String,
    },
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

/// Vulkan instance wrapper with RAII cleanup
pub struct VulkanInstance {
    /// Vulkan entry point
    pub entry: Entry,
    /// Vulkan instance handle
    pub instance: Instance,
    /// Debug utilities extension (debug builds)
    #[cfg(debug_assertions)]
    debug_utils: Option<DebugUtils>,
    /// Debug messenger handle (debug builds)
    #[cfg(debug_assertions)]
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl VulkanInstance {
    /// Create a new Vulkan instance
    ///
    /// The instance extensions GLFW requires for surface creation are checked
    /// against what the loader reports before creation, so a missing platform
    /// extension fails with a named error instead of a raw driver code.
    pub fn new(window: &Window, app_name: &str, enable_validation: bool) -> VulkanResult<Self> {
        let entry = unsafe { Entry::load() }.map_err(|e| {
            VulkanError::InitializationFailed(format!("Failed to load Vulkan: {e:?}"))
        })?;

        let app_name_cstr = CString::new(app_name)
            .map_err(|_| VulkanError::InitializationFailed("Invalid app name".to_string()))?;
        let engine_name_cstr = CString::new("TriEngine").expect("static name");
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name_cstr)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(&engine_name_cstr)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);

        // Required surface extensions come from GLFW
        let required_extensions = window.required_instance_extensions().map_err(|e| {
            VulkanError::InitializationFailed(format!("Failed to get required extensions: {e}"))
        })?;

        Self::check_instance_extensions(&entry, &required_extensions)?;

        let cstr_extensions: Vec<CString> = required_extensions
            .iter()
            .map(|ext| CString::new(ext.as_str()).expect("extension names have no NUL"))
            .collect();

        #[allow(unused_mut)] // Mutable in debug builds for adding debug extensions
        let mut extensions: Vec<*const i8> =
            cstr_extensions.iter().map(|ext| ext.as_ptr()).collect();

        #[cfg(debug_assertions)]
        if enable_validation {
            extensions.push(DebugUtils::name().as_ptr());
        }

        let layer_names = if cfg!(debug_assertions) && enable_validation {
            vec![CString::new("VK_LAYER_KHRONOS_validation").expect("static name")]
        } else {
            vec![]
        };

        let layer_names_ptrs: Vec<*const i8> =
            layer_names.iter().map(|name| name.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layer_names_ptrs);

        log::info!("Creating Vulkan instance");
        let instance = unsafe {
            entry
                .create_instance(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        #[cfg(debug_assertions)]
        let (debug_utils, debug_messenger) = if enable_validation {
            let debug_utils = DebugUtils::new(&entry, &instance);
            let debug_messenger = Self::setup_debug_messenger(&debug_utils)?;
            (Some(debug_utils), Some(debug_messenger))
        } else {
            (None, None)
        };

        log::info!("Vulkan instance created");
        Ok(Self {
            entry,
            instance,
            #[cfg(debug_assertions)]
            debug_utils,
            #[cfg(debug_assertions)]
            debug_messenger,
        })
    }

    /// Verify every required instance extension is reported as available
    fn check_instance_extensions(entry: &Entry, required: &[String]) -> VulkanResult<()> {
        let available = entry
            .enumerate_instance_extension_properties(None)
            .map_err(VulkanError::Api)?;

        for name in required {
            let found = available.iter().any(|props| {
                let ext_name = unsafe { CStr::from_ptr(props.extension_name.as_ptr()) };
                ext_name.to_string_lossy() == name.as_str()
            });
            if !found {
                log::error!("Instance extension {} is not available", name);
                return Err(VulkanError::ExtensionUnavailable(name.clone()));
            }
        }
        Ok(())
    }

    #[cfg(debug_assertions)]
    fn setup_debug_messenger(debug_utils: &DebugUtils) -> VulkanResult<vk::DebugUtilsMessengerEXT> {
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        unsafe {
            debug_utils
                .create_debug_utils_messenger(&create_info, None)
                .map_err(VulkanError::Api)
        }
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            #[cfg(debug_assertions)]
            if let (Some(debug_utils), Some(debug_messenger)) =
                (&self.debug_utils, &self.debug_messenger)
            {
                debug_utils.destroy_debug_utils_messenger(*debug_messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}

/// Debug callback for validation layers
#[cfg(debug_assertions)]
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    let callback_data = *callback_data;
    let message = CStr::from_ptr(callback_data.p_message).to_string_lossy();

    if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR {
        log::error!("[Vulkan] {:?} - {}", message_type, message);
    } else if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING {
        log::warn!("[Vulkan] {:?} - {}", message_type, message);
    } else {
        log::debug!("[Vulkan] {:?} - {}", message_type, message);
    }

    vk::FALSE
}

/// Vulkan surface wrapper with RAII cleanup
///
/// The surface owns its handle the way every other wrapper here does, so a
/// construction failure after surface creation still destroys the surface
/// before the instance unwinds.
pub struct VulkanSurface {
    loader: Surface,
    surface: vk::SurfaceKHR,
}

impl VulkanSurface {
    /// Create a surface for the window
    pub fn new(window: &mut Window, instance: &VulkanInstance) -> VulkanResult<Self> {
        let loader = Surface::new(&instance.entry, &instance.instance);
        let surface = window
            .create_vulkan_surface(instance.instance.handle())
            .map_err(|e| VulkanError::InitializationFailed(format!("Surface creation: {e}")))?;

        Ok(Self { loader, surface })
    }

    /// Get the surface handle
    pub fn handle(&self) -> vk::SurfaceKHR {
        self.surface
    }

    /// Get the surface extension loader
    pub fn loader(&self) -> &Surface {
        &self.loader
    }
}

impl Drop for VulkanSurface {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_surface(self.surface, None);
        }
    }
}

/// Logical device wrapper with RAII cleanup
pub struct LogicalDevice {
    /// Vulkan logical device handle
    pub device: Device,
    /// Graphics operations queue
    pub graphics_queue: vk::Queue,
    /// Surface presentation queue
    pub present_queue: vk::Queue,
    /// Index of the graphics queue family
    pub graphics_family: u32,
    /// Index of the presentation queue family
    pub present_family: u32,
}

impl LogicalDevice {
    /// Create a new logical device with graphics and present queues
    pub fn new(
        instance: &Instance,
        physical_device_info: &PhysicalDeviceInfo,
    ) -> VulkanResult<Self> {
        let unique_families: std::collections::HashSet<u32> = [
            physical_device_info.graphics_family,
            physical_device_info.present_family,
        ]
        .iter()
        .copied()
        .collect();

        let queue_infos: Vec<vk::DeviceQueueCreateInfo> = unique_families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family)
                    .queue_priorities(&[1.0])
                    .build()
            })
            .collect();

        let required_extensions = [SwapchainLoader::name().as_ptr()];

        // Geometry shader support is part of the selection criteria; enable it
        let device_features = vk::PhysicalDeviceFeatures::builder()
            .geometry_shader(true)
            .build();

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&required_extensions)
            .enabled_features(&device_features);

        let device = unsafe {
            instance
                .create_device(physical_device_info.device, &create_info, None)
                .map_err(VulkanError::Api)?
        };

        let graphics_queue =
            unsafe { device.get_device_queue(physical_device_info.graphics_family, 0) };
        let present_queue =
            unsafe { device.get_device_queue(physical_device_info.present_family, 0) };

        log::info!(
            "Logical device created (graphics family {}, present family {})",
            physical_device_info.graphics_family,
            physical_device_info.present_family
        );

        Ok(Self {
            device,
            graphics_queue,
            present_queue,
            graphics_family: physical_device_info.graphics_family,
            present_family: physical_device_info.present_family,
        })
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            // Ensure device is idle before destruction
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
    }
}

/// Main Vulkan context that owns instance, surface, and device
pub struct VulkanContext {
    /// Vulkan surface for rendering
    pub surface: VulkanSurface,
    /// Selected physical device information
    pub physical_device: PhysicalDeviceInfo,
    /// Logical device for operations
    pub device: LogicalDevice,
    /// Vulkan instance and debug utilities
    pub instance: VulkanInstance,
}

impl VulkanContext {
    /// Create a new Vulkan context for the window
    ///
    /// If any step after surface creation fails, the locals unwind in
    /// reverse creation order, so the surface is destroyed before the
    /// instance.
    pub fn new(window: &mut Window, app_name: &str) -> VulkanResult<Self> {
        let instance = VulkanInstance::new(window, app_name, cfg!(debug_assertions))?;

        let surface = VulkanSurface::new(window, &instance)?;

        let physical_device =
            PhysicalDeviceInfo::select(&instance.instance, surface.handle(), surface.loader())?;

        let device = LogicalDevice::new(&instance.instance, &physical_device)?;

        Ok(Self {
            surface,
            physical_device,
            device,
            instance,
        })
    }

    /// Get a reference to the Vulkan instance
    pub fn instance(&self) -> &Instance {
        &self.instance.instance
    }

    /// Get the surface handle
    pub fn surface(&self) -> vk::SurfaceKHR {
        self.surface.handle()
    }

    /// Get the surface loader
    pub fn surface_loader(&self) -> &Surface {
        self.surface.loader()
    }

    /// Get the physical device info
    pub fn physical_device(&self) -> &PhysicalDeviceInfo {
        &self.physical_device
    }

    /// Get a clone of the raw device handle
    pub fn raw_device(&self) -> Device {
        self.device.device.clone()
    }

    /// Get the graphics queue
    pub fn graphics_queue(&self) -> vk::Queue {
        self.device.graphics_queue
    }

    /// Get the present queue
    pub fn present_queue(&self) -> vk::Queue {
        self.device.present_queue
    }

    /// Get the graphics queue family index
    pub fn graphics_queue_family(&self) -> u32 {
        self.device.graphics_family
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device.device_wait_idle();
            // Fields then drop in declaration order: surface, device, instance.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every handle-owning wrapper here must carry drop glue so that both
    /// normal teardown and mid-construction unwinding release the handle.
    #[test]
    fn handle_wrappers_have_drop_glue() {
        assert!(std::mem::needs_drop::<VulkanSurface>());
        assert!(std::mem::needs_drop::<LogicalDevice>());
        assert!(std::mem::needs_drop::<VulkanInstance>());
        assert!(std::mem::needs_drop::<VulkanContext>());
    }
}
